//! In-memory stand-in for the Crowd usermanagement REST API.
//!
//! Serves the user, attribute, membership and group resources under
//! `/rest/usermanagement/1` with the same status codes and
//! `{"reason","message"}` error envelopes as the real service. Every request
//! must carry Basic credentials for the configured application.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use axum::{
    extract::{Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const ROOT: &str = "/rest/usermanagement/1";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct User {
    pub name: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default, skip_serializing)]
    pub password: Option<PasswordValue>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordValue {
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub group_type: String,
    #[serde(default)]
    pub active: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupName {
    pub name: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Groups {
    pub groups: Vec<GroupName>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    #[serde(default)]
    pub values: Vec<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Attributes {
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UserRename {
    pub new_name: String,
}

#[derive(Deserialize)]
pub struct UserQuery {
    pub username: String,
}

#[derive(Deserialize)]
pub struct UserAttributeQuery {
    pub username: String,
    pub attributename: String,
}

#[derive(Deserialize)]
pub struct UserGroupQuery {
    pub username: String,
    pub groupname: String,
}

#[derive(Deserialize)]
pub struct GroupQuery {
    pub groupname: String,
}

/// Credentials the mock accepts.
#[derive(Clone, Debug)]
pub struct MockConfig {
    pub application: String,
    pub password: String,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            application: "testapp".to_string(),
            password: "password".to_string(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Directory {
    users: HashMap<String, User>,
    passwords: HashMap<String, String>,
    attributes: HashMap<String, BTreeMap<String, Vec<String>>>,
    groups: HashMap<String, Group>,
    /// user -> groups the user is a direct member of
    memberships: HashMap<String, BTreeSet<String>>,
    /// parent group -> direct child groups
    children: HashMap<String, BTreeSet<String>>,
}

impl Directory {
    /// True if `target` is `from` or one of its nested child groups.
    fn reaches(&self, from: &str, target: &str) -> bool {
        let mut stack = vec![from.to_string()];
        let mut visited = BTreeSet::new();
        while let Some(group) = stack.pop() {
            if group == target {
                return true;
            }
            if !visited.insert(group.clone()) {
                continue;
            }
            if let Some(children) = self.children.get(&group) {
                stack.extend(children.iter().cloned());
            }
        }
        false
    }

    fn link_groups(&mut self, parent: &str, child: &str) -> Result<(), Rejection> {
        if self.reaches(child, parent) {
            return Err(Rejection::new(
                StatusCode::BAD_REQUEST,
                "INVALID_MEMBERSHIP",
                format!("Adding <{child}> to <{parent}> would create a circular dependency"),
            ));
        }
        self.children
            .entry(parent.to_string())
            .or_default()
            .insert(child.to_string());
        Ok(())
    }
}

pub type Db = Arc<RwLock<Directory>>;

#[derive(Clone)]
pub struct AppState {
    db: Db,
    expected_auth: Arc<str>,
}

/// An error response in the remote's envelope format.
#[derive(Debug)]
pub struct Rejection {
    status: StatusCode,
    reason: &'static str,
    message: String,
}

impl Rejection {
    fn new(status: StatusCode, reason: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            reason,
            message: message.into(),
        }
    }

    fn user_not_found(name: &str) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            "USER_NOT_FOUND",
            format!("User <{name}> does not exist"),
        )
    }

    fn group_not_found(status: StatusCode, name: &str) -> Self {
        Self::new(
            status,
            "GROUP_NOT_FOUND",
            format!("Group <{name}> does not exist"),
        )
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        tracing::debug!(status = %self.status, reason = self.reason, message = %self.message, "rejecting request");
        let body = serde_json::json!({ "reason": self.reason, "message": self.message });
        (self.status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, Rejection>;

pub fn app() -> Router {
    app_with(MockConfig::default())
}

pub fn app_with(config: MockConfig) -> Router {
    let credential = BASE64.encode(format!("{}:{}", config.application, config.password));
    let state = AppState {
        db: Arc::new(RwLock::new(Directory::default())),
        expected_auth: format!("Basic {credential}").into(),
    };

    let routes = Router::new()
        .route(
            "/user",
            get(get_user).post(add_user).put(update_user).delete(remove_user),
        )
        .route("/user/rename", post(rename_user))
        .route("/user/password", put(set_user_password))
        .route(
            "/user/attribute",
            get(get_user_attributes)
                .post(store_user_attributes)
                .delete(remove_user_attribute),
        )
        .route(
            "/user/group/direct",
            get(get_user_groups)
                .post(add_user_to_group)
                .delete(remove_user_from_group),
        )
        .route("/group", get(get_group).post(create_group).delete(remove_group))
        .route("/group/child-group/direct", post(add_child_group))
        .route("/group/parent-group/direct", post(add_parent_group));

    Router::new()
        .nest(ROOT, routes)
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with(listener, MockConfig::default()).await
}

pub async fn run_with(listener: TcpListener, config: MockConfig) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(config)).await
}

async fn require_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    if provided != Some(&*state.expected_auth) {
        return Rejection::new(
            StatusCode::UNAUTHORIZED,
            "APPLICATION_ACCESS_DENIED",
            "Application failed to authenticate",
        )
        .into_response();
    }
    next.run(request).await
}

// --- users ---

async fn get_user(State(state): State<AppState>, Query(q): Query<UserQuery>) -> ApiResult<Json<User>> {
    let db = state.db.read().await;
    db.users
        .get(&q.username)
        .cloned()
        .map(Json)
        .ok_or_else(|| Rejection::user_not_found(&q.username))
}

async fn add_user(
    State(state): State<AppState>,
    Json(mut user): Json<User>,
) -> ApiResult<(StatusCode, Json<User>)> {
    if user.name.is_empty() {
        return Err(Rejection::new(
            StatusCode::BAD_REQUEST,
            "INVALID_USER",
            "User name can't be empty",
        ));
    }
    let mut db = state.db.write().await;
    if db.users.contains_key(&user.name) {
        return Err(Rejection::new(
            StatusCode::BAD_REQUEST,
            "INVALID_USER",
            format!("User <{}> already exists", user.name),
        ));
    }
    if let Some(password) = user.password.take() {
        db.passwords.insert(user.name.clone(), password.value);
    }
    user.key = Some(Uuid::new_v4().to_string());
    db.users.insert(user.name.clone(), user.clone());
    Ok((StatusCode::CREATED, Json(user)))
}

async fn update_user(
    State(state): State<AppState>,
    Query(q): Query<UserQuery>,
    Json(mut user): Json<User>,
) -> ApiResult<StatusCode> {
    let mut db = state.db.write().await;
    let current = db
        .users
        .get_mut(&q.username)
        .ok_or_else(|| Rejection::user_not_found(&q.username))?;
    if user.name != q.username {
        return Err(Rejection::new(
            StatusCode::BAD_REQUEST,
            "INVALID_USER",
            format!("User name <{}> does not match <{}>", user.name, q.username),
        ));
    }
    user.key = current.key.clone();
    user.password = None;
    *current = user;
    Ok(StatusCode::NO_CONTENT)
}

async fn remove_user(State(state): State<AppState>, Query(q): Query<UserQuery>) -> ApiResult<StatusCode> {
    let mut db = state.db.write().await;
    db.users
        .remove(&q.username)
        .ok_or_else(|| Rejection::user_not_found(&q.username))?;
    db.passwords.remove(&q.username);
    db.attributes.remove(&q.username);
    db.memberships.remove(&q.username);
    Ok(StatusCode::NO_CONTENT)
}

async fn rename_user(
    State(state): State<AppState>,
    Query(q): Query<UserQuery>,
    Json(input): Json<UserRename>,
) -> ApiResult<Json<User>> {
    let mut db = state.db.write().await;
    if !db.users.contains_key(&q.username) {
        return Err(Rejection::user_not_found(&q.username));
    }
    if input.new_name.is_empty() || db.users.contains_key(&input.new_name) {
        return Err(Rejection::new(
            StatusCode::BAD_REQUEST,
            "INVALID_USER",
            format!("Cannot rename <{}> to <{}>", q.username, input.new_name),
        ));
    }
    let mut user = db
        .users
        .remove(&q.username)
        .ok_or_else(|| Rejection::user_not_found(&q.username))?;
    user.name = input.new_name.clone();
    db.users.insert(input.new_name.clone(), user.clone());
    if let Some(password) = db.passwords.remove(&q.username) {
        db.passwords.insert(input.new_name.clone(), password);
    }
    if let Some(attributes) = db.attributes.remove(&q.username) {
        db.attributes.insert(input.new_name.clone(), attributes);
    }
    if let Some(groups) = db.memberships.remove(&q.username) {
        db.memberships.insert(input.new_name, groups);
    }
    Ok(Json(user))
}

async fn set_user_password(
    State(state): State<AppState>,
    Query(q): Query<UserQuery>,
    Json(password): Json<PasswordValue>,
) -> ApiResult<StatusCode> {
    let mut db = state.db.write().await;
    if !db.users.contains_key(&q.username) {
        return Err(Rejection::user_not_found(&q.username));
    }
    if password.value.is_empty() {
        return Err(Rejection::new(
            StatusCode::BAD_REQUEST,
            "INVALID_CREDENTIAL",
            "Password can't be empty",
        ));
    }
    db.passwords.insert(q.username, password.value);
    Ok(StatusCode::NO_CONTENT)
}

// --- attributes ---

async fn get_user_attributes(
    State(state): State<AppState>,
    Query(q): Query<UserQuery>,
) -> ApiResult<Json<Attributes>> {
    let db = state.db.read().await;
    if !db.users.contains_key(&q.username) {
        return Err(Rejection::user_not_found(&q.username));
    }
    let attributes = db
        .attributes
        .get(&q.username)
        .map(|stored| {
            stored
                .iter()
                .map(|(name, values)| Attribute {
                    name: name.clone(),
                    values: values.clone(),
                })
                .collect()
        })
        .unwrap_or_default();
    Ok(Json(Attributes { attributes }))
}

async fn store_user_attributes(
    State(state): State<AppState>,
    Query(q): Query<UserQuery>,
    Json(input): Json<Attributes>,
) -> ApiResult<StatusCode> {
    let mut db = state.db.write().await;
    if !db.users.contains_key(&q.username) {
        return Err(Rejection::user_not_found(&q.username));
    }
    let stored = db.attributes.entry(q.username).or_default();
    for attribute in input.attributes {
        stored.insert(attribute.name, attribute.values);
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn remove_user_attribute(
    State(state): State<AppState>,
    Query(q): Query<UserAttributeQuery>,
) -> ApiResult<StatusCode> {
    let mut db = state.db.write().await;
    if !db.users.contains_key(&q.username) {
        return Err(Rejection::user_not_found(&q.username));
    }
    if let Some(stored) = db.attributes.get_mut(&q.username) {
        stored.remove(&q.attributename);
    }
    Ok(StatusCode::NO_CONTENT)
}

// --- direct membership ---

async fn get_user_groups(
    State(state): State<AppState>,
    Query(q): Query<UserQuery>,
) -> ApiResult<Json<Groups>> {
    let db = state.db.read().await;
    if !db.users.contains_key(&q.username) {
        return Err(Rejection::user_not_found(&q.username));
    }
    let groups = db
        .memberships
        .get(&q.username)
        .map(|names| {
            names
                .iter()
                .map(|name| GroupName { name: name.clone() })
                .collect()
        })
        .unwrap_or_default();
    Ok(Json(Groups { groups }))
}

async fn add_user_to_group(
    State(state): State<AppState>,
    Query(q): Query<UserQuery>,
    Json(group): Json<GroupName>,
) -> ApiResult<StatusCode> {
    let mut db = state.db.write().await;
    if !db.users.contains_key(&q.username) {
        return Err(Rejection::user_not_found(&q.username));
    }
    if !db.groups.contains_key(&group.name) {
        return Err(Rejection::group_not_found(StatusCode::BAD_REQUEST, &group.name));
    }
    let inserted = db
        .memberships
        .entry(q.username.clone())
        .or_default()
        .insert(group.name.clone());
    if !inserted {
        return Err(Rejection::new(
            StatusCode::CONFLICT,
            "MEMBERSHIP_ALREADY_EXISTS",
            format!("User <{}> is already a direct member of <{}>", q.username, group.name),
        ));
    }
    Ok(StatusCode::CREATED)
}

/// A missing user, group or membership all answer 404. Clients that map
/// 404 on this route to "user not found" report a non-member the same way.
async fn remove_user_from_group(
    State(state): State<AppState>,
    Query(q): Query<UserGroupQuery>,
) -> ApiResult<StatusCode> {
    let mut db = state.db.write().await;
    if !db.users.contains_key(&q.username) {
        return Err(Rejection::user_not_found(&q.username));
    }
    let removed = db
        .memberships
        .get_mut(&q.username)
        .is_some_and(|groups| groups.remove(&q.groupname));
    if !removed {
        return Err(Rejection::new(
            StatusCode::NOT_FOUND,
            "MEMBERSHIP_NOT_FOUND",
            format!("User <{}> is not a direct member of <{}>", q.username, q.groupname),
        ));
    }
    Ok(StatusCode::NO_CONTENT)
}

// --- groups ---

async fn get_group(State(state): State<AppState>, Query(q): Query<GroupQuery>) -> ApiResult<Json<Group>> {
    let db = state.db.read().await;
    db.groups
        .get(&q.groupname)
        .cloned()
        .map(Json)
        .ok_or_else(|| Rejection::group_not_found(StatusCode::NOT_FOUND, &q.groupname))
}

async fn create_group(
    State(state): State<AppState>,
    Json(group): Json<Group>,
) -> ApiResult<(StatusCode, Json<Group>)> {
    let mut db = state.db.write().await;
    if group.name.is_empty() || db.groups.contains_key(&group.name) {
        return Err(Rejection::new(
            StatusCode::BAD_REQUEST,
            "INVALID_GROUP",
            format!("Group <{}> already exists", group.name),
        ));
    }
    db.groups.insert(group.name.clone(), group.clone());
    Ok((StatusCode::CREATED, Json(group)))
}

async fn remove_group(State(state): State<AppState>, Query(q): Query<GroupQuery>) -> ApiResult<StatusCode> {
    let mut db = state.db.write().await;
    db.groups
        .remove(&q.groupname)
        .ok_or_else(|| Rejection::group_not_found(StatusCode::NOT_FOUND, &q.groupname))?;
    db.children.remove(&q.groupname);
    for children in db.children.values_mut() {
        children.remove(&q.groupname);
    }
    for groups in db.memberships.values_mut() {
        groups.remove(&q.groupname);
    }
    Ok(StatusCode::NO_CONTENT)
}

/// `groupname` is the parent; the body names the child.
async fn add_child_group(
    State(state): State<AppState>,
    Query(q): Query<GroupQuery>,
    Json(child): Json<GroupName>,
) -> ApiResult<(StatusCode, Json<GroupName>)> {
    let mut db = state.db.write().await;
    if !db.groups.contains_key(&q.groupname) {
        return Err(Rejection::group_not_found(StatusCode::NOT_FOUND, &q.groupname));
    }
    if !db.groups.contains_key(&child.name) {
        return Err(Rejection::group_not_found(StatusCode::BAD_REQUEST, &child.name));
    }
    db.link_groups(&q.groupname, &child.name)?;
    Ok((StatusCode::CREATED, Json(child)))
}

/// `groupname` is the child; the body names the parent.
async fn add_parent_group(
    State(state): State<AppState>,
    Query(q): Query<GroupQuery>,
    Json(parent): Json<GroupName>,
) -> ApiResult<(StatusCode, Json<GroupName>)> {
    let mut db = state.db.write().await;
    if !db.groups.contains_key(&q.groupname) {
        return Err(Rejection::group_not_found(StatusCode::NOT_FOUND, &q.groupname));
    }
    if !db.groups.contains_key(&parent.name) {
        return Err(Rejection::group_not_found(StatusCode::BAD_REQUEST, &parent.name));
    }
    db.link_groups(&parent.name, &q.groupname)?;
    Ok((StatusCode::CREATED, Json(parent)))
}
