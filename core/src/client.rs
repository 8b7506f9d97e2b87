//! Request building and response parsing for every usermanagement operation.
//!
//! # Design
//! `CrowdClient` holds only the `ClientContext` and carries no mutable state
//! between calls. Each operation is split into a `build_*` method that
//! produces an `HttpRequest` and a `parse_*` method that consumes an
//! `HttpResponse` with that operation's status table. `Crowd` runs the
//! round-trip in between; everything here is deterministic.

use std::borrow::Cow;

use crate::context::ClientContext;
use crate::error::CrowdError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::request::RequestBuilder;
use crate::response::{expect_empty, expect_json};
use crate::tables;
use crate::types::{Attributes, Group, GroupName, Groups, PasswordValue, User, UserRename};

/// Path prefix of every usermanagement resource.
pub const RESOURCE_ROOT: &str = "/rest/usermanagement/1";

/// Stateless request builder and response parser for the remote API.
#[derive(Debug, Clone)]
pub struct CrowdClient {
    context: ClientContext,
}

impl CrowdClient {
    pub fn new(context: ClientContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &ClientContext {
        &self.context
    }

    fn requests(&self) -> RequestBuilder<'_> {
        RequestBuilder::new(&self.context)
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    pub fn build_get_user(&self, username: &str) -> HttpRequest {
        self.requests().build(HttpMethod::Get, &user_path("", username))
    }

    pub fn parse_get_user(&self, response: HttpResponse) -> Result<User, CrowdError> {
        expect_json(response, tables::GET_USER)
    }

    pub fn build_add_user(&self, user: &User) -> Result<HttpRequest, CrowdError> {
        self.requests()
            .build_json(HttpMethod::Post, &format!("{RESOURCE_ROOT}/user"), user)
    }

    pub fn parse_add_user(&self, response: HttpResponse) -> Result<(), CrowdError> {
        expect_empty(response, tables::ADD_USER)
    }

    pub fn build_remove_user(&self, username: &str) -> HttpRequest {
        self.requests()
            .build(HttpMethod::Delete, &user_path("", username))
    }

    pub fn parse_remove_user(&self, response: HttpResponse) -> Result<(), CrowdError> {
        expect_empty(response, tables::REMOVE_USER)
    }

    /// Full replacement of `username` with `user`. See `UserUpdate::merge_into`.
    pub fn build_update_user(&self, username: &str, user: &User) -> Result<HttpRequest, CrowdError> {
        self.requests()
            .build_json(HttpMethod::Put, &user_path("", username), user)
    }

    pub fn parse_update_user(&self, response: HttpResponse) -> Result<(), CrowdError> {
        expect_empty(response, tables::UPDATE_USER)
    }

    pub fn build_rename_user(&self, username: &str, new_name: &str) -> Result<HttpRequest, CrowdError> {
        let body = UserRename {
            new_name: new_name.to_string(),
        };
        self.requests()
            .build_json(HttpMethod::Post, &user_path("/rename", username), &body)
    }

    pub fn parse_rename_user(&self, response: HttpResponse) -> Result<User, CrowdError> {
        expect_json(response, tables::RENAME_USER)
    }

    pub fn build_set_user_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<HttpRequest, CrowdError> {
        let body = PasswordValue {
            value: password.to_string(),
        };
        self.requests()
            .build_json(HttpMethod::Put, &user_path("/password", username), &body)
    }

    pub fn parse_set_user_password(&self, response: HttpResponse) -> Result<(), CrowdError> {
        expect_empty(response, tables::SET_USER_PASSWORD)
    }

    pub fn build_get_user_attributes(&self, username: &str) -> HttpRequest {
        self.requests()
            .build(HttpMethod::Get, &user_path("/attribute", username))
    }

    pub fn parse_get_user_attributes(&self, response: HttpResponse) -> Result<Attributes, CrowdError> {
        expect_json(response, tables::GET_USER_ATTRIBUTES)
    }

    pub fn build_store_user_attributes(
        &self,
        username: &str,
        attributes: &Attributes,
    ) -> Result<HttpRequest, CrowdError> {
        self.requests()
            .build_json(HttpMethod::Post, &user_path("/attribute", username), attributes)
    }

    pub fn parse_store_user_attributes(&self, response: HttpResponse) -> Result<(), CrowdError> {
        expect_empty(response, tables::STORE_USER_ATTRIBUTES)
    }

    pub fn build_remove_user_attribute(&self, username: &str, attribute: &str) -> HttpRequest {
        let path = format!(
            "{}&attributename={}",
            user_path("/attribute", username),
            escape(attribute)
        );
        self.requests().build(HttpMethod::Delete, &path)
    }

    pub fn parse_remove_user_attribute(&self, response: HttpResponse) -> Result<(), CrowdError> {
        expect_empty(response, tables::REMOVE_USER_ATTRIBUTE)
    }

    // -----------------------------------------------------------------------
    // Direct user membership
    // -----------------------------------------------------------------------

    pub fn build_get_user_groups(&self, username: &str) -> HttpRequest {
        self.requests()
            .build(HttpMethod::Get, &user_path("/group/direct", username))
    }

    pub fn parse_get_user_groups(&self, response: HttpResponse) -> Result<Groups, CrowdError> {
        expect_json(response, tables::GET_USER_GROUPS)
    }

    pub fn build_add_user_to_group(
        &self,
        username: &str,
        group: &str,
    ) -> Result<HttpRequest, CrowdError> {
        let body = GroupName {
            name: group.to_string(),
        };
        self.requests()
            .build_json(HttpMethod::Post, &user_path("/group/direct", username), &body)
    }

    pub fn parse_add_user_to_group(&self, response: HttpResponse) -> Result<(), CrowdError> {
        expect_empty(response, tables::ADD_USER_TO_GROUP)
    }

    pub fn build_remove_user_from_group(&self, username: &str, group: &str) -> HttpRequest {
        let path = format!(
            "{}&groupname={}",
            user_path("/group/direct", username),
            escape(group)
        );
        self.requests().build(HttpMethod::Delete, &path)
    }

    pub fn parse_remove_user_from_group(&self, response: HttpResponse) -> Result<(), CrowdError> {
        expect_empty(response, tables::REMOVE_USER_FROM_GROUP)
    }

    // -----------------------------------------------------------------------
    // Groups
    // -----------------------------------------------------------------------

    pub fn build_get_group(&self, name: &str) -> HttpRequest {
        self.requests().build(HttpMethod::Get, &group_path("", name))
    }

    pub fn parse_get_group(&self, response: HttpResponse) -> Result<Group, CrowdError> {
        expect_json(response, tables::GET_GROUP)
    }

    pub fn build_create_group(&self, group: &Group) -> Result<HttpRequest, CrowdError> {
        self.requests()
            .build_json(HttpMethod::Post, &format!("{RESOURCE_ROOT}/group"), group)
    }

    pub fn parse_create_group(&self, response: HttpResponse) -> Result<(), CrowdError> {
        expect_empty(response, tables::CREATE_GROUP)
    }

    pub fn build_remove_group(&self, name: &str) -> HttpRequest {
        self.requests().build(HttpMethod::Delete, &group_path("", name))
    }

    pub fn parse_remove_group(&self, response: HttpResponse) -> Result<(), CrowdError> {
        expect_empty(response, tables::REMOVE_GROUP)
    }

    /// Make `child` a direct member of `parent`.
    pub fn build_add_child_group_membership(
        &self,
        parent: &str,
        child: &str,
    ) -> Result<HttpRequest, CrowdError> {
        let body = GroupName {
            name: child.to_string(),
        };
        self.requests().build_json(
            HttpMethod::Post,
            &group_path("/child-group/direct", parent),
            &body,
        )
    }

    /// Same membership as `build_add_child_group_membership`, addressed from the child.
    pub fn build_add_parent_group_membership(
        &self,
        parent: &str,
        child: &str,
    ) -> Result<HttpRequest, CrowdError> {
        let body = GroupName {
            name: parent.to_string(),
        };
        self.requests().build_json(
            HttpMethod::Post,
            &group_path("/parent-group/direct", child),
            &body,
        )
    }

    pub fn parse_add_group_membership(&self, response: HttpResponse) -> Result<(), CrowdError> {
        expect_empty(response, tables::ADD_GROUP_MEMBERSHIP)
    }
}

/// Percent-escape a query value.
fn escape(value: &str) -> Cow<'_, str> {
    urlencoding::encode(value)
}

fn user_path(suffix: &str, username: &str) -> String {
    format!("{RESOURCE_ROOT}/user{suffix}?username={}", escape(username))
}

fn group_path(suffix: &str, groupname: &str) -> String {
    format!("{RESOURCE_ROOT}/group{suffix}?groupname={}", escape(groupname))
}
