//! Wire records for the usermanagement REST resources.
//!
//! # Design
//! Field names follow the remote's kebab-case JSON. String fields default to
//! empty so that sparse responses still decode; unknown fields such as
//! `expand` and `link` are ignored.

use serde::{Deserialize, Serialize};

/// The remote's error envelope, present on most 4xx bodies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordValue {
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    #[serde(default)]
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

/// A user as stored by the remote service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
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
    /// Only sent when creating a user; never returned by the remote.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<PasswordValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Attributes>,
}

/// Caller-supplied changes for `Crowd::update_user`.
///
/// Empty strings keep the current value; `active: None` keeps the current flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    pub first_name: String,
    pub last_name: String,
    pub display_name: String,
    pub email: String,
    pub active: Option<bool>,
}

impl UserUpdate {
    /// Overlay the non-empty fields onto `current`, producing the full
    /// replacement body.
    pub fn merge_into(&self, mut current: User) -> User {
        overlay(&mut current.first_name, &self.first_name);
        overlay(&mut current.last_name, &self.last_name);
        overlay(&mut current.display_name, &self.display_name);
        overlay(&mut current.email, &self.email);
        if let Some(active) = self.active {
            current.active = active;
        }
        current.password = None;
        current
    }
}

fn overlay(field: &mut String, value: &str) {
    if !value.is_empty() {
        *field = value.to_string();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UserRename {
    pub new_name: String,
}

/// Group type string the remote expects for ordinary groups.
pub const GROUP_TYPE: &str = "GROUP";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default = "default_group_type")]
    pub group_type: String,
    #[serde(default)]
    pub active: bool,
}

impl Group {
    pub fn new(name: impl Into<String>, description: impl Into<String>, active: bool) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            group_type: GROUP_TYPE.to_string(),
            active,
        }
    }
}

fn default_group_type() -> String {
    GROUP_TYPE.to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupName {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Groups {
    #[serde(default)]
    pub groups: Vec<GroupName>,
}
