//! Per-operation status tables.
//!
//! The remote reuses status codes with different meanings across endpoints,
//! so every operation carries its own table. Success codes are not listed:
//! `200..=204` is always success.

use crate::error::DomainError::{self, *};
use crate::response::StatusTable;

pub const GET_USER: &StatusTable = &[(404, UserNotFound)];

pub const ADD_USER: &StatusTable = &[(400, InvalidUser), (403, NoPermission)];

pub const REMOVE_USER: &StatusTable = &[(403, NoPermission), (404, UserNotFound)];

pub const UPDATE_USER: &StatusTable = &[
    (400, InvalidUserUpdate),
    (403, NoPermission),
    (404, UserNotFound),
];

pub const RENAME_USER: &StatusTable = &[
    (400, InvalidUser),
    (403, NoPermission),
    (404, UserNotFound),
];

pub const SET_USER_PASSWORD: &StatusTable = &[
    (400, InvalidPassword),
    (403, NoPermission),
    (404, UserNotFound),
];

pub const GET_USER_ATTRIBUTES: &StatusTable = &[(403, NoPermission), (404, UserNotFound)];

pub const STORE_USER_ATTRIBUTES: &StatusTable = &[(403, NoPermission), (404, UserNotFound)];

pub const REMOVE_USER_ATTRIBUTE: &StatusTable = &[(403, NoPermission), (404, UserNotFound)];

pub const GET_USER_GROUPS: &StatusTable = &[(404, UserNotFound)];

pub const ADD_USER_TO_GROUP: &StatusTable = &[
    (400, GroupNotFound),
    (403, NoPermission),
    (404, UserNotFound),
    (409, UserAlreadyInGroup),
];

pub const REMOVE_USER_FROM_GROUP: &StatusTable = &[(403, NoPermission), (404, UserNotFound)];

pub const GET_GROUP: &StatusTable = &[(404, GroupNotFound)];

pub const CREATE_GROUP: &StatusTable = &[(400, GroupAlreadyExists), (403, NoPermission)];

pub const REMOVE_GROUP: &StatusTable = &[(404, GroupNotFound)];

pub const ADD_GROUP_MEMBERSHIP: &StatusTable =
    &[(400, InvalidGroupMembership), (404, GroupNotFound)];

/// Look up a table by operation name, as used in test vectors.
pub fn by_operation(operation: &str) -> Option<&'static StatusTable> {
    let table = match operation {
        "get_user" => GET_USER,
        "add_user" => ADD_USER,
        "remove_user" => REMOVE_USER,
        "update_user" => UPDATE_USER,
        "rename_user" => RENAME_USER,
        "set_user_password" => SET_USER_PASSWORD,
        "get_user_attributes" => GET_USER_ATTRIBUTES,
        "store_user_attributes" => STORE_USER_ATTRIBUTES,
        "remove_user_attribute" => REMOVE_USER_ATTRIBUTE,
        "get_user_groups" => GET_USER_GROUPS,
        "add_user_to_group" => ADD_USER_TO_GROUP,
        "remove_user_from_group" => REMOVE_USER_FROM_GROUP,
        "get_group" => GET_GROUP,
        "create_group" => CREATE_GROUP,
        "remove_group" => REMOVE_GROUP,
        "add_child_group_membership" | "add_parent_group_membership" => ADD_GROUP_MEMBERSHIP,
        _ => return None,
    };
    Some(table)
}

/// The error a table assigns to `status`, if any.
pub fn lookup(table: &StatusTable, status: u16) -> Option<DomainError> {
    table
        .iter()
        .find(|(code, _)| *code == status)
        .map(|&(_, error)| error)
}
