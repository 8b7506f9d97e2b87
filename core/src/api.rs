//! Blocking façade that runs each operation end to end.

use crate::client::CrowdClient;
use crate::config::ClientConfig;
use crate::context::ClientContext;
use crate::error::CrowdError;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::{Transport, UreqTransport};
use crate::types::{Attributes, Group, Groups, User, UserUpdate};

/// Handle to one remote application.
///
/// Every method performs a single request/response exchange (two for
/// `update_user`) and returns once it completes or fails. No method retries.
/// A `Crowd` is immutable after construction and can be shared across
/// threads; concurrent calls reuse the transport's connection pool.
#[derive(Debug)]
pub struct Crowd<T: Transport = UreqTransport> {
    client: CrowdClient,
    transport: T,
}

impl Crowd<UreqTransport> {
    /// Connect with the default `ClientConfig`.
    pub fn new(url: &str, application: &str, password: &str) -> Result<Self, CrowdError> {
        Self::with_config(url, application, password, ClientConfig::default())
    }

    pub fn with_config(
        url: &str,
        application: &str,
        password: &str,
        config: ClientConfig,
    ) -> Result<Self, CrowdError> {
        let context = ClientContext::new(url, application, password, config.user_agent.clone())?;
        Ok(Self::with_transport(context, UreqTransport::new(&config)))
    }
}

impl<T: Transport> Crowd<T> {
    pub fn with_transport(context: ClientContext, transport: T) -> Self {
        Self {
            client: CrowdClient::new(context),
            transport,
        }
    }

    pub fn client(&self) -> &CrowdClient {
        &self.client
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn exchange(&self, request: HttpRequest) -> Result<HttpResponse, CrowdError> {
        let method = request.method;
        let url = request.url.clone();
        match self.transport.execute(request) {
            Ok(response) => {
                tracing::debug!(%method, %url, status = response.status, "crowd exchange");
                Ok(response)
            }
            Err(e) => {
                tracing::debug!(%method, %url, error = %e, "crowd transport failure");
                Err(e.into())
            }
        }
    }

    // Users

    pub fn get_user(&self, username: &str) -> Result<User, CrowdError> {
        let response = self.exchange(self.client.build_get_user(username))?;
        self.client.parse_get_user(response)
    }

    /// Create `user`. Set `user.password` to give the account a credential.
    pub fn add_user(&self, user: &User) -> Result<(), CrowdError> {
        let response = self.exchange(self.client.build_add_user(user)?)?;
        self.client.parse_add_user(response)
    }

    pub fn remove_user(&self, username: &str) -> Result<(), CrowdError> {
        let response = self.exchange(self.client.build_remove_user(username))?;
        self.client.parse_remove_user(response)
    }

    /// Partially update a user.
    ///
    /// The remote only accepts full replacements, so the current record is
    /// fetched first, the non-empty fields of `update` are overlaid, and the
    /// merged record is written back. A failed fetch is returned as-is and
    /// nothing is written.
    pub fn update_user(&self, username: &str, update: &UserUpdate) -> Result<(), CrowdError> {
        let current = self.get_user(username)?;
        let merged = update.merge_into(current);
        let response = self.exchange(self.client.build_update_user(username, &merged)?)?;
        self.client.parse_update_user(response)
    }

    /// Rename a user, returning the renamed record.
    pub fn rename_user(&self, username: &str, new_name: &str) -> Result<User, CrowdError> {
        let response = self.exchange(self.client.build_rename_user(username, new_name)?)?;
        self.client.parse_rename_user(response)
    }

    pub fn set_user_password(&self, username: &str, password: &str) -> Result<(), CrowdError> {
        let response = self.exchange(self.client.build_set_user_password(username, password)?)?;
        self.client.parse_set_user_password(response)
    }

    pub fn get_user_attributes(&self, username: &str) -> Result<Attributes, CrowdError> {
        let response = self.exchange(self.client.build_get_user_attributes(username))?;
        self.client.parse_get_user_attributes(response)
    }

    pub fn store_user_attributes(
        &self,
        username: &str,
        attributes: &Attributes,
    ) -> Result<(), CrowdError> {
        let request = self.client.build_store_user_attributes(username, attributes)?;
        let response = self.exchange(request)?;
        self.client.parse_store_user_attributes(response)
    }

    pub fn remove_user_attribute(&self, username: &str, attribute: &str) -> Result<(), CrowdError> {
        let request = self.client.build_remove_user_attribute(username, attribute);
        let response = self.exchange(request)?;
        self.client.parse_remove_user_attribute(response)
    }

    // Direct membership

    pub fn get_user_groups(&self, username: &str) -> Result<Groups, CrowdError> {
        let response = self.exchange(self.client.build_get_user_groups(username))?;
        self.client.parse_get_user_groups(response)
    }

    pub fn add_user_to_group(&self, username: &str, group: &str) -> Result<(), CrowdError> {
        let response = self.exchange(self.client.build_add_user_to_group(username, group)?)?;
        self.client.parse_add_user_to_group(response)
    }

    pub fn remove_user_from_group(&self, username: &str, group: &str) -> Result<(), CrowdError> {
        let request = self.client.build_remove_user_from_group(username, group);
        let response = self.exchange(request)?;
        self.client.parse_remove_user_from_group(response)
    }

    // Groups

    pub fn get_group(&self, name: &str) -> Result<Group, CrowdError> {
        let response = self.exchange(self.client.build_get_group(name))?;
        self.client.parse_get_group(response)
    }

    pub fn create_group(&self, name: &str, description: &str, active: bool) -> Result<(), CrowdError> {
        let group = Group::new(name, description, active);
        let response = self.exchange(self.client.build_create_group(&group)?)?;
        self.client.parse_create_group(response)
    }

    pub fn remove_group(&self, name: &str) -> Result<(), CrowdError> {
        let response = self.exchange(self.client.build_remove_group(name))?;
        self.client.parse_remove_group(response)
    }

    pub fn add_child_group_membership(&self, parent: &str, child: &str) -> Result<(), CrowdError> {
        let request = self.client.build_add_child_group_membership(parent, child)?;
        let response = self.exchange(request)?;
        self.client.parse_add_group_membership(response)
    }

    pub fn add_parent_group_membership(&self, parent: &str, child: &str) -> Result<(), CrowdError> {
        let request = self.client.build_add_parent_group_membership(parent, child)?;
        let response = self.exchange(request)?;
        self.client.parse_add_group_membership(response)
    }
}
