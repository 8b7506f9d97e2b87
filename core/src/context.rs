//! Credentials and endpoint for one remote application.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use crate::error::CrowdError;

/// Immutable per-application state shared by every call.
///
/// Holds the base URL (without trailing `/`), the precomputed Basic
/// credential and the user agent. Safe to share across threads.
#[derive(Clone)]
pub struct ClientContext {
    base_url: String,
    auth_token: String,
    user_agent: String,
}

impl ClientContext {
    /// Validate the inputs and precompute the Basic credential.
    ///
    /// Fails before any I/O with a distinct error for each empty field,
    /// checked in the order URL, application, password.
    pub fn new(
        base_url: &str,
        application: &str,
        password: &str,
        user_agent: impl Into<String>,
    ) -> Result<Self, CrowdError> {
        if base_url.is_empty() {
            return Err(CrowdError::EmptyUrl);
        }
        if application.is_empty() {
            return Err(CrowdError::EmptyApplication);
        }
        if password.is_empty() {
            return Err(CrowdError::EmptyPassword);
        }

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token: basic_auth_token(application, password),
            user_agent: user_agent.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The base64 `application:password` credential, without the `Basic ` prefix.
    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

// The token is a credential; keep it out of debug output.
impl std::fmt::Debug for ClientContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientContext")
            .field("base_url", &self.base_url)
            .field("auth_token", &"<redacted>")
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

pub(crate) fn basic_auth_token(application: &str, password: &str) -> String {
    BASE64.encode(format!("{application}:{password}"))
}
