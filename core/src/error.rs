//! Error types for the Crowd REST client.
//!
//! # Design
//! `CrowdError` separates the five ways a call can fail: the client was
//! misconfigured, a body could not be (de)serialized locally, the exchange
//! never completed, the remote rejected the call with a status the operation
//! knows about, or the remote answered with a status nobody mapped.
//!
//! Status codes mean different things on different endpoints (400 is "group
//! not found" for one call and "invalid user" for another), so `DomainError`
//! values are only ever produced through an operation's own status table.

use thiserror::Error;

/// A named condition reported by the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomainError {
    /// The application has no permission to use the service.
    NoPermission,
    UserNotFound,
    GroupNotFound,
    /// The user is already a direct member of the group.
    UserAlreadyInGroup,
    /// The user payload was rejected, or the user already exists.
    InvalidUser,
    /// The update payload was rejected or its name did not match the target.
    InvalidUserUpdate,
    InvalidPassword,
    GroupAlreadyExists,
    /// One of the groups does not exist, or the membership would be circular.
    InvalidGroupMembership,
}

impl DomainError {
    /// Stable identifier, used in test vectors and log fields.
    pub fn name(self) -> &'static str {
        match self {
            DomainError::NoPermission => "NoPermission",
            DomainError::UserNotFound => "UserNotFound",
            DomainError::GroupNotFound => "GroupNotFound",
            DomainError::UserAlreadyInGroup => "UserAlreadyInGroup",
            DomainError::InvalidUser => "InvalidUser",
            DomainError::InvalidUserUpdate => "InvalidUserUpdate",
            DomainError::InvalidPassword => "InvalidPassword",
            DomainError::GroupAlreadyExists => "GroupAlreadyExists",
            DomainError::InvalidGroupMembership => "InvalidGroupMembership",
        }
    }
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            DomainError::NoPermission => "application does not have permission to use Crowd",
            DomainError::UserNotFound => "user could not be found",
            DomainError::GroupNotFound => "group could not be found",
            DomainError::UserAlreadyInGroup => "user is already a direct member of the group",
            DomainError::InvalidUser => "invalid user data or user already exists",
            DomainError::InvalidUserUpdate => "invalid user data or user name mismatch",
            DomainError::InvalidPassword => "password was rejected",
            DomainError::GroupAlreadyExists => "group already exists",
            DomainError::InvalidGroupMembership => {
                "group could not be found or membership would be circular"
            }
        };
        f.write_str(text)
    }
}

/// Failure to complete an HTTP exchange at all.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The phase that ran out of time.
    #[error("request timed out: {0}")]
    Timeout(ureq::Timeout),

    /// Connection refused, reset, or the host could not be resolved.
    #[error("connection failed: {0}")]
    Connection(#[source] std::io::Error),

    /// TLS, protocol or request construction failure.
    #[error("transport failure: {0}")]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

/// Errors returned by every `Crowd` operation.
#[derive(Debug, Error)]
pub enum CrowdError {
    #[error("URL can't be empty")]
    EmptyUrl,

    #[error("application can't be empty")]
    EmptyApplication,

    #[error("password can't be empty")]
    EmptyPassword,

    /// The request payload could not be encoded; nothing was sent.
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// A success response carried a body that does not match the expected shape.
    #[error("deserialization failed: {0}")]
    Deserialization(#[source] serde_json::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The remote rejected the call with a status the operation maps.
    ///
    /// `message` is the remote's own explanation when its error envelope
    /// could be decoded. It never affects which `error` is chosen.
    #[error("{error}")]
    Domain {
        error: DomainError,
        message: Option<String>,
    },

    #[error("unknown response: {0}")]
    UnknownResponse(u16),
}

impl CrowdError {
    /// The named remote condition, if this is a domain error.
    pub fn domain(&self) -> Option<DomainError> {
        match self {
            CrowdError::Domain { error, .. } => Some(*error),
            _ => None,
        }
    }

    /// True for the three construction-time errors.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            CrowdError::EmptyUrl | CrowdError::EmptyApplication | CrowdError::EmptyPassword
        )
    }
}
