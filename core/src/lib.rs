//! Blocking client for the Crowd usermanagement REST API.
//!
//! # Overview
//! `Crowd` authenticates with an application name and password, sends JSON
//! requests, and turns every response into either a value or one specific
//! `CrowdError`. Each call is a single synchronous exchange; nothing retries.
//!
//! # Design
//! - `ClientContext` holds the base URL, the precomputed Basic credential and
//!   the user agent. It is validated once and never changes.
//! - `CrowdClient` splits every operation into `build_*` (produces an
//!   `HttpRequest`) and `parse_*` (classifies an `HttpResponse`), so request
//!   construction and status mapping are testable without a network.
//! - A `Transport` performs the exchange. `UreqTransport` pools connections
//!   and bounds every call with read/write timeouts.
//! - Status codes are mapped by per-operation tables in `tables`, because the
//!   remote gives the same code different meanings on different endpoints.
//!
//! ```no_run
//! use crowd_core::{Crowd, DomainError};
//!
//! let crowd = Crowd::new("https://crowd.example.com/crowd", "app", "secret")?;
//! match crowd.add_user_to_group("bob", "eng") {
//!     Ok(()) => {}
//!     Err(e) if e.domain() == Some(DomainError::UserAlreadyInGroup) => {}
//!     Err(e) => return Err(e),
//! }
//! # Ok::<(), crowd_core::CrowdError>(())
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod request;
pub mod response;
pub mod tables;
pub mod transport;
pub mod types;

pub use api::Crowd;
pub use client::{CrowdClient, RESOURCE_ROOT};
pub use config::ClientConfig;
pub use context::ClientContext;
pub use error::{CrowdError, DomainError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use response::{StatusOutcome, StatusTable};
pub use transport::{Transport, UreqTransport};
pub use types::{
    Attribute, Attributes, ErrorMessage, Group, GroupName, Groups, PasswordValue, User,
    UserRename, UserUpdate,
};
