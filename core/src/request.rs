//! Turns a verb, a path and an optional payload into an `HttpRequest`.

use serde::Serialize;

use crate::context::ClientContext;
use crate::error::CrowdError;
use crate::http::{HttpMethod, HttpRequest};

const JSON: &str = "application/json";

/// Builds authenticated JSON requests against one `ClientContext`.
///
/// Performs no I/O. The path is appended verbatim to the base URL, so query
/// values must already be percent-escaped.
#[derive(Debug, Clone, Copy)]
pub struct RequestBuilder<'a> {
    context: &'a ClientContext,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(context: &'a ClientContext) -> Self {
        Self { context }
    }

    /// Build a request without a body.
    pub fn build(&self, method: HttpMethod, path: &str) -> HttpRequest {
        HttpRequest {
            method,
            url: format!("{}{path}", self.context.base_url()),
            headers: self.base_headers(),
            body: None,
        }
    }

    /// Build a request carrying `body` encoded as JSON.
    ///
    /// An unencodable payload fails here, before anything is sent.
    pub fn build_json<B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: &str,
        body: &B,
    ) -> Result<HttpRequest, CrowdError> {
        let bytes = serde_json::to_vec(body).map_err(CrowdError::Serialization)?;
        let mut request = self.build(method, path);
        request
            .headers
            .push(("Content-Type".to_string(), JSON.to_string()));
        request.body = Some(bytes);
        Ok(request)
    }

    fn base_headers(&self) -> Vec<(String, String)> {
        vec![
            (
                "Authorization".to_string(),
                format!("Basic {}", self.context.auth_token()),
            ),
            ("User-Agent".to_string(), self.context.user_agent().to_string()),
            ("Accept".to_string(), JSON.to_string()),
        ]
    }
}
