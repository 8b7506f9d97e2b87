//! Blocking transport that performs the actual HTTP exchange.
//!
//! The classifier never sees a partial response: a `Transport` either returns
//! the full status and body, or a `TransportError`.

use crate::config::ClientConfig;
use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse};

/// Executes one request and waits for the complete response.
///
/// Implementations are shared by all concurrent calls and must not retry.
pub trait Transport: Send + Sync {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// A [`Transport`] backed by a pooled [`ureq::Agent`].
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(config: &ClientConfig) -> Self {
        let agent = ureq::Agent::config_builder()
            // Status codes are classified per operation, never by the agent.
            .http_status_as_error(false)
            // 3xx responses are classified, never followed.
            .max_redirects(0)
            .timeout_connect(Some(config.connect_timeout))
            .timeout_send_request(Some(config.write_timeout))
            .timeout_send_body(Some(config.write_timeout))
            .timeout_recv_response(Some(config.read_timeout))
            .timeout_recv_body(Some(config.read_timeout))
            .max_idle_age(config.max_idle_age)
            .max_idle_connections_per_host(config.max_idle_connections_per_host)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(&ClientConfig::default())
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = ::http::Request::builder()
            .method(::http::Method::from(request.method))
            .uri(&request.url);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let result = match request.body {
            Some(body) => {
                let req = builder
                    .body(body)
                    .map_err(|e| TransportError::Other(Box::new(e)))?;
                self.agent.run(req)
            }
            None => {
                let req = builder
                    .body(())
                    .map_err(|e| TransportError::Other(Box::new(e)))?;
                self.agent.run(req)
            }
        };

        read_response(result.map_err(map_error)?)
    }
}

fn read_response(response: ::http::Response<ureq::Body>) -> Result<HttpResponse, TransportError> {
    let (parts, mut body) = response.into_parts();
    let bytes = body.read_to_vec().map_err(map_error)?;

    Ok(HttpResponse {
        status: parts.status.as_u16(),
        body: bytes,
    })
}

/// Same mapping for failures before and after the status line arrives.
fn map_error(error: ureq::Error) -> TransportError {
    match error {
        ureq::Error::Timeout(phase) => TransportError::Timeout(phase),
        ureq::Error::HostNotFound => TransportError::Connection(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "host not found",
        )),
        ureq::Error::Io(e) => TransportError::Connection(e),
        e => TransportError::Other(Box::new(e)),
    }
}
