//! HTTP exchange types passed between the request builder, the transport and
//! the response classifier.
//!
//! # Design
//! Requests and responses are plain owned data. A request is built fresh for
//! every call, handed to a `Transport` by value, and dropped when the call
//! returns; a response is read once by the classifier and then dropped. No
//! value outlives the call that created it.

use std::fmt;

/// HTTP method for a request. The remote API only uses these four.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for ::http::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => ::http::Method::GET,
            HttpMethod::Post => ::http::Method::POST,
            HttpMethod::Put => ::http::Method::PUT,
            HttpMethod::Delete => ::http::Method::DELETE,
        }
    }
}

/// A fully-formed outbound request.
///
/// Built by `RequestBuilder`. `url` already contains any query string, and
/// `headers` are sent in order.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Look up a header by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// The raw outcome of a completed exchange: status code and full body.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn empty(status: u16) -> Self {
        Self::new(status, Vec::new())
    }
}
