//! Transport layer abstraction for Conduit calls.
//!
//! Defines the [`Transport`] trait the [`ConduitClient`](crate::conduit::ConduitClient)
//! sends through. Concrete implementations:
//! - [`http::HttpTransport`]: HTTPS POSTs via `reqwest`
//! - [`scripted::ScriptedTransport`]: in-process, handler-driven transport for testing

pub mod http;
pub mod scripted;

use taskcopy_proto::form;

/// Content type of every Conduit request body.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// A single Conduit request: the method name and its encoded form body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConduitRequest {
    /// Conduit method, e.g. `maniphest.search`.
    pub method: String,
    /// Form-encoded body, credential included.
    pub body: String,
}

impl ConduitRequest {
    /// Creates a request.
    pub fn new(method: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            body: body.into(),
        }
    }

    /// Decoded body parameters, in body order.
    #[must_use]
    pub fn params(&self) -> Vec<(String, String)> {
        form::decode(&self.body)
    }

    /// First value of the named body parameter.
    #[must_use]
    pub fn param(&self, key: &str) -> Option<String> {
        self.params()
            .into_iter()
            .find_map(|(k, v)| (k == key).then_some(v))
    }
}

/// A raw response: HTTP status and body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConduitResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body (a JSON envelope).
    pub body: String,
}

impl ConduitResponse {
    /// A `200 OK` response with the given body.
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }
}

/// Errors that prevent a request from completing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The configured base URL could not be used.
    #[error("invalid API URL {url}: {reason}")]
    InvalidUrl {
        /// The offending URL.
        url: String,
        /// Parser message.
        reason: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    /// The request was not answered (connect failure, timeout, reset).
    #[error("request to {method} failed: {reason}")]
    Request {
        /// Conduit method being called.
        method: String,
        /// Underlying error message.
        reason: String,
    },

    /// The server answered with a non-success HTTP status and no error
    /// envelope.
    #[error("{method} returned HTTP {status}")]
    Status {
        /// Conduit method being called.
        method: String,
        /// HTTP status code.
        status: u16,
    },
}

/// Async transport for Conduit requests.
///
/// Implementations deliver the body as-is and return the raw response;
/// envelope parsing happens in the client. No retries at this layer.
pub trait Transport: Send + Sync {
    /// Send one request and wait for its response.
    fn send(
        &self,
        request: ConduitRequest,
    ) -> impl std::future::Future<Output = Result<ConduitResponse, TransportError>> + Send;
}
