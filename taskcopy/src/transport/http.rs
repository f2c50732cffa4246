//! HTTPS transport backed by `reqwest`.

use std::time::Duration;

use url::Url;

use super::{ConduitRequest, ConduitResponse, FORM_CONTENT_TYPE, Transport, TransportError};

/// User-Agent sent with every request.
const USER_AGENT: &str = concat!("taskcopy/", env!("CARGO_PKG_VERSION"));

/// Transport that POSTs form bodies to `{base}/api/{method}`.
pub struct HttpTransport {
    client: reqwest::Client,
    base: Url,
}

impl HttpTransport {
    /// Creates a transport for the given install URL.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidUrl`] if `base_url` does not parse,
    /// or [`TransportError::Client`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let base = Url::parse(base_url).map_err(|e| TransportError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(Self { client, base })
    }

    /// Endpoint URL for a method. The `/api/` path replaces any path on
    /// the base URL.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidUrl`] if the joined URL is invalid.
    pub fn endpoint(&self, method: &str) -> Result<Url, TransportError> {
        self.base
            .join(&format!("/api/{method}"))
            .map_err(|e| TransportError::InvalidUrl {
                url: format!("{}api/{method}", self.base),
                reason: e.to_string(),
            })
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: ConduitRequest) -> Result<ConduitResponse, TransportError> {
        let ConduitRequest { method, body } = request;
        let url = self.endpoint(&method)?;

        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|e| TransportError::Request {
                method: method.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Request {
                method: method.clone(),
                reason: e.to_string(),
            })?;

        classify(method, status, body)
    }
}

/// Accepts a success status, or an error status whose body is still a
/// Conduit error envelope so its code and info reach the caller.
fn classify(method: String, status: u16, body: String) -> Result<ConduitResponse, TransportError> {
    if (200..300).contains(&status) || carries_error_envelope(&body) {
        return Ok(ConduitResponse { status, body });
    }
    tracing::debug!(%method, status, "non-success HTTP status");
    Err(TransportError::Status { method, status })
}

fn carries_error_envelope(body: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(body)
        .is_ok_and(|value| value.get("error_code").is_some_and(serde_json::Value::is_string))
}
