//! Scripted transport for testing.
//!
//! Answers every request by calling a handler closure, so tests can stand
//! in for a Conduit install without a network. Every request is recorded,
//! and an optional simulated latency lets tests observe how many calls
//! are outstanding at once.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use super::{ConduitRequest, ConduitResponse, Transport, TransportError};

type Handler = dyn Fn(&ConduitRequest) -> Result<ConduitResponse, TransportError> + Send + Sync;

/// In-process transport driven by a handler closure.
///
/// # Example
///
/// ```rust,no_run
/// use taskcopy::transport::scripted::{self, ScriptedTransport};
///
/// let transport = ScriptedTransport::new(|request| match request.method.as_str() {
///     "maniphest.search" => scripted::result(&serde_json::json!({ "data": [] })),
///     _ => scripted::api_error("ERR-CONDUIT-CORE", "unexpected method"),
/// });
/// ```
pub struct ScriptedTransport {
    handler: Box<Handler>,
    latency: Duration,
    requests: Mutex<Vec<ConduitRequest>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl ScriptedTransport {
    /// Creates a transport that answers with `handler`.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&ConduitRequest) -> Result<ConduitResponse, TransportError> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            latency: Duration::ZERO,
            requests: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    /// Delays every response by `latency` (tokio time, so pausable).
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// All requests received so far, in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<ConduitRequest> {
        self.requests.lock().clone()
    }

    /// Requests received for one method, in arrival order.
    #[must_use]
    pub fn requests_to(&self, method: &str) -> Vec<ConduitRequest> {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.method == method)
            .cloned()
            .collect()
    }

    /// Number of requests received for one method.
    #[must_use]
    pub fn calls_to(&self, method: &str) -> usize {
        self.requests.lock().iter().filter(|r| r.method == method).count()
    }

    /// Highest number of requests that were outstanding at the same time.
    #[must_use]
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

impl Transport for ScriptedTransport {
    async fn send(&self, request: ConduitRequest) -> Result<ConduitResponse, TransportError> {
        self.requests.lock().push(request.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let response = (self.handler)(&request);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        response
    }
}

/// A successful envelope wrapping `value`.
///
/// # Errors
///
/// Never fails; the `Result` matches the handler signature.
pub fn result(value: &serde_json::Value) -> Result<ConduitResponse, TransportError> {
    let envelope = serde_json::json!({
        "result": value,
        "error_code": null,
        "error_info": null,
    });
    Ok(ConduitResponse::ok(envelope.to_string()))
}

/// A failed envelope with the given code and info.
///
/// # Errors
///
/// Never fails; the `Result` matches the handler signature.
pub fn api_error(code: &str, info: &str) -> Result<ConduitResponse, TransportError> {
    let envelope = serde_json::json!({
        "result": null,
        "error_code": code,
        "error_info": info,
    });
    Ok(ConduitResponse::ok(envelope.to_string()))
}
