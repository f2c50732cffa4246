//! Conduit API client.
//!
//! [`ConduitClient::call`] is the single entry point: it signs the
//! parameters with the API token, sends them as one form-encoded POST
//! through a [`Transport`], and unwraps the response envelope. Typed
//! helpers for each endpoint live next to the code that uses them
//! (`search`, `tasks`, `priority`, `replication`).
//!
//! No retries happen here; a failed call is returned to the caller.

use serde::de::DeserializeOwned;
use taskcopy_proto::envelope::{ApiError, Envelope};
use taskcopy_proto::form::Params;

use crate::transport::{ConduitRequest, Transport, TransportError};

/// `project.search`
pub const PROJECT_SEARCH: &str = "project.search";
/// `maniphest.search`
pub const MANIPHEST_SEARCH: &str = "maniphest.search";
/// `maniphest.priority.search`
pub const PRIORITY_SEARCH: &str = "maniphest.priority.search";
/// `maniphest.edit`
pub const MANIPHEST_EDIT: &str = "maniphest.edit";

/// Errors from a single Conduit call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConduitError {
    /// The request never got a usable HTTP response.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The envelope carried an error instead of a result.
    #[error("{method} failed: {source}")]
    Api {
        /// Conduit method that was called.
        method: String,
        /// Code and info from the envelope.
        source: ApiError,
    },

    /// The body was not a valid envelope for the expected result type.
    #[error("{method} returned an unreadable response: {reason}")]
    Decode {
        /// Conduit method that was called.
        method: String,
        /// Parser message.
        reason: String,
    },
}

/// Client for one Conduit install, bound to one API token.
pub struct ConduitClient<T> {
    transport: T,
    token: String,
}

impl<T: Transport> ConduitClient<T> {
    /// Creates a client. An empty token is sent as-is; the server
    /// rejects it with an auth error.
    pub fn new(transport: T, token: impl Into<String>) -> Self {
        Self {
            transport,
            token: token.into(),
        }
    }

    /// The underlying transport.
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Calls `method` with `params` and returns the unwrapped result.
    ///
    /// # Errors
    ///
    /// Returns [`ConduitError::Transport`] if the request fails,
    /// [`ConduitError::Decode`] if the body is not a valid envelope, or
    /// [`ConduitError::Api`] if the envelope carries no result.
    pub async fn call<R: DeserializeOwned>(
        &self,
        method: &str,
        params: &Params,
    ) -> Result<R, ConduitError> {
        let request = ConduitRequest::new(method, params.encode(&self.token));
        tracing::debug!(method, "conduit call");

        let response = self.transport.send(request).await?;

        let envelope: Envelope<R> =
            serde_json::from_str(&response.body).map_err(|e| ConduitError::Decode {
                method: method.to_string(),
                reason: e.to_string(),
            })?;

        envelope.into_result().map_err(|source| {
            tracing::debug!(method, code = %source.code, "conduit returned an error");
            ConduitError::Api {
                method: method.to_string(),
                source,
            }
        })
    }
}
