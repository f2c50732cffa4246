//! The JSON envelope wrapped around every Conduit response.
//!
//! Conduit answers `{ "result": ..., "error_code": ..., "error_info": ... }`.
//! A null `result` means the call failed; the caller never sees it.

use serde::Deserialize;

/// Error reported by the remote API inside the envelope.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {info}")]
pub struct ApiError {
    /// Machine-readable error code, e.g. `ERR-INVALID-AUTH`.
    pub code: String,
    /// Human-readable detail.
    pub info: String,
}

/// Raw response envelope.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    /// Call result; `None` when the call failed.
    pub result: Option<T>,
    /// Error code, set when `result` is null.
    #[serde(default)]
    pub error_code: Option<String>,
    /// Error detail, set when `result` is null.
    #[serde(default)]
    pub error_info: Option<String>,
}

impl<T> Envelope<T> {
    /// Unwraps the envelope into its result.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when `result` is null. Missing code or info
    /// fields are filled with placeholders rather than dropped.
    pub fn into_result(self) -> Result<T, ApiError> {
        match self.result {
            Some(result) => Ok(result),
            None => Err(ApiError {
                code: self.error_code.unwrap_or_else(|| "ERR-UNKNOWN".to_string()),
                info: self
                    .error_info
                    .unwrap_or_else(|| "no result and no error information".to_string()),
            }),
        }
    }
}
