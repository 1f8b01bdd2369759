//! Error types for the lookup API client.
//!
//! # Design
//! Every non-2xx answer lands in `Rejected` together with whatever structured
//! message the server sent. The API uses two message fields (`error` for
//! technical failures, `mensaje` for business-rule empty results), so both are
//! kept and callers choose the precedence they need.

use thiserror::Error;

use crate::types::ErrorBody;

/// Errors returned by `LookupClient` parse methods and reported by hosts.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {}", .body.message().unwrap_or("no message"))]
    Rejected { status: u16, body: ErrorBody },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The request never completed.
    #[error("transport failed: {0}")]
    Transport(String),
}

impl ApiError {
    /// The structured error body of a rejected request, if any.
    pub fn body(&self) -> Option<&ErrorBody> {
        match self {
            ApiError::Rejected { body, .. } => Some(body),
            _ => None,
        }
    }
}

impl From<crate::http::TransportError> for ApiError {
    fn from(err: crate::http::TransportError) -> Self {
        ApiError::Transport(err.0)
    }
}
