//! Backend Error Module
//!
//! Errors raised by a document store while talking to its index.

use thiserror::Error;

// == Backend Error ==
/// Failure reported by a [`DocumentStore`](super::DocumentStore) call.
///
/// Transport problems (the store could not be reached) are kept apart from
/// errors the store itself reported for a request it did receive.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The client could not be built from its configuration
    #[error("invalid client configuration: {0}")]
    Config(String),

    /// The request never completed (connection refused, DNS, TLS, ...)
    #[error("transport error: {0}")]
    Transport(reqwest::Error),

    /// The request exceeded the client timeout
    #[error("request timeout")]
    Timeout,

    /// Structured error envelope returned by the store
    #[error("[{status}] {kind}: {reason}")]
    Query {
        status: String,
        kind: String,
        reason: String,
    },

    /// Error status without a structured `error` body
    #[error("HTTP error: {status}")]
    Http { status: String },

    /// Response body could not be decoded
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl BackendError {
    /// Builds a [`BackendError::Query`] from the parts of an error envelope.
    pub fn query(
        status: impl Into<String>,
        kind: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Query {
            status: status.into(),
            kind: kind.into(),
            reason: reason.into(),
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BackendError::Timeout
        } else {
            BackendError::Transport(err)
        }
    }
}
