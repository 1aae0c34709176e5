//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::backend::BackendError;
use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the cache adapter and its HTTP front.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The adapter was built without a document store
    #[error("client config is required")]
    MissingClient,

    /// Key has no document in the index
    #[error("not found: {0}")]
    NotFound(String),

    /// Key has a document, but it is older than the configured lifetime
    #[error("cache expired: {0}")]
    Expired(String),

    /// Entry could not be encoded or a stored document could not be decoded
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend unreachable or rejected the request
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl CacheError {
    /// True for the two "no usable entry" outcomes (not found, expired).
    pub fn is_miss(&self) -> bool {
        matches!(self, CacheError::NotFound(_) | CacheError::Expired(_))
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) | CacheError::Expired(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::Backend(_) => StatusCode::BAD_GATEWAY,
            CacheError::MissingClient | CacheError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
