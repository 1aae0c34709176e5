//! Response DTOs for the cache server API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::StatsSnapshot;

/// Response body for the GET operation (GET /get/:key)
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// The requested key
    pub key: String,
    /// The stored value
    pub value: String,
}

impl GetResponse {
    /// Creates a new GetResponse
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Response body for the SET operation (PUT /set)
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    /// The key that was set
    pub key: String,
}

impl SetResponse {
    /// Creates a new SetResponse
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set successfully", key),
            key,
        }
    }
}

/// Response body for GET /valid/:key
#[derive(Debug, Clone, Serialize)]
pub struct ValidResponse {
    pub key: String,
    pub valid: bool,
}

impl ValidResponse {
    pub fn new(key: impl Into<String>, valid: bool) -> Self {
        Self {
            key: key.into(),
            valid,
        }
    }
}

/// Response body for the clear endpoints (DELETE /del, /prefix, /all)
///
/// Clears are best effort, so this is returned even when the backend
/// rejected the delete.
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    /// Success message
    pub message: String,
    /// Key, prefix, or `*` for everything
    pub target: String,
}

impl ClearResponse {
    /// Clear of a single key
    pub fn key(key: impl Into<String>) -> Self {
        let target = key.into();
        Self {
            message: format!("Key '{}' cleared", target),
            target,
        }
    }

    /// Clear of every key under a prefix
    pub fn prefix(prefix: impl Into<String>) -> Self {
        let target = prefix.into();
        Self {
            message: format!("Keys with prefix '{}' cleared", target),
            target,
        }
    }

    /// Clear of the whole index
    pub fn all() -> Self {
        Self {
            message: "All keys cleared".to_string(),
            target: "*".to_string(),
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Index holding the entries
    pub index: String,
    /// Entry lifetime in seconds
    pub expires_in: u64,
    /// Counters
    #[serde(flatten)]
    pub stats: StatsSnapshot,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl StatsResponse {
    /// Creates a new StatsResponse from cache statistics
    pub fn new(index: impl Into<String>, expires_in: u64, stats: StatsSnapshot) -> Self {
        Self {
            index: index.into(),
            expires_in,
            hit_rate: stats.hit_rate(),
            stats,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
