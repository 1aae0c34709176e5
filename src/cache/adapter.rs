//! Cache Adapter Module
//!
//! The capability set a pluggable cache backend provides.

use async_trait::async_trait;

use crate::error::Result;

// == Cache Adapter ==
/// Pluggable string key-value cache.
#[async_trait]
pub trait CacheAdapter: Send + Sync {
    /// Stores `value` under `key`, replacing any previous entry.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Returns the value stored under `key`.
    ///
    /// Fails with `NotFound` when there is no entry and `Expired` when the
    /// entry is past its lifetime.
    async fn get(&self, key: &str) -> Result<String>;

    /// True when `get` succeeds with a non-empty value.
    ///
    /// A stored empty string is therefore reported as invalid.
    async fn is_valid(&self, key: &str) -> bool {
        matches!(self.get(key).await, Ok(value) if !value.is_empty())
    }

    /// Removes the entry stored under `key`.
    async fn clear(&self, key: &str) -> Result<()>;

    /// Removes every entry whose key starts with `prefix`.
    async fn clear_prefix(&self, prefix: &str) -> Result<()>;

    /// Removes every entry.
    async fn clear_all(&self) -> Result<()>;
}
