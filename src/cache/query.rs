//! Query Module
//!
//! Query bodies the cache sends to the index and the delete-by-query
//! primitive every invalidation goes through.

use std::fmt;

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::backend::{BackendError, DocumentStore};
use crate::cache::CacheStats;

/// Search body matching documents whose `key` field equals `key`.
pub fn match_key(key: &str) -> Value {
    json!({ "query": { "match": { "key": key } } })
}

// == Delete Query ==
/// Which documents an invalidation removes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteQuery {
    /// Documents whose `key` matches exactly
    Exact(String),
    /// Documents whose `key` starts with the prefix
    Prefix(String),
    /// Every document in the index
    All,
}

impl DeleteQuery {
    /// Query DSL body for `_delete_by_query`.
    pub fn body(&self) -> Value {
        match self {
            DeleteQuery::Exact(key) => match_key(key),
            DeleteQuery::Prefix(prefix) => json!({ "query": { "prefix": { "key": prefix } } }),
            DeleteQuery::All => json!({ "query": { "match_all": {} } }),
        }
    }
}

impl fmt::Display for DeleteQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeleteQuery::Exact(key) => write!(f, "key '{}'", key),
            DeleteQuery::Prefix(prefix) => write!(f, "prefix '{}'", prefix),
            DeleteQuery::All => f.write_str("all keys"),
        }
    }
}

// == Clear Outcome ==
/// Result of one delete-by-query call.
///
/// The public clear operations report success either way; a failure is
/// logged and counted in [`CacheStats`] instead of being returned.
#[derive(Debug)]
pub enum ClearOutcome {
    Deleted(u64),
    Failed(BackendError),
}

impl ClearOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, ClearOutcome::Failed(_))
    }
}

// == Delete By Query ==
/// Runs `query` against `index` and records the outcome.
pub async fn delete_by_query(
    store: &dyn DocumentStore,
    index: &str,
    query: &DeleteQuery,
    stats: &CacheStats,
) -> ClearOutcome {
    match store.delete_by_query(index, &query.body()).await {
        Ok(resp) => {
            if !resp.failures.is_empty() {
                warn!(
                    "delete by query for {} in '{}' reported {} failures",
                    query,
                    index,
                    resp.failures.len()
                );
            }
            debug!("cleared {}: {} documents deleted", query, resp.deleted);
            stats.record_clear();
            ClearOutcome::Deleted(resp.deleted)
        }
        Err(err) => {
            warn!("failed to clear {} in '{}': {}", query, index, err);
            stats.record_delete_failure();
            ClearOutcome::Failed(err)
        }
    }
}
