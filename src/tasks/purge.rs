//! Expired Entry Purge Task
//!
//! Deletes an expired key without holding up the read that found it.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::backend::DocumentStore;
use crate::cache::query::delete_by_query;
use crate::cache::{CacheStats, ClearOutcome, DeleteQuery};

/// Spawns a detached task deleting the documents for `key`.
///
/// Nothing waits on the result: the outcome is logged and counted in `stats`
/// like any other clear. The returned handle may be dropped.
///
/// # Example
/// ```ignore
/// let handle = spawn_purge(store, "gocache".to_string(), "foo".to_string(), stats);
/// ```
pub fn spawn_purge(
    store: Arc<dyn DocumentStore>,
    index: String,
    key: String,
    stats: Arc<CacheStats>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let query = DeleteQuery::Exact(key);
        if let ClearOutcome::Deleted(n) =
            delete_by_query(store.as_ref(), &index, &query, &stats).await
        {
            debug!("purged expired {} ({} documents)", query, n);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{entry_document, MemoryStore};

    #[tokio::test]
    async fn test_purge_removes_key() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_raw("idx", "old", entry_document("old", "v", "2020-01-01T00:00:00Z"))
            .await;
        store
            .insert_raw("idx", "new", entry_document("new", "v", "2020-01-01T00:00:00Z"))
            .await;
        let stats = Arc::new(CacheStats::new());

        let handle = spawn_purge(store.clone(), "idx".to_string(), "old".to_string(), stats.clone());
        handle.await.unwrap();

        assert_eq!(store.len("idx").await, 1);
        assert!(store.document("idx", "new").await.is_some());
        assert_eq!(stats.snapshot().clears, 1);
    }

    #[tokio::test]
    async fn test_purge_failure_is_counted() {
        let store = Arc::new(MemoryStore::new());
        let stats = Arc::new(CacheStats::new());

        let handle = spawn_purge(store.clone(), "missing".to_string(), "k".to_string(), stats.clone());
        handle.await.unwrap();

        assert_eq!(store.delete_calls(), 1);
        assert_eq!(stats.snapshot().delete_failures, 1);
    }
}
