//! Cache Store Module
//!
//! [`ElasticCache`]: cache entries kept as documents in a search index, with
//! lifetimes checked when an entry is read.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::backend::DocumentStore;
use crate::cache::query::{self, match_key, ClearOutcome, DeleteQuery};
use crate::cache::{CacheAdapter, CacheEntry, CacheStats, StatsSnapshot};
use crate::cache::{DEFAULT_EXPIRES_IN, DEFAULT_INDEX};
use crate::error::{CacheError, Result};
use crate::tasks::spawn_purge;

// == Purge Mode ==
/// How an expired entry found by a read gets deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PurgeMode {
    /// Delete before the read returns
    #[default]
    Inline,
    /// Delete on a detached task; the read does not wait for it
    Detached,
}

impl FromStr for PurgeMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "inline" => Ok(PurgeMode::Inline),
            "detached" => Ok(PurgeMode::Detached),
            other => Err(format!("unknown purge mode '{}'", other)),
        }
    }
}

// == Elastic Cache Config ==
/// Construction parameters for [`ElasticCache`].
#[derive(Clone, Default)]
pub struct ElasticCacheConfig {
    /// Document store holding the entries (required)
    pub client: Option<Arc<dyn DocumentStore>>,
    /// Index name; empty means `"gocache"`
    pub index: String,
    /// Entry lifetime; `None` or zero means one hour
    pub expires_in: Option<Duration>,
    /// Deletion strategy for expired entries found by reads
    pub purge: PurgeMode,
}

impl fmt::Debug for ElasticCacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElasticCacheConfig")
            .field("client", &self.client.is_some())
            .field("index", &self.index)
            .field("expires_in", &self.expires_in)
            .field("purge", &self.purge)
            .finish()
    }
}

// == Elastic Cache ==
/// Expiring cache over a document index.
///
/// Holds no entry state of its own; clones share the client and counters.
/// Concurrent writers of the same key are not serialized here, so a read is
/// only as fresh as the store's refresh-on-write makes it.
#[derive(Clone)]
pub struct ElasticCache {
    client: Arc<dyn DocumentStore>,
    index: String,
    expires_in: Duration,
    purge: PurgeMode,
    stats: Arc<CacheStats>,
}

impl ElasticCache {
    // == Constructor ==
    /// Builds the adapter, filling in defaults.
    ///
    /// Fails with [`CacheError::MissingClient`] when no client is configured.
    pub fn new(config: ElasticCacheConfig) -> Result<Self> {
        let client = config.client.ok_or(CacheError::MissingClient)?;

        let index = if config.index.is_empty() {
            DEFAULT_INDEX.to_string()
        } else {
            config.index
        };

        let expires_in = config
            .expires_in
            .filter(|d| !d.is_zero())
            .unwrap_or(DEFAULT_EXPIRES_IN);

        Ok(Self {
            client,
            index,
            expires_in,
            purge: config.purge,
            stats: Arc::new(CacheStats::new()),
        })
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    pub fn expires_in(&self) -> Duration {
        self.expires_in
    }

    pub fn purge_mode(&self) -> PurgeMode {
        self.purge
    }

    /// Current counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    // == Find ==
    /// Looks up the document for `key`.
    ///
    /// Only the first hit is used. Duplicate documents for one key are not
    /// produced by `set`, but nothing in the index prevents them; when they
    /// exist the remaining hits are ignored.
    pub async fn find(&self, key: &str) -> Result<CacheEntry> {
        let resp = self.client.search(&self.index, &match_key(key), true).await?;

        let matches = resp.hits.match_count();
        let first = resp.hits.hits.into_iter().next();
        if matches > 1 {
            debug!(
                "{} documents match key '{}', using '{}'",
                matches,
                key,
                first.as_ref().and_then(|hit| hit.id.as_deref()).unwrap_or_default()
            );
        }

        match first.and_then(|hit| hit.source) {
            Some(source) => Ok(CacheEntry::from_document(source)?),
            None => Err(CacheError::NotFound(key.to_string())),
        }
    }

    // == Is Expired ==
    /// Whether `entry` is past the configured lifetime. An absent entry is
    /// always expired.
    pub fn is_expired(&self, entry: Option<&CacheEntry>) -> bool {
        self.is_expired_at(entry, Utc::now())
    }

    /// [`is_expired`](Self::is_expired) against an explicit clock reading.
    pub fn is_expired_at(&self, entry: Option<&CacheEntry>, now: DateTime<Utc>) -> bool {
        entry.map_or(true, |e| e.is_expired_at(now, self.expires_in))
    }

    // == Purge Expired ==
    /// Deletes the entry for `key` after a read found it expired.
    ///
    /// Best effort: failures are logged, never returned.
    pub async fn purge_expired(&self, key: &str) {
        match self.purge {
            PurgeMode::Inline => {
                self.delete_by_query(DeleteQuery::Exact(key.to_string()))
                    .await;
            }
            PurgeMode::Detached => {
                spawn_purge(
                    Arc::clone(&self.client),
                    self.index.clone(),
                    key.to_string(),
                    Arc::clone(&self.stats),
                );
            }
        }
    }

    async fn delete_by_query(&self, query: DeleteQuery) -> ClearOutcome {
        query::delete_by_query(self.client.as_ref(), &self.index, &query, &self.stats).await
    }
}

#[async_trait]
impl CacheAdapter for ElasticCache {
    // == Set ==
    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let body = CacheEntry::new(key, value).to_document()?;

        self.client
            .index_document(&self.index, key, &body, true)
            .await?;

        self.stats.record_set();
        debug!("set key '{}' in '{}'", key, self.index);
        Ok(())
    }

    // == Get ==
    async fn get(&self, key: &str) -> Result<String> {
        let entry = match self.find(key).await {
            Ok(entry) => entry,
            Err(err) => {
                if err.is_miss() {
                    self.stats.record_miss();
                }
                return Err(err);
            }
        };

        if self.is_expired(Some(&entry)) {
            self.stats.record_expired();
            self.purge_expired(&entry.key).await;
            return Err(CacheError::Expired(key.to_string()));
        }

        self.stats.record_hit();
        Ok(entry.value)
    }

    // == Clear ==
    // Delete failures are logged and counted, not returned.
    async fn clear(&self, key: &str) -> Result<()> {
        self.delete_by_query(DeleteQuery::Exact(key.to_string()))
            .await;
        Ok(())
    }

    async fn clear_prefix(&self, prefix: &str) -> Result<()> {
        self.delete_by_query(DeleteQuery::Prefix(prefix.to_string()))
            .await;
        Ok(())
    }

    async fn clear_all(&self) -> Result<()> {
        self.delete_by_query(DeleteQuery::All).await;
        Ok(())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{entry_document, MemoryStore};

    const INDEX: &str = "test";

    fn cache_with(store: Arc<MemoryStore>, expires_in: Duration, purge: PurgeMode) -> ElasticCache {
        ElasticCache::new(ElasticCacheConfig {
            client: Some(store),
            index: INDEX.to_string(),
            expires_in: Some(expires_in),
            purge,
        })
        .unwrap()
    }

    fn cache(store: Arc<MemoryStore>) -> ElasticCache {
        cache_with(store, Duration::from_secs(60), PurgeMode::Inline)
    }

    fn seconds_ago(secs: i64) -> String {
        (Utc::now() - chrono::Duration::seconds(secs)).to_rfc3339()
    }

    #[test]
    fn test_missing_client() {
        let result = ElasticCache::new(ElasticCacheConfig::default());
        assert!(matches!(result, Err(CacheError::MissingClient)));
    }

    #[test]
    fn test_defaults() {
        let cache = ElasticCache::new(ElasticCacheConfig {
            client: Some(Arc::new(MemoryStore::new())),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(cache.index(), "gocache");
        assert_eq!(cache.expires_in(), Duration::from_secs(3600));
        assert_eq!(cache.purge_mode(), PurgeMode::Inline);
    }

    #[test]
    fn test_zero_expiry_uses_default() {
        let cache = cache_with(Arc::new(MemoryStore::new()), Duration::ZERO, PurgeMode::Inline);
        assert_eq!(cache.expires_in(), DEFAULT_EXPIRES_IN);
    }

    #[test]
    fn test_purge_mode_from_str() {
        assert_eq!("inline".parse::<PurgeMode>(), Ok(PurgeMode::Inline));
        assert_eq!("Detached".parse::<PurgeMode>(), Ok(PurgeMode::Detached));
        assert!("later".parse::<PurgeMode>().is_err());
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let store = Arc::new(MemoryStore::new());
        let cache = cache(store.clone());

        cache.set("foo", "bar").await.unwrap();

        assert_eq!(cache.get("foo").await.unwrap(), "bar");
        assert!(cache.is_valid("foo").await);
        assert_eq!(store.document(INDEX, "foo").await.unwrap()["value"], "bar");
    }

    #[tokio::test]
    async fn test_set_overwrites_and_resets_age() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_raw(INDEX, "foo", entry_document("foo", "old", &seconds_ago(120)))
            .await;
        let cache = cache(store.clone());

        cache.set("foo", "new").await.unwrap();

        assert_eq!(store.len(INDEX).await, 1);
        assert_eq!(cache.get("foo").await.unwrap(), "new");
    }

    #[tokio::test]
    async fn test_get_missing_index_is_backend_error() {
        let cache = cache(Arc::new(MemoryStore::new()));

        let err = cache.get("foo").await.unwrap_err();
        assert!(matches!(err, CacheError::Backend(_)));
        assert!(err.to_string().contains("index_not_found_exception"));
        assert!(!cache.is_valid("foo").await);
    }

    #[tokio::test]
    async fn test_get_not_found() {
        let store = Arc::new(MemoryStore::new());
        let cache = cache(store);
        cache.set("other", "x").await.unwrap();

        let err = cache.get("foo").await.unwrap_err();
        assert!(matches!(err, CacheError::NotFound(_)));
        assert_eq!(cache.stats().misses, 1);
    }

    #[tokio::test]
    async fn test_get_expired_purges_entry() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_raw(INDEX, "foo", entry_document("foo", "bar", &seconds_ago(120)))
            .await;
        let cache = cache(store.clone());

        let err = cache.get("foo").await.unwrap_err();

        assert!(matches!(err, CacheError::Expired(_)));
        assert_eq!(store.len(INDEX).await, 0);
        assert_eq!(cache.stats().expired, 1);

        // gone now, so the next read is a plain miss
        assert!(matches!(
            cache.get("foo").await,
            Err(CacheError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_expired_read_survives_failed_purge() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_raw(INDEX, "foo", entry_document("foo", "bar", &seconds_ago(120)))
            .await;
        store.set_failing_deletes(true);
        let cache = cache(store.clone());

        let err = cache.get("foo").await.unwrap_err();

        assert!(matches!(err, CacheError::Expired(_)));
        assert_eq!(store.len(INDEX).await, 1);
        assert_eq!(cache.stats().delete_failures, 1);
    }

    #[tokio::test]
    async fn test_detached_purge() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_raw(INDEX, "foo", entry_document("foo", "bar", &seconds_ago(120)))
            .await;
        let cache = cache_with(store.clone(), Duration::from_secs(60), PurgeMode::Detached);

        let err = cache.get("foo").await.unwrap_err();
        assert!(matches!(err, CacheError::Expired(_)));

        for _ in 0..100 {
            if store.len(INDEX).await == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(store.len(INDEX).await, 0);
    }

    #[tokio::test]
    async fn test_first_hit_wins_on_duplicates() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_raw(INDEX, "a", entry_document("dup", "first", &seconds_ago(1)))
            .await;
        store
            .insert_raw(INDEX, "b", entry_document("dup", "second", &seconds_ago(1)))
            .await;
        let cache = cache(store);

        let entry = cache.find("dup").await.unwrap();
        assert_eq!(entry.value, "first");
    }

    #[tokio::test]
    async fn test_undecodable_document() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_raw(INDEX, "bad", serde_json::json!({"key": "bad", "value": 1}))
            .await;
        let cache = cache(store);

        let err = cache.get("bad").await.unwrap_err();
        assert!(matches!(err, CacheError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_is_expired_boundary() {
        let cache = cache(Arc::new(MemoryStore::new()));
        let t0 = Utc::now();
        let entry = CacheEntry::created_at("k", "v", t0);
        let d = chrono::Duration::seconds(60);
        let eps = chrono::Duration::milliseconds(1);

        assert!(cache.is_expired_at(None, t0));
        assert!(!cache.is_expired_at(Some(&entry), t0 + d - eps));
        assert!(!cache.is_expired_at(Some(&entry), t0 + d));
        assert!(cache.is_expired_at(Some(&entry), t0 + d + eps));
    }

    #[tokio::test]
    async fn test_empty_value_is_not_valid() {
        let cache = cache(Arc::new(MemoryStore::new()));
        cache.set("blank", "").await.unwrap();

        assert_eq!(cache.get("blank").await.unwrap(), "");
        assert!(!cache.is_valid("blank").await);
    }

    #[tokio::test]
    async fn test_clear_family() {
        let store = Arc::new(MemoryStore::new());
        let cache = cache(store.clone());
        for (k, v) in [("hello", "world"), ("heli", "copter"), ("kitty", "hello")] {
            cache.set(k, v).await.unwrap();
        }

        cache.clear_prefix("hel").await.unwrap();
        assert!(!cache.is_valid("hello").await);
        assert!(!cache.is_valid("heli").await);
        assert_eq!(cache.get("kitty").await.unwrap(), "hello");

        cache.clear("kitty").await.unwrap();
        assert!(!cache.is_valid("kitty").await);

        cache.set("a", "1").await.unwrap();
        cache.clear_all().await.unwrap();
        assert_eq!(store.len(INDEX).await, 0);
        assert_eq!(cache.stats().clears, 3);
    }

    #[tokio::test]
    async fn test_clear_swallows_backend_errors() {
        let store = Arc::new(MemoryStore::new());
        let cache = cache(store.clone());
        store.set_failing(true);

        assert!(cache.clear("foo").await.is_ok());
        assert!(cache.clear_prefix("f").await.is_ok());
        assert!(cache.clear_all().await.is_ok());
        assert_eq!(cache.stats().delete_failures, 3);
    }

    #[tokio::test]
    async fn test_set_surfaces_backend_errors() {
        let store = Arc::new(MemoryStore::new());
        let cache = cache(store.clone());
        store.set_failing(true);

        let err = cache.set("foo", "bar").await.unwrap_err();
        assert!(matches!(err, CacheError::Backend(_)));
        assert_eq!(cache.stats().sets, 0);
    }
}
