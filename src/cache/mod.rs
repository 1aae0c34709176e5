//! Cache Module
//!
//! Expiring key-value cache stored as documents in a search index.

mod adapter;
mod entry;
pub mod query;
mod stats;
mod store;


use std::time::Duration;

// Re-export public types
pub use adapter::CacheAdapter;
pub use entry::CacheEntry;
pub use query::{ClearOutcome, DeleteQuery};
pub use stats::{CacheStats, StatsSnapshot};
pub use store::{ElasticCache, ElasticCacheConfig, PurgeMode};

// == Public Constants ==
/// Index used when none is configured
pub const DEFAULT_INDEX: &str = "gocache";

/// Entry lifetime used when none (or zero) is configured
pub const DEFAULT_EXPIRES_IN: Duration = Duration::from_secs(3600);
