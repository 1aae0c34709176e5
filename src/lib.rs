//! Elastic Cache - an expiring key-value cache stored in Elasticsearch
//!
//! Entries are documents in a search index; age is checked lazily on read
//! and invalidation is expressed as delete-by-query.

pub mod api;
pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use backend::{DocumentStore, ElasticClient, ElasticConfig, MemoryStore};
pub use cache::{CacheAdapter, ElasticCache, ElasticCacheConfig, PurgeMode};
pub use config::Config;
pub use error::CacheError;
