//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use crate::backend::{DocumentStore, ElasticConfig};
use crate::cache::{ElasticCacheConfig, PurgeMode, DEFAULT_EXPIRES_IN, DEFAULT_INDEX};

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Elasticsearch base URL
    pub elasticsearch_url: String,
    /// Basic auth user for the cluster
    pub elasticsearch_username: Option<String>,
    /// Basic auth password for the cluster
    pub elasticsearch_password: Option<String>,
    /// Index holding the cache documents
    pub index: String,
    /// Entry lifetime in seconds
    pub expires_in: u64,
    /// How expired entries found by reads are deleted
    pub purge_mode: PurgeMode,
    /// Per-request timeout for cluster calls, in seconds
    pub request_timeout: u64,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `ELASTICSEARCH_URL` - Cluster address (default: http://localhost:9200)
    /// - `ELASTICSEARCH_USERNAME` / `ELASTICSEARCH_PASSWORD` - Basic auth (optional)
    /// - `CACHE_INDEX` - Index name (default: gocache)
    /// - `CACHE_EXPIRES_IN` - Entry lifetime in seconds; non-positive means default (default: 3600)
    /// - `CACHE_PURGE_MODE` - `inline` or `detached` (default: inline)
    /// - `REQUEST_TIMEOUT` - Cluster request timeout in seconds (default: 10)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            elasticsearch_url: env::var("ELASTICSEARCH_URL")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.elasticsearch_url),
            elasticsearch_username: env::var("ELASTICSEARCH_USERNAME").ok(),
            elasticsearch_password: env::var("ELASTICSEARCH_PASSWORD").ok(),
            index: env::var("CACHE_INDEX")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.index),
            expires_in: env::var("CACHE_EXPIRES_IN")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .filter(|secs| *secs > 0)
                .map(|secs| secs as u64)
                .unwrap_or(defaults.expires_in),
            purge_mode: env::var("CACHE_PURGE_MODE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.purge_mode),
            request_timeout: env::var("REQUEST_TIMEOUT")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.request_timeout),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
        }
    }

    /// Connection settings for the Elasticsearch client.
    pub fn elastic_config(&self) -> ElasticConfig {
        ElasticConfig {
            base_url: self.elasticsearch_url.clone(),
            username: self.elasticsearch_username.clone(),
            password: self.elasticsearch_password.clone(),
            timeout: Duration::from_secs(self.request_timeout),
        }
    }

    /// Adapter settings around an already built client.
    pub fn cache_config(&self, client: Arc<dyn DocumentStore>) -> ElasticCacheConfig {
        ElasticCacheConfig {
            client: Some(client),
            index: self.index.clone(),
            expires_in: Some(Duration::from_secs(self.expires_in)),
            purge: self.purge_mode,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            elasticsearch_url: "http://localhost:9200".to_string(),
            elasticsearch_username: None,
            elasticsearch_password: None,
            index: DEFAULT_INDEX.to_string(),
            expires_in: DEFAULT_EXPIRES_IN.as_secs(),
            purge_mode: PurgeMode::Inline,
            request_timeout: 10,
            server_port: 3000,
        }
    }
}
