//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::backend::ElasticClient;
use crate::cache::{CacheAdapter, ElasticCache};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    ClearResponse, GetResponse, HealthResponse, SetRequest, SetResponse, StatsResponse,
    ValidResponse,
};

/// Application state shared across all handlers.
///
/// The cache handle is stateless apart from its counters, so no lock is needed.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<ElasticCache>,
}

impl AppState {
    /// Creates a new AppState around the given cache.
    pub fn new(cache: ElasticCache) -> Self {
        Self {
            cache: Arc::new(cache),
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Builds the Elasticsearch client and the cache adapter on top of it.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = ElasticClient::new(config.elastic_config())?;
        let cache = ElasticCache::new(config.cache_config(Arc::new(client)))?;
        Ok(Self::new(cache))
    }
}

/// Handler for PUT /set
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    state.cache.set(&req.key, &req.value).await?;

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /get/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let value = state.cache.get(&key).await?;

    Ok(Json(GetResponse::new(key, value)))
}

/// Handler for GET /valid/:key
pub async fn valid_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<ValidResponse> {
    let valid = state.cache.is_valid(&key).await;
    Json(ValidResponse::new(key, valid))
}

/// Handler for DELETE /del/:key
pub async fn clear_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ClearResponse>> {
    state.cache.clear(&key).await?;
    Ok(Json(ClearResponse::key(key)))
}

/// Handler for DELETE /prefix/:prefix
pub async fn clear_prefix_handler(
    State(state): State<AppState>,
    Path(prefix): Path<String>,
) -> Result<Json<ClearResponse>> {
    state.cache.clear_prefix(&prefix).await?;
    Ok(Json(ClearResponse::prefix(prefix)))
}

/// Handler for DELETE /all
pub async fn clear_all_handler(State(state): State<AppState>) -> Result<Json<ClearResponse>> {
    state.cache.clear_all().await?;
    Ok(Json(ClearResponse::all()))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::new(
        state.cache.index(),
        state.cache.expires_in().as_secs(),
        state.cache.stats(),
    ))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
