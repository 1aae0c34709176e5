//! API Routes
//!
//! Configures the Axum router with all cache server endpoints.

use axum::{
    routing::{delete, get, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_all_handler, clear_handler, clear_prefix_handler, get_handler, health_handler,
    set_handler, stats_handler, valid_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /set` - Store a key-value pair
/// - `GET /get/:key` - Retrieve a value by key
/// - `GET /valid/:key` - Check whether a key holds a live, non-empty value
/// - `DELETE /del/:key` - Clear a key
/// - `DELETE /prefix/:prefix` - Clear every key under a prefix
/// - `DELETE /all` - Clear the whole index
/// - `GET /stats` - Get cache statistics
/// - `GET /health` - Health check endpoint
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/set", put(set_handler))
        .route("/get/:key", get(get_handler))
        .route("/valid/:key", get(valid_handler))
        .route("/del/:key", delete(clear_handler))
        .route("/prefix/:prefix", delete(clear_prefix_handler))
        .route("/all", delete(clear_all_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
