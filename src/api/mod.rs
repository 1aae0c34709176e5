//! API Module
//!
//! HTTP handlers and routing for the cache server REST API.
//!
//! # Endpoints
//! - `PUT /set` - Store a key-value pair
//! - `GET /get/:key` - Retrieve a value by key
//! - `GET /valid/:key` - Validity check
//! - `DELETE /del/:key` - Clear a key
//! - `DELETE /prefix/:prefix` - Clear a key prefix
//! - `DELETE /all` - Clear every key
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
