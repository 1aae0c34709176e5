//! Background Tasks Module
//!
//! Detached work spawned by the cache.

mod purge;

pub use purge::spawn_purge;
