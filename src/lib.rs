//! Query Cache - client-side query result cache coordinator
//!
//! Memoizes async fetch results per (query name, params), serves them while
//! fresh, re-fetches transparently on expiry with at most one fetch in flight
//! per key, and exposes key, query-wide and pattern-based invalidation.

pub mod cache;
pub mod codec;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod models;
pub mod registry;
mod tasks;

pub use cache::{CacheEntry, CacheEvent, CacheEventKind, CacheStats, KeySubscription};
pub use config::Config;
pub use coordinator::{InvalidationTarget, QueryBinding, QueryCoordinator};
pub use error::{QueryError, Result};
pub use models::CacheSnapshot;
pub use registry::{QueryDefinition, QueryRegistry};
