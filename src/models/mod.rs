//! Diagnostic models for the query cache
//!
//! Serializable views of the cache state, suitable for logging or exposing
//! through a debug endpoint.

pub mod snapshot;

// Re-export commonly used types
pub use snapshot::{CacheSnapshot, EntrySnapshot};
