//! Error types for the query cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Query Error Enum ==
/// Errors surfaced to callers of the coordinator.
///
/// Fetch failures are never reported here; they are captured into
/// `CacheEntry::error` instead.
#[derive(Error, Debug)]
pub enum QueryError {
    /// Query name was never registered
    #[error("Unknown query: {0}")]
    UnknownQuery(String),

    /// Query name registered twice
    #[error("Duplicate query: {0}")]
    DuplicateQuery(String),

    /// Parameters could not be converted into a JSON value
    #[error("Invalid params for query '{query}': {source}")]
    InvalidParams {
        query: String,
        #[source]
        source: serde_json::Error,
    },

    /// Key could not be decoded back into parameters
    #[error("Malformed cache key '{key}': {source}")]
    MalformedKey {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

// == Result Type Alias ==
/// Convenience Result type for the query cache.
pub type Result<T> = std::result::Result<T, QueryError>;
