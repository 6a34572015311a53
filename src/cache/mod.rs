//! Cache Module
//!
//! Entry storage, change notifications and statistics for the coordinator.

mod entry;
mod events;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::{CacheEntry, EntryPatch};
pub use events::{CacheEvent, CacheEventKind, EventBus, KeySubscription};
pub use stats::CacheStats;
pub use store::CacheStore;
