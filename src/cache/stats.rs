//! Cache Statistics Module
//!
//! Tracks coordinator activity: fresh reads, fetch cycles and invalidations.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Queries answered from a fresh entry
    pub hits: u64,
    /// Queries that found the entry missing or expired and started a fetch
    pub misses: u64,
    /// Fetches that settled successfully
    pub fetches_succeeded: u64,
    /// Fetches that settled with an error
    pub fetches_failed: u64,
    /// Entries whose expiry was forced by invalidation
    pub invalidations: u64,
    /// Staleness checks that fired on a still-expired entry
    pub stale_marks: u64,
    /// Current number of entries across all queries
    pub total_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no queries have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Fetches started but not yet settled.
    pub fn fetches_in_flight(&self) -> u64 {
        self.misses
            .saturating_sub(self.fetches_succeeded + self.fetches_failed)
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_fetch_success(&mut self) {
        self.fetches_succeeded += 1;
    }

    pub fn record_fetch_failure(&mut self) {
        self.fetches_failed += 1;
    }

    pub fn record_invalidation(&mut self) {
        self.invalidations += 1;
    }

    pub fn record_stale_mark(&mut self) {
        self.stale_marks += 1;
    }

    // == Update Entry Count ==
    /// Updates the total entries count.
    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
