//! Snapshot DTOs
//!
//! Point-in-time, serializable copy of every cache entry.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::time::Instant;

use crate::cache::{CacheEntry, CacheStats, CacheStore};

/// One entry as seen at snapshot time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntrySnapshot {
    /// Current data (default, resolved, or stale)
    pub data: Value,
    /// Whether a fetch is in flight
    pub loading: bool,
    /// Last fetch failure, if any
    pub error: Option<String>,
    /// Milliseconds until expiry, 0 when expired
    pub expires_in_ms: u64,
    /// Expired at snapshot time
    pub stale: bool,
}

impl EntrySnapshot {
    /// Creates an EntrySnapshot relative to `now`.
    pub fn new(entry: &CacheEntry, now: Instant) -> Self {
        Self {
            data: entry.data.clone(),
            loading: entry.loading,
            error: entry.error.clone(),
            expires_in_ms: entry.expires_at.saturating_duration_since(now).as_millis() as u64,
            stale: entry.is_expired_at(now),
        }
    }
}

/// Every query's entries plus statistics.
#[derive(Debug, Clone, Serialize)]
pub struct CacheSnapshot {
    /// Wall-clock time the snapshot was taken
    pub taken_at: DateTime<Utc>,
    /// Statistics at snapshot time
    pub stats: CacheStats,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// query name -> cache key -> entry
    pub queries: BTreeMap<String, BTreeMap<String, EntrySnapshot>>,
}

impl CacheSnapshot {
    /// Captures the store's current state.
    pub fn capture(store: &CacheStore) -> Self {
        let now = Instant::now();
        let mut queries: BTreeMap<String, BTreeMap<String, EntrySnapshot>> = store
            .query_names()
            .into_iter()
            .map(|name| (name, BTreeMap::new()))
            .collect();

        for (query, key, entry) in store.iter() {
            queries
                .entry(query.to_string())
                .or_default()
                .insert(key.to_string(), EntrySnapshot::new(entry, now));
        }

        let stats = store.stats();
        Self {
            taken_at: Utc::now(),
            hit_rate: stats.hit_rate(),
            stats,
            queries,
        }
    }

    /// Looks up one entry.
    pub fn entry(&self, query: &str, key: &str) -> Option<&EntrySnapshot> {
        self.queries.get(query).and_then(|slots| slots.get(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::EntryPatch;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_entry_snapshot_fresh() {
        let now = Instant::now();
        let mut entry = CacheEntry::seed(json!([1]), now);
        entry.expires_at = now + Duration::from_millis(2500);

        let snap = EntrySnapshot::new(&entry, now);
        assert_eq!(snap.expires_in_ms, 2500);
        assert!(!snap.stale);
        assert_eq!(snap.data, json!([1]));
    }

    #[test]
    fn test_entry_snapshot_expired() {
        let now = Instant::now();
        let entry = CacheEntry::seed(json!(null), now);

        let snap = EntrySnapshot::new(&entry, now + Duration::from_secs(1));
        assert_eq!(snap.expires_in_ms, 0);
        assert!(snap.stale);
    }

    #[test]
    fn test_capture_lists_empty_queries() {
        let mut store = CacheStore::new(["colors", "search"]);
        store.get_or_seed("colors", r#"{"page":1}"#, &json!([]), Instant::now());
        store.commit("colors", r#"{"page":1}"#, EntryPatch::failed("nope".to_string()));

        let snapshot = CacheSnapshot::capture(&store);
        assert_eq!(snapshot.queries.len(), 2);
        assert!(snapshot.queries["search"].is_empty());
        let entry = snapshot.entry("colors", r#"{"page":1}"#).unwrap();
        assert_eq!(entry.error.as_deref(), Some("nope"));
        assert_eq!(snapshot.stats.total_entries, 1);
    }

    #[test]
    fn test_snapshot_serialize() {
        let store = CacheStore::new(["colors"]);
        let json = serde_json::to_string(&CacheSnapshot::capture(&store)).unwrap();
        assert!(json.contains("taken_at"));
        assert!(json.contains("colors"));
        assert!(json.contains("hit_rate"));
    }
}
