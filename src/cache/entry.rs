//! Cache Entry Module
//!
//! Defines the per-(query, key) entry and the patches that update it.

use serde_json::Value;
use tokio::time::Instant;

// == Cache Entry ==
/// Last known state of one (query, key) slot.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// Last resolved value, or the query default before the first resolution
    pub data: Value,
    /// True only while a fetch for this slot is in flight
    pub loading: bool,
    /// Message of the last fetch failure, cleared by the next success
    pub error: Option<String>,
    /// Instant at which the entry becomes stale
    pub expires_at: Instant,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry seeded with `data` that is already expired.
    pub fn seed(data: Value, now: Instant) -> Self {
        Self {
            data,
            loading: false,
            error: None,
            expires_at: now,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Boundary condition: an entry whose `expires_at` equals the current
    /// instant is expired.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Same as [`is_expired`](Self::is_expired) against a caller-supplied instant.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.expires_at <= now
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, `0` once expired.
    pub fn ttl_remaining_ms(&self) -> u64 {
        self.expires_at
            .saturating_duration_since(Instant::now())
            .as_millis() as u64
    }

    // == Apply ==
    /// Shallow-merges a patch: only fields set on the patch change.
    pub fn apply(&mut self, patch: EntryPatch) {
        if let Some(data) = patch.data {
            self.data = data;
        }
        if let Some(loading) = patch.loading {
            self.loading = loading;
        }
        if let Some(error) = patch.error {
            self.error = error;
        }
        if let Some(expires_at) = patch.expires_at {
            self.expires_at = expires_at;
        }
    }
}

// == Entry Patch ==
/// Partial update committed to a [`CacheEntry`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryPatch {
    pub data: Option<Value>,
    pub loading: Option<bool>,
    /// `Some(None)` clears the error
    pub error: Option<Option<String>>,
    pub expires_at: Option<Instant>,
}

impl EntryPatch {
    /// Fetch start: mark loading and push expiry out to `expires_at`.
    pub fn fetch_started(expires_at: Instant) -> Self {
        Self {
            loading: Some(true),
            expires_at: Some(expires_at),
            ..Self::default()
        }
    }

    /// Fetch success: store data and clear any previous error.
    pub fn resolved(data: Value) -> Self {
        Self {
            data: Some(data),
            loading: Some(false),
            error: Some(None),
            ..Self::default()
        }
    }

    /// Fetch failure: keep data, record the error.
    pub fn failed(error: String) -> Self {
        Self {
            loading: Some(false),
            error: Some(Some(error)),
            ..Self::default()
        }
    }

    /// Invalidation: expire now without touching data.
    pub fn expire(now: Instant) -> Self {
        Self {
            expires_at: Some(now),
            ..Self::default()
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_seed_is_expired() {
        let now = Instant::now();
        let entry = CacheEntry::seed(json!([]), now);

        assert_eq!(entry.data, json!([]));
        assert!(!entry.loading);
        assert!(entry.error.is_none());
        assert!(entry.is_expired_at(now), "Entry should be expired at boundary");
    }

    #[test]
    fn test_not_expired_before_deadline() {
        let now = Instant::now();
        let mut entry = CacheEntry::seed(json!(null), now);
        entry.expires_at = now + Duration::from_secs(10);

        assert!(!entry.is_expired_at(now));
        assert!(entry.is_expired_at(now + Duration::from_secs(10)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_remaining_ms() {
        let now = Instant::now();
        let mut entry = CacheEntry::seed(json!(null), now);
        entry.expires_at = now + Duration::from_secs(10);
        assert_eq!(entry.ttl_remaining_ms(), 10_000);

        tokio::time::advance(Duration::from_secs(4)).await;
        assert_eq!(entry.ttl_remaining_ms(), 6_000);

        tokio::time::advance(Duration::from_secs(20)).await;
        assert_eq!(entry.ttl_remaining_ms(), 0);
        assert!(entry.is_expired());
    }

    #[test]
    fn test_apply_merges_only_set_fields() {
        let now = Instant::now();
        let mut entry = CacheEntry::seed(json!("old"), now);
        let later = now + Duration::from_secs(5);

        entry.apply(EntryPatch::fetch_started(later));
        assert_eq!(entry.data, json!("old"));
        assert!(entry.loading);
        assert_eq!(entry.expires_at, later);

        entry.apply(EntryPatch::failed("boom".to_string()));
        assert_eq!(entry.data, json!("old"));
        assert!(!entry.loading);
        assert_eq!(entry.error.as_deref(), Some("boom"));
        assert_eq!(entry.expires_at, later);

        entry.apply(EntryPatch::resolved(json!("new")));
        assert_eq!(entry.data, json!("new"));
        assert!(entry.error.is_none());
    }

    #[test]
    fn test_expire_keeps_data() {
        let now = Instant::now();
        let mut entry = CacheEntry::seed(json!({"a": 1}), now);
        entry.expires_at = now + Duration::from_secs(60);

        entry.apply(EntryPatch::expire(now));
        assert!(entry.is_expired_at(now));
        assert_eq!(entry.data, json!({"a": 1}));
    }
}
