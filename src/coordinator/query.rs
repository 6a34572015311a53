//! Query path: read-through lookup, fetch cycle start and settlement.

use serde::Serialize;
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::QueryCoordinator;
use crate::cache::{CacheEntry, CacheEvent, CacheEventKind, EntryPatch};
use crate::codec;
use crate::error::{QueryError, Result};
use crate::tasks::{spawn_fetch, spawn_staleness_check};

/// Converts caller params into the JSON value fetches and keys work on.
pub(crate) fn to_params<P>(name: &str, params: &P) -> Result<Value>
where
    P: Serialize + ?Sized,
{
    serde_json::to_value(params).map_err(|source| QueryError::InvalidParams {
        query: name.to_string(),
        source,
    })
}

impl<C> QueryCoordinator<C>
where
    C: Send + Sync + 'static,
{
    // == Query ==
    /// Returns the current entry for `params`, starting a fetch when the entry
    /// is missing or expired.
    ///
    /// The returned entry is the state observed before any fetch started by
    /// this call: a first call yields the query default, not loading, already
    /// expired. Fetch failures never surface here; they land in
    /// [`CacheEntry::error`].
    ///
    /// # Errors
    /// [`QueryError::UnknownQuery`] if `name` was never registered.
    pub async fn query<P>(&self, name: &str, params: &P) -> Result<CacheEntry>
    where
        P: Serialize + ?Sized,
    {
        self.query_with_key(name, params, None).await
    }

    /// Same as [`query`](Self::query) but stores the entry under `key` when
    /// given instead of the key derived from `params`.
    pub async fn query_with_key<P>(
        &self,
        name: &str,
        params: &P,
        key: Option<&str>,
    ) -> Result<CacheEntry>
    where
        P: Serialize + ?Sized,
    {
        let definition = self.inner.registry.get(name)?;
        let params = to_params(name, params)?;
        let key = match key {
            Some(key) => key.to_string(),
            None => codec::serialize(&params),
        };

        let now = Instant::now();
        let mut store = self.inner.store.write().await;
        // A freshly seeded entry is already expired, so it always takes the
        // fetch path below.
        let (entry, created) = store.get_or_seed(name, &key, definition.default_value(), now);

        if !entry.is_expired_at(now) {
            store.stats_mut().record_hit();
            drop(store);
            debug!(query = name, key = %key, loading = entry.loading, "Cache hit");
            return Ok(entry);
        }

        let ttl = definition.ttl_or(self.inner.config.default_ttl());
        let expires_at = now + ttl;
        // Expiry moves forward before the fetch settles; later callers see a
        // fresh entry and do not fetch again.
        store.commit(name, &key, EntryPatch::fetch_started(expires_at));
        store.stats_mut().record_miss();
        drop(store);

        if created {
            self.publish(name, &key, CacheEventKind::Created);
        }
        self.publish(name, &key, CacheEventKind::FetchStarted);
        info!(query = name, key = %key, ttl_ms = ttl.as_millis() as u64, "Starting fetch");

        let fetch = definition.fetch(self.inner.context.clone(), params);
        spawn_staleness_check(self.downgrade(), name.to_string(), key.clone(), expires_at);
        spawn_fetch(self.clone(), name.to_string(), key, fetch);

        Ok(entry)
    }

    // == Settle ==
    /// Commits the outcome of a fetch. Last settlement wins.
    pub(crate) async fn settle(&self, name: &str, key: &str, outcome: anyhow::Result<Value>) {
        let (patch, kind) = match outcome {
            Ok(data) => (EntryPatch::resolved(data), CacheEventKind::Resolved),
            Err(err) => {
                let message = format!("{:#}", err);
                warn!(query = name, key = %key, error = %message, "Fetch failed");
                (EntryPatch::failed(message), CacheEventKind::Failed)
            }
        };

        let committed = {
            let mut store = self.inner.store.write().await;
            let committed = store.commit(name, key, patch).is_some();
            if committed {
                match kind {
                    CacheEventKind::Resolved => store.stats_mut().record_fetch_success(),
                    _ => store.stats_mut().record_fetch_failure(),
                }
            }
            committed
        };

        if committed {
            debug!(query = name, key = %key, ?kind, "Fetch settled");
            self.publish(name, key, kind);
        }
    }

    // == Mark If Stale ==
    /// Publishes a stale notification if the entry is still expired.
    ///
    /// Values are left untouched and no fetch is started. Returns whether the
    /// notification was sent.
    pub(crate) async fn mark_if_stale(&self, name: &str, key: &str) -> bool {
        let now = Instant::now();
        let stale = {
            let mut store = self.inner.store.write().await;
            let stale = store
                .get(name, key)
                .is_some_and(|entry| entry.is_expired_at(now));
            if stale {
                store.stats_mut().record_stale_mark();
            }
            stale
        };

        if stale {
            debug!(query = name, key = %key, "Entry marked stale");
            self.publish(name, key, CacheEventKind::MarkedStale);
        } else {
            debug!(query = name, key = %key, "Staleness check skipped, entry is fresh");
        }
        stale
    }

    pub(crate) fn publish(&self, name: &str, key: &str, kind: CacheEventKind) {
        self.inner.events.publish(CacheEvent::new(name, key, kind));
    }
}
