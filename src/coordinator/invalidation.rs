//! Invalidation Engine
//!
//! Bulk and pattern-based invalidation, all built on the single-slot expire
//! primitive. Invalidation forces `expires_at` to now and leaves `data` as is,
//! so consumers keep seeing the old value until a refetch resolves.
//!
//! Invalidation is lenient: unknown queries and missing keys are no-ops.

use serde::Serialize;
use serde_json::Value;
use tokio::time::Instant;
use tracing::debug;

use super::query::to_params;
use super::QueryCoordinator;
use crate::cache::{CacheEventKind, CacheStore, EntryPatch};
use crate::codec;
use crate::error::Result;

// == Invalidation Target ==
/// Scope of an invalidation.
#[derive(Debug, Clone, PartialEq)]
pub enum InvalidationTarget {
    /// Every key of every query
    All,
    /// Every key cached under one query
    Query(String),
    /// One entry addressed by its cache key
    Key { query: String, key: String },
    /// One entry addressed by the params its key derives from
    Params { query: String, params: Value },
}

impl<C> QueryCoordinator<C>
where
    C: Send + Sync + 'static,
{
    // == Invalidate ==
    /// Invalidates the entries selected by `target`.
    ///
    /// Returns the number of entries whose expiry was forced.
    pub async fn invalidate(&self, target: InvalidationTarget) -> usize {
        let now = Instant::now();
        let expired = {
            let mut store = self.inner.store.write().await;
            let slots: Vec<(String, String)> = match target {
                InvalidationTarget::All => store
                    .query_names()
                    .into_iter()
                    .flat_map(|query| {
                        store
                            .keys(&query)
                            .into_iter()
                            .map(move |key| (query.clone(), key))
                            .collect::<Vec<_>>()
                    })
                    .collect(),
                InvalidationTarget::Query(query) => store
                    .keys(&query)
                    .into_iter()
                    .map(|key| (query.clone(), key))
                    .collect(),
                InvalidationTarget::Key { query, key } => {
                    vec![(query, codec::canonical_key(&key))]
                }
                InvalidationTarget::Params { query, params } => {
                    vec![(query, codec::serialize(&params))]
                }
            };
            expire_slots(&mut store, slots, now)
        };

        self.announce(&expired);
        expired.len()
    }

    /// Invalidates every key of every registered query.
    pub async fn invalidate_all(&self) -> usize {
        self.invalidate(InvalidationTarget::All).await
    }

    /// Invalidates every key cached under `query`.
    pub async fn invalidate_query(&self, query: &str) -> usize {
        self.invalidate(InvalidationTarget::Query(query.to_string()))
            .await
    }

    /// Invalidates one entry by cache key.
    ///
    /// The key is canonicalized first, so a hand-written JSON key with a
    /// different property order still addresses the right entry.
    pub async fn invalidate_key(&self, query: &str, key: &str) -> usize {
        self.invalidate(InvalidationTarget::Key {
            query: query.to_string(),
            key: key.to_string(),
        })
        .await
    }

    /// Invalidates one entry by the params its key derives from.
    pub async fn invalidate_params<P>(&self, query: &str, params: &P) -> Result<usize>
    where
        P: Serialize + ?Sized,
    {
        let params = to_params(query, params)?;
        Ok(self
            .invalidate(InvalidationTarget::Params {
                query: query.to_string(),
                params,
            })
            .await)
    }

    // == Invalidate Where ==
    /// Invalidates every entry of `query` whose decoded params structurally
    /// contain `pattern` (see [`codec::contains`]).
    ///
    /// Keys that do not decode cannot match and are skipped.
    pub async fn invalidate_where<P>(&self, query: &str, pattern: &P) -> Result<usize>
    where
        P: Serialize + ?Sized,
    {
        let pattern = to_params(query, pattern)?;
        let now = Instant::now();
        let expired = {
            let mut store = self.inner.store.write().await;
            let slots: Vec<(String, String)> = store
                .keys(query)
                .into_iter()
                .filter(|key| match codec::parse(key) {
                    Ok(params) => codec::contains(&params, &pattern),
                    Err(err) => {
                        debug!(query, error = %err, "Skipping undecodable key");
                        false
                    }
                })
                .map(|key| (query.to_string(), key))
                .collect();
            expire_slots(&mut store, slots, now)
        };

        self.announce(&expired);
        Ok(expired.len())
    }

    fn announce(&self, expired: &[(String, String)]) {
        for (query, key) in expired {
            self.publish(query, key, CacheEventKind::Invalidated);
        }
        if !expired.is_empty() {
            debug!(count = expired.len(), "Invalidated entries");
        }
    }
}

/// Forces each existing slot's expiry to `now`; missing slots are skipped.
///
/// Returns the slots that were actually expired.
fn expire_slots(
    store: &mut CacheStore,
    slots: Vec<(String, String)>,
    now: Instant,
) -> Vec<(String, String)> {
    slots
        .into_iter()
        .filter(|(query, key)| {
            let expired = store.commit(query, key, EntryPatch::expire(now)).is_some();
            if expired {
                store.stats_mut().record_invalidation();
            }
            expired
        })
        .collect()
}
