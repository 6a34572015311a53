//! Query Coordinator Module
//!
//! The engine: memoizes fetch results per (query, key), re-fetches lazily
//! once entries expire, and exposes invalidation and reactive bindings.
//!
//! # Concurrency
//! The expiry check, the optimistic `loading`/`expires_at` commit and the
//! decision to fetch all happen under one write lock on the store, so at most
//! one fetch per (query, key) is in flight even on a multi-threaded runtime.
//! Fetches and staleness checks run on spawned tasks.
//!
//! Settlement is last-write-wins: a slow fetch that settles after a newer one
//! (for example across an invalidation) overwrites the newer result.

mod binding;
mod invalidation;
mod query;

use std::sync::{Arc, Weak};

use tokio::sync::RwLock;

use crate::cache::{
    CacheEntry, CacheEvent, CacheStats, CacheStore, EventBus, KeySubscription,
};
use crate::codec;
use crate::config::Config;
use crate::error::Result;
use crate::models::CacheSnapshot;
use crate::registry::QueryRegistry;

pub use binding::QueryBinding;
pub use invalidation::InvalidationTarget;

pub(crate) struct Inner<C> {
    registry: QueryRegistry<C>,
    config: Config,
    context: Arc<C>,
    store: RwLock<CacheStore>,
    events: EventBus,
}

// == Query Coordinator ==
/// Cloneable handle to a shared query cache.
pub struct QueryCoordinator<C = ()> {
    inner: Arc<Inner<C>>,
}

impl<C> Clone for QueryCoordinator<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C> QueryCoordinator<C>
where
    C: Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates a coordinator owning `context`, handed to every fetch.
    pub fn new(registry: QueryRegistry<C>, context: C, config: Config) -> Self {
        Self::with_shared_context(registry, Arc::new(context), config)
    }

    /// Creates a coordinator around an already shared context.
    pub fn with_shared_context(registry: QueryRegistry<C>, context: Arc<C>, config: Config) -> Self {
        let store = CacheStore::new(registry.names());
        let events = EventBus::new(config.event_capacity);
        Self {
            inner: Arc::new(Inner {
                registry,
                config,
                context,
                store: RwLock::new(store),
                events,
            }),
        }
    }

    pub fn registry(&self) -> &QueryRegistry<C> {
        &self.inner.registry
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn context(&self) -> &Arc<C> {
        &self.inner.context
    }

    // == Peek ==
    /// Reads the entry for `params` without triggering a fetch.
    pub async fn peek<P>(&self, name: &str, params: &P) -> Result<Option<CacheEntry>>
    where
        P: serde::Serialize + ?Sized,
    {
        self.inner.registry.get(name)?;
        let key = codec::serialize(&query::to_params(name, params)?);
        self.peek_key(name, &key).await
    }

    /// Reads the entry stored under an explicit key without triggering a fetch.
    pub async fn peek_key(&self, name: &str, key: &str) -> Result<Option<CacheEntry>> {
        self.inner.registry.get(name)?;
        let store = self.inner.store.read().await;
        Ok(store.get(name, key).cloned())
    }

    // == Subscriptions ==
    /// Subscribes to every change notification.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<CacheEvent> {
        self.inner.events.subscribe()
    }

    /// Subscribes to change notifications of one (query, key) slot.
    pub fn subscribe_key(&self, name: impl Into<String>, key: impl Into<String>) -> KeySubscription {
        self.inner.events.subscribe_key(name, key)
    }

    // == Stats ==
    /// Returns current statistics.
    pub async fn stats(&self) -> CacheStats {
        self.inner.store.read().await.stats()
    }

    // == Snapshot ==
    /// Captures every entry for diagnostics.
    pub async fn snapshot(&self) -> CacheSnapshot {
        let store = self.inner.store.read().await;
        CacheSnapshot::capture(&store)
    }

    pub(crate) fn downgrade(&self) -> WeakCoordinator<C> {
        WeakCoordinator {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

// == Weak Coordinator ==
/// Handle held by background tasks so they do not keep the cache alive.
pub(crate) struct WeakCoordinator<C> {
    inner: Weak<Inner<C>>,
}

impl<C> WeakCoordinator<C> {
    pub(crate) fn upgrade(&self) -> Option<QueryCoordinator<C>> {
        self.inner.upgrade().map(|inner| QueryCoordinator { inner })
    }
}
