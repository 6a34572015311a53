//! Change Notification Module
//!
//! Broadcasts per-(query, key) change events so that bound views can re-read
//! entries, including stale-marking events that carry no value change.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, warn};

// == Event Kind ==
/// What happened to an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheEventKind {
    /// Entry seeded with the query default
    Created,
    /// Fetch cycle began, entry is loading
    FetchStarted,
    /// Fetch settled with data
    Resolved,
    /// Fetch settled with an error
    Failed,
    /// Expiry forced by invalidation
    Invalidated,
    /// TTL elapsed with no intervening refresh; values unchanged
    MarkedStale,
}

// == Cache Event ==
/// Change notification for one (query, key) slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheEvent {
    pub query: String,
    pub key: String,
    pub kind: CacheEventKind,
}

impl CacheEvent {
    pub fn new(query: impl Into<String>, key: impl Into<String>, kind: CacheEventKind) -> Self {
        Self {
            query: query.into(),
            key: key.into(),
            kind,
        }
    }

    /// True if this event concerns the given slot.
    pub fn is_for(&self, query: &str, key: &str) -> bool {
        self.query == query && self.key == key
    }
}

// == Event Bus ==
/// Fan-out of cache events to any number of subscribers.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<CacheEvent>,
}

impl EventBus {
    /// Creates a bus buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event. Having no subscribers is fine.
    pub fn publish(&self, event: CacheEvent) {
        let kind = event.kind;
        match self.tx.send(event) {
            Ok(receivers) => debug!(?kind, receivers, "Published cache event"),
            Err(_) => debug!(?kind, "No subscribers for cache event"),
        }
    }

    /// Subscribes to every future event.
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.tx.subscribe()
    }

    /// Subscribes to future events of a single slot.
    pub fn subscribe_key(&self, query: impl Into<String>, key: impl Into<String>) -> KeySubscription {
        KeySubscription {
            query: query.into(),
            key: key.into(),
            rx: self.tx.subscribe(),
        }
    }
}

// == Key Subscription ==
/// Receiver filtered down to one (query, key) slot.
#[derive(Debug)]
pub struct KeySubscription {
    query: String,
    key: String,
    rx: broadcast::Receiver<CacheEvent>,
}

impl KeySubscription {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Waits for the next event on this slot.
    ///
    /// Returns `None` once the bus is gone. Events lost to lag are skipped.
    pub async fn recv(&mut self) -> Option<CacheEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.is_for(&self.query, &self.key) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(
                        query = %self.query,
                        key = %self.key,
                        skipped,
                        "Subscriber lagged, skipping missed events"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Waits until an event of the given kind arrives for this slot.
    pub async fn wait_for(&mut self, kind: CacheEventKind) -> Option<CacheEvent> {
        while let Some(event) = self.recv().await {
            if event.kind == kind {
                return Some(event);
            }
        }
        None
    }
}
