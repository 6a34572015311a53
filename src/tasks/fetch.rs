//! Fetch Task
//!
//! Drives one fetch future to completion and commits the outcome.

use serde_json::Value;
use tokio::task::JoinHandle;

use crate::coordinator::QueryCoordinator;
use crate::registry::FetchFuture;

/// Spawns a task that awaits `fetch` and settles the (query, key) entry.
///
/// Failures are captured into the entry, never propagated. There is no
/// cancellation: invalidating the entry does not stop a fetch in flight.
pub(crate) fn spawn_fetch<C>(
    coordinator: QueryCoordinator<C>,
    query: String,
    key: String,
    fetch: FetchFuture,
) -> JoinHandle<()>
where
    C: Send + Sync + 'static,
{
    tokio::spawn(async move {
        let outcome: anyhow::Result<Value> = fetch.await;
        coordinator.settle(&query, &key, outcome).await;
    })
}
