//! Staleness Check Task
//!
//! Deferred task that nudges subscribers once an entry's TTL elapses, so that
//! passive views learn about staleness without issuing a new query.

use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

use crate::coordinator::WeakCoordinator;

/// Spawns a task that waits until `deadline` and then marks the entry stale
/// if it is still expired.
///
/// The task never fetches and never changes values. If the entry was
/// refreshed or invalidated-then-refetched in the meantime, it is a no-op.
/// It holds a weak handle, so a dropped coordinator ends it quietly.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort it.
pub(crate) fn spawn_staleness_check<C>(
    coordinator: WeakCoordinator<C>,
    query: String,
    key: String,
    deadline: Instant,
) -> JoinHandle<()>
where
    C: Send + Sync + 'static,
{
    tokio::spawn(async move {
        sleep_until(deadline).await;

        match coordinator.upgrade() {
            Some(coordinator) => {
                coordinator.mark_if_stale(&query, &key).await;
            }
            None => debug!(query = %query, "Coordinator dropped before staleness check"),
        }
    })
}
