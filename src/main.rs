//! Query Cache demo
//!
//! Hosts a coordinator the way an application would: one paged `colors`
//! query backed by a simulated HTTP client.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use serde_json::{json, Value};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use query_cache::{CacheEventKind, Config, QueryCoordinator, QueryDefinition, QueryRegistry};

/// Stand-in for the application's HTTP client.
struct ColorsApi {
    latency: Duration,
    pages: Vec<Vec<&'static str>>,
}

impl ColorsApi {
    fn new() -> Self {
        Self {
            latency: Duration::from_millis(50),
            pages: vec![vec!["red"], vec!["green", "blue"]],
        }
    }

    async fn get_page(&self, page: u64) -> anyhow::Result<Value> {
        tokio::time::sleep(self.latency).await;
        let index = page.checked_sub(1).context("pages start at 1")? as usize;
        let colors = self
            .pages
            .get(index)
            .with_context(|| format!("GET /colors/{page}.json: 404"))?;

        let next = (index + 1 < self.pages.len()).then(|| page + 1);
        let prev = (page > 1).then(|| page - 1);
        Ok(json!({"colors": colors, "meta": {"next": next, "prev": prev}}))
    }
}

/// Main entry point for the demo.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Register queries and create the coordinator
/// 4. Query, wait for resolution, re-query, invalidate
/// 5. Log a JSON snapshot of the cache
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "query_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting query cache demo");

    let config = Config::from_env();
    info!(
        "Configuration loaded: default_ttl={}ms, event_capacity={}",
        config.default_ttl_ms, config.event_capacity
    );

    let registry = QueryRegistry::new().with(
        QueryDefinition::new("colors", |api: Arc<ColorsApi>, params: Value| async move {
            let page = params["page"].as_u64().context("page param must be a number")?;
            api.get_page(page).await
        })
        .with_default(json!({"colors": [], "meta": {"next": null, "prev": null}})),
    )?;
    let coordinator = QueryCoordinator::new(registry, ColorsApi::new(), config);

    let colors = coordinator.bind("colors", || json!({"page": 1}))?;
    let mut changes = colors.changes();

    let first = colors.data().await?;
    info!("Before fetch: {}", first);

    changes
        .wait_for(CacheEventKind::Resolved)
        .await
        .context("coordinator dropped")?;
    info!("After fetch: {}", colors.data().await?);

    // A missing page fails into the entry, the caller keeps going
    let missing = coordinator.bind("colors", || json!({"page": 9}))?;
    let mut missing_changes = missing.changes();
    missing.state().await?;
    missing_changes
        .wait_for(CacheEventKind::Failed)
        .await
        .context("coordinator dropped")?;
    info!("Missing page error: {:?}", missing.error().await?);

    let invalidated = coordinator
        .invalidate_where("colors", &json!({"page": 1}))
        .await?;
    info!("Invalidated {} entries", invalidated);

    let snapshot = coordinator.snapshot().await;
    info!("Snapshot: {}", serde_json::to_string_pretty(&snapshot)?);

    info!("Demo complete");
    Ok(())
}
