//! Query Registry Module
//!
//! Static description of each cacheable query: how to fetch it, what to show
//! before the first resolution, and an optional TTL override.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::error::{QueryError, Result};

/// Future returned by a fetch function.
pub type FetchFuture = Pin<Box<dyn Future<Output = anyhow::Result<Value>> + Send>>;

/// Fetch function: receives the coordinator context and the raw params.
pub type FetchFn<C> = Arc<dyn Fn(Arc<C>, Value) -> FetchFuture + Send + Sync>;

// == Query Definition ==
/// One named, parameterized, cacheable read.
pub struct QueryDefinition<C> {
    name: String,
    fetch: FetchFn<C>,
    default: Value,
    ttl: Option<Duration>,
}

impl<C> QueryDefinition<C> {
    /// Creates a definition with a `null` default and the coordinator TTL.
    pub fn new<F, Fut>(name: impl Into<String>, fetch: F) -> Self
    where
        C: 'static,
        F: Fn(Arc<C>, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        let fetch: FetchFn<C> =
            Arc::new(move |ctx: Arc<C>, params: Value| -> FetchFuture { Box::pin(fetch(ctx, params)) });
        Self {
            name: name.into(),
            fetch,
            default: Value::Null,
            ttl: None,
        }
    }

    /// Value served before the first fetch resolves.
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = default;
        self
    }

    /// Per-query TTL overriding the coordinator default.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default_value(&self) -> &Value {
        &self.default
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Effective TTL given the coordinator-wide fallback.
    pub fn ttl_or(&self, fallback: Duration) -> Duration {
        self.ttl.unwrap_or(fallback)
    }

    /// Starts the fetch. The returned future must be polled to make progress.
    pub fn fetch(&self, ctx: Arc<C>, params: Value) -> FetchFuture {
        (self.fetch)(ctx, params)
    }
}

impl<C> fmt::Debug for QueryDefinition<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryDefinition")
            .field("name", &self.name)
            .field("default", &self.default)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

// == Query Registry ==
/// Immutable set of query definitions, keyed by name.
pub struct QueryRegistry<C> {
    queries: BTreeMap<String, QueryDefinition<C>>,
}

impl<C> QueryRegistry<C> {
    pub fn new() -> Self {
        Self {
            queries: BTreeMap::new(),
        }
    }

    /// Adds a definition. Names must be unique.
    pub fn register(&mut self, definition: QueryDefinition<C>) -> Result<()> {
        if self.queries.contains_key(definition.name()) {
            return Err(QueryError::DuplicateQuery(definition.name().to_string()));
        }
        self.queries
            .insert(definition.name().to_string(), definition);
        Ok(())
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, definition: QueryDefinition<C>) -> Result<Self> {
        self.register(definition)?;
        Ok(self)
    }

    /// Looks up a definition, failing loudly on unknown names.
    pub fn get(&self, name: &str) -> Result<&QueryDefinition<C>> {
        self.queries
            .get(name)
            .ok_or_else(|| QueryError::UnknownQuery(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.queries.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.queries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}

impl<C> Default for QueryRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for QueryRegistry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.queries.values()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn echo() -> QueryDefinition<()> {
        QueryDefinition::new("echo", |_ctx: Arc<()>, params| async move { Ok(params) })
    }

    #[test]
    fn test_definition_defaults() {
        let def = echo();
        assert_eq!(def.name(), "echo");
        assert_eq!(def.default_value(), &Value::Null);
        assert!(def.ttl().is_none());
        assert_eq!(def.ttl_or(Duration::from_secs(5)), Duration::from_secs(5));
    }

    #[test]
    fn test_definition_overrides() {
        let def = echo()
            .with_default(json!([]))
            .with_ttl(Duration::from_millis(10));
        assert_eq!(def.default_value(), &json!([]));
        assert_eq!(def.ttl_or(Duration::from_secs(5)), Duration::from_millis(10));
    }

    #[tokio::test]
    async fn test_definition_fetch_passes_params() {
        let def = echo();
        let result = def.fetch(Arc::new(()), json!({"q": "a"})).await.unwrap();
        assert_eq!(result, json!({"q": "a"}));
    }

    #[test]
    fn test_registry_register_and_get() {
        let registry = QueryRegistry::new().with(echo()).unwrap();
        assert!(registry.contains("echo"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("echo").unwrap().name(), "echo");
    }

    #[test]
    fn test_registry_unknown_query() {
        let registry: QueryRegistry<()> = QueryRegistry::new();
        assert!(registry.is_empty());
        assert!(matches!(
            registry.get("missing"),
            Err(QueryError::UnknownQuery(name)) if name == "missing"
        ));
    }

    #[test]
    fn test_registry_duplicate_query() {
        let mut registry = QueryRegistry::new();
        registry.register(echo()).unwrap();
        assert!(matches!(
            registry.register(echo()),
            Err(QueryError::DuplicateQuery(_))
        ));
    }

    #[test]
    fn test_registry_names_sorted() {
        let registry = QueryRegistry::new()
            .with(QueryDefinition::new("b", |_: Arc<()>, _| async { Ok(Value::Null) }))
            .unwrap()
            .with(QueryDefinition::new("a", |_: Arc<()>, _| async { Ok(Value::Null) }))
            .unwrap();
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
