//! Binding Layer
//!
//! Read accessors for view code. Every read re-issues the query, so reading
//! and ensuring freshness are one operation; nothing is pre-warmed.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::QueryCoordinator;
use crate::cache::{CacheEntry, KeySubscription};
use crate::codec;
use crate::error::Result;

type ParamsFn = Arc<dyn Fn() -> Value + Send + Sync>;

// == Query Binding ==
/// A query bound to a params-producing function.
pub struct QueryBinding<C = ()> {
    coordinator: QueryCoordinator<C>,
    name: String,
    params: ParamsFn,
}

impl<C> Clone for QueryBinding<C> {
    fn clone(&self) -> Self {
        Self {
            coordinator: self.coordinator.clone(),
            name: self.name.clone(),
            params: Arc::clone(&self.params),
        }
    }
}

impl<C> fmt::Debug for QueryBinding<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBinding")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<C> QueryCoordinator<C>
where
    C: Send + Sync + 'static,
{
    /// Binds `name` to a params function evaluated on every read.
    ///
    /// # Errors
    /// [`QueryError::UnknownQuery`](crate::error::QueryError::UnknownQuery)
    /// if `name` was never registered.
    pub fn bind<F>(&self, name: &str, params: F) -> Result<QueryBinding<C>>
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.inner.registry.get(name)?;
        Ok(QueryBinding {
            coordinator: self.clone(),
            name: name.to_string(),
            params: Arc::new(params),
        })
    }
}

impl<C> QueryBinding<C>
where
    C: Send + Sync + 'static,
{
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current params as produced by the bound function.
    pub fn params(&self) -> Value {
        (self.params)()
    }

    /// Cache key for the current params.
    pub fn key(&self) -> String {
        codec::serialize(&self.params())
    }

    /// Whole entry for the current params.
    pub async fn state(&self) -> Result<CacheEntry> {
        self.coordinator.query(&self.name, &self.params()).await
    }

    /// Current data.
    pub async fn data(&self) -> Result<Value> {
        Ok(self.state().await?.data)
    }

    /// Current data deserialized into `T`.
    pub async fn data_as<T: DeserializeOwned>(&self) -> anyhow::Result<T> {
        let data = self.data().await?;
        Ok(serde_json::from_value(data)?)
    }

    /// Current loading flag.
    pub async fn loading(&self) -> Result<bool> {
        Ok(self.state().await?.loading)
    }

    /// Current error message, if the last fetch failed.
    pub async fn error(&self) -> Result<Option<String>> {
        Ok(self.state().await?.error)
    }

    /// Change notifications for the current params' entry.
    ///
    /// Re-read the accessors when an event arrives. Params that change later
    /// need a fresh subscription.
    pub fn changes(&self) -> KeySubscription {
        self.coordinator.subscribe_key(self.name.clone(), self.key())
    }
}
