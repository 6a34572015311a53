//! Cache Store Module
//!
//! Two-level map from query name to cache key to entry. Pure data: the
//! coordinator decides when and how entries change.

use std::collections::HashMap;

use serde_json::Value;
use tokio::time::Instant;

use crate::cache::{CacheEntry, CacheStats, EntryPatch};

// == Cache Store ==
/// In-memory storage for every query's entries.
#[derive(Debug, Default)]
pub struct CacheStore {
    /// query name -> cache key -> entry
    entries: HashMap<String, HashMap<String, CacheEntry>>,
    /// Activity statistics
    stats: CacheStats,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a store with an empty slot map for each query name.
    pub fn new<I, S>(queries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = queries
            .into_iter()
            .map(|name| (name.into(), HashMap::new()))
            .collect();
        Self {
            entries,
            stats: CacheStats::new(),
        }
    }

    // == Get ==
    /// Returns the entry for (query, key), if one was ever created.
    pub fn get(&self, query: &str, key: &str) -> Option<&CacheEntry> {
        self.entries.get(query).and_then(|slots| slots.get(key))
    }

    // == Get Or Seed ==
    /// Returns the entry for (query, key), seeding an expired one holding
    /// `default` when absent. The flag is true if the entry was created.
    pub fn get_or_seed(
        &mut self,
        query: &str,
        key: &str,
        default: &Value,
        now: Instant,
    ) -> (CacheEntry, bool) {
        let slots = self.entries.entry(query.to_string()).or_default();
        let mut created = false;
        let entry = slots.entry(key.to_string()).or_insert_with(|| {
            created = true;
            CacheEntry::seed(default.clone(), now)
        });
        let entry = entry.clone();
        if created {
            self.refresh_total();
        }
        (entry, created)
    }

    // == Commit ==
    /// Shallow-merges a patch into an existing entry.
    ///
    /// Returns the updated entry, or `None` if the slot does not exist.
    pub fn commit(&mut self, query: &str, key: &str, patch: EntryPatch) -> Option<CacheEntry> {
        let entry = self.entries.get_mut(query)?.get_mut(key)?;
        entry.apply(patch);
        Some(entry.clone())
    }

    // == Keys ==
    /// Returns all keys cached under a query (empty for unknown queries).
    pub fn keys(&self, query: &str) -> Vec<String> {
        self.entries
            .get(query)
            .map(|slots| slots.keys().cloned().collect())
            .unwrap_or_default()
    }

    // == Query Names ==
    /// Returns every query name the store has a slot map for, sorted.
    pub fn query_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }

    /// Iterates over every (query, key, entry).
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &CacheEntry)> {
        self.entries.iter().flat_map(|(query, slots)| {
            slots
                .iter()
                .map(move |(key, entry)| (query.as_str(), key.as_str(), entry))
        })
    }

    // == Stats ==
    /// Returns current statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.clone()
    }

    /// Mutable access for the coordinator's bookkeeping.
    pub fn stats_mut(&mut self) -> &mut CacheStats {
        &mut self.stats
    }

    // == Length ==
    /// Returns the number of entries across all queries.
    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn refresh_total(&mut self) {
        let total = self.len();
        self.stats.set_total_entries(total);
    }
}
