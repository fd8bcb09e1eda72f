//! Node-Local Cache Store
//!
//! Holds the named caches a node serves. Each cache is an ordered list of
//! key/value entries with opaque JSON payloads; diagnostics never interpret
//! the stored data, they only scan and project it.
//!
//! Uses `DashMap` for high-concurrency access: query jobs snapshot caches
//! while writers keep inserting.

use dashmap::DashMap;
use serde_json::Value;

/// The set of named caches hosted by a single node.
pub struct CacheStore {
    /// Structure: `Cache Name -> ordered entries (key, value)`.
    caches: DashMap<String, Vec<(Value, Value)>>,
}

impl CacheStore {
    /// Creates a new, empty store.
    pub fn new() -> Self {
        Self {
            caches: DashMap::new(),
        }
    }

    /// Creates an empty cache under the given name (no-op if it exists).
    pub fn create_cache(&self, name: &str) {
        self.caches.entry(name.to_string()).or_default();

        tracing::debug!("Created cache '{}'", name);
    }

    /// Inserts or replaces an entry in a cache, creating the cache if needed.
    ///
    /// Replacement keeps the entry's original position so scans stay in a
    /// stable order.
    pub fn put(&self, cache: &str, key: Value, value: Value) {
        let mut entries = self.caches.entry(cache.to_string()).or_default();

        match entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => entries.push((key, value)),
        }
    }

    /// Returns a point-in-time copy of a cache's entries.
    ///
    /// Query cursors iterate this snapshot so a concurrent `put` never
    /// shifts rows under an open cursor.
    pub fn snapshot(&self, cache: &str) -> Option<Vec<(Value, Value)>> {
        self.caches.get(cache).map(|entries| entries.clone())
    }

    /// Returns the names of all hosted caches.
    pub fn cache_names(&self) -> Vec<String> {
        self.caches
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Checks whether a cache exists on this node.
    pub fn has_cache(&self, cache: &str) -> bool {
        self.caches.contains_key(cache)
    }

    /// Returns the number of entries in a cache (0 if absent).
    pub fn entry_count(&self, cache: &str) -> usize {
        self.caches
            .get(cache)
            .map(|entries| entries.len())
            .unwrap_or(0)
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new()
    }
}
