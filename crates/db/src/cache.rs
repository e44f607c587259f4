//! Query result caching using Moka.
//!
//! Read-heavy list endpoints cache their serialized responses keyed by
//! query shape. Invalidation is deliberately coarse: any transaction
//! write flushes the whole cache, because a single write changes derived
//! rows at three levels plus the year summary.

use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;

/// Default cache capacity (number of entries).
const DEFAULT_CACHE_CAPACITY: u64 = 1000;

/// Default time-to-live for cache entries (5 minutes).
const DEFAULT_TTL_SECS: u64 = 300;

/// Shared cache of serialized query results.
///
/// Thread-safe and cheap to clone.
#[derive(Clone)]
pub struct QueryCache {
    cache: Cache<String, Arc<serde_json::Value>>,
}

impl QueryCache {
    /// Creates a cache with default settings (1000 entries, 5 minute TTL).
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DEFAULT_CACHE_CAPACITY, DEFAULT_TTL_SECS)
    }

    /// Creates a cache with custom capacity and TTL.
    #[must_use]
    pub fn with_config(max_capacity: u64, ttl_secs: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { cache }
    }

    /// Looks up a cached result.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Arc<serde_json::Value>> {
        self.cache.get(key)
    }

    /// Stores a result under the given key.
    pub fn insert(&self, key: impl Into<String>, value: serde_json::Value) {
        self.cache.insert(key.into(), Arc::new(value));
    }

    /// Drops every cached entry. Called after any transaction write.
    pub fn flush_all(&self) {
        self.cache.invalidate_all();
    }

    /// Drops a single entry.
    pub fn invalidate(&self, key: &str) {
        self.cache.invalidate(key);
    }

    /// Number of entries currently cached (approximate until pending
    /// tasks run).
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Forces Moka's pending maintenance to run, making `entry_count`
    /// exact. Test helper.
    pub fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks();
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_after_insert() {
        let cache = QueryCache::new();
        cache.insert("transactions:list", json!([{"amount": "100"}]));

        let hit = cache.get("transactions:list").unwrap();
        assert_eq!(*hit, json!([{"amount": "100"}]));
        assert!(cache.get("transactions:other").is_none());
    }

    #[test]
    fn test_flush_all_empties_cache() {
        let cache = QueryCache::new();
        cache.insert("a", json!(1));
        cache.insert("b", json!(2));

        cache.flush_all();
        cache.run_pending_tasks();

        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_none());
        assert_eq!(cache.entry_count(), 0);
    }

    #[test]
    fn test_invalidate_single_key() {
        let cache = QueryCache::new();
        cache.insert("keep", json!("k"));
        cache.insert("drop", json!("d"));

        cache.invalidate("drop");
        cache.run_pending_tasks();

        assert!(cache.get("keep").is_some());
        assert!(cache.get("drop").is_none());
    }

    #[test]
    fn test_ttl_expiry() {
        let cache = QueryCache::with_config(10, 0);
        cache.insert("ephemeral", json!(true));
        cache.run_pending_tasks();
        assert!(cache.get("ephemeral").is_none());
    }
}
