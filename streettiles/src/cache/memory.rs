//! In-memory cache with bounded size using moka.
//!
//! This module provides an async-safe memory cache backed by `moka::future::Cache`.
//! Moka uses lock-free data structures internally, making it safe to use from
//! async contexts without risk of blocking the Tokio runtime.
//!
//! The store itself implies no per-key locking. Callers that need mutual
//! exclusion on a key (the network cache) build it on top with
//! [`MemoryCache::insert_if_absent`] and an explicit marker value.

use std::sync::atomic::{AtomicU64, Ordering};

use moka::future::Cache;
use moka::ops::compute::{CompResult, Op};
use tracing::debug;

use super::config::CacheConfig;
use super::stats::CacheStats;
use crate::coord::TileCoord;

/// In-memory cache keyed by tile coordinate.
///
/// Generic over the stored value: encoded tile bytes for the tile cache,
/// `NetworkEntry` for the network cache. Values are cloned out on reads, so
/// `V` should be cheap to clone (`Bytes`, `Arc<_>`).
pub struct MemoryCache<V> {
    /// Name used in logs and statistics
    name: String,
    /// The underlying moka cache
    cache: Cache<TileCoord, V>,
    /// Maximum number of entries
    max_entries: u64,
    /// Statistics - using atomics for lock-free updates
    hits: AtomicU64,
    misses: AtomicU64,
    log_hits_misses: bool,
}

impl<V> MemoryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create a new memory cache from its configuration.
    pub fn new(config: CacheConfig) -> Self {
        let mut builder = Cache::builder().max_capacity(config.max_entries);

        if let Some(ttl) = config.ttl {
            builder = builder.time_to_live(ttl);
        }

        Self {
            name: config.name,
            cache: builder.build(),
            max_entries: config.max_entries,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            log_hits_misses: config.log_hits_misses,
        }
    }

    /// Get a cached value.
    ///
    /// Returns `Some(value)` if present, `None` otherwise. Never waits on
    /// other writers.
    pub async fn get(&self, key: &TileCoord) -> Option<V> {
        let value = self.cache.get(key).await;
        self.record_lookup(key, value.is_some());
        value
    }

    /// Store a value, replacing any existing entry for the key.
    ///
    /// Eviction happens automatically when the cache exceeds its size limit.
    pub async fn put(&self, key: TileCoord, value: V) {
        self.cache.insert(key, value).await;
    }

    /// Store `value` only if `key` has no entry yet.
    ///
    /// The read and the conditional write happen as one step, so of several
    /// concurrent callers on an empty key exactly one sees `None` (its value
    /// was stored) and the others receive the winner's value.
    ///
    /// # Returns
    ///
    /// - `None` if the key was absent and `value` is now stored
    /// - `Some(existing)` if the key already had a value (left untouched)
    pub async fn insert_if_absent(&self, key: TileCoord, value: V) -> Option<V> {
        let entry = self.cache.entry(key).or_insert(value).await;
        let fresh = entry.is_fresh();
        self.record_lookup(&key, !fresh);

        if fresh {
            None
        } else {
            Some(entry.into_value())
        }
    }

    /// Store `value` if `key` is absent or its current value satisfies
    /// `replace`, as one atomic step on the key.
    ///
    /// # Returns
    ///
    /// - `None` if `value` is now stored
    /// - `Some(current)` if the current value was kept
    pub async fn replace_if<P>(&self, key: TileCoord, value: V, replace: P) -> Option<V>
    where
        P: FnOnce(&V) -> bool,
    {
        let result = self
            .cache
            .entry(key)
            .and_compute_with(|current| {
                let op = match current {
                    Some(entry) if !replace(entry.value()) => Op::Nop,
                    _ => Op::Put(value),
                };
                std::future::ready(op)
            })
            .await;

        match result {
            CompResult::Unchanged(entry) => Some(entry.into_value()),
            _ => None,
        }
    }

    /// Remove a single entry.
    pub async fn invalidate(&self, key: &TileCoord) {
        self.cache.invalidate(key).await;
    }

    /// Check if a key exists in the cache without touching the counters.
    pub fn contains(&self, key: &TileCoord) -> bool {
        self.cache.contains_key(key)
    }

    /// Remove all entries and reset the hit/miss counters.
    pub fn clear(&self) {
        self.cache.invalidate_all();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Run moka's pending maintenance (eviction, expiry, counters).
    pub async fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks().await;
    }

    /// Get the current number of entries in the cache.
    ///
    /// Moka updates this lazily; call [`run_pending_tasks`](Self::run_pending_tasks)
    /// first when an exact figure matters.
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Get the maximum number of entries.
    pub fn max_entries(&self) -> u64 {
        self.max_entries
    }

    /// Get the cache name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            name: self.name.clone(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entry_count: self.entry_count(),
            max_entries: self.max_entries,
        }
    }

    fn record_lookup(&self, key: &TileCoord, hit: bool) {
        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }

        if self.log_hits_misses {
            let stats = self.stats();
            debug!(
                cache = %self.name,
                key = %key,
                hit,
                hits = stats.hits,
                misses = stats.misses,
                ratio = stats.hit_ratio(),
                "Cache lookup"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::sync::Arc;

    fn create_test_key(x: u32) -> TileCoord {
        TileCoord {
            zoom: 17,
            x,
            y: 78648,
        }
    }

    fn create_cache(max_entries: u64) -> MemoryCache<Bytes> {
        MemoryCache::new(CacheConfig::new("test", max_entries))
    }

    #[test]
    fn test_memory_cache_new() {
        let cache = create_cache(1_000);
        assert_eq!(cache.max_entries(), 1_000);
        assert_eq!(cache.entry_count(), 0);
        assert_eq!(cache.name(), "test");
    }

    #[tokio::test]
    async fn test_memory_cache_put_and_get() {
        let cache = create_cache(1_000);
        let key = create_test_key(1);
        let data = Bytes::from_static(&[1, 2, 3, 4, 5]);

        cache.put(key, data.clone()).await;

        assert_eq!(cache.get(&key).await, Some(data));
        cache.run_pending_tasks().await;
        assert_eq!(cache.entry_count(), 1);
    }

    #[tokio::test]
    async fn test_memory_cache_miss() {
        let cache = create_cache(1_000);
        assert_eq!(cache.get(&create_test_key(1)).await, None);
    }

    #[tokio::test]
    async fn test_memory_cache_replace_existing() {
        let cache = create_cache(1_000);
        let key = create_test_key(1);

        cache.put(key, Bytes::from_static(&[1, 2, 3])).await;
        cache.put(key, Bytes::from_static(&[4, 5, 6, 7])).await;

        assert_eq!(cache.get(&key).await, Some(Bytes::from_static(&[4, 5, 6, 7])));
    }

    #[tokio::test]
    async fn test_keys_differ_by_every_field() {
        let cache = create_cache(1_000);
        let key = TileCoord { zoom: 16, x: 1, y: 2 };
        cache.put(key, Bytes::from_static(b"a")).await;

        assert!(cache.get(&TileCoord { zoom: 17, x: 1, y: 2 }).await.is_none());
        assert!(cache.get(&TileCoord { zoom: 16, x: 2, y: 2 }).await.is_none());
        assert!(cache.get(&TileCoord { zoom: 16, x: 1, y: 3 }).await.is_none());
        assert!(cache.get(&key).await.is_some());
    }

    #[tokio::test]
    async fn test_insert_if_absent_stores_when_empty() {
        let cache = create_cache(1_000);
        let key = create_test_key(1);

        let existing = cache.insert_if_absent(key, Bytes::from_static(b"first")).await;
        assert!(existing.is_none());
        assert_eq!(cache.get(&key).await, Some(Bytes::from_static(b"first")));
    }

    #[tokio::test]
    async fn test_insert_if_absent_keeps_existing() {
        let cache = create_cache(1_000);
        let key = create_test_key(1);
        cache.put(key, Bytes::from_static(b"first")).await;

        let existing = cache.insert_if_absent(key, Bytes::from_static(b"second")).await;
        assert_eq!(existing, Some(Bytes::from_static(b"first")));
        assert_eq!(cache.get(&key).await, Some(Bytes::from_static(b"first")));
    }

    #[tokio::test]
    async fn test_insert_if_absent_single_winner_under_contention() {
        let cache = Arc::new(create_cache(1_000));
        let key = create_test_key(42);
        let mut handles = Vec::new();

        for i in 0..32u8 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                cache.insert_if_absent(key, Bytes::from(vec![i])).await.is_none()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_replace_if_swaps_matching_value() {
        let cache = create_cache(1_000);
        let key = create_test_key(1);
        cache.put(key, Bytes::from_static(b"stale")).await;

        let kept = cache
            .replace_if(key, Bytes::from_static(b"new"), |current| current == "stale")
            .await;

        assert!(kept.is_none());
        assert_eq!(cache.get(&key).await, Some(Bytes::from_static(b"new")));
    }

    #[tokio::test]
    async fn test_replace_if_keeps_non_matching_value() {
        let cache = create_cache(1_000);
        let key = create_test_key(1);
        cache.put(key, Bytes::from_static(b"ready")).await;

        let kept = cache
            .replace_if(key, Bytes::from_static(b"new"), |current| current == "stale")
            .await;

        assert_eq!(kept, Some(Bytes::from_static(b"ready")));
        assert_eq!(cache.get(&key).await, Some(Bytes::from_static(b"ready")));
    }

    #[tokio::test]
    async fn test_replace_if_stores_when_absent() {
        let cache = create_cache(1_000);
        let key = create_test_key(1);

        let kept = cache
            .replace_if(key, Bytes::from_static(b"new"), |_| false)
            .await;

        assert!(kept.is_none());
        assert_eq!(cache.get(&key).await, Some(Bytes::from_static(b"new")));
    }

    #[tokio::test]
    async fn test_invalidate_removes_entry() {
        let cache = create_cache(1_000);
        let key = create_test_key(1);
        cache.put(key, Bytes::from_static(b"x")).await;

        cache.invalidate(&key).await;

        assert!(!cache.contains(&key));
        assert!(cache.get(&key).await.is_none());
    }

    #[tokio::test]
    async fn test_memory_cache_clear_resets_entries_and_counters() {
        let cache = create_cache(1_000);
        let key = create_test_key(1);
        cache.put(key, Bytes::from_static(&[1, 2, 3])).await;
        cache.get(&key).await;
        cache.get(&create_test_key(2)).await;

        cache.clear();
        cache.run_pending_tasks().await;

        assert_eq!(cache.entry_count(), 0);
        assert!(!cache.contains(&key));
        let stats = cache.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
    }

    #[tokio::test]
    async fn test_memory_cache_statistics() {
        let cache = create_cache(1_000);
        let key = create_test_key(1);
        cache.put(key, Bytes::from_static(&[1, 2, 3])).await;

        cache.get(&key).await;
        cache.get(&key).await;
        cache.get(&create_test_key(2)).await;

        let stats = cache.stats();
        assert_eq!(stats.name, "test");
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn test_memory_cache_bounded_size() {
        let cache = create_cache(10);

        for x in 0..100 {
            cache.put(create_test_key(x), Bytes::from_static(b"tile")).await;
        }
        cache.run_pending_tasks().await;

        assert!(
            cache.entry_count() <= 10,
            "Cache should be under limit, got {} entries",
            cache.entry_count()
        );
    }

    #[tokio::test]
    async fn test_memory_cache_concurrent_access() {
        let cache = Arc::new(create_cache(10_000));
        let mut handles = Vec::new();

        for i in 0..100u32 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                let key = create_test_key(i);
                let data = Bytes::from(vec![i as u8; 16]);

                cache.put(key, data.clone()).await;
                assert_eq!(cache.get(&key).await, Some(data));
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        cache.run_pending_tasks().await;
        assert_eq!(cache.entry_count(), 100);
    }

    #[tokio::test]
    async fn test_hit_miss_logging_does_not_change_results() {
        let cache: MemoryCache<Bytes> =
            MemoryCache::new(CacheConfig::new("logged", 100).with_log_hits_misses(true));
        let key = create_test_key(1);

        assert!(cache.get(&key).await.is_none());
        cache.put(key, Bytes::from_static(b"v")).await;
        assert!(cache.get(&key).await.is_some());
    }
}
