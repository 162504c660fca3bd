//! Configuration types for the memory caches.

use std::time::Duration;

/// Default maximum number of encoded tiles kept in the tile cache.
pub const DEFAULT_TILE_CACHE_ENTRIES: u64 = 100_000;

/// Default maximum number of street networks kept in the network cache.
///
/// Networks are far larger than encoded tiles, and one network serves every
/// tile below its index tile, so this is much smaller than the tile cache.
pub const DEFAULT_NETWORK_CACHE_ENTRIES: u64 = 1_000;

/// Default time-to-live for cache entries (24 hours).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60 * 60 * 24);

/// Configuration for one [`MemoryCache`](super::MemoryCache) instance.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Name used in logs and statistics (e.g. "tile", "network").
    pub name: String,

    /// Maximum number of entries before eviction kicks in.
    pub max_entries: u64,

    /// Optional time-to-live for entries.
    /// If `None`, entries are only evicted when the size limit is reached.
    pub ttl: Option<Duration>,

    /// Emit a debug line with the running hit ratio on every lookup.
    pub log_hits_misses: bool,
}

impl CacheConfig {
    /// Create a cache configuration with the given name and entry limit.
    pub fn new(name: impl Into<String>, max_entries: u64) -> Self {
        Self {
            name: name.into(),
            max_entries,
            ttl: Some(DEFAULT_CACHE_TTL),
            log_hits_misses: false,
        }
    }

    /// Default configuration for the tile cache.
    pub fn tiles() -> Self {
        Self::new("tile", DEFAULT_TILE_CACHE_ENTRIES)
    }

    /// Default configuration for the network cache.
    pub fn networks() -> Self {
        Self::new("network", DEFAULT_NETWORK_CACHE_ENTRIES)
    }

    /// Set the entry limit.
    pub fn with_max_entries(mut self, max_entries: u64) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Set (or clear) the time-to-live.
    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    /// Enable or disable hit/miss logging.
    pub fn with_log_hits_misses(mut self, enabled: bool) -> Self {
        self.log_hits_misses = enabled;
        self
    }
}
