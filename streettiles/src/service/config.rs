//! Tile service configuration.

use std::time::Duration;

use crate::cache::CacheConfig;
use crate::tile::IndexOptions;

/// Zoom level at which street networks are generated and cached.
pub const DEFAULT_INDEX_ZOOM: u8 = 16;

/// How often a waiting request re-reads a `Generating` network entry.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// How long a request waits on another task's generation before starting
/// its own.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(60);

/// Configuration for [`TileService`](super::TileService).
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    /// Zoom the network cache is keyed at.
    pub index_zoom: u8,
    /// Sleep between polls of a `Generating` entry.
    pub poll_interval: Duration,
    /// Upper bound on polling before falling back to regeneration.
    pub max_wait: Duration,
    /// Tile cache sizing.
    pub tile_cache: CacheConfig,
    /// Network cache sizing.
    pub network_cache: CacheConfig,
    /// Tile index parameters used when encoding.
    pub index: IndexOptions,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            index_zoom: DEFAULT_INDEX_ZOOM,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_wait: DEFAULT_MAX_WAIT,
            tile_cache: CacheConfig::tiles(),
            network_cache: CacheConfig::networks(),
            index: IndexOptions::default(),
        }
    }
}

impl ServiceConfig {
    pub fn with_index_zoom(mut self, zoom: u8) -> Self {
        self.index_zoom = zoom;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    pub fn with_tile_cache(mut self, config: CacheConfig) -> Self {
        self.tile_cache = config;
        self
    }

    pub fn with_network_cache(mut self, config: CacheConfig) -> Self {
        self.network_cache = config;
        self
    }

    pub fn with_index_options(mut self, options: IndexOptions) -> Self {
        self.index = options;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.index_zoom, 16);
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.max_wait, Duration::from_secs(60));
        assert_eq!(config.tile_cache.max_entries, 100_000);
        assert_eq!(config.network_cache.max_entries, 1_000);
        assert_eq!(config.index, IndexOptions::default());
    }

    #[test]
    fn test_builder() {
        let config = ServiceConfig::default()
            .with_index_zoom(15)
            .with_poll_interval(Duration::from_millis(5))
            .with_max_wait(Duration::from_millis(50))
            .with_tile_cache(CacheConfig::new("t", 10))
            .with_network_cache(CacheConfig::new("n", 2));

        assert_eq!(config.index_zoom, 15);
        assert_eq!(config.poll_interval, Duration::from_millis(5));
        assert_eq!(config.max_wait, Duration::from_millis(50));
        assert_eq!(config.tile_cache.name, "t");
        assert_eq!(config.network_cache.max_entries, 2);
    }
}
