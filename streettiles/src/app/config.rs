//! Application configuration for `StreetTilesApp`.
//!
//! `AppConfig` combines everything needed to bootstrap the server: the tile
//! service settings, where to listen, and which Overpass instance to query.

use std::time::Duration;

use crate::cache::CacheConfig;
use crate::config::{ConfigFile, DEFAULT_BIND, DEFAULT_PORT};
use crate::provider::{DEFAULT_OVERPASS_URL, DEFAULT_QUERY_TIMEOUT_SECS};
use crate::service::ServiceConfig;

/// Extra time the HTTP client allows on top of the Overpass query timeout,
/// so the server reports its own timeout before the connection is dropped.
pub const HTTP_TIMEOUT_MARGIN_SECS: u64 = 30;

/// Top-level configuration passed to `StreetTilesApp::start()`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Tile service configuration (caches, index zoom, polling).
    pub service: ServiceConfig,

    /// Listen address.
    pub server: ServerAppConfig,

    /// Overpass data source.
    pub overpass: OverpassAppConfig,
}

/// Listen address for the HTTP server.
#[derive(Clone, Debug, PartialEq)]
pub struct ServerAppConfig {
    pub bind: String,
    /// Port 0 picks an ephemeral port.
    pub port: u16,
}

impl Default for ServerAppConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerAppConfig {
    /// `bind:port` as accepted by `TcpListener::bind`.
    pub fn address(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

/// Overpass instance used for street data.
#[derive(Clone, Debug, PartialEq)]
pub struct OverpassAppConfig {
    pub url: String,
    pub timeout_secs: u32,
}

impl Default for OverpassAppConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_OVERPASS_URL.to_string(),
            timeout_secs: DEFAULT_QUERY_TIMEOUT_SECS,
        }
    }
}

impl OverpassAppConfig {
    /// Total HTTP timeout for one Overpass request.
    pub fn http_timeout_secs(&self) -> u64 {
        u64::from(self.timeout_secs) + HTTP_TIMEOUT_MARGIN_SECS
    }
}

impl AppConfig {
    /// Create an application config with default server and Overpass settings.
    pub fn new(service: ServiceConfig) -> Self {
        Self {
            service,
            server: ServerAppConfig::default(),
            overpass: OverpassAppConfig::default(),
        }
    }

    /// Create application config from the user's configuration file.
    ///
    /// Keeps the translation from INI settings to component configs in one
    /// place rather than scattered through CLI code.
    pub fn from_config_file(config: &ConfigFile) -> Self {
        let ttl = match config.cache.ttl_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        let service = ServiceConfig::default()
            .with_index_zoom(config.tiles.index_zoom)
            .with_poll_interval(Duration::from_millis(config.generation.poll_interval_ms))
            .with_max_wait(Duration::from_secs(config.generation.max_wait_secs))
            .with_tile_cache(
                CacheConfig::tiles()
                    .with_max_entries(config.cache.tile_entries)
                    .with_ttl(ttl)
                    .with_log_hits_misses(config.cache.log_hits_misses),
            )
            .with_network_cache(
                CacheConfig::networks()
                    .with_max_entries(config.cache.network_entries)
                    .with_ttl(ttl)
                    .with_log_hits_misses(config.cache.log_hits_misses),
            );

        Self {
            service,
            server: ServerAppConfig {
                bind: config.server.bind.clone(),
                port: config.server.port,
            },
            overpass: OverpassAppConfig {
                url: config.overpass.url.clone(),
                timeout_secs: config.overpass.timeout_secs,
            },
        }
    }

    /// Set the listen address.
    pub fn with_server(mut self, bind: impl Into<String>, port: u16) -> Self {
        self.server = ServerAppConfig {
            bind: bind.into(),
            port,
        };
        self
    }

    /// Set the Overpass base URL.
    pub fn with_overpass_url(mut self, url: impl Into<String>) -> Self {
        self.overpass.url = url.into();
        self
    }
}
