//! Default values for every configuration setting.

use std::path::PathBuf;

use super::file::config_directory;
use super::settings::*;
use crate::cache::{DEFAULT_CACHE_TTL, DEFAULT_NETWORK_CACHE_ENTRIES, DEFAULT_TILE_CACHE_ENTRIES};
use crate::provider::{DEFAULT_OVERPASS_URL, DEFAULT_QUERY_TIMEOUT_SECS};
use crate::service::{DEFAULT_INDEX_ZOOM, DEFAULT_MAX_WAIT, DEFAULT_POLL_INTERVAL};

/// Default bind address (all interfaces).
pub const DEFAULT_BIND: &str = "0.0.0.0";

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 3000;

/// Environment variable that overrides `[server] port`.
pub const PORT_ENV_VAR: &str = "PORT";

/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "streettiles.log";

/// Default log directory (~/.streettiles/logs).
pub fn default_log_directory() -> PathBuf {
    config_directory().join("logs")
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                bind: DEFAULT_BIND.to_string(),
                port: DEFAULT_PORT,
            },
            tiles: TileSettings {
                index_zoom: DEFAULT_INDEX_ZOOM,
            },
            generation: GenerationSettings {
                poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
                max_wait_secs: DEFAULT_MAX_WAIT.as_secs(),
            },
            cache: CacheSettings {
                tile_entries: DEFAULT_TILE_CACHE_ENTRIES,
                network_entries: DEFAULT_NETWORK_CACHE_ENTRIES,
                ttl_secs: DEFAULT_CACHE_TTL.as_secs(),
                log_hits_misses: false,
            },
            overpass: OverpassSettings {
                url: DEFAULT_OVERPASS_URL.to_string(),
                timeout_secs: DEFAULT_QUERY_TIMEOUT_SECS,
            },
            logging: LoggingSettings {
                directory: default_log_directory(),
                file: DEFAULT_LOG_FILE.to_string(),
            },
        }
    }
}
