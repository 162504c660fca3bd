//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use std::path::PathBuf;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// HTTP server settings
    pub server: ServerSettings,
    /// Tile pipeline settings
    pub tiles: TileSettings,
    /// Network generation coordination
    pub generation: GenerationSettings,
    /// Cache sizing
    pub cache: CacheSettings,
    /// Overpass API settings
    pub overpass: OverpassSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// `[server]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerSettings {
    /// Address to bind, e.g. `0.0.0.0` or `127.0.0.1`
    pub bind: String,
    /// TCP port
    pub port: u16,
}

/// `[tiles]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct TileSettings {
    /// Zoom at which street networks are generated and cached
    pub index_zoom: u8,
}

/// `[generation]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    /// Poll interval while another request generates the same network
    pub poll_interval_ms: u64,
    /// Maximum time to wait before regenerating
    pub max_wait_secs: u64,
}

/// `[cache]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSettings {
    /// Maximum encoded tiles kept in memory
    pub tile_entries: u64,
    /// Maximum street networks kept in memory
    pub network_entries: u64,
    /// Entry time-to-live in seconds; 0 disables expiry
    pub ttl_secs: u64,
    /// Log every cache lookup with the running hit ratio
    pub log_hits_misses: bool,
}

/// `[overpass]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct OverpassSettings {
    /// Base URL of the Overpass API instance
    pub url: String,
    /// Server-side query timeout in seconds
    pub timeout_secs: u32,
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Directory for the log file
    pub directory: PathBuf,
    /// Log file name
    pub file: String,
}
