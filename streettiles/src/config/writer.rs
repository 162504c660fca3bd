//! INI serialization logic for converting `ConfigFile` → INI string.
//!
//! Produces the commented representation written to `config.ini`. Every
//! key written here is read back by [`super::parser`].

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let log_hits_misses = if config.cache.log_hits_misses {
        "true"
    } else {
        "false"
    };

    format!(
        r#"[server]
; Address the HTTP server binds to (0.0.0.0 = all interfaces)
bind = {}
; TCP port; the PORT environment variable overrides this value
port = {}

[tiles]
; Zoom level at which street networks are generated and cached.
; Tiles requested at coarser zooms are rejected.
index_zoom = {}

[generation]
; How often a waiting request re-checks a network being generated elsewhere
poll_interval_ms = {}
; How long to wait for another request's generation before regenerating
max_wait_secs = {}

[cache]
; Maximum number of encoded tiles held in memory
tile_entries = {}
; Maximum number of derived street networks held in memory
network_entries = {}
; Entry time-to-live in seconds (0 = entries only leave through eviction)
ttl_secs = {}
; Log every cache lookup with the running hit ratio (true/false)
log_hits_misses = {}

[overpass]
; Overpass API instance used to fetch OpenStreetMap data
url = {}
; Server-side query timeout in seconds
timeout_secs = {}

[logging]
; Directory for the log file
directory = {}
; Log file name
file = {}
"#,
        config.server.bind,
        config.server.port,
        config.tiles.index_zoom,
        config.generation.poll_interval_ms,
        config.generation.max_wait_secs,
        config.cache.tile_entries,
        config.cache.network_entries,
        config.cache.ttl_secs,
        log_hits_misses,
        config.overpass.url,
        config.overpass.timeout_secs,
        path_to_string(&config.logging.directory),
        config.logging.file,
    )
}

fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
