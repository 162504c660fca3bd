//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use std::path::PathBuf;
use std::str::FromStr;

use ini::Ini;

use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::coord::MAX_ZOOM;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [server] section
    if let Some(section) = ini.section(Some("server")) {
        if let Some(v) = section.get("bind") {
            let v = v.trim();
            if !v.is_empty() {
                config.server.bind = v.to_string();
            }
        }
        if let Some(v) = section.get("port") {
            config.server.port = parse_number(
                "server",
                "port",
                v,
                "must be a port number (0-65535)",
            )?;
        }
    }

    // [tiles] section
    if let Some(section) = ini.section(Some("tiles")) {
        if let Some(v) = section.get("index_zoom") {
            let zoom: u8 = parse_number("tiles", "index_zoom", v, "must be a zoom level")?;
            if zoom > MAX_ZOOM {
                return Err(invalid(
                    "tiles",
                    "index_zoom",
                    v,
                    &format!("must be at most {}", MAX_ZOOM),
                ));
            }
            config.tiles.index_zoom = zoom;
        }
    }

    // [generation] section
    if let Some(section) = ini.section(Some("generation")) {
        if let Some(v) = section.get("poll_interval_ms") {
            config.generation.poll_interval_ms = parse_positive(
                "generation",
                "poll_interval_ms",
                v,
                "must be a positive integer (milliseconds)",
            )?;
        }
        if let Some(v) = section.get("max_wait_secs") {
            config.generation.max_wait_secs = parse_positive(
                "generation",
                "max_wait_secs",
                v,
                "must be a positive integer (seconds)",
            )?;
        }
    }

    // [cache] section
    if let Some(section) = ini.section(Some("cache")) {
        if let Some(v) = section.get("tile_entries") {
            config.cache.tile_entries =
                parse_positive("cache", "tile_entries", v, "must be a positive integer")?;
        }
        if let Some(v) = section.get("network_entries") {
            config.cache.network_entries =
                parse_positive("cache", "network_entries", v, "must be a positive integer")?;
        }
        if let Some(v) = section.get("ttl_secs") {
            config.cache.ttl_secs = parse_number(
                "cache",
                "ttl_secs",
                v,
                "must be a non-negative integer (seconds, 0 disables expiry)",
            )?;
        }
        if let Some(v) = section.get("log_hits_misses") {
            config.cache.log_hits_misses = parse_bool(v);
        }
    }

    // [overpass] section
    if let Some(section) = ini.section(Some("overpass")) {
        if let Some(v) = section.get("url") {
            let v = v.trim();
            if !(v.starts_with("http://") || v.starts_with("https://")) {
                return Err(invalid(
                    "overpass",
                    "url",
                    v,
                    "must start with http:// or https://",
                ));
            }
            config.overpass.url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = section.get("timeout_secs") {
            config.overpass.timeout_secs = parse_positive(
                "overpass",
                "timeout_secs",
                v,
                "must be a positive integer (seconds)",
            )?;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.directory = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = v.to_string();
            }
        }
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_number<T: FromStr>(
    section: &str,
    key: &str,
    value: &str,
    reason: &str,
) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, reason))
}

fn parse_positive<T>(section: &str, key: &str, value: &str, reason: &str) -> Result<T, ConfigFileError>
where
    T: FromStr + PartialOrd + Default,
{
    let parsed: T = parse_number(section, key, value, reason)?;
    if parsed <= T::default() {
        return Err(invalid(section, key, value, reason));
    }
    Ok(parsed)
}

pub(super) fn parse_bool(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    v == "true" || v == "1" || v == "yes" || v == "on"
}

pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::*;
    use tempfile::TempDir;

    fn load(content: &str) -> Result<ConfigFile, ConfigFileError> {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");
        std::fs::write(&config_path, content).unwrap();
        ConfigFile::load_from(&config_path)
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = load(
            r#"
[server]
port = 8080
"#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.bind, DEFAULT_BIND);
        assert_eq!(config.tiles.index_zoom, 16);
    }

    #[test]
    fn test_all_sections() {
        let config = load(
            r#"
[server]
bind = 127.0.0.1
port = 9000

[tiles]
index_zoom = 15

[generation]
poll_interval_ms = 100
max_wait_secs = 30

[cache]
tile_entries = 500
network_entries = 20
ttl_secs = 0
log_hits_misses = yes

[overpass]
url = https://overpass-api.de/
timeout_secs = 60

[logging]
directory = /var/log/streettiles
file = tiles.log
"#,
        )
        .unwrap();

        assert_eq!(config.server.bind, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.tiles.index_zoom, 15);
        assert_eq!(config.generation.poll_interval_ms, 100);
        assert_eq!(config.generation.max_wait_secs, 30);
        assert_eq!(config.cache.tile_entries, 500);
        assert_eq!(config.cache.network_entries, 20);
        assert_eq!(config.cache.ttl_secs, 0);
        assert!(config.cache.log_hits_misses);
        assert_eq!(config.overpass.url, "https://overpass-api.de");
        assert_eq!(config.overpass.timeout_secs, 60);
        assert_eq!(config.logging.directory, PathBuf::from("/var/log/streettiles"));
        assert_eq!(config.logging.file, "tiles.log");
    }

    #[test]
    fn test_invalid_port() {
        let err = load("[server]\nport = 70000\n").unwrap_err();
        assert!(err.to_string().contains("server.port"));
        assert!(err.to_string().contains("70000"));
    }

    #[test]
    fn test_index_zoom_above_max() {
        let err = load("[tiles]\nindex_zoom = 25\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigFileError::InvalidValue { ref key, .. } if key == "index_zoom"
        ));
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        assert!(load("[generation]\npoll_interval_ms = 0\n").is_err());
    }

    #[test]
    fn test_zero_cache_entries_rejected() {
        assert!(load("[cache]\ntile_entries = 0\n").is_err());
        assert!(load("[cache]\nnetwork_entries = -5\n").is_err());
    }

    #[test]
    fn test_invalid_overpass_url() {
        let err = load("[overpass]\nurl = overpass.kumi.systems\n").unwrap_err();
        assert!(err.to_string().contains("http://"));
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("true"));
        assert!(parse_bool("1"));
        assert!(parse_bool("YES"));
        assert!(parse_bool(" on "));
        assert!(!parse_bool("false"));
        assert!(!parse_bool("nope"));
    }

    #[test]
    fn test_expand_tilde() {
        assert_eq!(expand_tilde("/abs/path"), PathBuf::from("/abs/path"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~/logs"), home.join("logs"));
        }
    }
}
