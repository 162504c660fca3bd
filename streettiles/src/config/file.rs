//! Configuration file handling for ~/.streettiles/config.ini.
//!
//! Loads and saves user configuration with sensible defaults.
//! Settings structs live in [`super::settings`], constants in [`super::defaults`],
//! parsing in [`super::parser`], and serialization in [`super::writer`].

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use super::defaults::PORT_ENV_VAR;
use super::settings::ConfigFile;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create config directory
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

impl ConfigFile {
    /// Load configuration from the default path (~/.streettiles/config.ini).
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Save configuration to the default path (~/.streettiles/config.ini).
    pub fn save(&self) -> Result<(), ConfigFileError> {
        self.save_to(&config_file_path())
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        let content = super::writer::to_config_string(self);
        std::fs::write(path, content).map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }

    /// Applies environment overrides read through `lookup`.
    ///
    /// Only `PORT` is recognised; it replaces `[server] port`.
    pub fn with_env_overrides<L>(mut self, lookup: L) -> Result<Self, ConfigFileError>
    where
        L: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup(PORT_ENV_VAR) {
            self.server.port = port.trim().parse().map_err(|_| ConfigFileError::InvalidValue {
                section: "env".to_string(),
                key: PORT_ENV_VAR.to_string(),
                value: port.clone(),
                reason: "must be a port number (0-65535)".to_string(),
            })?;
        }
        Ok(self)
    }

    /// Applies overrides from the process environment.
    pub fn with_process_env(self) -> Result<Self, ConfigFileError> {
        self.with_env_overrides(|name| std::env::var(name).ok())
    }
}

/// Get the path to the config directory (~/.streettiles).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".streettiles")
}

/// Get the path to the config file (~/.streettiles/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::*;

    #[test]
    fn test_default_config() {
        let config = ConfigFile::default();

        assert_eq!(config.server.bind, DEFAULT_BIND);
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.tiles.index_zoom, 16);
        assert_eq!(config.generation.poll_interval_ms, 250);
        assert_eq!(config.generation.max_wait_secs, 60);
        assert_eq!(config.cache.tile_entries, 100_000);
        assert_eq!(config.cache.network_entries, 1_000);
        assert_eq!(config.cache.ttl_secs, 86_400);
        assert!(!config.cache.log_hits_misses);
        assert_eq!(config.overpass.url, "https://overpass.kumi.systems");
        assert_eq!(config.overpass.timeout_secs, 180);
        assert_eq!(config.logging.file, DEFAULT_LOG_FILE);
    }

    #[test]
    fn test_load_nonexistent_returns_defaults() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.ini");

        let config = ConfigFile::load_from(&config_path).unwrap();

        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.ini");

        let mut config = ConfigFile::default();
        config.server.port = 8080;
        config.tiles.index_zoom = 15;
        config.cache.ttl_secs = 0;
        config.cache.log_hits_misses = true;
        config.overpass.url = "http://localhost:12345".to_string();
        config.logging.directory = temp_dir.path().join("logs");
        config.save_to(&config_path).unwrap();

        let loaded = ConfigFile::load_from(&config_path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_port_env_override() {
        let config = ConfigFile::default()
            .with_env_overrides(|name| (name == "PORT").then(|| "4000".to_string()))
            .unwrap();
        assert_eq!(config.server.port, 4000);

        let untouched = ConfigFile::default().with_env_overrides(|_| None).unwrap();
        assert_eq!(untouched.server.port, DEFAULT_PORT);
    }

    #[test]
    fn test_invalid_port_env_override() {
        let result = ConfigFile::default().with_env_overrides(|_| Some("http".to_string()));
        assert!(matches!(
            result,
            Err(ConfigFileError::InvalidValue { ref key, .. }) if key == "PORT"
        ));
    }

    #[test]
    fn test_config_paths() {
        assert!(config_file_path().ends_with(".streettiles/config.ini"));
        assert!(default_log_directory().ends_with(".streettiles/logs"));
    }
}
