//! CLI runner for common setup.
//!
//! Encapsulates config loading, logging initialization and runtime creation
//! so every command handler starts the same way.

use std::path::Path;

use streettiles::config::{config_file_path, ConfigFile};
use streettiles::logging::{init_logging, LoggingGuard};
use tokio::runtime::Runtime;
use tracing::info;

use crate::error::CliError;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Keeps the log writer alive while the runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration (file values plus environment overrides)
    config: ConfigFile,
}

impl CliRunner {
    /// Loads configuration and initializes logging.
    ///
    /// `config_path` overrides the default `~/.streettiles/config.ini`.
    pub fn new(config_path: Option<&Path>) -> Result<Self, CliError> {
        let config = load_config(config_path)?;

        let logging_guard = init_logging(&config.logging.directory, &config.logging.file)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("StreetTiles v{}", streettiles::VERSION);
        info!("StreetTiles CLI: {} command", command);
    }

    /// Creates the multi-threaded runtime commands run on.
    pub fn runtime(&self) -> Result<Runtime, CliError> {
        Runtime::new().map_err(CliError::Runtime)
    }
}

/// Loads the config file and applies environment overrides.
pub fn load_config(config_path: Option<&Path>) -> Result<ConfigFile, CliError> {
    let config = match config_path {
        Some(path) => ConfigFile::load_from(path)?,
        None => ConfigFile::load_from(&config_file_path())?,
    };
    Ok(config.with_process_env()?)
}
