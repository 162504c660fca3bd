//! User configuration stored in `~/.streettiles/config.ini`.
//!
//! [`ConfigFile`] mirrors the INI sections one struct per section. Missing
//! files and missing keys fall back to the library defaults, so an empty
//! config is always valid.

mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use defaults::{
    default_log_directory, DEFAULT_BIND, DEFAULT_LOG_FILE, DEFAULT_PORT, PORT_ENV_VAR,
};
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    CacheSettings, ConfigFile, GenerationSettings, LoggingSettings, OverpassSettings,
    ServerSettings, TileSettings,
};
