//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use streettiles::app::AppError;
use streettiles::config::ConfigFileError;
use streettiles::coord::CoordError;
use streettiles::service::ServiceError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(ConfigFileError),
    /// Failed to create the Tokio runtime
    Runtime(std::io::Error),
    /// Invalid tile coordinate on the command line
    Coord(CoordError),
    /// Server failed to start or stopped with an error
    Serve(AppError),
    /// Tile could not be generated
    Tile(ServiceError),
    /// Failed to write output file
    FileWrite { path: String, error: std::io::Error },
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Serve(AppError::Bind { .. }) => {
                eprintln!();
                eprintln!("Common issues:");
                eprintln!("  1. Port already in use: pick another with --port or PORT");
                eprintln!("  2. Ports below 1024 need elevated privileges");
            }
            CliError::Tile(ServiceError::DataFetchFailure(_)) => {
                eprintln!();
                eprintln!("The Overpass API may be busy; retry later or set");
                eprintln!("[overpass] url in the config file to another instance.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::Runtime(e) => write!(f, "Failed to create Tokio runtime: {}", e),
            CliError::Coord(e) => write!(f, "Invalid tile: {}", e),
            CliError::Serve(e) => write!(f, "Tile server error: {}", e),
            CliError::Tile(e) => write!(f, "Failed to generate tile: {}", e),
            CliError::FileWrite { path, error } => {
                write!(f, "Failed to write file '{}': {}", path, error)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            CliError::Coord(e) => Some(e),
            CliError::Serve(e) => Some(e),
            CliError::Tile(e) => Some(e),
            CliError::FileWrite { error, .. } => Some(error),
            CliError::LoggingInit(_) => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<AppError> for CliError {
    fn from(e: AppError) -> Self {
        CliError::Serve(e)
    }
}

impl From<ServiceError> for CliError {
    fn from(e: ServiceError) -> Self {
        CliError::Tile(e)
    }
}

impl From<CoordError> for CliError {
    fn from(e: CoordError) -> Self {
        CliError::Coord(e)
    }
}
