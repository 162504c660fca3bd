//! Init command - initialize configuration file.

use std::path::Path;

use streettiles::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Run the init command.
pub fn run(force: bool) -> Result<(), CliError> {
    let path = config_file_path();
    let written = write_default(&path, force)?;

    if written {
        println!("Configuration file: {}", path.display());
        println!();
        println!("Edit this file to customize StreetTiles settings.");
        println!("CLI arguments override config file values when specified.");
    } else {
        println!("Configuration file already exists: {}", path.display());
        println!("Use --force to overwrite it with defaults.");
    }
    Ok(())
}

/// Writes the default configuration to `path`.
///
/// Returns `false` without touching the file if it exists and `force` is
/// not set.
fn write_default(path: &Path, force: bool) -> Result<bool, CliError> {
    if path.exists() && !force {
        return Ok(false);
    }
    ConfigFile::default().save_to(path)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_writes_loadable_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.ini");

        assert!(write_default(&path, false).unwrap());
        assert_eq!(ConfigFile::load_from(&path).unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_keeps_existing_file_without_force() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.ini");
        std::fs::write(&path, "[server]\nport = 9999\n").unwrap();

        assert!(!write_default(&path, false).unwrap());
        assert_eq!(ConfigFile::load_from(&path).unwrap().server.port, 9999);

        assert!(write_default(&path, true).unwrap());
        assert_eq!(
            ConfigFile::load_from(&path).unwrap().server.port,
            ConfigFile::default().server.port
        );
    }
}
