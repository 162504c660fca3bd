//! Tile command - generate a single tile to a file.

use std::path::PathBuf;
use std::time::Instant;

use streettiles::app::{build_service, AppConfig};
use streettiles::coord::TileCoord;
use tracing::info;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the tile command.
pub struct TileArgs {
    pub zoom: u8,
    pub x: u32,
    pub y: u32,
    pub output: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

/// Default output file name for a tile: `{zoom}_{x}_{y}.mvt`.
pub fn default_output(coord: TileCoord) -> PathBuf {
    PathBuf::from(format!("{}_{}_{}.mvt", coord.zoom, coord.x, coord.y))
}

/// Run the tile command.
pub fn run(args: TileArgs) -> Result<(), CliError> {
    let coord = TileCoord::new(args.zoom, args.x, args.y)?;

    let runner = CliRunner::new(args.config.as_deref())?;
    runner.log_startup("tile");

    let app_config = AppConfig::from_config_file(runner.config());
    let service = build_service(&app_config)?;

    println!("Generating tile {}", coord);
    println!("  Overpass: {}", app_config.overpass.url);
    println!();

    let start = Instant::now();
    let runtime = runner.runtime()?;
    let bytes = runtime.block_on(service.resolve_tile(coord))?;
    println!(
        "Generated {} bytes in {:.2}s",
        bytes.len(),
        start.elapsed().as_secs_f64()
    );

    let output = args.output.unwrap_or_else(|| default_output(coord));
    std::fs::write(&output, &bytes).map_err(|error| CliError::FileWrite {
        path: output.display().to_string(),
        error,
    })?;

    info!(path = %output.display(), bytes = bytes.len(), "Tile written");
    println!("Saved to {}", output.display());
    Ok(())
}
