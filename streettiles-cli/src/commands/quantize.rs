//! Quantize command - show the index tile a tile is generated from.

use streettiles::coord::{quantize, TileCoord};

use crate::error::CliError;

/// Arguments for the quantize command.
pub struct QuantizeArgs {
    pub zoom: u8,
    pub x: u32,
    pub y: u32,
    pub to: u8,
}

/// Run the quantize command.
pub fn run(args: QuantizeArgs) -> Result<(), CliError> {
    let quantized = quantize_args(&args)?;
    println!("{}", quantized);
    Ok(())
}

fn quantize_args(args: &QuantizeArgs) -> Result<TileCoord, CliError> {
    let coord = TileCoord::new(args.zoom, args.x, args.y)?;
    Ok(quantize(coord, args.to)?)
}
