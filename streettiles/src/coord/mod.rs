//! Coordinate conversion module
//!
//! Provides tile coordinate quantization (mapping a detailed tile onto the
//! coarser "index" tile that contains it) and conversions between geographic
//! coordinates (latitude/longitude) and Web Mercator tile space.

mod types;

pub use types::{
    tiles_at_zoom, CoordError, TileBounds, TileCoord, MAX_LAT, MAX_LON, MAX_ZOOM, MIN_LAT,
    MIN_LON, MIN_ZOOM,
};

use std::f64::consts::PI;

/// Maps a tile onto the tile containing it at a coarser zoom level.
///
/// Each level descended halves `x` and `y` with floor division, so every
/// tile at `coord.zoom` lands in exactly one tile at `target_zoom`.
///
/// # Errors
///
/// Returns [`CoordError::CannotZoomOut`] if `target_zoom` is more detailed
/// than `coord.zoom`. Quantization only ever coarsens.
///
/// # Example
///
/// ```
/// use streettiles::coord::{quantize, TileCoord};
///
/// let tile = TileCoord { zoom: 17, x: 120587, y: 78648 };
/// let index = quantize(tile, 16).unwrap();
/// assert_eq!(index, TileCoord { zoom: 16, x: 60293, y: 39324 });
/// ```
#[inline]
pub fn quantize(coord: TileCoord, target_zoom: u8) -> Result<TileCoord, CoordError> {
    if coord.zoom < target_zoom {
        return Err(CoordError::CannotZoomOut {
            zoom: coord.zoom,
            target_zoom,
        });
    }

    let mut quantized = coord;
    while quantized.zoom > target_zoom {
        // Unsigned shift is floor division for all valid inputs
        quantized.x >>= 1;
        quantized.y >>= 1;
        quantized.zoom -= 1;
    }
    Ok(quantized)
}

/// Longitude of the western edge of tile column `x` (fractional allowed).
#[inline]
pub fn tile_x_to_lon(x: f64, zoom: u8) -> f64 {
    x / tiles_at_zoom(zoom) as f64 * 360.0 - 180.0
}

/// Latitude of the northern edge of tile row `y` (fractional allowed).
#[inline]
pub fn tile_y_to_lat(y: f64, zoom: u8) -> f64 {
    let n = PI - 2.0 * PI * y / tiles_at_zoom(zoom) as f64;
    n.sinh().atan().to_degrees()
}

/// Projects a longitude onto the unit Web Mercator square (0 = west edge).
#[inline]
pub fn lon_to_world_x(lon: f64) -> f64 {
    (lon + 180.0) / 360.0
}

/// Projects a latitude onto the unit Web Mercator square (0 = north edge).
#[inline]
pub fn lat_to_world_y(lat: f64) -> f64 {
    let lat = lat.clamp(MIN_LAT, MAX_LAT).to_radians();
    (1.0 - lat.tan().asinh() / PI) / 2.0
}
