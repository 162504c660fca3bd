//! Coordinate type definitions

use std::fmt;

use thiserror::Error;

/// Web Mercator valid latitude range
pub const MIN_LAT: f64 = -85.05112878;
pub const MAX_LAT: f64 = 85.05112878;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Zoom levels served by the tile pipeline.
///
/// 24 is the deepest level the per-layer tile index preserves detail for.
pub const MIN_ZOOM: u8 = 0;
pub const MAX_ZOOM: u8 = 24;

/// Tile coordinates in the Web Mercator / Slippy Map system.
///
/// Equality and hashing cover all three fields, so a `TileCoord` is used
/// directly as the key of both the tile cache and the network cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    /// Zoom level (0-24)
    pub zoom: u8,
    /// X coordinate (west-east), 0 at the antimeridian
    pub x: u32,
    /// Y coordinate (north-south), 0 at the north edge
    pub y: u32,
}

impl TileCoord {
    /// Creates a validated tile coordinate.
    ///
    /// # Errors
    ///
    /// - [`CoordError::InvalidZoom`] if `zoom > MAX_ZOOM`
    /// - [`CoordError::InvalidX`] / [`CoordError::InvalidY`] if the
    ///   coordinate lies outside `[0, 2^zoom)`
    pub fn new(zoom: u8, x: u32, y: u32) -> Result<Self, CoordError> {
        if zoom > MAX_ZOOM {
            return Err(CoordError::InvalidZoom(zoom));
        }
        let tiles = tiles_at_zoom(zoom);
        if x as u64 >= tiles {
            return Err(CoordError::InvalidX { x, zoom });
        }
        if y as u64 >= tiles {
            return Err(CoordError::InvalidY { y, zoom });
        }
        Ok(Self { zoom, x, y })
    }

    /// Geographic bounding box of this tile in degrees.
    #[inline]
    pub fn bounds(&self) -> TileBounds {
        TileBounds {
            west: super::tile_x_to_lon(self.x as f64, self.zoom),
            south: super::tile_y_to_lat(self.y as f64 + 1.0, self.zoom),
            east: super::tile_x_to_lon(self.x as f64 + 1.0, self.zoom),
            north: super::tile_y_to_lat(self.y as f64, self.zoom),
        }
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// Number of tiles along one axis at the given zoom level.
#[inline]
pub fn tiles_at_zoom(zoom: u8) -> u64 {
    1u64 << zoom
}

/// Geographic bounding box of a tile, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileBounds {
    /// Western-most longitude
    pub west: f64,
    /// Southern-most latitude
    pub south: f64,
    /// Eastern-most longitude
    pub east: f64,
    /// Northern-most latitude
    pub north: f64,
}

/// Errors that can occur when building or transforming tile coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordError {
    /// Zoom level is outside the supported range
    #[error("Invalid zoom level: {0} (must be between {MIN_ZOOM} and {MAX_ZOOM})")]
    InvalidZoom(u8),

    /// X is outside `[0, 2^zoom)`
    #[error("Invalid x: {x} is outside the tile grid at zoom {zoom}")]
    InvalidX { x: u32, zoom: u8 },

    /// Y is outside `[0, 2^zoom)`
    #[error("Invalid y: {y} is outside the tile grid at zoom {zoom}")]
    InvalidY { y: u32, zoom: u8 },

    /// Quantization only coarsens; the target is more detailed than the input
    #[error("Cannot zoom out from zoom {zoom} to the more detailed zoom {target_zoom}")]
    CannotZoomOut { zoom: u8, target_zoom: u8 },
}

impl CoordError {
    /// Name of the request field this error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            CoordError::InvalidZoom(_) | CoordError::CannotZoomOut { .. } => "zoom",
            CoordError::InvalidX { .. } => "x",
            CoordError::InvalidY { .. } => "y",
        }
    }
}
