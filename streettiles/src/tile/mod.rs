//! Vector tile encoding.
//!
//! This module turns a [`StreetNetwork`](crate::network::StreetNetwork)
//! into the binary tile served for one coordinate:
//!
//! 1. every [`TileLayer`] is sliced through a [`TileIndex`] (projection,
//!    clipping to the tile plus buffer, integer tile coordinates)
//! 2. the slices are written into one Mapbox Vector Tile by [`MvtWriter`]
//!
//! [`LayeredTileEncoder`] drives both steps and fails as a whole when any
//! layer is unavailable.

mod encoder;
mod index;
mod layers;
mod writer;

pub use encoder::{EncodeError, IndexSlicer, LayerSlicer, LayeredTileEncoder};
pub use index::{
    IndexOptions, TileFeature, TileGeometry, TileIndex, TilePoint, TileSlice, DEFAULT_BUFFER,
    DEFAULT_EXTENT, DEFAULT_INDEX_MAX_ZOOM,
};
pub use layers::TileLayer;
pub use writer::{MvtWriter, TileWriter};
