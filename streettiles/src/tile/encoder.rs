//! Layered tile encoder.
//!
//! Slices each of the network's layers at the requested coordinate and
//! combines the slices into one binary tile.

use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;
use tracing::trace;

use super::index::{IndexOptions, TileIndex, TileSlice};
use super::layers::TileLayer;
use super::writer::{MvtWriter, TileWriter};
use crate::coord::TileCoord;
use crate::network::{FeatureCollection, StreetNetwork};

/// Errors that can occur while encoding a tile.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    /// A layer is absent from the network or has no tile at the coordinate
    #[error("Layer '{layer}' has no tile for {coord}")]
    MissingLayer {
        layer: &'static str,
        coord: TileCoord,
    },

    /// The binary writer rejected the slices
    #[error("Vector tile encoding failed: {0}")]
    EncodingFailure(String),
}

/// Produces the slice of one layer's features for one tile.
pub trait LayerSlicer: Send + Sync {
    /// Returns `None` when no tile can be produced for `coord`.
    fn slice(
        &self,
        layer: TileLayer,
        features: &FeatureCollection,
        coord: TileCoord,
    ) -> Option<TileSlice>;
}

/// Slices layers through a freshly built [`TileIndex`].
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexSlicer {
    options: IndexOptions,
}

impl IndexSlicer {
    pub fn new(options: IndexOptions) -> Self {
        Self { options }
    }
}

impl LayerSlicer for IndexSlicer {
    fn slice(
        &self,
        _layer: TileLayer,
        features: &FeatureCollection,
        coord: TileCoord,
    ) -> Option<TileSlice> {
        TileIndex::new(features, self.options).tile(coord)
    }
}

/// Encodes every [`TileLayer`] of a street network into one tile.
///
/// Cheap to clone; the slicer and writer are shared.
#[derive(Clone)]
pub struct LayeredTileEncoder {
    slicer: Arc<dyn LayerSlicer>,
    writer: Arc<dyn TileWriter>,
}

impl LayeredTileEncoder {
    /// Encoder producing Mapbox Vector Tiles with the given index options.
    pub fn new(options: IndexOptions) -> Self {
        Self::with_parts(Arc::new(IndexSlicer::new(options)), Arc::new(MvtWriter::new()))
    }

    /// Encoder with a custom slicer and writer.
    pub fn with_parts(slicer: Arc<dyn LayerSlicer>, writer: Arc<dyn TileWriter>) -> Self {
        Self { slicer, writer }
    }

    /// Encodes `network` for the tile at `coord`.
    ///
    /// # Errors
    ///
    /// - [`EncodeError::MissingLayer`] if any layer is absent from the network
    ///   or yields no slice; no partial tile is produced
    /// - [`EncodeError::EncodingFailure`] if the writer fails
    pub fn encode(&self, network: &StreetNetwork, coord: TileCoord) -> Result<Bytes, EncodeError> {
        let mut slices = Vec::with_capacity(TileLayer::ALL.len());

        for layer in TileLayer::ALL {
            let missing = || EncodeError::MissingLayer {
                layer: layer.name(),
                coord,
            };
            let features = network.layer(layer).ok_or_else(missing)?;
            let slice = self
                .slicer
                .slice(layer, features, coord)
                .ok_or_else(missing)?;
            trace!(layer = layer.name(), tile = %coord, features = slice.len(), "Sliced layer");
            slices.push((layer, slice));
        }

        self.writer.write(&slices).map(Bytes::from)
    }
}

impl Default for LayeredTileEncoder {
    fn default() -> Self {
        Self::new(IndexOptions::default())
    }
}
