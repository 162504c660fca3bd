//! Street networks derived from raw map data.
//!
//! A [`StreetNetwork`] is computed once per index tile and then shared
//! read-only (behind an `Arc`) by every tile encoded from it. It holds one
//! [`FeatureCollection`] per [`TileLayer`].
//!
//! The network cache stores [`NetworkEntry`] values: either a finished
//! network or the marker that some task is currently generating it.

mod deriver;
mod feature;
mod osm;

pub use deriver::{DeriveError, NetworkDeriver};
pub use feature::{Feature, FeatureCollection};
pub use osm::{lane_width_for, OsmNetworkDeriver};

use std::collections::HashMap;
use std::sync::Arc;

use crate::coord::TileCoord;
use crate::tile::TileLayer;

/// Derived street geometry for one index tile, grouped by layer.
#[derive(Debug, Clone, PartialEq)]
pub struct StreetNetwork {
    area: TileCoord,
    layers: HashMap<TileLayer, FeatureCollection>,
}

impl StreetNetwork {
    /// Creates a network for `area` with no layers.
    pub fn new(area: TileCoord) -> Self {
        Self {
            area,
            layers: HashMap::new(),
        }
    }

    /// Builder-style [`insert_layer`](Self::insert_layer).
    pub fn with_layer(mut self, layer: TileLayer, features: FeatureCollection) -> Self {
        self.insert_layer(layer, features);
        self
    }

    /// Sets the features of one layer, replacing any previous collection.
    pub fn insert_layer(&mut self, layer: TileLayer, features: FeatureCollection) {
        self.layers.insert(layer, features);
    }

    /// Features of one layer, `None` if the layer was never set.
    pub fn layer(&self, layer: TileLayer) -> Option<&FeatureCollection> {
        self.layers.get(&layer)
    }

    /// The index tile this network was derived for.
    pub fn area(&self) -> TileCoord {
        self.area
    }

    /// Total number of features across all layers.
    pub fn feature_count(&self) -> usize {
        self.layers.values().map(FeatureCollection::len).sum()
    }
}

/// Value stored in the network cache.
///
/// A missing key means nobody has started on the area yet.
#[derive(Debug, Clone)]
pub enum NetworkEntry {
    /// A task has claimed the key and is fetching/deriving the network.
    Generating,
    /// The network is available.
    Ready(Arc<StreetNetwork>),
}

impl NetworkEntry {
    pub fn is_generating(&self) -> bool {
        matches!(self, NetworkEntry::Generating)
    }
}
