//! The fixed set of layers every tile carries.

use std::fmt;

/// A named feature layer of a street tile.
///
/// The wire names returned by [`TileLayer::name`] are part of the public
/// tile format and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TileLayer {
    /// Road centre lines and intersection points
    Geometry,
    /// Road surfaces buffered to their lane count
    LanePolygons,
    /// Lane dividers and centre lines
    LaneMarkings,
    /// Crossings and intersection areas
    IntersectionMarkings,
}

impl TileLayer {
    /// All layers in encoding order.
    pub const ALL: [TileLayer; 4] = [
        TileLayer::Geometry,
        TileLayer::LanePolygons,
        TileLayer::LaneMarkings,
        TileLayer::IntersectionMarkings,
    ];

    /// Layer name as written into the encoded tile.
    pub const fn name(self) -> &'static str {
        match self {
            TileLayer::Geometry => "geometry",
            TileLayer::LanePolygons => "lanePolygons",
            TileLayer::LaneMarkings => "laneMarkings",
            TileLayer::IntersectionMarkings => "intersectionMarkings",
        }
    }
}

impl fmt::Display for TileLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
