//! Binary vector tile writers.

use mvt::{Feature as MvtFeature, GeomData, GeomEncoder, GeomType, Tile};
use serde_json::Value;

use super::encoder::EncodeError;
use super::index::{TileGeometry, TileSlice, DEFAULT_EXTENT};
use super::layers::TileLayer;

/// Serializes per-layer tile slices into one binary tile.
pub trait TileWriter: Send + Sync {
    /// Writes all `layers`, in order, into a single buffer.
    ///
    /// Either the whole tile is written or an error is returned.
    fn write(&self, layers: &[(TileLayer, TileSlice)]) -> Result<Vec<u8>, EncodeError>;
}

/// Mapbox Vector Tile (protobuf) writer.
///
/// Properties become tags: strings, booleans, integers and floats are
/// written with their native tag type; arrays and objects as their JSON
/// text. `null` values are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct MvtWriter;

impl MvtWriter {
    pub fn new() -> Self {
        Self
    }
}

impl TileWriter for MvtWriter {
    fn write(&self, layers: &[(TileLayer, TileSlice)]) -> Result<Vec<u8>, EncodeError> {
        let extent = layers
            .first()
            .map(|(_, slice)| slice.extent)
            .unwrap_or(DEFAULT_EXTENT);
        let mut tile = Tile::new(extent);

        for (layer, slice) in layers {
            let mut mvt_layer = tile.create_layer(layer.name());

            for feature in &slice.features {
                let Some(geometry) = encode_geometry(&feature.geometry)? else {
                    continue;
                };
                let mut mvt_feature = mvt_layer.into_feature(geometry);
                for (key, value) in &feature.properties {
                    add_tag(&mut mvt_feature, key, value);
                }
                mvt_layer = mvt_feature.into_layer();
            }

            tile.add_layer(mvt_layer).map_err(encoding_failure)?;
        }

        tile.to_bytes().map_err(encoding_failure)
    }
}

fn encoding_failure(e: mvt::Error) -> EncodeError {
    EncodeError::EncodingFailure(e.to_string())
}

fn encode_geometry(geometry: &TileGeometry) -> Result<Option<GeomData>, EncodeError> {
    let encoder = match geometry {
        TileGeometry::Points(points) => {
            if points.is_empty() {
                return Ok(None);
            }
            let mut encoder = GeomEncoder::new(GeomType::Point);
            for &(x, y) in points {
                encoder = encoder
                    .point(x as f64, y as f64)
                    .map_err(encoding_failure)?;
            }
            encoder
        }
        TileGeometry::LineStrings(lines) => {
            if lines.is_empty() {
                return Ok(None);
            }
            let mut encoder = GeomEncoder::new(GeomType::Linestring);
            for line in lines {
                for &(x, y) in line {
                    encoder = encoder
                        .point(x as f64, y as f64)
                        .map_err(encoding_failure)?;
                }
                encoder = encoder.complete().map_err(encoding_failure)?;
            }
            encoder
        }
        TileGeometry::Polygons(polygons) => {
            if polygons.is_empty() {
                return Ok(None);
            }
            let mut encoder = GeomEncoder::new(GeomType::Polygon);
            for ring in polygons.iter().flatten() {
                for &(x, y) in ring {
                    encoder = encoder
                        .point(x as f64, y as f64)
                        .map_err(encoding_failure)?;
                }
                encoder = encoder.complete().map_err(encoding_failure)?;
            }
            encoder
        }
    };

    encoder.encode().map(Some).map_err(encoding_failure)
}

fn add_tag(feature: &mut MvtFeature, key: &str, value: &Value) {
    match value {
        Value::Null => {}
        Value::Bool(b) => feature.add_tag_bool(key, *b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                feature.add_tag_sint(key, i);
            } else if let Some(u) = n.as_u64() {
                feature.add_tag_uint(key, u);
            } else if let Some(f) = n.as_f64() {
                feature.add_tag_double(key, f);
            }
        }
        Value::String(s) => feature.add_tag_string(key, s),
        Value::Array(_) | Value::Object(_) => feature.add_tag_string(key, &value.to_string()),
    }
}
