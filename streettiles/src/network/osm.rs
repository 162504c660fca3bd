//! Street network derivation from Overpass JSON.
//!
//! Roads are OSM ways carrying a `highway` tag. Each road contributes its
//! centre line, a lane surface polygon and lane markings; nodes shared by
//! two or more roads become intersections.
//!
//! Offsets are computed in a local equirectangular frame (metres east and
//! north of the road's first vertex), which is accurate enough at the size
//! of a single index tile.

use std::collections::{HashMap, HashSet};

use geo_types::{Coord, LineString, Point, Polygon};
use serde::Deserialize;
use tracing::debug;

use super::deriver::{DeriveError, NetworkDeriver};
use super::feature::{Feature, FeatureCollection};
use super::StreetNetwork;
use crate::coord::TileCoord;
use crate::tile::TileLayer;

/// Metres per degree of latitude (and of longitude at the equator).
const METRES_PER_DEGREE: f64 = 111_320.0;

/// Longest miter, as a multiple of the offset distance, at sharp bends.
const MAX_MITER_SCALE: f64 = 2.0;

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<Element>,
    #[serde(default)]
    remark: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Element {
    Node {
        id: i64,
        lat: f64,
        lon: f64,
        #[serde(default)]
        tags: HashMap<String, String>,
    },
    Way {
        id: i64,
        #[serde(default)]
        nodes: Vec<i64>,
        #[serde(default)]
        tags: HashMap<String, String>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RoadClass {
    Major,
    Minor,
    Path,
}

impl RoadClass {
    fn from_highway(highway: &str) -> Option<Self> {
        let base = highway.strip_suffix("_link").unwrap_or(highway);
        match base {
            "motorway" | "trunk" | "primary" | "secondary" | "tertiary" => Some(RoadClass::Major),
            "residential" | "unclassified" | "service" | "living_street" | "road" | "busway" => {
                Some(RoadClass::Minor)
            }
            "footway" | "path" | "cycleway" | "pedestrian" | "steps" | "track" | "bridleway" => {
                Some(RoadClass::Path)
            }
            _ => None,
        }
    }

    fn lane_width(self) -> f64 {
        match self {
            RoadClass::Major => 3.5,
            RoadClass::Minor => 3.0,
            RoadClass::Path => 2.0,
        }
    }
}

/// Width of one lane in metres for an OSM `highway` value.
///
/// Unknown classes get the width of a minor road.
pub fn lane_width_for(highway: &str) -> f64 {
    RoadClass::from_highway(highway)
        .unwrap_or(RoadClass::Minor)
        .lane_width()
}

struct Road {
    id: i64,
    highway: String,
    name: Option<String>,
    class: RoadClass,
    lanes: u32,
    oneway: bool,
    node_ids: Vec<i64>,
    coords: Vec<Coord<f64>>,
}

impl Road {
    fn lane_width(&self) -> f64 {
        self.class.lane_width()
    }

    fn half_width(&self) -> f64 {
        self.lanes as f64 * self.lane_width() / 2.0
    }
}

/// Derives street networks from Overpass API JSON (`[out:json]`).
#[derive(Debug, Clone, Default)]
pub struct OsmNetworkDeriver;

impl OsmNetworkDeriver {
    pub fn new() -> Self {
        Self
    }
}

impl NetworkDeriver for OsmNetworkDeriver {
    fn derive(&self, area: TileCoord, raw: &[u8]) -> Result<StreetNetwork, DeriveError> {
        let response: OverpassResponse =
            serde_json::from_slice(raw).map_err(|e| DeriveError::Malformed(e.to_string()))?;

        let mut nodes = HashMap::new();
        let mut crossings = Vec::new();
        let mut ways = Vec::new();

        for element in response.elements {
            match element {
                Element::Node { id, lat, lon, tags } => {
                    let coord = Coord { x: lon, y: lat };
                    if is_crossing(&tags) {
                        crossings.push((id, coord, tags.get("crossing").cloned()));
                    }
                    nodes.insert(id, coord);
                }
                Element::Way { id, nodes, tags } => ways.push((id, nodes, tags)),
                Element::Other => {}
            }
        }

        if nodes.is_empty() {
            if let Some(remark) = response.remark {
                return Err(DeriveError::Malformed(format!("Overpass reported: {}", remark)));
            }
            return Err(DeriveError::EmptyInput(area));
        }

        let roads: Vec<Road> = ways
            .into_iter()
            .filter_map(|(id, node_ids, tags)| build_road(id, node_ids, tags, &nodes))
            .collect();
        let intersections = find_intersections(&roads, &nodes);

        let network = StreetNetwork::new(area)
            .with_layer(TileLayer::Geometry, geometry_layer(&roads, &intersections))
            .with_layer(TileLayer::LanePolygons, lane_polygon_layer(&roads))
            .with_layer(TileLayer::LaneMarkings, lane_marking_layer(&roads))
            .with_layer(
                TileLayer::IntersectionMarkings,
                intersection_marking_layer(&crossings, &intersections),
            );

        debug!(
            area = %area,
            nodes = nodes.len(),
            roads = roads.len(),
            intersections = intersections.len(),
            features = network.feature_count(),
            "Derived street network"
        );
        Ok(network)
    }
}

fn is_crossing(tags: &HashMap<String, String>) -> bool {
    tags.get("highway").map(String::as_str) == Some("crossing")
        || tags.get("railway").map(String::as_str) == Some("crossing")
}

fn build_road(
    id: i64,
    node_ids: Vec<i64>,
    tags: HashMap<String, String>,
    nodes: &HashMap<i64, Coord<f64>>,
) -> Option<Road> {
    let highway = tags.get("highway")?;
    let class = RoadClass::from_highway(highway)?;

    let mut kept_ids = Vec::with_capacity(node_ids.len());
    let mut coords: Vec<Coord<f64>> = Vec::with_capacity(node_ids.len());
    for node_id in node_ids {
        if let Some(&coord) = nodes.get(&node_id) {
            if coords.last() != Some(&coord) {
                coords.push(coord);
                kept_ids.push(node_id);
            }
        }
    }
    if coords.len() < 2 {
        return None;
    }

    let oneway = matches!(
        tags.get("oneway").map(String::as_str),
        Some("yes" | "true" | "1" | "-1")
    ) || tags.get("junction").map(String::as_str) == Some("roundabout")
        || highway == "motorway";

    let default_lanes = match class {
        RoadClass::Path => 1,
        _ if oneway => 1,
        _ => 2,
    };
    let lanes = tags
        .get("lanes")
        .and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|&n| n > 0)
        .unwrap_or(default_lanes);

    Some(Road {
        id,
        highway: highway.clone(),
        name: tags.get("name").cloned(),
        class,
        lanes,
        oneway,
        node_ids: kept_ids,
        coords,
    })
}

struct Intersection {
    node_id: i64,
    coord: Coord<f64>,
    degree: usize,
    half_width: f64,
}

/// Nodes shared by at least two roads, in node id order.
fn find_intersections(roads: &[Road], nodes: &HashMap<i64, Coord<f64>>) -> Vec<Intersection> {
    let mut usage: HashMap<i64, (usize, f64)> = HashMap::new();
    for road in roads {
        let unique: HashSet<i64> = road.node_ids.iter().copied().collect();
        for node_id in unique {
            let entry = usage.entry(node_id).or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 = entry.1.max(road.half_width());
        }
    }

    let mut intersections: Vec<Intersection> = usage
        .into_iter()
        .filter(|(_, (degree, _))| *degree >= 2)
        .filter_map(|(node_id, (degree, half_width))| {
            nodes.get(&node_id).map(|&coord| Intersection {
                node_id,
                coord,
                degree,
                half_width,
            })
        })
        .collect();
    intersections.sort_by_key(|i| i.node_id);
    intersections
}

fn geometry_layer(roads: &[Road], intersections: &[Intersection]) -> FeatureCollection {
    let mut layer = FeatureCollection::new();

    for road in roads {
        let mut feature = Feature::new(LineString::from(road.coords.clone()))
            .with_property("osm_way_id", road.id)
            .with_property("highway", road.highway.as_str())
            .with_property("lanes", road.lanes)
            .with_property("oneway", road.oneway);
        if let Some(name) = &road.name {
            feature = feature.with_property("name", name.as_str());
        }
        layer.push(feature);
    }

    for intersection in intersections {
        layer.push(
            Feature::new(Point::from(intersection.coord))
                .with_property("kind", "intersection")
                .with_property("osm_node_id", intersection.node_id)
                .with_property("degree", intersection.degree as u64),
        );
    }

    layer
}

fn lane_polygon_layer(roads: &[Road]) -> FeatureCollection {
    roads
        .iter()
        .map(|road| {
            Feature::new(buffer_line(&road.coords, road.half_width()))
                .with_property("osm_way_id", road.id)
                .with_property("highway", road.highway.as_str())
                .with_property("lanes", road.lanes)
                .with_property("width", road.half_width() * 2.0)
        })
        .collect()
}

fn lane_marking_layer(roads: &[Road]) -> FeatureCollection {
    let mut layer = FeatureCollection::new();

    for road in roads.iter().filter(|r| r.class != RoadClass::Path) {
        let lane_width = road.lane_width();
        let half = road.half_width();

        for boundary in 1..road.lanes {
            // Positive offsets lie left of the direction of travel
            let offset = half - boundary as f64 * lane_width;
            let kind = if !road.oneway && road.lanes % 2 == 0 && boundary == road.lanes / 2 {
                "centre_line"
            } else {
                "lane_divider"
            };
            layer.push(
                Feature::new(LineString::from(offset_line(&road.coords, offset)))
                    .with_property("kind", kind)
                    .with_property("osm_way_id", road.id),
            );
        }
    }

    layer
}

fn intersection_marking_layer(
    crossings: &[(i64, Coord<f64>, Option<String>)],
    intersections: &[Intersection],
) -> FeatureCollection {
    let mut layer = FeatureCollection::new();

    for (node_id, coord, crossing_type) in crossings {
        let mut feature = Feature::new(Point::from(*coord))
            .with_property("kind", "crossing")
            .with_property("osm_node_id", *node_id);
        if let Some(crossing_type) = crossing_type {
            feature = feature.with_property("crossing", crossing_type.as_str());
        }
        layer.push(feature);
    }

    for intersection in intersections {
        layer.push(
            Feature::new(square_around(intersection.coord, intersection.half_width))
                .with_property("kind", "intersection_area")
                .with_property("osm_node_id", intersection.node_id)
                .with_property("degree", intersection.degree as u64),
        );
    }

    layer
}

/// Local metric frame anchored at a reference latitude.
#[derive(Clone, Copy)]
struct LocalFrame {
    metres_per_lon: f64,
    metres_per_lat: f64,
}

impl LocalFrame {
    fn at(lat: f64) -> Self {
        Self {
            metres_per_lon: METRES_PER_DEGREE * lat.to_radians().cos().max(1e-6),
            metres_per_lat: METRES_PER_DEGREE,
        }
    }

    fn to_metres(self, c: Coord<f64>) -> (f64, f64) {
        (c.x * self.metres_per_lon, c.y * self.metres_per_lat)
    }

    fn to_degrees(self, (x, y): (f64, f64)) -> Coord<f64> {
        Coord {
            x: x / self.metres_per_lon,
            y: y / self.metres_per_lat,
        }
    }
}

/// Shifts a polyline sideways by `distance` metres (positive = left).
///
/// Interior vertices are mitered, with the miter length capped at
/// [`MAX_MITER_SCALE`] times the distance.
fn offset_line(coords: &[Coord<f64>], distance: f64) -> Vec<Coord<f64>> {
    let Some(first) = coords.first() else {
        return Vec::new();
    };
    let frame = LocalFrame::at(first.y);
    let points: Vec<(f64, f64)> = coords.iter().map(|&c| frame.to_metres(c)).collect();

    let normals: Vec<(f64, f64)> = points
        .windows(2)
        .map(|w| {
            let (dx, dy) = (w[1].0 - w[0].0, w[1].1 - w[0].1);
            let len = dx.hypot(dy);
            if len == 0.0 {
                (0.0, 0.0)
            } else {
                (-dy / len, dx / len)
            }
        })
        .collect();

    points
        .iter()
        .enumerate()
        .map(|(i, &(x, y))| {
            let before = i.checked_sub(1).and_then(|j| normals.get(j)).copied();
            let after = normals.get(i).copied();
            let (nx, ny, scale) = match (before, after) {
                (Some(a), Some(b)) => miter(a, b),
                (Some(n), None) | (None, Some(n)) => (n.0, n.1, 1.0),
                (None, None) => (0.0, 0.0, 0.0),
            };
            frame.to_degrees((x + nx * distance * scale, y + ny * distance * scale))
        })
        .collect()
}

fn miter(a: (f64, f64), b: (f64, f64)) -> (f64, f64, f64) {
    let (sx, sy) = (a.0 + b.0, a.1 + b.1);
    let len = sx.hypot(sy);
    if len < 1e-9 {
        // Full reversal; fall back to the incoming normal
        return (a.0, a.1, 1.0);
    }
    let (nx, ny) = (sx / len, sy / len);
    let cos_half = nx * b.0 + ny * b.1;
    let scale = if cos_half > 1e-9 {
        (1.0 / cos_half).min(MAX_MITER_SCALE)
    } else {
        MAX_MITER_SCALE
    };
    (nx, ny, scale)
}

/// Buffers a polyline into a polygon `half_width` metres either side.
fn buffer_line(coords: &[Coord<f64>], half_width: f64) -> Polygon<f64> {
    let mut ring = offset_line(coords, half_width);
    ring.extend(offset_line(coords, -half_width).into_iter().rev());
    Polygon::new(LineString::from(ring), Vec::new())
}

/// Axis-aligned square with the given half side length in metres.
fn square_around(center: Coord<f64>, half_side: f64) -> Polygon<f64> {
    let frame = LocalFrame::at(center.y);
    let (cx, cy) = frame.to_metres(center);
    let corners = [
        (cx - half_side, cy - half_side),
        (cx + half_side, cy - half_side),
        (cx + half_side, cy + half_side),
        (cx - half_side, cy + half_side),
    ];
    Polygon::new(
        LineString::from(
            corners
                .into_iter()
                .map(|p| frame.to_degrees(p))
                .collect::<Vec<_>>(),
        ),
        Vec::new(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::Geometry;
    use serde_json::{json, Value};

    fn area() -> TileCoord {
        TileCoord {
            zoom: 16,
            x: 35205,
            y: 21489,
        }
    }

    /// Two crossing streets sharing node 3, plus a crossing node and a
    /// non-road way.
    fn sample_json() -> Vec<u8> {
        json!({
            "version": 0.6,
            "elements": [
                {"type": "node", "id": 1, "lat": 52.5000, "lon": 13.3900},
                {"type": "node", "id": 2, "lat": 52.5000, "lon": 13.3905},
                {"type": "node", "id": 3, "lat": 52.5000, "lon": 13.3910},
                {"type": "node", "id": 4, "lat": 52.5005, "lon": 13.3910},
                {"type": "node", "id": 5, "lat": 52.4995, "lon": 13.3910,
                 "tags": {"highway": "crossing", "crossing": "zebra"}},
                {"type": "node", "id": 6, "lat": 52.4990, "lon": 13.3900},
                {"type": "way", "id": 100, "nodes": [1, 2, 3],
                 "tags": {"highway": "primary", "name": "Hauptstrasse", "lanes": "4"}},
                {"type": "way", "id": 101, "nodes": [4, 3, 5],
                 "tags": {"highway": "residential", "oneway": "yes"}},
                {"type": "way", "id": 102, "nodes": [1, 6],
                 "tags": {"building": "yes"}},
                {"type": "relation", "id": 900, "members": []}
            ]
        })
        .to_string()
        .into_bytes()
    }

    fn derive_sample() -> StreetNetwork {
        OsmNetworkDeriver::new()
            .derive(area(), &sample_json())
            .unwrap()
    }

    fn kinds(collection: &FeatureCollection) -> Vec<String> {
        collection
            .iter()
            .filter_map(|f| f.property("kind").and_then(Value::as_str).map(String::from))
            .collect()
    }

    #[test]
    fn test_all_layers_present() {
        let network = derive_sample();
        assert_eq!(network.area(), area());
        for layer in TileLayer::ALL {
            assert!(network.layer(layer).is_some(), "missing {}", layer);
        }
    }

    #[test]
    fn test_geometry_layer_roads_and_intersections() {
        let network = derive_sample();
        let geometry = network.layer(TileLayer::Geometry).unwrap();

        let lines: Vec<_> = geometry
            .iter()
            .filter(|f| matches!(f.geometry, Geometry::LineString(_)))
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].property("osm_way_id"), Some(&json!(100)));
        assert_eq!(lines[0].property("name"), Some(&json!("Hauptstrasse")));
        assert_eq!(lines[0].property("lanes"), Some(&json!(4)));
        assert_eq!(lines[1].property("oneway"), Some(&json!(true)));
        assert_eq!(lines[1].property("lanes"), Some(&json!(1)));

        assert_eq!(kinds(geometry), vec!["intersection"]);
        let intersection = geometry
            .iter()
            .find(|f| f.property("kind").is_some())
            .unwrap();
        assert_eq!(intersection.property("osm_node_id"), Some(&json!(3)));
        assert_eq!(intersection.property("degree"), Some(&json!(2)));
    }

    #[test]
    fn test_lane_polygons_one_per_road() {
        let network = derive_sample();
        let polygons = network.layer(TileLayer::LanePolygons).unwrap();

        assert_eq!(polygons.len(), 2);
        assert!(polygons
            .iter()
            .all(|f| matches!(f.geometry, Geometry::Polygon(_))));
        assert_eq!(polygons.features[0].property("width"), Some(&json!(14.0)));
    }

    #[test]
    fn test_lane_markings_for_four_lane_two_way_road() {
        let network = derive_sample();
        let markings = network.layer(TileLayer::LaneMarkings).unwrap();

        // 4 lanes => 3 interior boundaries, the middle one is the centre line;
        // the one-lane residential road has none.
        assert_eq!(
            kinds(markings),
            vec!["lane_divider", "centre_line", "lane_divider"]
        );
    }

    #[test]
    fn test_intersection_markings() {
        let network = derive_sample();
        let markings = network.layer(TileLayer::IntersectionMarkings).unwrap();

        assert_eq!(kinds(markings), vec!["crossing", "intersection_area"]);
        assert_eq!(markings.features[0].property("crossing"), Some(&json!("zebra")));
    }

    #[test]
    fn test_centre_line_follows_road_when_offset_zero() {
        let coords = vec![
            Coord { x: 13.39, y: 52.5 },
            Coord { x: 13.391, y: 52.5 },
        ];
        let offset = offset_line(&coords, 0.0);
        assert_eq!(offset.len(), coords.len());
        for (a, b) in offset.iter().zip(&coords) {
            assert!((a.x - b.x).abs() < 1e-12 && (a.y - b.y).abs() < 1e-12);
        }
    }

    #[test]
    fn test_offset_left_of_eastbound_line_is_north() {
        let coords = vec![
            Coord { x: 13.39, y: 52.5 },
            Coord { x: 13.391, y: 52.5 },
        ];
        let left = offset_line(&coords, 10.0);
        let right = offset_line(&coords, -10.0);

        assert!(left.iter().all(|c| c.y > 52.5));
        assert!(right.iter().all(|c| c.y < 52.5));
        let metres = (left[0].y - 52.5) * METRES_PER_DEGREE;
        assert!((metres - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_square_around_is_centered() {
        let center = Coord { x: 13.39, y: 52.5 };
        let square = square_around(center, 5.0);
        let ring = square.exterior();

        // Closed ring of four corners
        assert_eq!(ring.0.len(), 5);
        let mean_x: f64 = ring.0[..4].iter().map(|c| c.x).sum::<f64>() / 4.0;
        let mean_y: f64 = ring.0[..4].iter().map(|c| c.y).sum::<f64>() / 4.0;
        assert!((mean_x - center.x).abs() < 1e-12);
        assert!((mean_y - center.y).abs() < 1e-12);
    }

    #[test]
    fn test_lane_width_by_class() {
        assert_eq!(lane_width_for("primary"), 3.5);
        assert_eq!(lane_width_for("primary_link"), 3.5);
        assert_eq!(lane_width_for("residential"), 3.0);
        assert_eq!(lane_width_for("footway"), 2.0);
        assert_eq!(lane_width_for("raceway"), 3.0);
    }

    #[test]
    fn test_no_nodes_is_empty_input() {
        let raw = json!({"elements": []}).to_string().into_bytes();
        assert_eq!(
            OsmNetworkDeriver::new().derive(area(), &raw),
            Err(DeriveError::EmptyInput(area()))
        );
    }

    #[test]
    fn test_overpass_remark_without_data_is_malformed() {
        let raw = json!({"elements": [], "remark": "runtime error: Query timed out"})
            .to_string()
            .into_bytes();
        assert!(matches!(
            OsmNetworkDeriver::new().derive(area(), &raw),
            Err(DeriveError::Malformed(msg)) if msg.contains("timed out")
        ));
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        assert!(matches!(
            OsmNetworkDeriver::new().derive(area(), b"<osm></osm>"),
            Err(DeriveError::Malformed(_))
        ));
    }

    #[test]
    fn test_nodes_without_roads_give_empty_layers() {
        let raw = json!({"elements": [{"type": "node", "id": 1, "lat": 1.0, "lon": 2.0}]})
            .to_string()
            .into_bytes();
        let network = OsmNetworkDeriver::new().derive(area(), &raw).unwrap();
        assert_eq!(network.feature_count(), 0);
        assert!(network.layer(TileLayer::Geometry).unwrap().is_empty());
    }
}
