//! Per-layer tile index.
//!
//! A [`TileIndex`] projects a layer's features into the unit Web Mercator
//! square once, then cuts out the part visible in any requested tile:
//! geometry is clipped to the tile plus a buffer and converted to integer
//! tile-local coordinates (`0..extent`, y pointing down).

use geo_types::{Coord, Geometry, LineString, Polygon};
use serde_json::{Map, Value};

use crate::coord::{lat_to_world_y, lon_to_world_x, tiles_at_zoom, TileCoord, MAX_ZOOM};
use crate::network::FeatureCollection;

/// Tile-local coordinate range.
pub const DEFAULT_EXTENT: u32 = 4096;

/// Extra tile-local units kept around each tile edge.
pub const DEFAULT_BUFFER: u32 = 64;

/// Deepest zoom the index produces tiles for.
pub const DEFAULT_INDEX_MAX_ZOOM: u8 = MAX_ZOOM;

/// Slicing parameters shared by every layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexOptions {
    pub max_zoom: u8,
    pub extent: u32,
    pub buffer: u32,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            max_zoom: DEFAULT_INDEX_MAX_ZOOM,
            extent: DEFAULT_EXTENT,
            buffer: DEFAULT_BUFFER,
        }
    }
}

/// A point in tile-local integer coordinates.
pub type TilePoint = (i32, i32);

/// Clipped geometry of one feature.
#[derive(Debug, Clone, PartialEq)]
pub enum TileGeometry {
    Points(Vec<TilePoint>),
    LineStrings(Vec<Vec<TilePoint>>),
    /// Each polygon is a list of open rings; the first is the exterior and
    /// has positive area in tile coordinates, holes have negative area.
    Polygons(Vec<Vec<Vec<TilePoint>>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TileFeature {
    pub geometry: TileGeometry,
    pub properties: Map<String, Value>,
}

/// The features of one layer visible in one tile.
#[derive(Debug, Clone, PartialEq)]
pub struct TileSlice {
    pub coord: TileCoord,
    pub extent: u32,
    pub features: Vec<TileFeature>,
}

impl TileSlice {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

type WorldPoint = (f64, f64);

enum WorldGeometry {
    Points(Vec<WorldPoint>),
    Lines(Vec<Vec<WorldPoint>>),
    Polygons(Vec<Vec<Vec<WorldPoint>>>),
}

#[derive(Debug, Clone, Copy)]
struct WorldBox {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl WorldBox {
    fn empty() -> Self {
        Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    fn extend(&mut self, (x, y): WorldPoint) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    fn intersects(&self, other: &WorldBox) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }
}

struct IndexedFeature {
    geometry: WorldGeometry,
    properties: Map<String, Value>,
    bbox: WorldBox,
}

/// Projected features of one layer, ready to be sliced into tiles.
pub struct TileIndex {
    options: IndexOptions,
    features: Vec<IndexedFeature>,
}

impl TileIndex {
    /// Projects every feature of `collection`.
    ///
    /// Geometry collections are split into one indexed feature per member,
    /// each carrying the parent's properties.
    pub fn new(collection: &FeatureCollection, options: IndexOptions) -> Self {
        let mut features = Vec::with_capacity(collection.len());
        for feature in collection {
            project_into(&feature.geometry, &feature.properties, &mut features);
        }
        Self { options, features }
    }

    pub fn options(&self) -> IndexOptions {
        self.options
    }

    /// Number of indexed (projected) features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Cuts out the tile at `coord`.
    ///
    /// Returns `None` if `coord` is deeper than `max_zoom` or outside the
    /// tile grid. An in-range tile with no intersecting features yields an
    /// empty slice.
    pub fn tile(&self, coord: TileCoord) -> Option<TileSlice> {
        if coord.zoom > self.options.max_zoom {
            return None;
        }
        let tiles = tiles_at_zoom(coord.zoom);
        if coord.x as u64 >= tiles || coord.y as u64 >= tiles {
            return None;
        }

        let n = tiles as f64;
        let extent = self.options.extent as f64;
        let buffer = self.options.buffer as f64;
        let pad = buffer / extent;
        let clip_box = WorldBox {
            min_x: (coord.x as f64 - pad) / n,
            min_y: (coord.y as f64 - pad) / n,
            max_x: (coord.x as f64 + 1.0 + pad) / n,
            max_y: (coord.y as f64 + 1.0 + pad) / n,
        };
        let clipper = Clipper {
            n,
            origin_x: coord.x as f64,
            origin_y: coord.y as f64,
            extent,
            lo: -buffer,
            hi: extent + buffer,
        };

        let features = self
            .features
            .iter()
            .filter(|f| f.bbox.intersects(&clip_box))
            .filter_map(|f| {
                clipper.clip(&f.geometry).map(|geometry| TileFeature {
                    geometry,
                    properties: f.properties.clone(),
                })
            })
            .collect();

        Some(TileSlice {
            coord,
            extent: self.options.extent,
            features,
        })
    }
}

fn project(c: &Coord<f64>) -> WorldPoint {
    (lon_to_world_x(c.x), lat_to_world_y(c.y))
}

fn project_line(line: &LineString<f64>) -> Vec<WorldPoint> {
    line.0.iter().map(project).collect()
}

/// Projects a ring, dropping the closing vertex.
fn project_ring(ring: &LineString<f64>) -> Vec<WorldPoint> {
    let mut points = project_line(ring);
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    points
}

fn project_polygon(polygon: &Polygon<f64>) -> Vec<Vec<WorldPoint>> {
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(project_ring)
        .collect()
}

fn project_into(
    geometry: &Geometry<f64>,
    properties: &Map<String, Value>,
    out: &mut Vec<IndexedFeature>,
) {
    let projected = match geometry {
        Geometry::Point(p) => WorldGeometry::Points(vec![project(&p.0)]),
        Geometry::MultiPoint(mp) => WorldGeometry::Points(mp.0.iter().map(|p| project(&p.0)).collect()),
        Geometry::Line(l) => WorldGeometry::Lines(vec![vec![project(&l.start), project(&l.end)]]),
        Geometry::LineString(ls) => WorldGeometry::Lines(vec![project_line(ls)]),
        Geometry::MultiLineString(mls) => {
            WorldGeometry::Lines(mls.0.iter().map(project_line).collect())
        }
        Geometry::Polygon(p) => WorldGeometry::Polygons(vec![project_polygon(p)]),
        Geometry::MultiPolygon(mp) => {
            WorldGeometry::Polygons(mp.0.iter().map(project_polygon).collect())
        }
        Geometry::Rect(r) => WorldGeometry::Polygons(vec![project_polygon(&r.to_polygon())]),
        Geometry::Triangle(t) => WorldGeometry::Polygons(vec![project_polygon(&t.to_polygon())]),
        Geometry::GeometryCollection(gc) => {
            for member in &gc.0 {
                project_into(member, properties, out);
            }
            return;
        }
    };

    let mut bbox = WorldBox::empty();
    match &projected {
        WorldGeometry::Points(points) => points.iter().for_each(|&p| bbox.extend(p)),
        WorldGeometry::Lines(lines) => lines.iter().flatten().for_each(|&p| bbox.extend(p)),
        WorldGeometry::Polygons(polygons) => polygons
            .iter()
            .flatten()
            .flatten()
            .for_each(|&p| bbox.extend(p)),
    }

    out.push(IndexedFeature {
        geometry: projected,
        properties: properties.clone(),
        bbox,
    });
}

/// Transforms world points into one tile's local space and clips them to
/// `lo..=hi` on both axes.
struct Clipper {
    n: f64,
    origin_x: f64,
    origin_y: f64,
    extent: f64,
    lo: f64,
    hi: f64,
}

impl Clipper {
    fn to_tile(&self, (x, y): WorldPoint) -> (f64, f64) {
        (
            (x * self.n - self.origin_x) * self.extent,
            (y * self.n - self.origin_y) * self.extent,
        )
    }

    fn inside(&self, (x, y): (f64, f64)) -> bool {
        x >= self.lo && x <= self.hi && y >= self.lo && y <= self.hi
    }

    fn clip(&self, geometry: &WorldGeometry) -> Option<TileGeometry> {
        match geometry {
            WorldGeometry::Points(points) => {
                let kept: Vec<TilePoint> = points
                    .iter()
                    .map(|&p| self.to_tile(p))
                    .filter(|&p| self.inside(p))
                    .map(round)
                    .collect();
                (!kept.is_empty()).then_some(TileGeometry::Points(kept))
            }
            WorldGeometry::Lines(lines) => {
                let runs: Vec<Vec<TilePoint>> = lines
                    .iter()
                    .flat_map(|line| {
                        let local: Vec<_> = line.iter().map(|&p| self.to_tile(p)).collect();
                        clip_line(&local, self.lo, self.hi)
                    })
                    .filter_map(|run| snap_line(&run))
                    .collect();
                (!runs.is_empty()).then_some(TileGeometry::LineStrings(runs))
            }
            WorldGeometry::Polygons(polygons) => {
                let kept: Vec<Vec<Vec<TilePoint>>> = polygons
                    .iter()
                    .filter_map(|rings| self.clip_polygon(rings))
                    .collect();
                (!kept.is_empty()).then_some(TileGeometry::Polygons(kept))
            }
        }
    }

    fn clip_polygon(&self, rings: &[Vec<WorldPoint>]) -> Option<Vec<Vec<TilePoint>>> {
        let mut clipped = Vec::with_capacity(rings.len());
        for (i, ring) in rings.iter().enumerate() {
            let local: Vec<_> = ring.iter().map(|&p| self.to_tile(p)).collect();
            let snapped = snap_ring(&clip_ring(&local, self.lo, self.hi));
            match snapped {
                Some(ring) => clipped.push(orient(ring, i == 0)),
                // Without an exterior there is nothing to keep
                None if i == 0 => return None,
                None => {}
            }
        }
        Some(clipped)
    }
}

fn round((x, y): (f64, f64)) -> TilePoint {
    (x.round() as i32, y.round() as i32)
}

fn snap(points: &[(f64, f64)]) -> Vec<TilePoint> {
    let mut out: Vec<TilePoint> = Vec::with_capacity(points.len());
    for &p in points {
        let p = round(p);
        if out.last() != Some(&p) {
            out.push(p);
        }
    }
    out
}

fn snap_line(points: &[(f64, f64)]) -> Option<Vec<TilePoint>> {
    let line = snap(points);
    (line.len() >= 2).then_some(line)
}

fn snap_ring(points: &[(f64, f64)]) -> Option<Vec<TilePoint>> {
    let mut ring = snap(points);
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    (ring.len() >= 3 && signed_area(&ring) != 0).then_some(ring)
}

/// Twice the signed area (surveyor's formula) in tile coordinates.
fn signed_area(ring: &[TilePoint]) -> i64 {
    let mut sum = 0i64;
    for (i, &(x1, y1)) in ring.iter().enumerate() {
        let (x2, y2) = ring[(i + 1) % ring.len()];
        sum += x1 as i64 * y2 as i64 - x2 as i64 * y1 as i64;
    }
    sum
}

fn orient(mut ring: Vec<TilePoint>, exterior: bool) -> Vec<TilePoint> {
    let positive = signed_area(&ring) > 0;
    if positive != exterior {
        ring.reverse();
    }
    ring
}

/// Clips a segment to the square `lo..=hi` (Liang-Barsky).
///
/// Unclipped endpoints are returned bit-identical, which `clip_line` relies
/// on to tell continuing runs from re-entries.
fn clip_segment(
    a: (f64, f64),
    b: (f64, f64),
    lo: f64,
    hi: f64,
) -> Option<((f64, f64), (f64, f64))> {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;

    for (p, q) in [(-dx, a.0 - lo), (dx, hi - a.0), (-dy, a.1 - lo), (dy, hi - a.1)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    let start = if t0 == 0.0 {
        a
    } else {
        (a.0 + t0 * dx, a.1 + t0 * dy)
    };
    let end = if t1 == 1.0 {
        b
    } else {
        (a.0 + t1 * dx, a.1 + t1 * dy)
    };
    Some((start, end))
}

/// Clips a polyline into the runs that lie inside the square.
fn clip_line(points: &[(f64, f64)], lo: f64, hi: f64) -> Vec<Vec<(f64, f64)>> {
    fn flush(current: &mut Vec<(f64, f64)>, runs: &mut Vec<Vec<(f64, f64)>>) {
        if current.len() >= 2 {
            runs.push(std::mem::take(current));
        } else {
            current.clear();
        }
    }

    if points.len() == 1 {
        return Vec::new();
    }

    let mut runs = Vec::new();
    let mut current = Vec::new();

    for w in points.windows(2) {
        match clip_segment(w[0], w[1], lo, hi) {
            Some((start, end)) => {
                if start != w[0] {
                    flush(&mut current, &mut runs);
                }
                if current.is_empty() {
                    current.push(start);
                }
                current.push(end);
                if end != w[1] {
                    flush(&mut current, &mut runs);
                }
            }
            None => flush(&mut current, &mut runs),
        }
    }
    flush(&mut current, &mut runs);
    runs
}

#[derive(Clone, Copy)]
enum Edge {
    Left(f64),
    Right(f64),
    Top(f64),
    Bottom(f64),
}

impl Edge {
    fn inside(self, (x, y): (f64, f64)) -> bool {
        match self {
            Edge::Left(v) => x >= v,
            Edge::Right(v) => x <= v,
            Edge::Top(v) => y >= v,
            Edge::Bottom(v) => y <= v,
        }
    }

    fn intersect(self, a: (f64, f64), b: (f64, f64)) -> (f64, f64) {
        match self {
            Edge::Left(v) | Edge::Right(v) => {
                let t = (v - a.0) / (b.0 - a.0);
                (v, a.1 + t * (b.1 - a.1))
            }
            Edge::Top(v) | Edge::Bottom(v) => {
                let t = (v - a.1) / (b.1 - a.1);
                (a.0 + t * (b.0 - a.0), v)
            }
        }
    }
}

/// Clips an open ring to the square `lo..=hi` (Sutherland-Hodgman).
fn clip_ring(ring: &[(f64, f64)], lo: f64, hi: f64) -> Vec<(f64, f64)> {
    let mut output = ring.to_vec();

    for edge in [Edge::Left(lo), Edge::Right(hi), Edge::Top(lo), Edge::Bottom(hi)] {
        let Some(&last) = output.last() else {
            break;
        };
        let input = std::mem::take(&mut output);
        let mut prev = last;
        for &current in &input {
            match (edge.inside(prev), edge.inside(current)) {
                (true, true) => output.push(current),
                (true, false) => output.push(edge.intersect(prev, current)),
                (false, true) => {
                    output.push(edge.intersect(prev, current));
                    output.push(current);
                }
                (false, false) => {}
            }
            prev = current;
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::Feature;
    use geo_types::{line_string, point, polygon};
    use serde_json::json;

    fn collection(features: Vec<Feature>) -> FeatureCollection {
        features.into_iter().collect()
    }

    fn north_west_quadrant() -> TileCoord {
        TileCoord { zoom: 1, x: 0, y: 0 }
    }

    fn index(features: Vec<Feature>) -> TileIndex {
        TileIndex::new(&collection(features), IndexOptions::default())
    }

    #[test]
    fn test_default_options() {
        let options = IndexOptions::default();
        assert_eq!(options.extent, 4096);
        assert_eq!(options.buffer, 64);
        assert_eq!(options.max_zoom, 24);
    }

    #[test]
    fn test_no_tile_beyond_max_zoom() {
        let index = TileIndex::new(
            &collection(vec![]),
            IndexOptions {
                max_zoom: 18,
                ..IndexOptions::default()
            },
        );
        assert!(index.tile(TileCoord { zoom: 18, x: 0, y: 0 }).is_some());
        assert!(index.tile(TileCoord { zoom: 19, x: 0, y: 0 }).is_none());
    }

    #[test]
    fn test_no_tile_outside_grid() {
        let index = index(vec![]);
        assert!(index.tile(TileCoord { zoom: 1, x: 2, y: 0 }).is_none());
    }

    #[test]
    fn test_empty_slice_when_nothing_intersects() {
        let index = index(vec![Feature::new(point!(x: 90.0, y: -45.0))]);
        let slice = index.tile(north_west_quadrant()).unwrap();
        assert!(slice.is_empty());
        assert_eq!(slice.extent, DEFAULT_EXTENT);
        assert_eq!(slice.coord, north_west_quadrant());
    }

    #[test]
    fn test_point_inside_is_kept_with_properties() {
        let index = index(vec![
            Feature::new(point!(x: -90.0, y: 0.0)).with_property("kind", "crossing")
        ]);
        let slice = index.tile(north_west_quadrant()).unwrap();

        assert_eq!(slice.len(), 1);
        assert_eq!(slice.features[0].geometry, TileGeometry::Points(vec![(2048, 4096)]));
        assert_eq!(slice.features[0].properties["kind"], json!("crossing"));
    }

    #[test]
    fn test_line_clipped_at_buffer_edge() {
        let index = index(vec![Feature::new(
            line_string![(x: -90.0, y: 40.0), (x: 90.0, y: 40.0)],
        )]);
        let slice = index.tile(north_west_quadrant()).unwrap();

        let TileGeometry::LineStrings(lines) = &slice.features[0].geometry else {
            panic!("expected lines, got {:?}", slice.features[0].geometry);
        };
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].len(), 2);
        assert_eq!(lines[0][0].0, 2048);
        assert_eq!(lines[0][1].0, 4096 + 64);
        assert_eq!(lines[0][0].1, lines[0][1].1);
    }

    #[test]
    fn test_line_leaving_and_reentering_splits_into_runs() {
        let index = index(vec![Feature::new(line_string![
            (x: -135.0, y: 40.0),
            (x: 45.0, y: 40.0),
            (x: 45.0, y: 30.0),
            (x: -135.0, y: 30.0),
        ])]);
        let slice = index.tile(north_west_quadrant()).unwrap();

        let TileGeometry::LineStrings(lines) = &slice.features[0].geometry else {
            panic!("expected lines");
        };
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|run| run.len() == 2));
    }

    #[test]
    fn test_polygon_clipped_to_buffered_tile() {
        let index = index(vec![Feature::new(polygon![
            (x: -170.0, y: -80.0),
            (x: 170.0, y: -80.0),
            (x: 170.0, y: 80.0),
            (x: -170.0, y: 80.0),
        ])]);
        let slice = index.tile(north_west_quadrant()).unwrap();

        let TileGeometry::Polygons(polygons) = &slice.features[0].geometry else {
            panic!("expected polygons");
        };
        assert_eq!(polygons.len(), 1);
        let exterior = &polygons[0][0];
        assert_eq!(exterior.len(), 4);
        assert!(exterior
            .iter()
            .all(|&(x, y)| (-64..=4160).contains(&x) && (-64..=4160).contains(&y)));
        assert!(exterior.contains(&(4160, 4160)));
        assert!(signed_area(exterior) > 0);
    }

    #[test]
    fn test_exterior_orientation_is_normalised() {
        let clockwise = polygon![
            (x: -100.0, y: 10.0),
            (x: -100.0, y: 20.0),
            (x: -90.0, y: 20.0),
            (x: -90.0, y: 10.0),
        ];
        let counter_clockwise = polygon![
            (x: -100.0, y: 10.0),
            (x: -90.0, y: 10.0),
            (x: -90.0, y: 20.0),
            (x: -100.0, y: 20.0),
        ];
        let index = index(vec![Feature::new(clockwise), Feature::new(counter_clockwise)]);
        let slice = index.tile(north_west_quadrant()).unwrap();

        assert_eq!(slice.len(), 2);
        for feature in &slice.features {
            let TileGeometry::Polygons(polygons) = &feature.geometry else {
                panic!("expected polygons");
            };
            assert!(signed_area(&polygons[0][0]) > 0);
        }
    }

    #[test]
    fn test_polygon_outside_is_dropped() {
        let index = index(vec![Feature::new(polygon![
            (x: 100.0, y: -10.0),
            (x: 110.0, y: -10.0),
            (x: 110.0, y: -20.0),
        ])]);
        assert!(index.tile(north_west_quadrant()).unwrap().is_empty());
    }

    #[test]
    fn test_geometry_collection_is_split() {
        let gc = geo_types::GeometryCollection(vec![
            Geometry::Point(point!(x: -90.0, y: 10.0)),
            Geometry::LineString(line_string![(x: -90.0, y: 10.0), (x: -80.0, y: 10.0)]),
        ]);
        let index = index(vec![Feature::new(Geometry::GeometryCollection(gc)).with_property("id", 7)]);

        assert_eq!(index.len(), 2);
        let slice = index.tile(north_west_quadrant()).unwrap();
        assert_eq!(slice.len(), 2);
        assert!(slice.features.iter().all(|f| f.properties["id"] == json!(7)));
    }

    #[test]
    fn test_clip_segment_fully_inside_is_unchanged() {
        let a = (10.5, 20.25);
        let b = (30.0, 40.0);
        assert_eq!(clip_segment(a, b, 0.0, 100.0), Some((a, b)));
    }

    #[test]
    fn test_clip_segment_outside() {
        assert_eq!(clip_segment((-10.0, -10.0), (-5.0, 50.0), 0.0, 100.0), None);
    }

    #[test]
    fn test_clip_ring_triangle_corner() {
        let ring = vec![(-50.0, -50.0), (50.0, -50.0), (-50.0, 50.0)];
        let clipped = clip_ring(&ring, 0.0, 100.0);
        assert!(clipped.iter().all(|&(x, y)| x >= 0.0 && y >= 0.0));
        assert!(clipped.len() >= 3);
    }
}
