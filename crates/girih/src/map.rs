//! Planar edge maps.
//!
//! A [`Map`] is a set of straight edges whose endpoints are shared vertices.
//! After every mutation (or at the end of a merge batch) the map is
//! *normalized*: endpoints within [`TOLERANCE`] snap to one vertex, every
//! edge is stored in canonical orientation, degenerate edges are dropped,
//! and the edge list is sorted and free of duplicates.
//!
//! ## Spatial hashing
//!
//! Vertex lookup uses the same trick as the polyline chainer this module
//! grew out of: points are bucketed into a coarse grid keyed by
//! `(i64, i64)`, and a lookup only scans the 3×3 block of cells around the
//! query. The cell size is larger than the tolerance, so a match can never
//! hide two cells away.

use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::debug;

use crate::geometry::{Point, Rect, TOLERANCE, TOLERANCE2};
use crate::intersect::intersect_within;
use crate::transform::Transform;

/// Grid cell size for vertex snapping.
const CELL: f64 = 1e-5;

/// A straight edge between two points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub p1: Point,
    pub p2: Point,
}

/// Canonical ordering of two endpoints: by x, or by y when the x
/// coordinates agree within tolerance.
fn precedes(a: Point, b: Point) -> bool {
    if (a.x - b.x).abs() > TOLERANCE { a.x < b.x } else { a.y < b.y }
}

fn compare_points(a: &Point, b: &Point) -> Ordering {
    a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y))
}

fn compare_edges(a: &Edge, b: &Edge) -> Ordering {
    compare_points(&a.p1, &b.p1).then_with(|| compare_points(&a.p2, &b.p2))
}

impl Edge {
    #[inline]
    pub const fn new(p1: Point, p2: Point) -> Self {
        Self { p1, p2 }
    }

    #[inline]
    pub fn reversed(&self) -> Edge {
        Edge::new(self.p2, self.p1)
    }

    pub fn is_canonical(&self) -> bool {
        precedes(self.p1, self.p2)
    }

    /// This edge oriented canonically. Degenerate edges come back unchanged.
    pub fn canonical(&self) -> Edge {
        if !self.is_canonical() && self.reversed().is_canonical() {
            self.reversed()
        } else {
            *self
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.p1.approx_eq(self.p2)
    }

    #[inline]
    pub fn direction(&self) -> Point {
        self.p2 - self.p1
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.p1.distance(self.p2)
    }

    #[inline]
    pub fn midpoint(&self) -> Point {
        self.p1.convex_sum(self.p2, 0.5)
    }

    pub fn has_endpoint(&self, v: Point) -> bool {
        self.p1.approx_eq(v) || self.p2.approx_eq(v)
    }

    /// The endpoint that is not `v`.
    pub fn other(&self, v: Point) -> Point {
        if self.p1.approx_eq(v) { self.p2 } else { self.p1 }
    }

    /// This edge oriented to start at `v`.
    pub fn from_vertex(&self, v: Point) -> Edge {
        if self.p1.approx_eq(v) { *self } else { self.reversed() }
    }

    pub fn transformed(&self, t: &Transform) -> Edge {
        Edge::new(t.apply(self.p1), t.apply(self.p2))
    }
}

// ============================================================================
// Vertex index
// ============================================================================

#[derive(Debug, Clone, Default)]
struct VertexIndex {
    points: Vec<Point>,
    grid: HashMap<(i64, i64), Vec<usize>>,
}

impl VertexIndex {
    fn cell(p: Point) -> (i64, i64) {
        ((p.x / CELL).floor() as i64, (p.y / CELL).floor() as i64)
    }

    fn find(&self, p: Point) -> Option<usize> {
        let (cx, cy) = Self::cell(p);
        for dx in -1..=1 {
            for dy in -1..=1 {
                let Some(ids) = self.grid.get(&(cx + dx, cy + dy)) else {
                    continue;
                };
                if let Some(&id) = ids.iter().find(|&&id| self.points[id].distance2(p) < TOLERANCE2) {
                    return Some(id);
                }
            }
        }
        None
    }

    fn intern(&mut self, p: Point) -> usize {
        if let Some(id) = self.find(p) {
            return id;
        }
        let id = self.points.len();
        self.points.push(p);
        self.grid.entry(Self::cell(p)).or_default().push(id);
        id
    }
}

// ============================================================================
// Map
// ============================================================================

/// A normalized planar edge set.
#[derive(Debug, Clone, Default)]
pub struct Map {
    edges: Vec<Edge>,
    /// Vertex ids of each edge's endpoints, parallel to `edges`.
    ends: Vec<(usize, usize)>,
    index: VertexIndex,
    /// Edge indices incident to each vertex.
    incident: Vec<Vec<usize>>,
    batch_depth: usize,
    dirty: bool,
}

impl Map {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw edges without crossing detection.
    pub fn from_edges(edges: impl IntoIterator<Item = Edge>) -> Self {
        let mut map = Self {
            edges: edges.into_iter().collect(),
            ..Self::default()
        };
        map.normalize();
        map
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Canonical edges in sorted order.
    #[inline]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn vertices(&self) -> &[Point] {
        &self.index.points
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.index.points.len()
    }

    /// The stored vertex within tolerance of `p`.
    pub fn find_vertex(&self, p: Point) -> Option<Point> {
        self.index.find(p).map(|id| self.index.points[id])
    }

    pub(crate) fn edge_ends(&self, edge: usize) -> (usize, usize) {
        self.ends[edge]
    }

    pub(crate) fn incident(&self, vertex: usize) -> &[usize] {
        &self.incident[vertex]
    }

    pub fn bounds(&self) -> Rect {
        Rect::bounding(self.index.points.iter().copied())
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Add an edge without looking for crossings. Zero-length and invalid
    /// edges are ignored.
    pub fn add_edge(&mut self, p1: Point, p2: Point) {
        self.edges.push(Edge::new(p1, p2));
        self.touch();
    }

    /// Add the closed outline of a point loop without crossing detection.
    pub fn add_loop(&mut self, points: &[Point]) {
        let n = points.len();
        if n < 2 {
            return;
        }
        self.edges
            .extend((0..n).map(|i| Edge::new(points[i], points[(i + 1) % n])));
        self.touch();
    }

    /// Insert an edge, splitting it and any existing edges at crossings,
    /// T-junctions and collinear overlaps so the map stays planar.
    pub fn insert(&mut self, edge: Edge) {
        if self.dirty {
            self.normalize();
        }
        if !edge.p1.is_valid() || !edge.p2.is_valid() {
            return;
        }
        let a = self.find_vertex(edge.p1).unwrap_or(edge.p1);
        let b = self.find_vertex(edge.p2).unwrap_or(edge.p2);
        if a.approx_eq(b) {
            return;
        }

        let mut cuts: Vec<Point> = Vec::new();
        let mut next: Vec<Edge> = Vec::with_capacity(self.edges.len() + 4);

        for e in &self.edges {
            let mut splits: Vec<Point> = Vec::new();
            let x = intersect_within(a, b, e.p1, e.p2);
            if x.is_valid() {
                if !x.approx_eq(a) && !x.approx_eq(b) {
                    cuts.push(x);
                }
                if !x.approx_eq(e.p1) && !x.approx_eq(e.p2) {
                    splits.push(x);
                }
            } else {
                // Parallel edges only interact when collinear and overlapping.
                cuts.extend([e.p1, e.p2].into_iter().filter(|p| p.is_inside_segment(a, b)));
                splits.extend([a, b].into_iter().filter(|p| p.is_inside_segment(e.p1, e.p2)));
            }
            if splits.is_empty() {
                next.push(*e);
            } else {
                next.extend(split_at(*e, splits));
            }
        }
        next.extend(split_at(Edge::new(a, b), cuts));

        self.edges = next;
        self.touch();
    }

    /// Start a merge batch. Normalization is deferred until the matching
    /// [`end_merge`](Self::end_merge). Batches nest.
    pub fn begin_merge(&mut self) {
        self.batch_depth += 1;
    }

    /// Close a merge batch, normalizing once the outermost batch ends.
    pub fn end_merge(&mut self) {
        self.batch_depth = self.batch_depth.saturating_sub(1);
        if self.batch_depth == 0 && self.dirty {
            self.normalize();
            debug!(
                edges = self.edges.len(),
                vertices = self.index.points.len(),
                "merge batch closed"
            );
        }
    }

    #[inline]
    pub fn is_merging(&self) -> bool {
        self.batch_depth > 0
    }

    /// Add every edge of `other`, assuming no proper crossings between the
    /// two maps. Shared vertices and duplicate edges still collapse.
    pub fn merge_non_overlapping(&mut self, other: &Map) {
        self.edges.extend_from_slice(&other.edges);
        self.touch();
    }

    pub fn transformed(&self, t: &Transform) -> Map {
        Map::from_edges(self.edges.iter().map(|e| e.transformed(t)))
    }

    fn touch(&mut self) {
        self.dirty = true;
        if self.batch_depth == 0 {
            self.normalize();
        }
    }

    /// Snap, canonicalize, drop degenerates, sort, dedup and rebuild the
    /// vertex index.
    fn normalize(&mut self) {
        let mut snap = VertexIndex::default();
        let mut edges: Vec<Edge> = std::mem::take(&mut self.edges)
            .into_iter()
            .filter(|e| e.p1.is_valid() && e.p2.is_valid())
            .filter_map(|e| {
                let a = snap.intern(e.p1);
                let b = snap.intern(e.p2);
                (a != b).then(|| Edge::new(snap.points[a], snap.points[b]).canonical())
            })
            .collect();
        edges.sort_by(compare_edges);
        edges.dedup();

        // Rebuild from the surviving edges only, so vertices of dropped
        // degenerate edges disappear.
        let mut index = VertexIndex::default();
        let mut incident: Vec<Vec<usize>> = Vec::new();
        let mut ends = Vec::with_capacity(edges.len());
        for (i, e) in edges.iter().enumerate() {
            let a = index.intern(e.p1);
            let b = index.intern(e.p2);
            incident.resize_with(index.points.len(), Vec::new);
            incident[a].push(i);
            incident[b].push(i);
            ends.push((a, b));
        }

        self.edges = edges;
        self.ends = ends;
        self.index = index;
        self.incident = incident;
        self.dirty = false;
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Edges leaving `v`, each oriented to start at `v`, sorted
    /// counter-clockwise by direction.
    pub fn outbounds(&self, v: Point) -> Vec<Edge> {
        let Some(id) = self.index.find(v) else {
            return Vec::new();
        };
        let origin = self.index.points[id];
        let mut out: Vec<Edge> = self.incident[id]
            .iter()
            .map(|&i| self.edges[i].from_vertex(origin))
            .collect();
        out.sort_by(|a, b| a.direction().angle().total_cmp(&b.direction().angle()));
        out
    }

    /// The edge leaving `edge.p2` that continues `edge` most nearly
    /// straight. `None` at dead ends.
    pub fn continuation(&self, edge: &Edge) -> Option<Edge> {
        let incoming = edge.direction().normalize();
        self.outbounds(edge.p2)
            .into_iter()
            .filter(|e| !e.p2.approx_eq(edge.p1))
            .max_by(|a, b| {
                let da = incoming.dot(a.direction().normalize());
                let db = incoming.dot(b.direction().normalize());
                da.total_cmp(&db)
            })
    }

    /// Describe every structural problem: pairs of edges that cross, touch
    /// away from shared vertices, or run along each other. Empty for a
    /// healthy map.
    pub fn check(&self) -> Vec<String> {
        let mut problems = Vec::new();
        for (i, a) in self.edges.iter().enumerate() {
            if !a.is_canonical() {
                problems.push(format!("edge #{i} is not canonical"));
            }
            for (j, b) in self.edges.iter().enumerate().skip(i + 1) {
                let x = intersect_within(a.p1, a.p2, b.p1, b.p2);
                if x.is_valid() {
                    problems.push(format!(
                        "edges #{i} and #{j} meet at ({:.6}, {:.6}) away from a shared vertex",
                        x.x, x.y
                    ));
                } else if overlaps(a, b) {
                    problems.push(format!("edges #{i} and #{j} overlap along a line"));
                }
            }
        }
        problems
    }
}

/// Collinear edges sharing more than a single point.
fn overlaps(a: &Edge, b: &Edge) -> bool {
    let same = |p: Point, q: Point| p.approx_eq(q);
    if (same(a.p1, b.p1) && same(a.p2, b.p2)) || (same(a.p1, b.p2) && same(a.p2, b.p1)) {
        return true;
    }
    [b.p1, b.p2].iter().any(|p| p.is_inside_segment(a.p1, a.p2))
        || [a.p1, a.p2].iter().any(|p| p.is_inside_segment(b.p1, b.p2))
}

/// Split `edge` at interior points, in order along the edge.
fn split_at(edge: Edge, mut points: Vec<Point>) -> Vec<Edge> {
    points.retain(|p| p.is_inside_segment(edge.p1, edge.p2));
    points.sort_by(|a, b| {
        a.parameter_along_line(edge.p1, edge.p2)
            .total_cmp(&b.parameter_along_line(edge.p1, edge.p2))
    });
    points.dedup_by(|a, b| a.approx_eq(*b));

    let mut out = Vec::with_capacity(points.len() + 1);
    let mut prev = edge.p1;
    for p in points {
        out.push(Edge::new(prev, p));
        prev = p;
    }
    out.push(Edge::new(prev, edge.p2));
    out
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn canonical_orientation() {
        assert!(Edge::new(p(0.0, 0.0), p(1.0, 0.0)).is_canonical());
        assert!(!Edge::new(p(1.0, 0.0), p(0.0, 0.0)).is_canonical());
        // Vertical edges order by y.
        assert!(Edge::new(p(0.0, 0.0), p(0.0, 1.0)).is_canonical());
        let e = Edge::new(p(0.0, 1.0), p(0.0, 0.0)).canonical();
        assert_eq!(e, Edge::new(p(0.0, 0.0), p(0.0, 1.0)));
    }

    #[test]
    fn duplicates_and_reversals_collapse() {
        let mut map = Map::new();
        map.add_edge(p(0.0, 0.0), p(1.0, 0.0));
        map.add_edge(p(1.0, 0.0), p(0.0, 0.0));
        map.add_edge(p(1e-9, 0.0), p(1.0, 1e-9));
        assert_eq!(map.edge_count(), 1);
        assert_eq!(map.vertex_count(), 2);
    }

    #[test]
    fn degenerate_edges_are_dropped() {
        let map = Map::from_edges([Edge::new(p(1.0, 1.0), p(1.0, 1.0 + 1e-9))]);
        assert!(map.is_empty());
        assert_eq!(map.vertex_count(), 0);
    }

    #[test]
    fn insert_splits_crossing_edges() {
        let mut map = Map::new();
        map.insert(Edge::new(p(-1.0, 0.0), p(1.0, 0.0)));
        map.insert(Edge::new(p(0.0, -1.0), p(0.0, 1.0)));
        assert_eq!(map.edge_count(), 4);
        assert_eq!(map.outbounds(Point::ORIGIN).len(), 4);
        assert!(map.check().is_empty());
    }

    #[test]
    fn insert_handles_t_junction() {
        let mut map = Map::new();
        map.insert(Edge::new(p(0.0, 0.0), p(2.0, 0.0)));
        map.insert(Edge::new(p(1.0, 0.0), p(1.0, 1.0)));
        assert_eq!(map.edge_count(), 3);
        assert_eq!(map.outbounds(p(1.0, 0.0)).len(), 3);
    }

    #[test]
    fn insert_merges_collinear_overlap() {
        let mut map = Map::new();
        map.insert(Edge::new(p(0.0, 0.0), p(2.0, 0.0)));
        map.insert(Edge::new(p(1.0, 0.0), p(3.0, 0.0)));
        let xs: Vec<(f64, f64)> = map.edges().iter().map(|e| (e.p1.x, e.p2.x)).collect();
        assert_eq!(xs, vec![(0.0, 1.0), (1.0, 2.0), (2.0, 3.0)]);
    }

    #[test]
    fn batch_defers_normalization() {
        let mut map = Map::new();
        map.begin_merge();
        map.begin_merge();
        let a = Map::from_edges([Edge::new(p(0.0, 0.0), p(1.0, 0.0))]);
        map.merge_non_overlapping(&a);
        map.merge_non_overlapping(&a);
        map.end_merge();
        assert!(map.is_merging());
        map.end_merge();
        assert!(!map.is_merging());
        assert_eq!(map.edge_count(), 1);
    }

    #[test]
    fn merge_shares_vertices() {
        let mut map = Map::from_edges([Edge::new(p(0.0, 0.0), p(1.0, 0.0))]);
        let other = Map::from_edges([Edge::new(p(1.0 + 1e-9, 0.0), p(1.0, 1.0))]);
        map.merge_non_overlapping(&other);
        assert_eq!(map.vertex_count(), 3);
        assert_eq!(map.outbounds(p(1.0, 0.0)).len(), 2);
    }

    #[test]
    fn outbounds_start_at_vertex_in_angle_order() {
        let mut map = Map::new();
        map.add_edge(p(0.0, 0.0), p(1.0, 0.0));
        map.add_edge(p(0.0, 1.0), p(0.0, 0.0));
        map.add_edge(p(-1.0, 0.0), p(0.0, 0.0));
        let out = map.outbounds(Point::ORIGIN);
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|e| e.p1.approx_eq(Point::ORIGIN)));
        let angles: Vec<f64> = out.iter().map(|e| e.direction().angle()).collect();
        assert!(angles.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn continuation_prefers_straight() {
        let mut map = Map::new();
        map.insert(Edge::new(p(-1.0, 0.0), p(1.0, 0.0)));
        map.insert(Edge::new(p(0.0, 0.0), p(0.5, 1.0)));
        let next = map
            .continuation(&Edge::new(p(-1.0, 0.0), p(0.0, 0.0)))
            .expect("has continuation");
        assert!(next.p2.approx_eq(p(1.0, 0.0)));
        assert!(map.continuation(&Edge::new(p(0.0, 0.0), p(1.0, 0.0))).is_none());
    }

    #[test]
    fn check_reports_raw_crossings() {
        let map = Map::from_edges([
            Edge::new(p(-1.0, 0.0), p(1.0, 0.0)),
            Edge::new(p(0.0, -1.0), p(0.0, 1.0)),
        ]);
        assert_eq!(map.check().len(), 1);
    }

    #[test]
    fn check_reports_collinear_overlap() {
        let map = Map::from_edges([
            Edge::new(p(0.0, 0.0), p(2.0, 0.0)),
            Edge::new(p(1.0, 0.0), p(3.0, 0.0)),
        ]);
        let problems = map.check();
        assert_eq!(problems.len(), 1, "{:?}", problems);
        assert!(problems[0].contains("overlap"));

        let nested = Map::from_edges([
            Edge::new(p(0.0, 0.0), p(3.0, 0.0)),
            Edge::new(p(1.0, 0.0), p(2.0, 0.0)),
        ]);
        assert_eq!(nested.check().len(), 1);
    }

    #[test]
    fn check_accepts_collinear_edges_that_only_touch() {
        let map = Map::from_edges([
            Edge::new(p(0.0, 0.0), p(1.0, 0.0)),
            Edge::new(p(1.0, 0.0), p(2.0, 0.0)),
        ]);
        assert!(map.check().is_empty(), "{:?}", map.check());
    }

    #[test]
    fn transformed_recanonicalizes() {
        let map = Map::from_edges([Edge::new(p(0.0, 0.0), p(1.0, 0.0))]);
        let flipped = map.transformed(&Transform::scale_xy(-1.0, 1.0));
        assert_eq!(flipped.edges(), &[Edge::new(p(-1.0, 0.0), p(0.0, 0.0))]);
    }

    proptest! {
        #[test]
        fn canonical_is_idempotent(
            x1 in -100.0f64..100.0, y1 in -100.0f64..100.0,
            x2 in -100.0f64..100.0, y2 in -100.0f64..100.0,
        ) {
            let e = Edge::new(p(x1, y1), p(x2, y2)).canonical();
            prop_assert_eq!(e.canonical(), e);
        }

        #[test]
        fn normalized_edges_are_sorted_and_unique(
            coords in prop::collection::vec((-5i32..5, -5i32..5, -5i32..5, -5i32..5), 1..30)
        ) {
            let edges = coords.iter().map(|&(a, b, c, d)| {
                Edge::new(p(a as f64, b as f64), p(c as f64, d as f64))
            });
            let map = Map::from_edges(edges);
            for e in map.edges() {
                prop_assert!(e.is_canonical());
            }
            for w in map.edges().windows(2) {
                prop_assert_eq!(compare_edges(&w[0], &w[1]), Ordering::Less);
            }
        }
    }
}
