//! Over/under weaving of a map's strands.
//!
//! Each edge is drawn as a band. At every vertex the bands pair up into
//! strands that pass straight through; consecutive crossings alternate so a
//! strand goes over, then under, then over again. Each edge stores one bit,
//! whether it is on top at its `p1` end. The `p2` end is always the
//! opposite.
//!
//! Propagation is a breadth-first walk over `(edge, vertex)` pairs. Maps
//! with odd cycles cannot alternate everywhere; the walk keeps the first
//! assignment and counts the disagreements as conflicts.

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::geometry::{Point, Polygon};
use crate::map::{Edge, Map};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterlaceParams {
    /// Half-width of each band.
    pub width: f64,
    /// How far an under end is pulled back from its vertex.
    pub gap: f64,
}

impl Default for InterlaceParams {
    fn default() -> Self {
        Self { width: 0.05, gap: 0.0 }
    }
}

/// One band, ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct StrandSegment {
    pub edge: Edge,
    pub over_at_p1: bool,
    pub outline: Polygon,
}

#[derive(Debug, Clone, Default)]
pub struct Interlace {
    over_at_p1: Vec<bool>,
    conflicts: usize,
}

impl Interlace {
    pub fn build(map: &Map) -> Interlace {
        let m = map.edge_count();
        let mut over = vec![false; m];
        let mut done = vec![false; m];
        let mut conflicts = 0;
        let mut queue: VecDeque<(usize, usize, bool)> = VecDeque::new();

        let state_at = |over: &[bool], e: usize, v: usize| {
            if map.edge_ends(e).0 == v { over[e] } else { !over[e] }
        };

        for seed in 0..m {
            if done[seed] {
                continue;
            }
            done[seed] = true;
            over[seed] = true;
            let (a, b) = map.edge_ends(seed);
            queue.push_back((seed, a, true));
            queue.push_back((seed, b, false));

            while let Some((e, v, state)) = queue.pop_front() {
                for (f, wanted) in strand_states(map, e, v, state) {
                    if done[f] {
                        if state_at(&over, f, v) != wanted {
                            conflicts += 1;
                        }
                        continue;
                    }
                    done[f] = true;
                    let (p, q) = map.edge_ends(f);
                    over[f] = if p == v { wanted } else { !wanted };
                    let far = if p == v { q } else { p };
                    queue.push_back((f, far, !wanted));
                }
            }
        }

        if conflicts > 0 {
            warn!(conflicts, "interlace could not alternate everywhere");
        }
        debug!(edges = m, "interlace assigned");
        Interlace { over_at_p1: over, conflicts }
    }

    pub fn over_at_p1(&self, edge: usize) -> bool {
        self.over_at_p1[edge]
    }

    /// Whether edge `edge` is on top where it meets `vertex`.
    pub fn over_at(&self, map: &Map, edge: usize, vertex: Point) -> bool {
        let at_p1 = map.edges()[edge].p1.approx_eq(vertex);
        self.over_at_p1[edge] == at_p1
    }

    pub fn conflicts(&self) -> usize {
        self.conflicts
    }

    /// Band outlines for every edge, under ends pulled back by the gap.
    pub fn segments(&self, map: &Map, params: &InterlaceParams) -> Vec<StrandSegment> {
        map.edges()
            .iter()
            .zip(&self.over_at_p1)
            .map(|(edge, &over_at_p1)| {
                let shortened = pull_back(edge, over_at_p1, params.gap);
                StrandSegment {
                    edge: *edge,
                    over_at_p1,
                    outline: fat_line(&shortened, params.width),
                }
            })
            .collect()
    }
}

/// Desired states at `v` for the other edges meeting `e` there, given that
/// `e` has `state` at `v`.
///
/// At a vertex of degree three or more, each edge is paired with the edge
/// pointing most nearly opposite it rather than with its angular neighbour,
/// so a strand runs straight through the crossing instead of turning back.
fn strand_states(map: &Map, e: usize, v: usize, state: bool) -> Vec<(usize, bool)> {
    let incident = map.incident(v);
    match incident.len() {
        0 | 1 => Vec::new(),
        2 => incident
            .iter()
            .filter(|&&f| f != e)
            .map(|&f| (f, !state))
            .collect(),
        _ => {
            let origin = map.vertices()[v];
            let direction = |f: usize| map.edges()[f].other(origin) - origin;

            // Angular order, rotated so the incoming edge leads.
            let mut around: Vec<usize> = incident.to_vec();
            around.sort_by(|&a, &b| direction(a).angle().total_cmp(&direction(b).angle()));
            if let Some(pos) = around.iter().position(|&f| f == e) {
                around.rotate_left(pos);
            }

            // Pair each edge with its straightest continuation.
            let mut strand_of: Vec<Option<usize>> = vec![None; around.len()];
            let mut strands = 0;
            for i in 0..around.len() {
                if strand_of[i].is_some() {
                    continue;
                }
                strand_of[i] = Some(strands);
                let di = direction(around[i]).normalize();
                let partner = (0..around.len())
                    .filter(|&j| j != i && strand_of[j].is_none())
                    .min_by(|&a, &b| {
                        let da = di.dot(direction(around[a]).normalize());
                        let db = di.dot(direction(around[b]).normalize());
                        da.total_cmp(&db)
                    });
                if let Some(j) = partner {
                    strand_of[j] = Some(strands);
                }
                strands += 1;
            }

            around
                .iter()
                .zip(&strand_of)
                .filter(|&(&f, _)| f != e)
                .map(|(&f, strand)| {
                    // Partners share a state; successive strands alternate.
                    let k = strand.unwrap_or(0);
                    (f, if k % 2 == 0 { state } else { !state })
                })
                .collect()
        }
    }
}

/// The edge with its under end moved back by `gap`, never past the middle.
fn pull_back(edge: &Edge, over_at_p1: bool, gap: f64) -> Edge {
    let len = edge.length();
    if gap <= 0.0 || len <= 0.0 {
        return *edge;
    }
    let t = (gap / len).min(0.5);
    if over_at_p1 {
        Edge::new(edge.p1, edge.p2.convex_sum(edge.p1, t))
    } else {
        Edge::new(edge.p1.convex_sum(edge.p2, t), edge.p2)
    }
}

/// Hexagonal band of half-width `width` around `edge`, with pointed ends
/// so bands meeting at a vertex mitre cleanly.
pub fn fat_line(edge: &Edge, width: f64) -> Polygon {
    let Some(d) = edge.direction().normalize().valid() else {
        return Polygon::default();
    };
    let n = d.perp();
    let (p1, p2) = (edge.p1, edge.p2);
    Polygon::new(vec![
        p1,
        p1 + (d + n) * width,
        p2 + (n - d) * width,
        p2,
        p2 - (d + n) * width,
        p1 + (d - n) * width,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figures::{Figure, HankinInference};

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn closed_loop_alternates_at_every_vertex() {
        let mut map = Map::new();
        map.add_loop(&[p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.0, 1.0)]);
        let weave = Interlace::build(&map);
        assert_eq!(weave.conflicts(), 0);
        for (v, vertex) in map.vertices().iter().enumerate() {
            let states: Vec<bool> = map
                .incident(v)
                .iter()
                .map(|&e| weave.over_at(&map, e, *vertex))
                .collect();
            assert_eq!(states.len(), 2);
            assert_ne!(states[0], states[1], "vertex {:?}", vertex);
        }
    }

    #[test]
    fn crossing_strands_alternate() {
        let mut map = Map::new();
        map.insert(Edge::new(p(-1.0, 0.0), p(1.0, 0.0)));
        map.insert(Edge::new(p(0.0, -1.0), p(0.0, 1.0)));
        let weave = Interlace::build(&map);
        let center = Point::ORIGIN;
        let state = |to: Point| {
            let e = map
                .edges()
                .iter()
                .position(|e| e.has_endpoint(to))
                .expect("edge");
            weave.over_at(&map, e, center)
        };
        // Straight-through partners agree, the crossing strand differs.
        assert_eq!(state(p(-1.0, 0.0)), state(p(1.0, 0.0)));
        assert_eq!(state(p(0.0, -1.0)), state(p(0.0, 1.0)));
        assert_ne!(state(p(1.0, 0.0)), state(p(0.0, 1.0)));
    }

    #[test]
    fn each_edge_has_one_over_end() {
        let map = Figure::star(8, 3.0, 3).build_map(&HankinInference);
        let weave = Interlace::build(&map);
        for (i, e) in map.edges().iter().enumerate() {
            assert_ne!(weave.over_at(&map, i, e.p1), weave.over_at(&map, i, e.p2));
        }
    }

    #[test]
    fn fat_line_is_a_hexagon_around_the_edge() {
        let band = fat_line(&Edge::new(p(0.0, 0.0), p(2.0, 0.0)), 0.1);
        assert_eq!(band.len(), 6);
        assert!(band.contains(p(1.0, 0.05)));
        assert!(!band.contains(p(1.0, 0.2)));
        // 1.8 x 0.2 body plus two 0.2 x 0.1 end triangles.
        assert!((band.signed_area().abs() - 0.38).abs() < 1e-9);
    }

    #[test]
    fn gap_shortens_the_under_end() {
        let map = Map::from_edges([Edge::new(p(0.0, 0.0), p(1.0, 0.0))]);
        let weave = Interlace::build(&map);
        let params = InterlaceParams { width: 0.1, gap: 0.2 };
        let seg = &weave.segments(&map, &params)[0];
        assert!(seg.over_at_p1);
        let xs: Vec<f64> = seg.outline.points.iter().map(|q| q.x).collect();
        let max_x = xs.iter().copied().fold(f64::MIN, f64::max);
        assert!((max_x - 0.8).abs() < 1e-9, "got {max_x}");
    }

    #[test]
    fn zero_length_edge_has_empty_band() {
        assert!(fat_line(&Edge::new(p(1.0, 1.0), p(1.0, 1.0)), 0.1).is_empty());
    }
}
