//! Star polygons `{n/d}`.
//!
//! The unit starts at the tip `(1, 0)` and runs along the chord toward the
//! point `d` steps around the circle. It stops at mirror axes: the chord
//! crosses axis `k` (angle `πk/n`) for every `k ≤ ⌊d + 0.01⌋`, and the
//! `s` parameter keeps only the first `s` of those crossings.

use std::hash::{Hash, Hasher};

use super::radial::{axis_crossings, build_radial_map, mirrored_chain};
use crate::geometry::Point;
use crate::map::Map;

/// Slack on the axis limit, so `d = 2.995` still reaches axis 3.
const D_ROUNDING: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Star {
    /// Symmetry order.
    pub n: usize,
    /// Skip: how far around the circle each chord reaches.
    pub d: f64,
    /// How many axis crossings of each chord to keep.
    pub s: usize,
}

impl Star {
    pub fn new(n: usize, d: f64, s: usize) -> Self {
        Self { n, d, s }
    }

    /// `d` limited to `[1, n/2 - 0.01]`.
    pub fn clamped_d(&self) -> f64 {
        self.d.min(0.5 * self.n as f64 - D_ROUNDING).max(1.0)
    }

    pub fn build_unit(&self) -> Map {
        let n = self.n as f64;
        let tip = Point::new(1.0, 0.0);
        let toward = Point::arc(self.clamped_d() / n);
        let crossings = axis_crossings(tip, toward - tip, self.n, 1, 1, D_ROUNDING);

        let chain: Vec<Point> = std::iter::once(tip)
            .chain(crossings.into_iter().take(self.s))
            .collect();
        mirrored_chain(&chain)
    }

    pub fn build_map(&self) -> Map {
        build_radial_map(&self.build_unit(), self.n)
    }

    pub(crate) fn hash_key<H: Hasher>(&self, state: &mut H) {
        "star".hash(state);
        self.n.hash(state);
        self.d.to_bits().hash(state);
        self.s.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figures::tests::same_edges;
    use crate::transform::Transform;

    #[test]
    fn d_is_clamped() {
        assert_eq!(Star::new(8, 0.2, 1).clamped_d(), 1.0);
        assert!((Star::new(8, 9.0, 1).clamped_d() - 3.99).abs() < 1e-12);
    }

    #[test]
    fn unit_is_mirror_symmetric() {
        let unit = Star::new(8, 3.0, 2).build_unit();
        assert_eq!(unit.edge_count(), 4);
        let mirrored = unit.transformed(&Transform::reflect_x());
        assert!(same_edges(&unit, &mirrored));
    }

    #[test]
    fn d_one_gives_the_polygon_through_the_tips() {
        let map = Star::new(6, 1.0, 1).build_map();
        // Each side is split at its midpoint on an axis.
        assert_eq!(map.edge_count(), 12);
        for v in map.vertices() {
            assert!(v.magnitude() <= 1.0 + 1e-9);
        }
    }

    #[test]
    fn s_truncates_the_chain() {
        let short = Star::new(8, 3.0, 1).build_unit();
        let long = Star::new(8, 3.0, 3).build_unit();
        assert_eq!(short.edge_count(), 2);
        assert_eq!(long.edge_count(), 6);
    }

    #[test]
    fn full_star_closes_at_the_chord_midpoints() {
        let map = Star::new(8, 3.0, 3).build_map();
        // Eight chords, each cut by the other chords it meets.
        assert!(map.check().is_empty(), "{:?}", map.check());
        let tips = map.vertices().iter().filter(|v| (v.magnitude() - 1.0).abs() < 1e-9).count();
        assert_eq!(tips, 8);
    }
}
