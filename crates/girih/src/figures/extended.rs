//! Scaled radial figures whose tips are extended out to the tile border.
//!
//! A scale figure shrinks its child by `s`, which pulls the tips away from
//! the tile's edge midpoints. The extended figure then runs each tip's
//! outer edges on toward the border of the regular `n`-gon, stopping where
//! they meet the extensions of neighbouring tips.
//!
//! Left to itself the figure picks the *connect scale*: the `s` at which a
//! tip's extension and the mirrored extension from the next tip meet exactly
//! on the border corner between them, so the crown closes up there.

use std::f64::consts::PI;
use std::hash::{Hash, Hasher};

use super::RadialFigure;
use super::radial::{border_polygon, build_radial_map};
use crate::geometry::{Point, TOLERANCE};
use crate::intersect::intersect;
use crate::map::{Edge, Map};
use crate::transform::Transform;

/// Long enough to leave any border polygon with `n >= 3`.
const RAY_LENGTH: f64 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ExtendedFigure {
    pub child: RadialFigure,
    /// Scale applied to the child before extending.
    pub s: f64,
}

impl ExtendedFigure {
    pub fn new(child: RadialFigure, s: f64) -> Self {
        Self { child, s }
    }

    /// Extend `child` at its connect scale, or leave it unscaled when the
    /// child has none.
    pub fn connected(child: RadialFigure) -> Self {
        let s = Self::connect_scale(&child).unwrap_or(1.0);
        Self { child, s }
    }

    /// The scale at which the extended tip edge passes through the border
    /// corner at angle `π/n`.
    ///
    /// The extension keeps the direction of the child's lower tip edge, so
    /// only its starting point `(s, 0)` moves with `s`. `None` when the edge
    /// is too shallow to reach the corner from any scale in `(0, 1]`.
    pub fn connect_scale(child: &RadialFigure) -> Option<f64> {
        let n = child.n();
        let tip = Point::new(1.0, 0.0);
        let below = lower_neighbour(&child.build_unit(), tip)?;
        let heading = tip - below;
        if heading.y < TOLERANCE {
            return None;
        }
        let corner = Point::new(1.0, (PI / n as f64).tan());
        let s = corner.x - corner.y * heading.x / heading.y;
        (s > TOLERANCE && s < 1.0 + TOLERANCE).then_some(s.min(1.0))
    }

    pub fn n(&self) -> usize {
        self.child.n()
    }

    pub fn build_unit(&self) -> Map {
        let unit = self.child.build_unit();
        if (self.s - 1.0).abs() < TOLERANCE {
            return unit;
        }
        let n = self.n();
        let scaled = unit.transformed(&Transform::scale(self.s));

        let tip = Point::new(1.0, 0.0);
        let Some(below) = lower_neighbour(&unit, tip) else {
            return scaled;
        };

        let tip = tip * self.s;
        let below = below * self.s;
        let Some(heading) = (tip - below).normalize().valid() else {
            return scaled;
        };
        let ray_end = tip + heading * RAY_LENGTH;

        let Some(end) = border_polygon(n)
            .edges()
            .map(|(a, b)| intersect(tip, ray_end, a, b))
            .filter(Point::is_valid)
            .min_by(|a, b| a.distance2(tip).total_cmp(&b.distance2(tip)))
        else {
            return scaled;
        };

        // Each neighbour's lower extension, rotated into place, may cut
        // ours short.
        let mirror = (tip.conj(), end.conj());
        let mut chain = vec![tip];
        for k in 1..=n.div_ceil(2) {
            let turn = Transform::rotation(2.0 * PI * k as f64 / n as f64);
            let hit = intersect(tip, end, turn.apply(mirror.0), turn.apply(mirror.1));
            if !hit.is_valid() {
                break;
            }
            chain.push(hit);
        }
        if chain.last().is_some_and(|last| !last.approx_eq(end)) {
            chain.push(end);
        }

        let mut map = scaled;
        map.begin_merge();
        for w in chain.windows(2) {
            map.add_edge(w[0], w[1]);
            map.add_edge(w[0].conj(), w[1].conj());
        }
        map.end_merge();
        map
    }

    pub fn build_map(&self) -> Map {
        build_radial_map(&self.build_unit(), self.n())
    }

    pub(crate) fn hash_key<H: Hasher>(&self, state: &mut H) {
        "extended".hash(state);
        self.s.to_bits().hash(state);
        self.child.hash_key(state);
    }
}

/// The far end of the tip's outbound edge that runs below the axis.
fn lower_neighbour(unit: &Map, tip: Point) -> Option<Point> {
    unit.outbounds(tip)
        .into_iter()
        .map(|e| e.p2)
        .find(|p| p.y < -TOLERANCE)
}

/// Edges of `map` that touch the border of the `n`-gon tile.
pub fn border_contacts(map: &Map, n: usize) -> Vec<Edge> {
    let border = border_polygon(n);
    map.edges()
        .iter()
        .copied()
        .filter(|e| {
            border.edges().any(|(a, b)| {
                [e.p1, e.p2]
                    .iter()
                    .any(|p| p.approx_eq(a) || p.approx_eq(b) || p.is_inside_segment(a, b))
            })
        })
        .collect()
}
