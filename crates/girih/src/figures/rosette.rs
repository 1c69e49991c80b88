//! Rosettes: stars whose points bend into petals.
//!
//! From the tip the unit leans toward the first mirror axis at an angle set
//! by `q`, meeting it at the *shoulder*. From the shoulder it continues
//! inward along the extension of the neighbouring tip's shoulder line,
//! crossing the axes at `0, -π/n, -2π/n, …` until the closest approach to
//! the centre. `s` keeps only the first `s` of those crossings.

use std::f64::consts::{FRAC_PI_2, PI};
use std::hash::{Hash, Hasher};

use super::radial::{axis_crossings, build_radial_map, mirrored_chain};
use crate::geometry::Point;
use crate::intersect::intersect_anywhere;
use crate::map::Map;

/// `q` is kept strictly inside (-1, 1) so the shoulder stays finite.
const Q_LIMIT: f64 = 0.99;

/// Axis limit slack, as a fraction of one axis step.
const AXIS_SLACK: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rosette {
    pub n: usize,
    /// Shoulder lean in `[-1, 1]`; larger values give sharper petals.
    pub q: f64,
    pub s: usize,
}

impl Rosette {
    pub fn new(n: usize, q: f64, s: usize) -> Self {
        Self { n, q, s }
    }

    /// The shoulder: where the tip's first edge meets axis 1.
    pub fn shoulder(&self) -> Point {
        let alpha = PI / self.n as f64;
        let q = self.q.clamp(-Q_LIMIT, Q_LIMIT);
        let theta = alpha + (FRAC_PI_2 - alpha) * (1.0 + q) / 2.0;
        let tip = Point::new(1.0, 0.0);
        let lean = Point::new(-theta.sin(), theta.cos());
        intersect_anywhere(tip, tip + lean, Point::ORIGIN, Point::from_angle(alpha))
    }

    pub fn build_unit(&self) -> Map {
        let Some(shoulder) = self.shoulder().valid() else {
            return Map::new();
        };
        let tip = Point::new(1.0, 0.0);
        let neighbour = Point::arc(1.0 / self.n as f64);
        let crossings = axis_crossings(shoulder, shoulder - neighbour, self.n, 0, -1, AXIS_SLACK);

        let chain: Vec<Point> = [tip, shoulder]
            .into_iter()
            .chain(crossings.into_iter().take(self.s))
            .collect();
        mirrored_chain(&chain)
    }

    pub fn build_map(&self) -> Map {
        build_radial_map(&self.build_unit(), self.n)
    }

    pub(crate) fn hash_key<H: Hasher>(&self, state: &mut H) {
        "rosette".hash(state);
        self.n.hash(state);
        self.q.to_bits().hash(state);
        self.s.hash(state);
    }
}
