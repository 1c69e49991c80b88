//! Shared construction for radially symmetric figures.
//!
//! A radial figure with `n`-fold symmetry is drawn in a frame where its
//! tips lie on the unit circle at angles `2πk/n`, and its mirror axes are
//! the rays at angles `πk/n`. Each figure only builds the *unit*: the
//! geometry around the tip at angle 0, symmetric about the x axis. The
//! full figure is the unit rotated `n` times.

use std::f64::consts::PI;

use crate::geometry::{Point, Polygon};
use crate::intersect::intersect_anywhere;
use crate::map::{Edge, Map};
use crate::transform::Transform;

/// The unit rotated `n` times about the origin.
pub fn build_radial_map(unit: &Map, n: usize) -> Map {
    let mut map = Map::new();
    map.begin_merge();
    for k in 0..n {
        let turn = Transform::rotation(2.0 * PI * k as f64 / n as f64);
        map.merge_non_overlapping(&unit.transformed(&turn));
    }
    map.end_merge();
    map
}

/// A map holding the polyline `chain` and its mirror image across the
/// x axis.
pub(crate) fn mirrored_chain(chain: &[Point]) -> Map {
    let edges = chain.windows(2).flat_map(|w| {
        [
            Edge::new(w[0], w[1]),
            Edge::new(w[0].conj(), w[1].conj()),
        ]
    });
    Map::from_edges(edges)
}

/// Where the line through `start` with direction `dir` crosses successive
/// mirror axes.
///
/// Axes are visited from index `first`, stepping by `step` (±1), for as long
/// as they lie on the near side of the line's closest approach to the
/// origin. `slack` widens that limit by a fraction of one axis step.
pub(crate) fn axis_crossings(
    start: Point,
    dir: Point,
    n: usize,
    first: i32,
    step: i32,
    slack: f64,
) -> Vec<Point> {
    let unit = dir.normalize();
    if !unit.is_valid() || n == 0 {
        return Vec::new();
    }
    let foot = start - unit * start.dot(unit);
    let limit = foot.angle();
    let eps = PI * slack / n as f64;

    let mut out = Vec::new();
    let mut k = first;
    // Each axis is crossed at most once, so `n` steps is a hard ceiling.
    while out.len() <= n {
        let theta = PI * k as f64 / n as f64;
        let past = if step > 0 { theta > limit + eps } else { theta < limit - eps };
        if past {
            break;
        }
        let axis = Point::from_angle(theta);
        let x = intersect_anywhere(start, start + dir, Point::ORIGIN, axis);
        if !x.is_valid() || x.dot(axis) <= 0.0 {
            break;
        }
        out.push(x);
        k += step;
    }
    out
}

/// The regular `n`-gon whose edges touch the unit circle at the tip
/// directions.
pub fn border_polygon(n: usize) -> Polygon {
    let r = 1.0 / (PI / n as f64).cos();
    let nf = n as f64;
    Polygon::new(
        (0..n)
            .map(|i| Point::arc((i as f64 + 0.5) / nf) * r)
            .collect(),
    )
}

/// Scale that carries the figure frame onto a unit-circumradius regular
/// `n`-gon tile: the frame's tips land on the tile's edge midpoints.
pub fn tile_fit(n: usize) -> Transform {
    Transform::scale((PI / n as f64).cos())
}
