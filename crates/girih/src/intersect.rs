//! Segment and line intersection.
//!
//! Every function takes two segments `p1 → q1` and `p2 → q2` and returns a
//! [`Point`], invalid when there is no acceptable intersection. They differ
//! only in which parameter ranges they accept.

use crate::geometry::{Point, TOLERANCE};

/// How far past the ends `intersect_near` still accepts, as a fraction of
/// segment length.
pub const NEAR_SLACK: f64 = 0.2;

/// Parameters `(s, t)` with `p1 + s·(q1 - p1) == p2 + t·(q2 - p2)`.
///
/// `None` when the lines are parallel (or either segment is degenerate).
pub fn intersection_params(p1: Point, q1: Point, p2: Point, q2: Point) -> Option<(f64, f64)> {
    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let det = d1.cross(d2);
    if det.abs() < TOLERANCE {
        return None;
    }
    let w = p2 - p1;
    Some((w.cross(d2) / det, w.cross(d1) / det))
}

#[inline]
fn within(value: f64, lo: f64, hi: f64) -> bool {
    value >= lo && value <= hi
}

fn intersect_with(
    p1: Point,
    q1: Point,
    p2: Point,
    q2: Point,
    accept: impl Fn(f64, f64) -> bool,
) -> Point {
    match intersection_params(p1, q1, p2, q2) {
        Some((s, t)) if accept(s, t) => p1.convex_sum(q1, s),
        _ => Point::INVALID,
    }
}

/// Intersection of the two infinite lines.
pub fn intersect_anywhere(p1: Point, q1: Point, p2: Point, q2: Point) -> Point {
    intersect_with(p1, q1, p2, q2, |_, _| true)
}

/// Intersection of the two segments, endpoints included.
pub fn intersect(p1: Point, q1: Point, p2: Point, q2: Point) -> Point {
    intersect_with(p1, q1, p2, q2, |s, t| {
        within(s, -TOLERANCE, 1.0 + TOLERANCE) && within(t, -TOLERANCE, 1.0 + TOLERANCE)
    })
}

/// Like [`intersect`], but accepts hits up to [`NEAR_SLACK`] past either end.
pub fn intersect_near(p1: Point, q1: Point, p2: Point, q2: Point) -> Point {
    let lo = -NEAR_SLACK;
    let hi = 1.0 + NEAR_SLACK;
    intersect_with(p1, q1, p2, q2, |s, t| within(s, lo, hi) && within(t, lo, hi))
}

/// Like [`intersect`], but rejects a hit that is an endpoint of both
/// segments (segments that merely share a vertex).
pub fn intersect_within(p1: Point, q1: Point, p2: Point, q2: Point) -> Point {
    let x = intersect(p1, q1, p2, q2);
    if !x.is_valid() {
        return x;
    }
    let end_of_first = x.approx_eq(p1) || x.approx_eq(q1);
    let end_of_second = x.approx_eq(p2) || x.approx_eq(q2);
    if end_of_first && end_of_second { Point::INVALID } else { x }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn crossing_segments() {
        let x = intersect(p(0.0, 0.0), p(2.0, 0.0), p(1.0, -1.0), p(1.0, 1.0));
        assert!(x.approx_eq(p(1.0, 0.0)));
    }

    #[test]
    fn parallel_segments_are_invalid() {
        let x = intersect(p(0.0, 0.0), p(1.0, 0.0), p(0.0, 1.0), p(1.0, 1.0));
        assert!(!x.is_valid());
        assert!(intersection_params(p(0.0, 0.0), p(1.0, 0.0), p(0.0, 1.0), p(1.0, 1.0)).is_none());
    }

    #[test]
    fn anywhere_extends_lines() {
        let x = intersect_anywhere(p(0.0, 0.0), p(1.0, 0.0), p(5.0, 1.0), p(5.0, 2.0));
        assert!(x.approx_eq(p(5.0, 0.0)));
        assert!(!intersect(p(0.0, 0.0), p(1.0, 0.0), p(5.0, 1.0), p(5.0, 2.0)).is_valid());
    }

    #[test]
    fn near_allows_slack() {
        // Hit at s = 1.1 on the first segment.
        let x = intersect_near(p(0.0, 0.0), p(1.0, 0.0), p(1.1, -1.0), p(1.1, 1.0));
        assert!(x.approx_eq(p(1.1, 0.0)));
        let far = intersect_near(p(0.0, 0.0), p(1.0, 0.0), p(1.5, -1.0), p(1.5, 1.0));
        assert!(!far.is_valid());
    }

    #[test]
    fn within_rejects_shared_vertex() {
        let shared = intersect_within(p(0.0, 0.0), p(1.0, 0.0), p(1.0, 0.0), p(1.0, 1.0));
        assert!(!shared.is_valid());
        // T-junction: endpoint of one, interior of the other.
        let tee = intersect_within(p(0.0, 0.0), p(2.0, 0.0), p(1.0, 0.0), p(1.0, 1.0));
        assert!(tee.approx_eq(p(1.0, 0.0)));
    }
}
