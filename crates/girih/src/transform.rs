//! Affine transforms of the plane.
//!
//! Backed by `lyon_geom`'s 2D transform (euclid's `Transform2D`), which uses
//! the row-vector convention: `a.then(&b)` applies `a` first and `b` second,
//! and the six parameters `[m11, m12, m21, m22, m31, m32]` are the same
//! numbers as SVG's `matrix(a b c d e f)`.

use std::ops::Mul;

use lyon_geom::euclid::Angle;
use lyon_geom::euclid::default::Transform2D;

use crate::geometry::{Point, TOLERANCE};

/// A 2D affine transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform(Transform2D<f64>);

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn identity() -> Self {
        Self(Transform2D::identity())
    }

    pub fn translation(x: f64, y: f64) -> Self {
        Self(Transform2D::translation(x, y))
    }

    pub fn translate(offset: Point) -> Self {
        Self::translation(offset.x, offset.y)
    }

    /// Counter-clockwise rotation about the origin.
    pub fn rotation(theta: f64) -> Self {
        Self(Transform2D::rotation(Angle::radians(theta)))
    }

    /// Rotation about an arbitrary centre.
    pub fn rotation_about(center: Point, theta: f64) -> Self {
        Self::translate(-center)
            .then(&Self::rotation(theta))
            .then(&Self::translate(center))
    }

    pub fn scale(s: f64) -> Self {
        Self::scale_xy(s, s)
    }

    pub fn scale_xy(sx: f64, sy: f64) -> Self {
        Self(Transform2D::scale(sx, sy))
    }

    /// Mirror across the x axis.
    pub fn reflect_x() -> Self {
        Self::scale_xy(1.0, -1.0)
    }

    /// Build from `[m11, m12, m21, m22, m31, m32]`.
    pub fn from_parameters(p: [f64; 6]) -> Self {
        Self(Transform2D::new(p[0], p[1], p[2], p[3], p[4], p[5]))
    }

    /// `[m11, m12, m21, m22, m31, m32]`.
    pub fn parameters(&self) -> [f64; 6] {
        let m = &self.0;
        [m.m11, m.m12, m.m21, m.m22, m.m31, m.m32]
    }

    /// The similarity that carries segment `from` onto segment `to`.
    ///
    /// Degenerate `from` segments give the plain translation between the
    /// start points.
    pub fn similarity(from: (Point, Point), to: (Point, Point)) -> Self {
        let v1 = from.1 - from.0;
        let v2 = to.1 - to.0;
        let len1 = v1.magnitude();
        if len1 < TOLERANCE {
            return Self::translate(to.0 - from.0);
        }
        Self::translate(-from.0)
            .then(&Self::rotation(v2.angle() - v1.angle()))
            .then(&Self::scale(v2.magnitude() / len1))
            .then(&Self::translate(to.0))
    }

    /// Apply `self`, then `next`.
    pub fn then(&self, next: &Transform) -> Transform {
        Self(self.0.then(&next.0))
    }

    /// `None` for singular transforms.
    pub fn invert(&self) -> Option<Transform> {
        self.0.inverse().map(Self)
    }

    /// `self` composed with itself `k` times; negative powers use the
    /// inverse.
    pub fn pow(&self, k: i32) -> Option<Transform> {
        let base = if k < 0 { self.invert()? } else { *self };
        Some((0..k.unsigned_abs()).fold(Self::identity(), |acc, _| acc.then(&base)))
    }

    pub fn apply(&self, p: Point) -> Point {
        let q = self.0.transform_point(lyon_geom::point(p.x, p.y));
        Point::new(q.x, q.y)
    }

    /// Apply the linear part only.
    pub fn apply_vector(&self, v: Point) -> Point {
        let q = self.0.transform_vector(lyon_geom::vector(v.x, v.y));
        Point::new(q.x, q.y)
    }

    pub fn determinant(&self) -> f64 {
        let m = &self.0;
        m.m11 * m.m22 - m.m12 * m.m21
    }

    /// Linear scale factor, exact for similarities.
    pub fn scale_factor(&self) -> f64 {
        self.determinant().abs().sqrt()
    }

    pub fn is_identity(&self) -> bool {
        self.approx_eq(&Self::identity())
    }

    /// The point left in place, or invalid when there is none (pure
    /// translations and other transforms with an eigenvalue of 1).
    pub fn fixed_point(&self) -> Point {
        let m = &self.0;
        let a = 1.0 - m.m11;
        let b = -m.m21;
        let c = -m.m12;
        let d = 1.0 - m.m22;
        let det = a * d - b * c;
        if det.abs() < TOLERANCE {
            return Point::INVALID;
        }
        Point::new((m.m31 * d - b * m.m32) / det, (a * m.m32 - c * m.m31) / det)
    }

    pub fn approx_eq(&self, other: &Transform) -> bool {
        self.parameters()
            .iter()
            .zip(other.parameters())
            .all(|(a, b)| (a - b).abs() < TOLERANCE)
    }
}

/// `a * b` is `a.then(&b)`.
impl Mul for Transform {
    type Output = Transform;

    fn mul(self, rhs: Transform) -> Transform {
        self.then(&rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn then_applies_left_first() {
        let t = Transform::translation(1.0, 0.0).then(&Transform::rotation(PI / 2.0));
        let p = t.apply(Point::ORIGIN);
        assert!(p.approx_eq(Point::new(0.0, 1.0)), "got {:?}", p);
        assert_eq!(t, Transform::translation(1.0, 0.0) * Transform::rotation(PI / 2.0));
    }

    #[test]
    fn invert_round_trips() {
        let t = Transform::rotation(0.3)
            .then(&Transform::scale(2.5))
            .then(&Transform::translation(-4.0, 7.0));
        let inv = t.invert().expect("invertible");
        let p = Point::new(3.0, -2.0);
        assert!(inv.apply(t.apply(p)).approx_eq(p));
        assert!(Transform::scale(0.0).invert().is_none());
    }

    #[test]
    fn parameters_round_trip() {
        let t = Transform::rotation(1.0).then(&Transform::translation(2.0, 3.0));
        assert_eq!(Transform::from_parameters(t.parameters()), t);
    }

    #[test]
    fn similarity_maps_segment() {
        let from = (Point::new(0.0, 0.0), Point::new(1.0, 0.0));
        let to = (Point::new(2.0, 2.0), Point::new(2.0, 4.0));
        let t = Transform::similarity(from, to);
        assert!(t.apply(from.0).approx_eq(to.0));
        assert!(t.apply(from.1).approx_eq(to.1));
        assert!((t.scale_factor() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn fixed_point_of_rotation_about() {
        let c = Point::new(3.0, -1.0);
        let t = Transform::rotation_about(c, 0.7);
        assert!(t.fixed_point().approx_eq(c));
        assert!(!Transform::translation(1.0, 0.0).fixed_point().is_valid());
    }

    #[test]
    fn pow_handles_negative_exponents() {
        let t = Transform::scale(2.0);
        let p = t.pow(-2).expect("invertible");
        assert!(p.apply(Point::new(4.0, 0.0)).approx_eq(Point::new(1.0, 0.0)));
        assert!(t.pow(0).expect("identity").is_identity());
    }
}
