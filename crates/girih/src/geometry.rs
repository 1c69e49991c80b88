//! Core geometry types for girih.
//!
//! ## Rust Lesson #3: Structs & Derives
//!
//! `Point` and `Rect` derive `Copy`: they are a couple of `f64`s, so passing
//! them by value is as cheap as passing a reference. `Polygon` owns a `Vec`,
//! so it is only `Clone`.
//!
//! ## The invalid sentinel
//!
//! "No point" is encoded as NaN coordinates instead of `Option<Point>`, so an
//! invalid value flows through arithmetic untouched and the caller checks
//! `is_valid()` once at the end. Use [`Point::valid`] to get back to `Option`
//! where `?` or `let ... else` reads better.

use std::f64::consts::PI;
use std::ops::{Add, Mul, Neg, Sub};

use crate::transform::Transform;

/// Shared distance tolerance for every numeric comparison in the crate.
pub const TOLERANCE: f64 = 1e-7;

/// Square of [`TOLERANCE`], for comparing squared distances without `sqrt`.
pub const TOLERANCE2: f64 = TOLERANCE * TOLERANCE;

/// A 2D point (or vector) with x,y coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// The "no point" sentinel.
    pub const INVALID: Point = Point { x: f64::NAN, y: f64::NAN };

    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Unit vector at angle `theta` (radians).
    #[inline]
    pub fn from_angle(theta: f64) -> Self {
        Self::new(theta.cos(), theta.sin())
    }

    /// Point on the unit circle at `fraction` of a full turn.
    #[inline]
    pub fn arc(fraction: f64) -> Self {
        Self::from_angle(2.0 * PI * fraction)
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        !self.x.is_nan() && !self.y.is_nan()
    }

    /// `Some(self)` unless this is the invalid sentinel.
    #[inline]
    pub fn valid(self) -> Option<Point> {
        self.is_valid().then_some(self)
    }

    #[inline]
    pub fn dot(&self, other: Point) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// z component of the 3D cross product; positive when `other` is
    /// counter-clockwise from `self`.
    #[inline]
    pub fn cross(&self, other: Point) -> f64 {
        self.x * other.y - self.y * other.x
    }

    #[inline]
    pub fn magnitude2(&self) -> f64 {
        self.dot(*self)
    }

    #[inline]
    pub fn magnitude(&self) -> f64 {
        self.magnitude2().sqrt()
    }

    #[inline]
    pub fn distance2(&self, other: Point) -> f64 {
        (*self - other).magnitude2()
    }

    #[inline]
    pub fn distance(&self, other: Point) -> f64 {
        self.distance2(other).sqrt()
    }

    /// Same point within [`TOLERANCE`].
    #[inline]
    pub fn approx_eq(&self, other: Point) -> bool {
        self.distance2(other) < TOLERANCE2
    }

    /// Unit vector in the same direction. Zero-length vectors become invalid.
    pub fn normalize(&self) -> Point {
        let len = self.magnitude();
        if len < TOLERANCE {
            return Point::INVALID;
        }
        Point::new(self.x / len, self.y / len)
    }

    /// Angle from the positive x axis, in `(-π, π]`.
    #[inline]
    pub fn angle(&self) -> f64 {
        self.y.atan2(self.x)
    }

    /// Rotate counter-clockwise about the origin.
    pub fn rotate(&self, theta: f64) -> Point {
        let (sin, cos) = theta.sin_cos();
        Point::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    /// Rotate by +90°.
    #[inline]
    pub fn perp(&self) -> Point {
        Point::new(-self.y, self.x)
    }

    /// Mirror image across the x axis.
    #[inline]
    pub fn conj(&self) -> Point {
        Point::new(self.x, -self.y)
    }

    /// `self + t * (other - self)`.
    #[inline]
    pub fn convex_sum(&self, other: Point, t: f64) -> Point {
        *self + (other - *self) * t
    }

    /// Parameter of the projection of `self` onto the line `a → b`
    /// (0 at `a`, 1 at `b`).
    pub fn parameter_along_line(&self, a: Point, b: Point) -> f64 {
        let ab = b - a;
        (*self - a).dot(ab) / ab.magnitude2()
    }

    /// Closest point to `self` on the infinite line through `a` and `b`.
    pub fn project_onto_line(&self, a: Point, b: Point) -> Point {
        a.convex_sum(b, self.parameter_along_line(a, b))
    }

    /// Squared distance to the infinite line through `a` and `b`.
    pub fn dist2_to_line(&self, a: Point, b: Point) -> f64 {
        self.distance2(self.project_onto_line(a, b))
    }

    /// Distance to the infinite line through `a` and `b`.
    pub fn dist_to_line(&self, a: Point, b: Point) -> f64 {
        self.dist2_to_line(a, b).sqrt()
    }

    /// Lies strictly inside segment `a → b` (not at either endpoint).
    pub fn is_inside_segment(&self, a: Point, b: Point) -> bool {
        if self.approx_eq(a) || self.approx_eq(b) {
            return false;
        }
        let t = self.parameter_along_line(a, b);
        t > 0.0 && t < 1.0 && self.dist2_to_line(a, b) < TOLERANCE2
    }
}

impl Add for Point {
    type Output = Point;
    #[inline]
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;
    #[inline]
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;
    #[inline]
    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Point {
    type Output = Point;
    #[inline]
    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

/// An ordered point sequence. The closing edge from the last point back to
/// the first is implicit.
///
/// Equality is order sensitive: the same points starting elsewhere compare
/// unequal.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polygon {
    pub points: Vec<Point>,
}

impl Polygon {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// `n` equally spaced points on the unit circle.
    ///
    /// Vertex `i` sits at angle `(i + ½)·2π/n`, which puts the edge midpoints
    /// on the directions `2πk/n` where radial figures have their tips.
    pub fn regular(n: usize) -> Self {
        let nf = n as f64;
        let points = (0..n)
            .map(|i| Point::arc((i as f64 + 0.5) / nf))
            .collect();
        Self { points }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Edges as `(start, end)` pairs, including the closing edge.
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let n = self.points.len();
        (0..n).map(move |i| (self.points[i], self.points[(i + 1) % n]))
    }

    pub fn bounds(&self) -> Rect {
        Rect::bounding(self.points.iter().copied())
    }

    /// Signed area (shoelace). Positive for counter-clockwise winding.
    pub fn signed_area(&self) -> f64 {
        signed_area_of_points(&self.points)
    }

    #[inline]
    pub fn is_clockwise(&self) -> bool {
        self.signed_area() < 0.0
    }

    /// Vertex average. Invalid for an empty polygon.
    pub fn centroid(&self) -> Point {
        if self.points.is_empty() {
            return Point::INVALID;
        }
        let sum = self.points.iter().fold(Point::ORIGIN, |acc, p| acc + *p);
        sum * (1.0 / self.points.len() as f64)
    }

    pub fn transformed(&self, t: &Transform) -> Polygon {
        Polygon::new(self.points.iter().map(|p| t.apply(*p)).collect())
    }

    /// Even-odd point containment.
    pub fn contains(&self, p: Point) -> bool {
        let mut inside = false;
        for (a, b) in self.edges() {
            if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
                inside = !inside;
            }
        }
        inside
    }

    /// Separating-axis overlap test for two convex polygons. Touching
    /// boundaries count as overlapping.
    pub fn convex_overlap(&self, other: &Polygon) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        let separated_along = |axis: Point| {
            let (min_a, max_a) = project(&self.points, axis);
            let (min_b, max_b) = project(&other.points, axis);
            max_a < min_b - TOLERANCE || max_b < min_a - TOLERANCE
        };
        !self
            .edges()
            .chain(other.edges())
            .map(|(a, b)| (b - a).perp())
            .any(separated_along)
    }
}

fn project(points: &[Point], axis: Point) -> (f64, f64) {
    points.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
        let d = p.dot(axis);
        (lo.min(d), hi.max(d))
    })
}

/// Signed area of a point sequence using the shoelace formula.
///
/// Positive for counter-clockwise winding, negative for clockwise.
pub fn signed_area_of_points(points: &[Point]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }

    let mut area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        area += points[i].x * points[j].y;
        area -= points[j].x * points[i].y;
    }
    area / 2.0
}

/// Axis-aligned rectangle. `Rect::INVALID` is the empty rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const INVALID: Rect = Rect {
        x: f64::NAN,
        y: f64::NAN,
        width: f64::NAN,
        height: f64::NAN,
    };

    #[inline]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle spanning two opposite corners, in any order.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self::new(a.x.min(b.x), a.y.min(b.y), (a.x - b.x).abs(), (a.y - b.y).abs())
    }

    /// Bounding box of a point set. Invalid when the set is empty.
    pub fn bounding(points: impl IntoIterator<Item = Point>) -> Self {
        let mut lo = Point::new(f64::INFINITY, f64::INFINITY);
        let mut hi = Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
        let mut any = false;
        for p in points.into_iter().filter(Point::is_valid) {
            lo = Point::new(lo.x.min(p.x), lo.y.min(p.y));
            hi = Point::new(hi.x.max(p.x), hi.y.max(p.y));
            any = true;
        }
        if any { Rect::from_corners(lo, hi) } else { Rect::INVALID }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        !(self.x.is_nan() || self.y.is_nan() || self.width.is_nan() || self.height.is_nan())
    }

    #[inline]
    pub fn left(&self) -> f64 {
        self.x
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[inline]
    pub fn top(&self) -> f64 {
        self.y
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[inline]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Corners in winding order starting at `(x, y)`.
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.left(), self.top()),
            Point::new(self.right(), self.top()),
            Point::new(self.right(), self.bottom()),
            Point::new(self.left(), self.bottom()),
        ]
    }

    pub fn to_polygon(&self) -> Polygon {
        Polygon::new(self.corners().to_vec())
    }

    /// Bounding union. An invalid operand is ignored.
    pub fn combine(&self, other: &Rect) -> Rect {
        match (self.is_valid(), other.is_valid()) {
            (false, _) => *other,
            (_, false) => *self,
            _ => Rect::bounding(self.corners().into_iter().chain(other.corners())),
        }
    }

    /// Overlap of two rectangles; invalid when they are disjoint.
    pub fn intersect(&self, other: &Rect) -> Rect {
        if !self.is_valid() || !other.is_valid() {
            return Rect::INVALID;
        }
        let left = self.left().max(other.left());
        let top = self.top().max(other.top());
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right < left || bottom < top {
            return Rect::INVALID;
        }
        Rect::new(left, top, right - left, bottom - top)
    }

    pub fn contains(&self, p: Point) -> bool {
        self.is_valid()
            && p.x >= self.left() - TOLERANCE
            && p.x <= self.right() + TOLERANCE
            && p.y >= self.top() - TOLERANCE
            && p.y <= self.bottom() + TOLERANCE
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.is_valid() && other.corners().iter().all(|c| self.contains(*c))
    }

    /// Same centre, sides multiplied by `factor`.
    pub fn scaled_about_center(&self, factor: f64) -> Rect {
        let c = self.center();
        let (w, h) = (self.width * factor, self.height * factor);
        Rect::new(c.x - w / 2.0, c.y - h / 2.0, w, h)
    }

    /// Bounding box of this rectangle after a transform.
    pub fn transformed(&self, t: &Transform) -> Rect {
        if !self.is_valid() {
            return Rect::INVALID;
        }
        Rect::bounding(self.corners().into_iter().map(|c| t.apply(c)))
    }

    /// Uniform scale plus translation that fits `self` inside `target`,
    /// centred.
    pub fn fit_transform(&self, target: &Rect) -> Transform {
        if !self.is_valid() || !target.is_valid() || self.width <= 0.0 || self.height <= 0.0 {
            return Transform::identity();
        }
        let scale = (target.width / self.width).min(target.height / self.height);
        let from = self.center();
        let to = target.center();
        Transform::translation(-from.x, -from.y)
            .then(&Transform::scale(scale))
            .then(&Transform::translation(to.x, to.y))
    }
}
