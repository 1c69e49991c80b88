//! Figures for tiles that are not regular polygons.
//!
//! An irregular figure has no radial symmetry to exploit, so its map is
//! *inferred* from the tile polygon itself by an [`Infer`] implementation.
//! The crate ships [`HankinInference`], the classic "polygons in contact"
//! construction; callers can plug in their own.

use std::f64::consts::FRAC_PI_2;
use std::hash::{Hash, Hasher};

use crate::geometry::{Point, Polygon, TOLERANCE2};
use crate::intersect::intersection_params;
use crate::map::{Edge, Map};
use crate::tiling::TileId;

/// The inference strategies an irregular figure can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InferMode {
    Star,
    Girih,
    Intersect,
    Progressive,
    Hourglass,
    Rosette,
    ExtendedRosette,
    Simple,
}

impl InferMode {
    pub fn all() -> &'static [InferMode] {
        &[
            InferMode::Star,
            InferMode::Girih,
            InferMode::Intersect,
            InferMode::Progressive,
            InferMode::Hourglass,
            InferMode::Rosette,
            InferMode::ExtendedRosette,
            InferMode::Simple,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            InferMode::Star => "star",
            InferMode::Girih => "girih",
            InferMode::Intersect => "intersect",
            InferMode::Progressive => "progressive",
            InferMode::Hourglass => "hourglass",
            InferMode::Rosette => "rosette",
            InferMode::ExtendedRosette => "extended-rosette",
            InferMode::Simple => "simple",
        }
    }

    pub fn from_name(name: &str) -> Option<InferMode> {
        let name = name.to_lowercase().replace('_', "-");
        Self::all().iter().copied().find(|m| m.name() == name)
    }
}

/// Numeric knobs passed through to inference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InferParams {
    pub q: f64,
    pub d: f64,
    pub s: usize,
}

impl Default for InferParams {
    fn default() -> Self {
        Self { q: 0.5, d: 2.0, s: 1 }
    }
}

/// Builds a figure map from a tile polygon. The result lives in tile
/// coordinates.
pub trait Infer {
    fn infer(&self, polygon: &Polygon, mode: InferMode, params: &InferParams) -> Map;
}

#[derive(Debug, Clone, PartialEq)]
pub struct IrregularFigure {
    pub polygon: Polygon,
    pub mode: InferMode,
    pub params: InferParams,
    /// The tile this figure was assigned to, once a mosaic owns it.
    pub tile: Option<TileId>,
}

impl IrregularFigure {
    pub fn new(polygon: Polygon, mode: InferMode, params: InferParams) -> Self {
        Self {
            polygon,
            mode,
            params,
            tile: None,
        }
    }

    pub fn build_map(&self, infer: &dyn Infer) -> Map {
        infer.infer(&self.polygon, self.mode, &self.params)
    }

    pub(crate) fn hash_key<H: Hasher>(&self, state: &mut H) {
        "irregular".hash(state);
        self.mode.hash(state);
        self.params.q.to_bits().hash(state);
        self.params.d.to_bits().hash(state);
        self.params.s.hash(state);
        for p in &self.polygon.points {
            p.x.to_bits().hash(state);
            p.y.to_bits().hash(state);
        }
    }
}

// ============================================================================
// Hankin inference
// ============================================================================

/// Smallest and largest contact angle, away from the degenerate 0 and 90°.
const MIN_CONTACT: f64 = 0.05;
const MAX_CONTACT: f64 = FRAC_PI_2 - 0.05;

/// Hankin's method: from the midpoint of every edge, two rays leave at the
/// *contact angle* to the edge, one leaning toward each end. Each ray is
/// cut where it meets the ray from the neighbouring edge that leans toward
/// the same corner.
#[derive(Debug, Clone, Copy, Default)]
pub struct HankinInference;

impl HankinInference {
    /// Contact angle, measured from the edge toward the tile interior.
    ///
    /// `Star` mode reads `d` the way a regular star does: a chord reaching
    /// `d` of `sides` steps meets the edge at `π·d/sides`. Other modes map
    /// `q ∈ [0, 1]` linearly onto the angle range.
    pub fn contact_angle(mode: InferMode, params: &InferParams, sides: usize) -> f64 {
        let angle = match mode {
            InferMode::Star => std::f64::consts::PI * params.d / sides.max(1) as f64,
            _ => params.q.clamp(0.0, 1.0) * FRAC_PI_2,
        };
        angle.clamp(MIN_CONTACT, MAX_CONTACT)
    }
}

impl Infer for HankinInference {
    fn infer(&self, polygon: &Polygon, mode: InferMode, params: &InferParams) -> Map {
        let pts = &polygon.points;
        let m = pts.len();
        if m < 3 {
            return Map::new();
        }
        let theta = Self::contact_angle(mode, params, m);
        let (sin, cos) = theta.sin_cos();
        let inward_sign = if polygon.is_clockwise() { -1.0 } else { 1.0 };

        // (midpoint, ray toward the edge's end, ray toward its start)
        let rays: Vec<(Point, Point, Point)> = polygon
            .edges()
            .map(|(a, b)| {
                let mid = a.convex_sum(b, 0.5);
                let dir = (b - a).normalize();
                let inward = dir.perp() * inward_sign;
                (mid, dir * cos + inward * sin, -dir * cos + inward * sin)
            })
            .collect();

        let mut map = Map::new();
        for i in 0..m {
            let (mid, forward, _) = rays[i];
            let (next_mid, _, backward) = rays[(i + 1) % m];
            let Some((s, t)) = intersection_params(mid, mid + forward, next_mid, next_mid + backward)
            else {
                // Collinear rays already meet: join the midpoints directly.
                let ahead = (next_mid - mid).dot(forward) > 0.0;
                if ahead && next_mid.dist2_to_line(mid, mid + forward) < TOLERANCE2 {
                    map.insert(Edge::new(mid, next_mid));
                }
                continue;
            };
            if s <= 0.0 || t <= 0.0 {
                continue;
            }
            let meet = mid + forward * s;
            map.insert(Edge::new(mid, meet));
            map.insert(Edge::new(meet, next_mid));
        }
        map
    }
}
