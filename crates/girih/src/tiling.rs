//! Periodic and inflation tilings.
//!
//! A [`Tiling`] is a *fundamental unit* (a few placed tiles) plus a rule
//! for repeating it: a translation lattice spanned by `t1` and `t2`, or an
//! inflation that maps one edge onto another and is applied outward in
//! rings around its fixed point.

use std::f64::consts::PI;

use tracing::{debug, warn};

use crate::geometry::{Point, Polygon, Rect};
use crate::map::Edge;
use crate::transform::Transform;

/// Hard ceiling on inflation rings in each direction.
pub const MAX_RINGS: i32 = 64;

/// Inward rings stop once the unit shrinks below this fraction of the
/// region's size.
const INWARD_CUTOFF: f64 = 1e-3;

/// Index of a tile within its tiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(pub usize);

/// The polygon a tile is made of.
#[derive(Debug, Clone, PartialEq)]
pub enum TileShape {
    /// Regular polygon with unit circumradius, see [`Polygon::regular`].
    Regular(usize),
    /// Any other polygon, in tile coordinates.
    Polygon(Polygon),
}

impl TileShape {
    pub fn polygon(&self) -> Polygon {
        match self {
            TileShape::Regular(n) => Polygon::regular(*n),
            TileShape::Polygon(p) => p.clone(),
        }
    }

    pub fn sides(&self) -> usize {
        match self {
            TileShape::Regular(n) => *n,
            TileShape::Polygon(p) => p.len(),
        }
    }

    pub fn is_regular(&self) -> bool {
        matches!(self, TileShape::Regular(_))
    }
}

/// A tile shape and every place it appears in the fundamental unit.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedTile {
    pub shape: TileShape,
    pub placements: Vec<Transform>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Lattice {
    Translation {
        t1: Point,
        t2: Point,
    },
    /// The similarity carrying `from` onto `to`, applied repeatedly. `t1`
    /// and `t2` are kept for files that carry both.
    Inflation {
        from: Edge,
        to: Edge,
        t1: Point,
        t2: Point,
    },
}

impl Lattice {
    pub fn translation(t1: Point, t2: Point) -> Self {
        Lattice::Translation { t1, t2 }
    }

    pub fn inflation_transform(&self) -> Option<Transform> {
        match self {
            Lattice::Translation { .. } => None,
            Lattice::Inflation { from, to, .. } => {
                Some(Transform::similarity((from.p1, from.p2), (to.p1, to.p2)))
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Lattice::Translation { .. } => "translation",
            Lattice::Inflation { .. } => "inflation",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tiling {
    pub name: String,
    pub description: String,
    pub author: String,
    pub lattice: Lattice,
    tiles: Vec<PlacedTile>,
}

impl Tiling {
    pub fn new(name: impl Into<String>, lattice: Lattice) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            author: String::new(),
            lattice,
            tiles: Vec::new(),
        }
    }

    /// Add placements of `shape`. A shape already in the tiling gains the
    /// placements instead of becoming a second tile.
    pub fn add_tile(&mut self, shape: TileShape, placements: Vec<Transform>) -> TileId {
        if let Some(i) = self.tiles.iter().position(|t| t.shape == shape) {
            self.tiles[i].placements.extend(placements);
            return TileId(i);
        }
        self.tiles.push(PlacedTile { shape, placements });
        TileId(self.tiles.len() - 1)
    }

    pub fn tiles(&self) -> &[PlacedTile] {
        &self.tiles
    }

    pub fn tile(&self, id: TileId) -> Option<&PlacedTile> {
        self.tiles.get(id.0)
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Every placed tile polygon of the fundamental unit.
    pub fn unit_polygons(&self) -> impl Iterator<Item = Polygon> + '_ {
        self.tiles.iter().flat_map(|tile| {
            let base = tile.shape.polygon();
            tile.placements.iter().map(move |t| base.transformed(t))
        })
    }

    /// Bounds of the fundamental unit.
    pub fn unit_bounds(&self) -> Rect {
        self.unit_polygons()
            .fold(Rect::INVALID, |acc, poly| acc.combine(&poly.bounds()))
    }

    /// Every lattice transform whose copy of the unit may touch `region`.
    pub fn placements(&self, region: &Rect) -> Vec<Transform> {
        let mut out = Vec::new();
        match &self.lattice {
            Lattice::Translation { t1, t2 } => {
                fill_lattice(*t1, *t2, region, |a, b| {
                    out.push(Transform::translate(*t1 * a as f64 + *t2 * b as f64));
                });
            }
            Lattice::Inflation { .. } => {
                if let Some(inflation) = self.lattice.inflation_transform() {
                    fill_rings(&inflation, &self.unit_bounds(), region, |_, t| out.push(t));
                }
            }
        }
        debug!(tiling = %self.name, count = out.len(), "lattice placements");
        out
    }
}

/// Call `f(a, b)` for every integer cell `a·t1 + b·t2` whose neighbourhood
/// overlaps `region`.
///
/// The region is mapped into lattice coordinates, its bounding box is
/// padded by one cell, and each candidate cell (grown by half a cell on
/// every side) is tested against the mapped region.
pub fn fill_lattice(t1: Point, t2: Point, region: &Rect, mut f: impl FnMut(i32, i32)) {
    let basis = Transform::from_parameters([t1.x, t1.y, t2.x, t2.y, 0.0, 0.0]);
    let Some(to_lattice) = basis.invert() else {
        warn!(?t1, ?t2, "degenerate lattice vectors");
        return;
    };
    if !region.is_valid() {
        return;
    }
    let mapped = Polygon::new(region.corners().iter().map(|c| to_lattice.apply(*c)).collect());
    let bounds = mapped.bounds();

    let x0 = bounds.left().floor() as i32 - 1;
    let x1 = bounds.right().ceil() as i32 + 1;
    let y0 = bounds.top().floor() as i32 - 1;
    let y1 = bounds.bottom().ceil() as i32 + 1;

    for b in y0..=y1 {
        for a in x0..=x1 {
            let cell = Rect::new(a as f64 - 0.5, b as f64 - 0.5, 2.0, 2.0).to_polygon();
            if cell.convex_overlap(&mapped) {
                f(a, b);
            }
        }
    }
}

/// Call `f(ring, transform)` for successive powers of `inflation`.
///
/// Ring 0 is the identity. Positive rings grow the unit until its image
/// covers `region`; negative rings shrink it until it is too small to see.
/// Both directions stop after [`MAX_RINGS`].
pub fn fill_rings(inflation: &Transform, unit: &Rect, region: &Rect, mut f: impl FnMut(i32, Transform)) {
    let Some(inverse) = inflation.invert() else {
        warn!("singular inflation transform");
        return;
    };
    let (grow, shrink) = if inflation.scale_factor() >= 1.0 {
        (*inflation, inverse)
    } else {
        (inverse, *inflation)
    };

    f(0, Transform::identity());

    // Growth stops once a ring covers the region or has moved past it.
    let center = inflation.fixed_point();
    let reach = region
        .corners()
        .iter()
        .map(|c| c.distance(center))
        .fold(0.0, f64::max);
    let mut t = Transform::identity();
    for ring in 1..=MAX_RINGS {
        t = t.then(&grow);
        f(ring, t);
        let image = unit.transformed(&t);
        if t.scale_factor() <= 1.0 + 1e-9
            || image.contains_rect(region)
            || distance_to_rect(center, &image) > reach
        {
            break;
        }
    }

    let min_size = region.width.max(region.height) * INWARD_CUTOFF;
    let mut t = Transform::identity();
    for ring in 1..=MAX_RINGS {
        t = t.then(&shrink);
        let size = unit.transformed(&t);
        if size.width.max(size.height) < min_size {
            break;
        }
        f(-ring, t);
    }
}

fn distance_to_rect(p: Point, rect: &Rect) -> f64 {
    let dx = (rect.left() - p.x).max(p.x - rect.right()).max(0.0);
    let dy = (rect.top() - p.y).max(p.y - rect.bottom()).max(0.0);
    dx.hypot(dy)
}

/// The eight lattice neighbours around the origin cell.
pub fn surround(t1: Point, t2: Point, mut f: impl FnMut(Transform)) {
    for b in -1..=1 {
        for a in -1..=1 {
            if a == 0 && b == 0 {
                continue;
            }
            f(Transform::translate(t1 * a as f64 + t2 * b as f64));
        }
    }
}

/// Placement that puts a regular `n`-gon at `center`, scaled to the given
/// edge length and turned by `rotation`.
pub fn regular_placement(n: usize, edge_length: f64, rotation: f64, center: Point) -> Transform {
    let circumradius = edge_length / (2.0 * (PI / n as f64).sin());
    Transform::scale(circumradius)
        .then(&Transform::rotation(rotation))
        .then(&Transform::translate(center))
}
