//! Figures: the motif drawn inside one tile.
//!
//! ## Rust Lesson #10: Enums (Sum Types)
//!
//! The set of figure kinds is fixed, so it is an `enum` rather than a trait
//! object. `match` forces every operation to handle every kind, and adding a
//! kind is a compile error everywhere it is not yet supported.
//!
//! ```text
//! Figure
//! ├── Radial(RadialFigure)      n-fold symmetric, built from a unit
//! │   ├── Star
//! │   ├── Rosette
//! │   └── Extended               scaled child, tips run to the border
//! └── Irregular(IrregularFigure) inferred from the tile polygon
//! ```
//!
//! Building a figure map is not free, so [`MapCache`] memoizes maps by a
//! key hashed from the figure's parameters. Editing a parameter changes the
//! key, which is all the invalidation the cache needs.

mod extended;
mod irregular;
mod radial;
mod rosette;
mod star;

use std::collections::HashMap;
use std::collections::hash_map::{DefaultHasher, Entry};
use std::hash::{Hash, Hasher};

use tracing::trace;

use crate::map::Map;
use crate::transform::Transform;

pub use extended::{ExtendedFigure, border_contacts};
pub use irregular::{HankinInference, Infer, InferMode, InferParams, IrregularFigure};
pub use radial::{border_polygon, build_radial_map, tile_fit};
pub use rosette::Rosette;
pub use star::Star;

/// A figure with `n`-fold rotational and mirror symmetry.
#[derive(Debug, Clone, PartialEq)]
pub enum RadialFigure {
    Star(Star),
    Rosette(Rosette),
    Extended(Box<ExtendedFigure>),
}

impl RadialFigure {
    pub fn n(&self) -> usize {
        match self {
            RadialFigure::Star(star) => star.n,
            RadialFigure::Rosette(rosette) => rosette.n,
            RadialFigure::Extended(ext) => ext.n(),
        }
    }

    /// The geometry around the tip at angle 0.
    pub fn build_unit(&self) -> Map {
        match self {
            RadialFigure::Star(star) => star.build_unit(),
            RadialFigure::Rosette(rosette) => rosette.build_unit(),
            RadialFigure::Extended(ext) => ext.build_unit(),
        }
    }

    pub fn build_map(&self) -> Map {
        build_radial_map(&self.build_unit(), self.n())
    }

    pub(crate) fn hash_key<H: Hasher>(&self, state: &mut H) {
        match self {
            RadialFigure::Star(star) => star.hash_key(state),
            RadialFigure::Rosette(rosette) => rosette.hash_key(state),
            RadialFigure::Extended(ext) => ext.hash_key(state),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Figure {
    Radial(RadialFigure),
    Irregular(IrregularFigure),
}

impl Figure {
    pub fn star(n: usize, d: f64, s: usize) -> Self {
        Figure::Radial(RadialFigure::Star(Star::new(n, d, s)))
    }

    pub fn rosette(n: usize, q: f64, s: usize) -> Self {
        Figure::Radial(RadialFigure::Rosette(Rosette::new(n, q, s)))
    }

    /// Wrap a radial figure in an extension with scale `s`. Irregular
    /// figures come back unchanged.
    pub fn extended(self, s: f64) -> Self {
        match self {
            Figure::Radial(child) => {
                Figure::Radial(RadialFigure::Extended(Box::new(ExtendedFigure::new(child, s))))
            }
            other => other,
        }
    }

    /// Like [`Figure::extended`], with the scale chosen so neighbouring
    /// tips connect on the tile border.
    pub fn extended_to_border(self) -> Self {
        match self {
            Figure::Radial(child) => {
                Figure::Radial(RadialFigure::Extended(Box::new(ExtendedFigure::connected(child))))
            }
            other => other,
        }
    }

    /// Short kind name for logs and reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Figure::Radial(RadialFigure::Star(_)) => "star",
            Figure::Radial(RadialFigure::Rosette(_)) => "rosette",
            Figure::Radial(RadialFigure::Extended(_)) => "extended",
            Figure::Irregular(_) => "irregular",
        }
    }

    /// Symmetry order for radial figures.
    pub fn symmetry(&self) -> Option<usize> {
        match self {
            Figure::Radial(radial) => Some(radial.n()),
            Figure::Irregular(_) => None,
        }
    }

    /// The figure's map in its own frame.
    pub fn build_map(&self, infer: &dyn Infer) -> Map {
        match self {
            Figure::Radial(radial) => radial.build_map(),
            Figure::Irregular(irregular) => irregular.build_map(infer),
        }
    }

    /// Transform from the figure frame into tile coordinates.
    pub fn tile_fit(&self) -> Transform {
        match self {
            Figure::Radial(radial) => tile_fit(radial.n()),
            Figure::Irregular(_) => Transform::identity(),
        }
    }

    pub fn cache_key(&self) -> FigureKey {
        let mut hasher = DefaultHasher::new();
        match self {
            Figure::Radial(radial) => radial.hash_key(&mut hasher),
            Figure::Irregular(irregular) => irregular.hash_key(&mut hasher),
        }
        FigureKey(hasher.finish())
    }
}

/// Hash of a figure's kind and parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FigureKey(pub u64);

/// Memoized figure maps.
#[derive(Debug, Default)]
pub struct MapCache {
    maps: HashMap<FigureKey, Map>,
    hits: usize,
    misses: usize,
}

impl MapCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached map for `figure`, building it on first use.
    pub fn get_or_build(&mut self, figure: &Figure, infer: &dyn Infer) -> &Map {
        let key = figure.cache_key();
        match self.maps.entry(key) {
            Entry::Occupied(entry) => {
                self.hits += 1;
                entry.into_mut()
            }
            Entry::Vacant(entry) => {
                self.misses += 1;
                trace!(kind = figure.kind(), key = key.0, "building figure map");
                entry.insert(figure.build_map(infer))
            }
        }
    }

    pub fn contains(&self, figure: &Figure) -> bool {
        self.maps.contains_key(&figure.cache_key())
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    /// `(hits, misses)` since creation.
    pub fn stats(&self) -> (usize, usize) {
        (self.hits, self.misses)
    }

    pub fn clear(&mut self) {
        self.maps.clear();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::geometry::{Point, Polygon};
    use crate::map::Edge;

    /// Same edge set within tolerance, ignoring order.
    pub(crate) fn same_edges(a: &Map, b: &Map) -> bool {
        let matches = |e: &Edge, map: &Map| {
            map.edges().iter().any(|f| {
                (e.p1.approx_eq(f.p1) && e.p2.approx_eq(f.p2))
                    || (e.p1.approx_eq(f.p2) && e.p2.approx_eq(f.p1))
            })
        };
        a.edge_count() == b.edge_count()
            && a.edges().iter().all(|e| matches(e, b))
            && b.edges().iter().all(|e| matches(e, a))
    }

    #[test]
    fn radial_maps_are_closed_under_rotation() {
        let figures = [
            Figure::star(8, 3.0, 2),
            Figure::rosette(8, 0.3, 2),
            Figure::star(6, 2.0, 1).extended(0.75),
            Figure::star(10, 3.0, 1).extended_to_border(),
        ];
        for figure in &figures {
            let n = figure.symmetry().expect("radial");
            let map = figure.build_map(&HankinInference);
            let turned = map.transformed(&Transform::rotation(std::f64::consts::TAU / n as f64));
            assert!(same_edges(&map, &turned), "{} not {}-fold symmetric", figure.kind(), n);
        }
    }

    #[test]
    fn cache_key_tracks_parameters() {
        let a = Figure::star(8, 3.0, 2);
        let b = Figure::star(8, 3.0, 2);
        let c = Figure::star(8, 3.0, 3);
        assert_eq!(a.cache_key(), b.cache_key());
        assert_ne!(a.cache_key(), c.cache_key());
        assert_ne!(Figure::rosette(8, 3.0, 2).cache_key(), a.cache_key());
    }

    #[test]
    fn cache_builds_once_per_key() {
        let mut cache = MapCache::new();
        let figure = Figure::rosette(6, 0.0, 1);
        let first = cache.get_or_build(&figure, &HankinInference).edge_count();
        let second = cache.get_or_build(&figure.clone(), &HankinInference).edge_count();
        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats(), (1, 1));
    }

    #[test]
    fn edited_figure_misses_the_cache() {
        let mut cache = MapCache::new();
        let mut figure = Figure::star(8, 3.0, 2);
        cache.get_or_build(&figure, &HankinInference);
        if let Figure::Radial(RadialFigure::Star(star)) = &mut figure {
            star.s = 1;
        }
        assert!(!cache.contains(&figure));
    }

    #[test]
    fn tile_fit_puts_tips_on_edge_midpoints() {
        let figure = Figure::star(8, 3.0, 2);
        let tip = figure.tile_fit().apply(Point::new(1.0, 0.0));
        let octagon = Polygon::regular(8);
        let midpoint = (octagon.points[7] + octagon.points[0]) * 0.5;
        assert!(tip.approx_eq(midpoint), "{:?} vs {:?}", tip, midpoint);
    }

    #[test]
    fn irregular_ignores_extension() {
        let figure = Figure::Irregular(IrregularFigure::new(
            Polygon::regular(5),
            InferMode::Girih,
            InferParams::default(),
        ));
        assert_eq!(figure.clone().extended(0.5), figure);
        assert_eq!(figure.clone().extended_to_border(), figure);
        assert!(figure.tile_fit().is_identity());
    }
}
