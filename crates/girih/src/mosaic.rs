//! Mosaics: a tiling with a figure assigned to each tile.
//!
//! Figures live in an arena owned by the mosaic and are referred to by
//! [`FigureId`]; several tiles may share one figure. Tiles without a figure
//! contribute nothing to the constructed map.

use tracing::{debug, info_span};

use crate::figures::{Figure, Infer, MapCache};
use crate::geometry::Rect;
use crate::map::Map;
use crate::tiling::{TileId, Tiling};

/// Index of a figure in its mosaic's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FigureId(pub usize);

#[derive(Debug, Clone, PartialEq)]
pub struct Mosaic {
    tiling: Tiling,
    figures: Vec<Figure>,
    assignments: Vec<Option<FigureId>>,
}

impl Mosaic {
    pub fn new(tiling: Tiling) -> Self {
        let assignments = vec![None; tiling.tile_count()];
        Self {
            tiling,
            figures: Vec::new(),
            assignments,
        }
    }

    pub fn tiling(&self) -> &Tiling {
        &self.tiling
    }

    pub fn add_figure(&mut self, figure: Figure) -> FigureId {
        self.figures.push(figure);
        FigureId(self.figures.len() - 1)
    }

    pub fn figure(&self, id: FigureId) -> Option<&Figure> {
        self.figures.get(id.0)
    }

    /// Mutable access for editing parameters. The map cache notices the
    /// change through the figure's key.
    pub fn figure_mut(&mut self, id: FigureId) -> Option<&mut Figure> {
        self.figures.get_mut(id.0)
    }

    pub fn figures(&self) -> &[Figure] {
        &self.figures
    }

    /// Give `tile` the figure `figure`. Returns `false` when either id is
    /// out of range.
    pub fn assign(&mut self, tile: TileId, figure: FigureId) -> bool {
        if tile.0 >= self.assignments.len() || figure.0 >= self.figures.len() {
            return false;
        }
        if let Figure::Irregular(irregular) = &mut self.figures[figure.0] {
            irregular.tile = Some(tile);
        }
        self.assignments[tile.0] = Some(figure);
        true
    }

    /// Add `figure` and assign it to `tile` in one go.
    pub fn assign_new(&mut self, tile: TileId, figure: Figure) -> Option<FigureId> {
        let id = self.add_figure(figure);
        self.assign(tile, id).then_some(id)
    }

    pub fn unassign(&mut self, tile: TileId) {
        if let Some(slot) = self.assignments.get_mut(tile.0) {
            *slot = None;
        }
    }

    pub fn figure_for(&self, tile: TileId) -> Option<&Figure> {
        let id = (*self.assignments.get(tile.0)?)?;
        self.figure(id)
    }

    /// The whole design over `region`: every assigned figure, fitted into
    /// its tile, placed at every tile placement and every lattice position.
    pub fn construct(&self, region: &Rect, cache: &mut MapCache, infer: &dyn Infer) -> Map {
        let _span = info_span!("construct", tiling = %self.tiling.name).entered();
        let lattice = self.tiling.placements(region);

        let mut result = Map::new();
        result.begin_merge();
        for (index, tile) in self.tiling.tiles().iter().enumerate() {
            let Some(figure) = self.figure_for(TileId(index)) else {
                continue;
            };
            let map = cache.get_or_build(figure, infer);
            let fit = figure.tile_fit();
            for placement in &tile.placements {
                let placed = map.transformed(&fit.then(placement));
                for cell in &lattice {
                    result.merge_non_overlapping(&placed.transformed(cell));
                }
            }
        }
        result.end_merge();

        debug!(
            cells = lattice.len(),
            edges = result.edge_count(),
            vertices = result.vertex_count(),
            "mosaic constructed"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figures::{HankinInference, InferMode, InferParams, IrregularFigure};
    use crate::geometry::{Point, Polygon};
    use crate::tiling::{Lattice, TileShape, regular_placement};
    use crate::transform::Transform;

    fn hexagons() -> Tiling {
        let t1 = Point::new(3f64.sqrt(), 0.0);
        let t2 = Point::new(3f64.sqrt() / 2.0, 1.5);
        let mut tiling = Tiling::new("hexagons", Lattice::translation(t1, t2));
        tiling.add_tile(TileShape::Regular(6), vec![Transform::identity()]);
        tiling
    }

    #[test]
    fn unassigned_tiles_contribute_nothing() {
        let mosaic = Mosaic::new(hexagons());
        let map = mosaic.construct(&Rect::new(-2.0, -2.0, 4.0, 4.0), &mut MapCache::new(), &HankinInference);
        assert!(map.is_empty());
    }

    #[test]
    fn neighbouring_figures_share_tip_vertices() {
        let mut mosaic = Mosaic::new(hexagons());
        mosaic.assign_new(TileId(0), Figure::star(6, 2.0, 1)).expect("tile exists");
        let map = mosaic.construct(&Rect::new(-2.0, -2.0, 4.0, 4.0), &mut MapCache::new(), &HankinInference);
        // The tip between the tile at the origin and its neighbour at t1.
        let tip = Point::new(3f64.sqrt() / 2.0, 0.0);
        assert_eq!(map.outbounds(tip).len(), 4);
        assert!(map.check().is_empty());
    }

    #[test]
    fn figure_is_built_once_across_placements() {
        let mut mosaic = Mosaic::new(hexagons());
        mosaic.assign_new(TileId(0), Figure::rosette(6, 0.0, 1)).expect("tile exists");
        let mut cache = MapCache::new();
        let region = Rect::new(-3.0, -3.0, 6.0, 6.0);
        mosaic.construct(&region, &mut cache, &HankinInference);
        mosaic.construct(&region, &mut cache, &HankinInference);
        assert_eq!(cache.stats(), (1, 1));
    }

    #[test]
    fn assign_rejects_unknown_ids() {
        let mut mosaic = Mosaic::new(hexagons());
        let id = mosaic.add_figure(Figure::star(6, 2.0, 1));
        assert!(!mosaic.assign(TileId(3), id));
        assert!(!mosaic.assign(TileId(0), FigureId(9)));
        assert!(mosaic.assign(TileId(0), id));
        mosaic.unassign(TileId(0));
        assert!(mosaic.figure_for(TileId(0)).is_none());
    }

    #[test]
    fn irregular_figure_learns_its_tile() {
        let mut tiling = Tiling::new("squares", Lattice::translation(Point::new(1.0, 0.0), Point::new(0.0, 1.0)));
        let square = Polygon::regular(4).transformed(&regular_placement(4, 1.0, 0.0, Point::ORIGIN));
        let tile = tiling.add_tile(TileShape::Polygon(square.clone()), vec![Transform::identity()]);
        let mut mosaic = Mosaic::new(tiling);
        let id = mosaic
            .assign_new(tile, Figure::Irregular(IrregularFigure::new(square, InferMode::Girih, InferParams::default())))
            .expect("tile exists");
        match mosaic.figure(id) {
            Some(Figure::Irregular(irregular)) => assert_eq!(irregular.tile, Some(tile)),
            other => panic!("unexpected figure {:?}", other),
        }
        let map = mosaic.construct(&Rect::new(0.0, 0.0, 2.0, 2.0), &mut MapCache::new(), &HankinInference);
        assert!(!map.is_empty());
    }
}
