//! # girih
//!
//! Islamic star patterns from planar maps, radial figures and tilings.
//!
//! A [`Tiling`] repeats a few tile shapes over the plane. A [`Mosaic`]
//! assigns a [`Figure`] (a star, a rosette, or a figure inferred from an
//! irregular polygon) to each tile and merges every placed copy into one
//! [`Map`]. [`Faces`] colours the regions of the result, [`Interlace`]
//! weaves its strands, and a [`Style`] draws it through any
//! [`DrawingSurface`], such as the bundled [`SvgSurface`].
//!
//! ## Rust Lesson #7: Modules
//!
//! Rust modules are like ES6 modules but more explicit:
//! - `mod foo;` = load from `foo.rs` or `foo/mod.rs`
//! - `pub mod foo;` = also export it publicly
//! - `pub use foo::Bar;` = re-export Bar at this level
//!
//! Unlike Node.js, you must explicitly declare every module.

pub mod error;
pub mod faces;
pub mod figures;
pub mod geometry;
pub mod interlace;
pub mod intersect;
pub mod map;
pub mod mosaic;
pub mod render;
pub mod svg;
pub mod tiling;
pub mod tiling_file;
pub mod transform;

// Re-export common types at crate root for convenience.
pub use error::{FaceError, TilingFileError};
pub use faces::{FaceClass, Faces};
pub use figures::{
    ExtendedFigure, Figure, HankinInference, Infer, InferMode, InferParams, IrregularFigure, MapCache,
    RadialFigure, Rosette, Star,
};
pub use geometry::{Point, Polygon, Rect, TOLERANCE};
pub use interlace::{Interlace, InterlaceParams};
pub use intersect::{intersect, intersect_near, intersect_within};
pub use map::{Edge, Map};
pub use mosaic::{FigureId, Mosaic};
pub use render::{Color, DrawingSurface, Stroke, Style};
pub use svg::SvgSurface;
pub use tiling::{Lattice, TileId, TileShape, Tiling};
pub use tiling_file::{load_tiling, load_tiling_dir, read_tiling, save_tiling, write_tiling};
pub use transform::Transform;
