//! CLI command implementations.
//!
//! This module contains the implementations for the various CLI subcommands:
//! - `render` - Build a layered recipe into SVG, PNG or JSON
//! - `figure` - Draw a single star or rosette
//! - `tilings` - Load and summarize a folder of tiling files
//! - `example` - Print a sample recipe

pub mod common;
pub mod figure;
pub mod recipe;
pub mod render;
pub mod tilings;

pub use figure::{FigureArgs, cmd_figure};
pub use recipe::print_example;
pub use render::{RenderArgs, cmd_render};
pub use tilings::{TilingsArgs, cmd_tilings};
