//! `girih figure`: draw one radial figure inside its tile.

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Args, ValueEnum};
use tracing::{info, warn};

use girih::figures::border_polygon;
use girih::render::{DrawingSurface, Stroke, mark_vertices};
use girih::{Color, Faces, Figure, HankinInference, Style, SvgSurface};

use super::common::write_outputs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FigureKind {
    Star,
    Rosette,
}

#[derive(Debug, Args)]
pub struct FigureArgs {
    /// Figure family
    #[arg(value_enum)]
    pub kind: FigureKind,

    /// Rotational symmetry
    #[arg(short, default_value_t = 8)]
    pub n: usize,

    /// Star: how many vertices each line skips
    #[arg(short, default_value_t = 3.0)]
    pub d: f64,

    /// Rosette: shoulder position in (-1, 1)
    #[arg(short, default_value_t = 0.0, allow_negative_numbers = true)]
    pub q: f64,

    /// Number of line segments kept per arm
    #[arg(short, default_value_t = 2)]
    pub s: usize,

    /// Extend the figure out to its tile border with this scale
    #[arg(long)]
    pub extend: Option<f64>,

    /// Extend to the border at the scale where neighbouring tips connect
    #[arg(long, conflicts_with = "extend")]
    pub connect: bool,

    /// Drawing style
    #[arg(long, default_value = "thick")]
    pub style: String,

    /// Circle every vertex
    #[arg(long)]
    pub vertices: bool,

    /// SVG output file (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also rasterize to this PNG file
    #[arg(long)]
    pub png: Option<PathBuf>,

    /// Image width in pixels
    #[arg(long, default_value_t = 600.0)]
    pub size: f64,
}

impl FigureArgs {
    pub fn figure(&self) -> Result<Figure> {
        if self.n < 3 {
            bail!("n must be at least 3, got {}", self.n);
        }
        let figure = match self.kind {
            FigureKind::Star => Figure::star(self.n, self.d, self.s),
            FigureKind::Rosette => Figure::rosette(self.n, self.q, self.s),
        };
        Ok(match self.extend {
            Some(k) => figure.extended(k),
            None if self.connect => figure.extended_to_border(),
            None => figure,
        })
    }
}

pub fn cmd_figure(args: &FigureArgs) -> Result<()> {
    let Some(style) = Style::default_named(&args.style) else {
        bail!("unknown style '{}' (expected one of: {})", args.style, Style::names().join(", "));
    };
    let figure = args.figure()?;
    let map = figure.build_map(&HankinInference);
    info!(
        kind = figure.kind(),
        n = args.n,
        edges = map.edge_count(),
        vertices = map.vertex_count(),
        "figure built"
    );
    if let Err(err) = Faces::build(&map).verify() {
        warn!(%err, "figure faces");
    }

    let border = border_polygon(args.n);
    let view = border.bounds().scaled_about_center(1.1);

    let mut surface = SvgSurface::new();
    surface.set_color(Color::new_rgb(0xbb, 0xbb, 0xbb));
    surface.set_stroke(Stroke::new(0.005));
    surface.draw_polygon(&border);
    style.draw(&map, &mut surface);
    if args.vertices {
        mark_vertices(&map, &mut surface, Color::new_rgb(0xd6, 0x28, 0x28), 0.02);
    }

    let svg = surface.finish(&view, Some(Color::new_rgb(255, 255, 255)), Some(args.size));
    write_outputs(&svg, args.output.as_deref(), args.png.as_deref(), 1.0)
}
