//! `girih render`: build a recipe and write SVG, PNG or JSON.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Args;
use tracing::{info, warn};

use super::common::write_outputs;
use super::recipe::Recipe;

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Recipe YAML file
    pub recipe: PathBuf,

    /// SVG output file (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also rasterize to this PNG file
    #[arg(long)]
    pub png: Option<PathBuf>,

    /// PNG pixels per canvas pixel
    #[arg(long, default_value_t = 1.0)]
    pub scale: f32,

    /// Write the layer edge lists as JSON to this file
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Fail when a layer's faces cannot be two-coloured
    #[arg(long)]
    pub verify: bool,
}

pub fn cmd_render(args: &RenderArgs) -> Result<()> {
    let recipe = Recipe::load(&args.recipe)?;
    info!(
        recipe = %recipe.name,
        layers = recipe.layers.len(),
        width = recipe.canvas.width,
        height = recipe.canvas.height,
        "loaded recipe"
    );

    let base = args.recipe.parent().unwrap_or(Path::new("."));
    let rendered = recipe.render(base)?;

    let problems = rendered.verify();
    for problem in &problems {
        warn!(%problem, "face check");
    }
    if args.verify && !problems.is_empty() {
        bail!("{} layer(s) failed the face check", problems.len());
    }

    if let Some(path) = &args.json {
        let text = serde_json::to_string_pretty(&rendered.to_json())?;
        fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "wrote JSON");
    }

    let svg = rendered.to_svg()?;
    write_outputs(&svg, args.output.as_deref(), args.png.as_deref(), args.scale)
}
