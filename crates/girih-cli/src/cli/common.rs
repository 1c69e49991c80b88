//! Common utilities shared across CLI commands.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tiny_skia::Pixmap;
use tracing::info;

/// Rasterize an SVG document, scaling its intrinsic size by `scale`.
pub fn svg_to_png(svg: &str, scale: f32) -> Result<Vec<u8>> {
    let options = usvg::Options::default();
    let tree = usvg::Tree::from_str(svg, &options).context("generated SVG did not parse")?;

    let size = tree.size();
    let width = (size.width() * scale).ceil().max(1.0) as u32;
    let height = (size.height() * scale).ceil().max(1.0) as u32;
    let mut pixmap =
        Pixmap::new(width, height).ok_or_else(|| anyhow!("cannot allocate a {}x{} image", width, height))?;

    resvg::render(&tree, tiny_skia::Transform::from_scale(scale, scale), &mut pixmap.as_mut());
    pixmap.encode_png().context("PNG encoding failed")
}

/// Write the SVG to `output`, or stdout when absent, and optionally a PNG.
pub fn write_outputs(svg: &str, output: Option<&Path>, png: Option<&Path>, scale: f32) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, svg).with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), bytes = svg.len(), "wrote SVG");
        }
        None => {
            io::stdout().write_all(svg.as_bytes())?;
        }
    }

    if let Some(path) = png {
        let bytes = svg_to_png(svg, scale)?;
        fs::write(path, &bytes).with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), bytes = bytes.len(), "wrote PNG");
    }
    Ok(())
}
