//! `girih tilings`: load a folder of tiling files and report on them.

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Args;
use serde::Serialize;

use girih::{TileShape, Tiling, load_tiling_dir};

#[derive(Debug, Args)]
pub struct TilingsArgs {
    /// Folder of `.tiling` files
    pub dir: PathBuf,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Exit with an error if any file failed to load
    #[arg(long)]
    pub strict: bool,
}

/// One line of the report.
#[derive(Debug, Serialize)]
pub struct TilingSummary {
    pub name: String,
    pub lattice: &'static str,
    pub tiles: Vec<String>,
    pub placements: usize,
    pub description: String,
    pub author: String,
}

impl TilingSummary {
    pub fn of(tiling: &Tiling) -> Self {
        let tiles = tiling
            .tiles()
            .iter()
            .map(|tile| match &tile.shape {
                TileShape::Regular(n) => format!("{{{}}}", n),
                TileShape::Polygon(p) => format!("{}-gon", p.len()),
            })
            .collect();
        Self {
            name: tiling.name.clone(),
            lattice: tiling.lattice.kind(),
            tiles,
            placements: tiling.tiles().iter().map(|t| t.placements.len()).sum(),
            description: tiling.description.clone(),
            author: tiling.author.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct Report {
    tilings: Vec<TilingSummary>,
    errors: Vec<String>,
}

pub fn cmd_tilings(args: &TilingsArgs) -> Result<()> {
    let (tilings, errors) = load_tiling_dir(&args.dir);
    let report = Report {
        tilings: tilings.iter().map(TilingSummary::of).collect(),
        errors,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for t in &report.tilings {
            println!(
                "{:<16} {:<12} tiles: {:<20} placements: {}",
                t.name,
                t.lattice,
                t.tiles.join(" "),
                t.placements
            );
            if !t.description.is_empty() {
                println!("    {}", t.description);
            }
        }
        for err in &report.errors {
            eprintln!("error: {}", err);
        }
        println!("{} loaded, {} failed", report.tilings.len(), report.errors.len());
    }

    if args.strict && !report.errors.is_empty() {
        bail!("{} tiling file(s) failed to load", report.errors.len());
    }
    Ok(())
}
