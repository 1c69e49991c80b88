//! girih - Islamic star pattern generator
//!
//! Usage:
//!   girih render <recipe.yaml> [-o out.svg] [--png out.png]   Render a layered recipe
//!   girih figure star -n 8 -d 3 -s 2                          Draw one figure
//!   girih tilings <dir>                                       Summarize tiling files
//!   girih example                                             Print a sample recipe
//!
//! Logging goes to stderr; set `RUST_LOG=girih=debug` for construction details.

mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cli::{FigureArgs, RenderArgs, TilingsArgs};

#[derive(Parser)]
#[command(name = "girih", version)]
#[command(about = "Islamic star patterns from tilings and radial figures")]
struct Cmd {
    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Render a layered recipe
    Render(RenderArgs),
    /// Draw a single star or rosette in its tile
    Figure(FigureArgs),
    /// Load a folder of tiling files and summarize them
    Tilings(TilingsArgs),
    /// Print an example recipe
    Example,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cmd = Cmd::parse();
    match cmd.action {
        Action::Render(args) => cli::cmd_render(&args),
        Action::Figure(args) => cli::cmd_figure(&args),
        Action::Tilings(args) => cli::cmd_tilings(&args),
        Action::Example => {
            cli::print_example();
            Ok(())
        }
    }
}
