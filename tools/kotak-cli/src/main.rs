//! KotakKata CLI: lay out and render text cards from the terminal.
//!
//! Usage:
//!   kotak render [OPTIONS]    Render a card to a PNG file
//!   kotak layout [OPTIONS]    Print the fitted layout as JSON
//!   kotak fonts               List the font catalog and installed faces

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use kotak_common::config::AppConfig;

mod commands;

use commands::request::RequestArgs;

#[derive(Parser)]
#[command(
    name = "kotak",
    about = "Fit text into a card and render it as an image",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to the per-user config)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a card to a PNG file
    Render {
        #[command(flatten)]
        request: RequestArgs,

        /// Output file (defaults to a timestamped name in the output dir)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Draw block glyphs instead of loading font files
        #[arg(long)]
        block_glyphs: bool,
    },

    /// Print the fitted layout as JSON
    Layout {
        #[command(flatten)]
        request: RequestArgs,

        /// Measure with built-in metric tables instead of font files
        #[arg(long)]
        metrics_only: bool,
    },

    /// List the font catalog and which families are installed
    Fonts,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };

    // Initialize logging
    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    kotak_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Render {
            request,
            out,
            block_glyphs,
        } => commands::render::run(request, out, block_glyphs, &config).await,
        Commands::Layout {
            request,
            metrics_only,
        } => commands::layout::run(request, metrics_only, &config),
        Commands::Fonts => commands::fonts::run(&config),
    }
}
