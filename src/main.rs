//! r128view - An EBU R128 loudness meter for the terminal
//!
//! Reads periodic loudness measurements and draws them against a target
//! level. Features include:
//! - Header with momentary, short-term, integrated loudness and range
//! - Color-zoned gauge and scrolling history graph
//! - Absolute (LUFS) and relative (LU) display, toggled at runtime
//! - YAML-based configuration of levels, timing, layout and colors
//! - Export of the current frame as ANSI colored text

mod config;
mod error;
mod history;
mod scale;
mod source;
mod ui;
mod zones;

use anyhow::{Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;

use source::{SampleSource, SourceKind};

/// r128view - EBU R128 loudness meter
#[derive(Parser, Debug)]
#[command(name = "r128view")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Replay samples from a JSON lines file instead of reading stdin
    #[arg(short, long, conflicts_with = "demo")]
    input: Option<PathBuf>,

    /// Show a synthetic signal instead of reading stdin
    #[arg(long)]
    demo: bool,

    /// Where the save key writes the current frame
    #[arg(short, long)]
    export: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    log::info!("Starting r128view");

    // Load configuration
    let mut config = match &args.config {
        Some(path) => config::Config::load(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => config::Config::default(),
    };
    if let Some(export) = args.export {
        config.export_path = export;
    }

    log::info!(
        "Loaded config from {}: target {} LUFS, scale {:+}..{:+}, {} samples per screen",
        config.config_path.as_deref().unwrap_or("defaults"),
        config.target,
        config.scale_from,
        config.scale_to,
        config.history_len()
    );

    // Start the measurement source
    let kind = SourceKind::select(args.demo, args.input, config.target, std::io::stdin().is_terminal())?;
    let source = SampleSource::spawn(kind, config.interval())?;

    // Create and run the application
    let app = ui::App::new(&config, source);
    app.run()?;

    log::info!("r128view exiting");
    Ok(())
}
