//! # Strata Entry Point
//!
//! Loads terrain and room templates, generates a level and writes it out as
//! wrapped grid JSON and/or an ASCII dump.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use strata::{
    AsciiRenderer, GenerationConfig, Generator, LevelGenerator, StrataError, StrataResult, TerrainCatalog,
};
#[cfg(not(feature = "dev-tools"))]
use log::{info, warn};
#[cfg(feature = "dev-tools")]
use tracing::{info, warn};

/// Command line arguments for the level generator.
#[derive(Parser, Debug)]
#[command(name = "strata")]
#[command(about = "Generate multi-layer dungeon levels from prefabricated rooms")]
#[command(version)]
struct Args {
    /// Random seed for level generation
    #[arg(short, long)]
    seed: Option<u64>,

    /// Directory of room template JSON files
    #[arg(short, long, default_value = "assets/rooms")]
    templates: PathBuf,

    /// Terrain catalog JSON file; the standard catalog when omitted
    #[arg(long)]
    terrain: Option<PathBuf>,

    /// Generation config JSON file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of rooms to place around the start room
    #[arg(long)]
    rooms: Option<u32>,

    /// Write the generated grid here as wrapped JSON
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print every layer as ASCII
    #[arg(long)]
    render: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> StrataResult<()> {
    let args = Args::parse();

    initialize_logging(&args.log_level)?;

    info!("Starting Strata v{}", strata::VERSION);
    run(&args)
}

/// Initializes the logging system based on the specified log level.
fn initialize_logging(log_level: &str) -> StrataResult<()> {
    #[cfg(feature = "dev-tools")]
    {
        let filter = tracing_subscriber::EnvFilter::try_new(log_level)
            .map_err(|e| StrataError::InvalidArgument(format!("log level {:?}: {}", log_level, e)))?;

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init()
            .map_err(|e| StrataError::InvalidArgument(format!("logging already initialized: {}", e)))?;
    }

    #[cfg(not(feature = "dev-tools"))]
    {
        let level: log::LevelFilter = log_level
            .parse()
            .map_err(|_| StrataError::InvalidArgument(format!("unknown log level {:?}", log_level)))?;

        env_logger::Builder::new()
            .filter_level(level)
            .parse_default_env()
            .try_init()
            .map_err(|e| StrataError::InvalidArgument(format!("logging already initialized: {}", e)))?;
    }

    Ok(())
}

/// Generates one level and emits the requested outputs.
fn run(args: &Args) -> StrataResult<()> {
    let catalog = match &args.terrain {
        Some(path) => TerrainCatalog::load(path)?,
        None => TerrainCatalog::standard(),
    };

    let mut config = match &args.config {
        Some(path) => GenerationConfig::load(path)?,
        None => GenerationConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(rooms) = args.rooms {
        config.room_count = rooms;
    }

    let generator = LevelGenerator::from_template_dir(Arc::new(catalog), &args.templates)?;
    if generator.templates().is_empty() {
        return Err(StrataError::InvalidArgument(format!(
            "no room templates found in {}",
            args.templates.display()
        )));
    }

    info!("Generating level with seed: {}", config.seed);
    let level = generator.generate_level(&config)?;
    generator.validate(&level.grid, &config)?;

    let report = &level.report;
    for anchor in &report.unreachable {
        warn!("Room anchored at {} is not connected", anchor);
    }
    info!(
        "Level ready: hub {}, {} rooms, {} painted cells, {} events",
        report.hub,
        report.rooms.len() + 1,
        level.grid.painted_count(),
        report.events.len()
    );

    if args.render {
        let renderer = AsciiRenderer::new().with_marker(report.hub, '@');
        print!("{}", renderer.render_all(&level.grid)?);
    }

    if let Some(path) = &args.output {
        std::fs::write(path, level.grid.wrap().to_json()?)?;
        info!("Wrote level to {}", path.display());
    }

    Ok(())
}
