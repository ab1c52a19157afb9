//! Quarry CLI - Command-line interface for the Quarry entity store

mod commands;
mod logging;
mod systems;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{load, simulate};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "quarry")]
#[command(about = "In-memory entity-component store with live component indices", long_about = None)]
#[command(version)]
struct Cli {
    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the headless moving-shapes simulation
    Simulate {
        /// Number of entities to add
        #[arg(long, default_value_t = 5000)]
        entities: usize,

        /// Number of ticks to run
        #[arg(long, default_value_t = 60)]
        ticks: u64,

        /// RNG seed
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// How many entities stop moving after a random timeout
        #[arg(long, default_value_t = 0)]
        expiring: usize,

        /// Playfield width
        #[arg(long, default_value_t = 800.0)]
        width: f64,

        /// Playfield height
        #[arg(long, default_value_t = 600.0)]
        height: f64,

        /// Path to a store config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Load entities from a TOML scene file and report the indices
    Load {
        /// Path to scene file
        scene: PathBuf,

        /// Entity ids to delete after loading
        #[arg(long, value_delimiter = ',')]
        delete: Vec<String>,

        /// Path to a store config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format (text, json or toml)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level)?;

    match cli.command {
        Commands::Simulate {
            entities,
            ticks,
            seed,
            expiring,
            width,
            height,
            config,
            format,
        } => simulate::run(simulate::SimulateArgs {
            entities,
            ticks,
            seed,
            expiring,
            width,
            height,
            config,
            format,
        }),
        Commands::Load {
            scene,
            delete,
            config,
            format,
        } => load::run(&scene, &delete, config.as_deref(), &format),
    }
}
