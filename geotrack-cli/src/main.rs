//! GeoTrack CLI - Command-line interface
//!
//! Drives the tracking controller against a simulated position source and a
//! console map, and inspects configuration.

mod commands;
mod console_map;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;
use geotrack::config::{config_file_path, TrackerConfig};
use geotrack::logging::{init_logging, LoggingGuard};

use crate::commands::config::ConfigCommands;
use crate::commands::simulate::SimulateArgs;
use crate::error::CliError;

#[derive(Debug, Parser)]
#[command(name = "geotrack", version, about = "Live location tracking with map synchronisation")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a tracking session against a simulated device
    Simulate(SimulateArgs),

    /// Inspect or create the configuration file
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {}", style("error:").red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(config_file_path);

    match cli.command {
        Commands::Config(command) => commands::config::run(command, &config_path),
        Commands::Simulate(args) => {
            let config = TrackerConfig::load_from(&config_path)?;
            let _guard = setup_logging(&config, cli.verbose)?;
            commands::simulate::run(args, config)
        }
    }
}

fn setup_logging(config: &TrackerConfig, verbose: bool) -> Result<LoggingGuard, CliError> {
    let mut logging = config.logging.clone();
    if verbose {
        logging.level = "debug".to_string();
    }
    Ok(init_logging(&logging)?)
}
