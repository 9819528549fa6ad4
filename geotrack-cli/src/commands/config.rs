//! Configuration CLI commands.
//!
//! Provides `config path`, `config show` and `config init`.

use std::path::Path;

use clap::Subcommand;
use geotrack::config::TrackerConfig;

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// Print the effective configuration as INI
    Show,

    /// Write a configuration file with the default settings
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands, path: &Path) -> Result<(), CliError> {
    match command {
        ConfigCommands::Path => {
            println!("{}", path.display());
            Ok(())
        }
        ConfigCommands::Show => {
            let config = TrackerConfig::load_from(path)?;
            print!("{}", config.to_ini_string());
            Ok(())
        }
        ConfigCommands::Init { force } => {
            write_defaults(path, force)?;
            println!("Wrote default configuration to {}", path.display());
            Ok(())
        }
    }
}

/// Write the default configuration, refusing to clobber unless `force`.
fn write_defaults(path: &Path, force: bool) -> Result<(), CliError> {
    if path.exists() && !force {
        return Err(CliError::Config(format!(
            "{} already exists. Use --force to overwrite it.",
            path.display()
        )));
    }
    TrackerConfig::default().save_to(path)?;
    Ok(())
}
