//! CLI error type.

use std::fmt;

use geotrack::config::ConfigError;
use geotrack::logging::LoggingError;
use geotrack::TrackingError;

/// Errors reported by CLI commands.
#[derive(Debug)]
pub enum CliError {
    /// Configuration could not be loaded or written.
    Config(String),
    /// Logging could not be set up.
    Logging(String),
    /// The async runtime could not be started.
    Runtime(String),
    /// A tracking operation failed.
    Tracking(TrackingError),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Logging(msg) => write!(f, "Logging error: {}", msg),
            CliError::Runtime(msg) => write!(f, "Runtime error: {}", msg),
            CliError::Tracking(err) => write!(f, "{} ({})", err.status_message(), err),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        CliError::Config(err.to_string())
    }
}

impl From<LoggingError> for CliError {
    fn from(err: LoggingError) -> Self {
        CliError::Logging(err.to_string())
    }
}

impl From<TrackingError> for CliError {
    fn from(err: TrackingError) -> Self {
        CliError::Tracking(err)
    }
}
