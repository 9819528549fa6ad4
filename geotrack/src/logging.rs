//! Logging setup.
//!
//! Installs a `tracing-subscriber` registry with an `EnvFilter` and a
//! console `fmt` layer, plus an optional non-blocking file layer. `RUST_LOG`
//! overrides the configured level.

use std::path::{Path, PathBuf};

use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::UtcOffset;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::OffsetTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Default filter level for this crate.
pub const DEFAULT_LEVEL: &str = "info";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log file path: {}", .0.display())]
    InvalidFile(PathBuf),

    #[error("failed to create log directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to install subscriber: {0}")]
    Init(String),
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Level for `geotrack` targets when `RUST_LOG` is unset.
    pub level: String,
    /// Also write logs to this file.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL.to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }
}

/// Keeps the file writer flushing. Drop it only at shutdown.
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard {
    _file: Option<WorkerGuard>,
}

/// Filter directive for `level`, e.g. `geotrack=debug`.
pub fn default_directive(level: &str) -> String {
    format!("geotrack={level}")
}

fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(level)))
}

fn split_file_path(path: &Path) -> Result<(PathBuf, PathBuf), LoggingError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| LoggingError::InvalidFile(path.to_path_buf()))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, PathBuf::from(file_name)))
}

/// Install the global subscriber.
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<LoggingGuard, LoggingError> {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    let timer = OffsetTime::new(offset, Rfc3339);

    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_timer(timer.clone());

    let (file_layer, file_guard) = match &config.file {
        Some(path) => {
            let (dir, file_name) = split_file_path(path)?;
            std::fs::create_dir_all(&dir).map_err(|source| LoggingError::CreateDir {
                path: dir.clone(),
                source,
            })?;
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_timer(timer)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(build_filter(&config.level))
        .with(console)
        .with(file_layer)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))?;

    tracing::debug!(level = %config.level, file = ?config.file, "Logging initialised");
    Ok(LoggingGuard { _file: file_guard })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive("debug"), "geotrack=debug");
        assert_eq!(LoggingConfig::default().level, "info");
    }

    #[test]
    fn test_split_file_path() {
        let (dir, name) = split_file_path(Path::new("/var/log/geotrack.log")).unwrap();
        assert_eq!(dir, PathBuf::from("/var/log"));
        assert_eq!(name, PathBuf::from("geotrack.log"));

        let (dir, _) = split_file_path(Path::new("geotrack.log")).unwrap();
        assert_eq!(dir, PathBuf::from("."));
    }

    #[test]
    fn test_split_rejects_directory_path() {
        assert!(matches!(
            split_file_path(Path::new("/")),
            Err(LoggingError::InvalidFile(_))
        ));
    }

    #[test]
    fn test_builders() {
        let config = LoggingConfig::default()
            .with_level("trace")
            .with_file("/tmp/x.log");
        assert_eq!(config.level, "trace");
        assert_eq!(config.file, Some(PathBuf::from("/tmp/x.log")));
    }
}
