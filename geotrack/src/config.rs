//! Tracker configuration.
//!
//! [`TrackerConfig`] aggregates the per-component configs. It can be loaded
//! from an INI file; a missing file yields defaults and unknown keys are
//! ignored.
//!
//! ```ini
//! [location]
//! high_accuracy = true
//! watch_timeout_ms = 10000
//! watch_max_age_ms = 1000
//! one_shot_timeout_ms = 15000
//!
//! [map]
//! container = map
//! initial_lat = -23.5505
//! initial_lon = -46.6333
//! initial_zoom = 13
//! focus_zoom = 16
//! init_retry_delay_ms = 500
//! recenter_fix_count = 1
//!
//! [tracking]
//! min_render_interval_ms = 1000
//! unsubscribe_on_error = true
//!
//! [geocode]
//! endpoint = https://nominatim.openstreetmap.org
//! zoom = 18
//! timeout_secs = 10
//!
//! [logging]
//! level = info
//! file = /tmp/geotrack.log
//! ```

use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ini::{Ini, Properties};
use thiserror::Error;

use crate::geocode::GeocodeConfig;
use crate::location::LocationOptions;
use crate::logging::LoggingConfig;
use crate::map::{LatLng, MapConfig};
use crate::throttle::MIN_RENDER_INTERVAL;

/// Errors loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid value '{value}' for {section}.{key}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
    },
}

/// Position request options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationConfig {
    pub watch: LocationOptions,
    pub one_shot: LocationOptions,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            watch: LocationOptions::watch(),
            one_shot: LocationOptions::one_shot(),
        }
    }
}

/// Session behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Minimum spacing between map redraws.
    pub min_render_interval: Duration,
    /// Unsubscribe the watch when it reports an error.
    pub unsubscribe_on_error: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            min_render_interval: MIN_RENDER_INTERVAL,
            unsubscribe_on_error: true,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackerConfig {
    pub location: LocationConfig,
    pub map: MapConfig,
    pub session: SessionConfig,
    pub geocode: GeocodeConfig,
    pub logging: LoggingConfig,
}

impl TrackerConfig {
    pub fn with_map(mut self, map: MapConfig) -> Self {
        self.map = map;
        self
    }

    pub fn with_session(mut self, session: SessionConfig) -> Self {
        self.session = session;
        self
    }

    pub fn with_location(mut self, location: LocationConfig) -> Self {
        self.location = location;
        self
    }

    /// Load from the default path, falling back to defaults if absent.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load from `path`, falling back to defaults if absent.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ini_str(&contents)
    }

    /// Parse INI text. Absent keys keep their defaults.
    pub fn from_ini_str(contents: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let mut config = Self::default();

        let location = Section::new(&ini, "location");
        if let Some(high) = location.get::<bool>("high_accuracy")? {
            config.location.watch.high_accuracy = high;
            config.location.one_shot.high_accuracy = high;
        }
        if let Some(ms) = location.get("watch_timeout_ms")? {
            config.location.watch.timeout_ms = ms;
        }
        if let Some(ms) = location.get("watch_max_age_ms")? {
            config.location.watch.max_age_ms = ms;
        }
        if let Some(ms) = location.get("one_shot_timeout_ms")? {
            config.location.one_shot.timeout_ms = ms;
        }

        let map = Section::new(&ini, "map");
        if let Some(container) = map.get::<String>("container")? {
            config.map.container_id = container;
        }
        let lat = map.get::<f64>("initial_lat")?;
        let lon = map.get::<f64>("initial_lon")?;
        if lat.is_some() || lon.is_some() {
            let center = config.map.initial_center;
            config.map.initial_center =
                LatLng::new(lat.unwrap_or(center.lat), lon.unwrap_or(center.lon));
        }
        if let Some(zoom) = map.get("initial_zoom")? {
            config.map.initial_zoom = zoom;
        }
        if let Some(zoom) = map.get("focus_zoom")? {
            config.map.focus_zoom = zoom;
        }
        if let Some(ms) = map.get("init_retry_delay_ms")? {
            config.map.init_retry_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = map.get("resize_delay_ms")? {
            config.map.resize_delay = Duration::from_millis(ms);
        }
        if let Some(count) = map.get("recenter_fix_count")? {
            config.map.recenter_fix_count = count;
        }

        let tracking = Section::new(&ini, "tracking");
        if let Some(ms) = tracking.get("min_render_interval_ms")? {
            config.session.min_render_interval = Duration::from_millis(ms);
        }
        if let Some(flag) = tracking.get("unsubscribe_on_error")? {
            config.session.unsubscribe_on_error = flag;
        }

        let geocode = Section::new(&ini, "geocode");
        if let Some(endpoint) = geocode.get::<String>("endpoint")? {
            config.geocode.endpoint = endpoint;
        }
        if let Some(zoom) = geocode.get("zoom")? {
            config.geocode.zoom = zoom;
        }
        if let Some(secs) = geocode.get("timeout_secs")? {
            config.geocode.timeout = Duration::from_secs(secs);
        }
        if let Some(agent) = geocode.get::<String>("user_agent")? {
            config.geocode.user_agent = agent;
        }

        let logging = Section::new(&ini, "logging");
        if let Some(level) = logging.get::<String>("level")? {
            config.logging.level = level;
        }
        if let Some(file) = logging.get::<String>("file")? {
            config.logging.file = Some(PathBuf::from(file));
        }

        Ok(config)
    }

    /// Render as INI text.
    pub fn to_ini_string(&self) -> String {
        let mut ini = Ini::new();
        ini.with_section(Some("location"))
            .set("high_accuracy", self.location.watch.high_accuracy.to_string())
            .set("watch_timeout_ms", self.location.watch.timeout_ms.to_string())
            .set("watch_max_age_ms", self.location.watch.max_age_ms.to_string())
            .set(
                "one_shot_timeout_ms",
                self.location.one_shot.timeout_ms.to_string(),
            );
        ini.with_section(Some("map"))
            .set("container", self.map.container_id.as_str())
            .set("initial_lat", self.map.initial_center.lat.to_string())
            .set("initial_lon", self.map.initial_center.lon.to_string())
            .set("initial_zoom", self.map.initial_zoom.to_string())
            .set("focus_zoom", self.map.focus_zoom.to_string())
            .set(
                "init_retry_delay_ms",
                self.map.init_retry_delay.as_millis().to_string(),
            )
            .set("resize_delay_ms", self.map.resize_delay.as_millis().to_string())
            .set("recenter_fix_count", self.map.recenter_fix_count.to_string());
        ini.with_section(Some("tracking"))
            .set(
                "min_render_interval_ms",
                self.session.min_render_interval.as_millis().to_string(),
            )
            .set(
                "unsubscribe_on_error",
                self.session.unsubscribe_on_error.to_string(),
            );
        ini.with_section(Some("geocode"))
            .set("endpoint", self.geocode.endpoint.as_str())
            .set("zoom", self.geocode.zoom.to_string())
            .set("timeout_secs", self.geocode.timeout.as_secs().to_string())
            .set("user_agent", self.geocode.user_agent.as_str());
        let mut logging = ini.with_section(Some("logging"));
        logging.set("level", self.logging.level.as_str());
        if let Some(file) = &self.logging.file {
            logging.set("file", file.display().to_string());
        }

        let mut buf = Vec::new();
        // Writing into a Vec cannot fail
        let _ = ini.write_to(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Write to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        std::fs::write(path, self.to_ini_string()).map_err(write_err)
    }
}

/// Default config file location.
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("geotrack")
        .join("config.ini")
}

struct Section<'a> {
    name: &'static str,
    props: Option<&'a Properties>,
}

impl<'a> Section<'a> {
    fn new(ini: &'a Ini, name: &'static str) -> Self {
        Self {
            name,
            props: ini.section(Some(name)),
        }
    }

    fn get<T: FromStr>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        let Some(raw) = self.props.and_then(|p| p.get(key)) else {
            return Ok(None);
        };
        let raw = raw.trim();
        raw.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
            section: self.name.to_string(),
            key: key.to_string(),
            value: raw.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TrackerConfig::default();
        assert_eq!(config.location.watch.timeout_ms, 10_000);
        assert_eq!(config.location.one_shot.timeout_ms, 15_000);
        assert_eq!(config.session.min_render_interval, Duration::from_millis(1000));
        assert!(config.session.unsubscribe_on_error);
        assert_eq!(config.map.initial_zoom, 13);
        assert_eq!(config.geocode.zoom, 18);
    }

    #[test]
    fn test_parse_overrides_and_keeps_defaults() {
        let config = TrackerConfig::from_ini_str(
            "[map]\ncontainer = tracker-map\ninitial_lat = 52.5\nrecenter_fix_count = 2\n\
             [tracking]\nunsubscribe_on_error = false\nunknown_key = 1\n",
        )
        .unwrap();

        assert_eq!(config.map.container_id, "tracker-map");
        assert_eq!(config.map.initial_center, LatLng::new(52.5, -46.6333));
        assert_eq!(config.map.recenter_fix_count, 2);
        assert!(!config.session.unsubscribe_on_error);
        assert_eq!(config.location, LocationConfig::default());
    }

    #[test]
    fn test_invalid_value() {
        let err = TrackerConfig::from_ini_str("[location]\nwatch_timeout_ms = soon\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref key, ref value, .. }
                if key == "watch_timeout_ms" && value == "soon"
        ));
        assert_eq!(
            err.to_string(),
            "invalid value 'soon' for location.watch_timeout_ms"
        );
    }

    #[test]
    fn test_ini_round_trip() {
        let mut config = TrackerConfig::default();
        config.map.focus_zoom = 17;
        config.logging.file = Some(PathBuf::from("/tmp/geotrack.log"));

        let parsed = TrackerConfig::from_ini_str(&config.to_ini_string()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = TrackerConfig::load_from(&dir.path().join("absent.ini")).unwrap();
        assert_eq!(config, TrackerConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.ini");
        let config = TrackerConfig::default().with_session(SessionConfig {
            min_render_interval: Duration::from_millis(250),
            unsubscribe_on_error: false,
        });

        config.save_to(&path).unwrap();
        assert_eq!(TrackerConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_config_file_path_ends_with_app_dir() {
        assert!(config_file_path().ends_with("geotrack/config.ini"));
    }
}
