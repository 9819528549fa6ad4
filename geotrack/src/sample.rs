//! Position samples produced by the location source.
//!
//! A [`PositionSample`] is an immutable snapshot of one fix. Samples are
//! validated once, when normalised from the provider's [`RawPosition`], and
//! are never mutated afterwards: the next fix supersedes the previous one.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coordinates as reported by the geolocation provider, before validation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawCoordinates {
    pub latitude: f64,
    pub longitude: f64,
    /// Horizontal accuracy radius in meters.
    pub accuracy: f64,
    #[serde(default)]
    pub altitude: Option<f64>,
    #[serde(default)]
    pub altitude_accuracy: Option<f64>,
    /// Ground speed in m/s.
    #[serde(default)]
    pub speed: Option<f64>,
    /// Heading in degrees, clockwise from true north.
    #[serde(default)]
    pub heading: Option<f64>,
}

/// A raw fix as pushed by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawPosition {
    pub coords: RawCoordinates,
    /// Wall-clock time of the fix in milliseconds since the Unix epoch.
    pub timestamp: u64,
}

impl RawPosition {
    /// Create a raw position with only the horizontal fields set.
    pub fn new(latitude: f64, longitude: f64, accuracy: f64, timestamp: u64) -> Self {
        Self {
            coords: RawCoordinates {
                latitude,
                longitude,
                accuracy,
                altitude: None,
                altitude_accuracy: None,
                speed: None,
                heading: None,
            },
            timestamp,
        }
    }

    /// Set speed (m/s) and heading (degrees).
    pub fn with_motion(mut self, speed: Option<f64>, heading: Option<f64>) -> Self {
        self.coords.speed = speed;
        self.coords.heading = heading;
        self
    }

    /// Set altitude and its accuracy (meters).
    pub fn with_altitude(mut self, altitude: Option<f64>, accuracy: Option<f64>) -> Self {
        self.coords.altitude = altitude;
        self.coords.altitude_accuracy = accuracy;
        self
    }
}

/// Reasons a raw fix is rejected during normalisation.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SampleError {
    #[error("latitude {0} outside [-90, 90]")]
    InvalidLatitude(f64),

    #[error("longitude {0} outside [-180, 180]")]
    InvalidLongitude(f64),

    #[error("accuracy {0} is negative or not a number")]
    InvalidAccuracy(f64),
}

/// A validated position fix.
///
/// Invariants: latitude in [-90, 90], longitude in [-180, 180],
/// accuracy >= 0, heading (when present) in [0, 360).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    latitude: f64,
    longitude: f64,
    accuracy: f64,
    altitude: Option<f64>,
    altitude_accuracy: Option<f64>,
    speed: Option<f64>,
    heading: Option<f64>,
    timestamp: u64,
}

impl PositionSample {
    /// Create a sample from horizontal fields only.
    pub fn new(
        latitude: f64,
        longitude: f64,
        accuracy: f64,
        timestamp: u64,
    ) -> Result<Self, SampleError> {
        Self::try_from(RawPosition::new(latitude, longitude, accuracy, timestamp))
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Horizontal accuracy radius in meters.
    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    pub fn altitude(&self) -> Option<f64> {
        self.altitude
    }

    pub fn altitude_accuracy(&self) -> Option<f64> {
        self.altitude_accuracy
    }

    /// Ground speed in m/s.
    pub fn speed(&self) -> Option<f64> {
        self.speed
    }

    /// Heading in degrees, normalised to [0, 360).
    pub fn heading(&self) -> Option<f64> {
        self.heading
    }

    /// Milliseconds since the Unix epoch.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// `(latitude, longitude)` pair.
    pub fn lat_lon(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}

/// Drop non-finite optional readings.
fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

impl TryFrom<RawPosition> for PositionSample {
    type Error = SampleError;

    fn try_from(raw: RawPosition) -> Result<Self, Self::Error> {
        let c = raw.coords;

        if !(-90.0..=90.0).contains(&c.latitude) {
            return Err(SampleError::InvalidLatitude(c.latitude));
        }
        if !(-180.0..=180.0).contains(&c.longitude) {
            return Err(SampleError::InvalidLongitude(c.longitude));
        }
        // NaN fails the comparison as well
        if !(c.accuracy >= 0.0) || c.accuracy.is_infinite() {
            return Err(SampleError::InvalidAccuracy(c.accuracy));
        }

        Ok(Self {
            latitude: c.latitude,
            longitude: c.longitude,
            accuracy: c.accuracy,
            altitude: finite(c.altitude),
            altitude_accuracy: finite(c.altitude_accuracy).filter(|a| *a >= 0.0),
            speed: finite(c.speed).filter(|s| *s >= 0.0),
            heading: finite(c.heading).map(|h| h.rem_euclid(360.0)),
            timestamp: raw.timestamp,
        })
    }
}
