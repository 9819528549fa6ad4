//! Tracking error taxonomy.
//!
//! Every failure in the tracking screen maps onto [`TrackingError`]. None of
//! them is fatal: each degrades one operation and, where the user should
//! know, surfaces as a short status string via
//! [`TrackingError::status_message`].

use thiserror::Error;

use crate::geocode::GeocodeError;
use crate::location::LocationError;
use crate::map::MapError;
use crate::platform::PlatformError;

/// Result type for controller operations.
pub type TrackingResult<T> = Result<T, TrackingError>;

/// Errors surfaced by the tracking controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackingError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Geolocation unavailable: {0}")]
    PermissionUnavailable(String),

    #[error("Location request timed out")]
    Timeout,

    #[error("Location unavailable: {0}")]
    PositionUnavailable(String),

    /// Map could not be created; the screen runs without it.
    #[error("Map initialisation failed: {0}")]
    MapInitFailure(MapError),

    /// Address lookup failed. Absorbed, never shown.
    #[error("Reverse geocoding failed: {0}")]
    GeocodeFailure(GeocodeError),

    /// Neither share sheet nor clipboard accepted the location.
    #[error("Sharing failed: {0}")]
    ShareFailure(PlatformError),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl TrackingError {
    /// Short user-facing status line.
    pub fn status_message(&self) -> &'static str {
        match self {
            TrackingError::PermissionDenied => "Location permission denied",
            TrackingError::PermissionUnavailable(_) => "Location not supported on this device",
            TrackingError::Timeout => "Location request timed out",
            TrackingError::PositionUnavailable(_) => "Location unavailable",
            TrackingError::MapInitFailure(_) => "Map unavailable",
            TrackingError::GeocodeFailure(_) => "Address unavailable",
            TrackingError::ShareFailure(_) => "Could not share location",
            TrackingError::Unknown(_) => "Unknown location error",
        }
    }
}

impl From<LocationError> for TrackingError {
    fn from(err: LocationError) -> Self {
        match err {
            LocationError::PermissionDenied => TrackingError::PermissionDenied,
            LocationError::PermissionUnavailable(msg) => TrackingError::PermissionUnavailable(msg),
            LocationError::Timeout => TrackingError::Timeout,
            LocationError::PositionUnavailable(msg) => TrackingError::PositionUnavailable(msg),
            LocationError::Unknown(msg) => TrackingError::Unknown(msg),
        }
    }
}

impl From<MapError> for TrackingError {
    fn from(err: MapError) -> Self {
        TrackingError::MapInitFailure(err)
    }
}

impl From<GeocodeError> for TrackingError {
    fn from(err: GeocodeError) -> Self {
        TrackingError::GeocodeFailure(err)
    }
}

impl From<PlatformError> for TrackingError {
    fn from(err: PlatformError) -> Self {
        TrackingError::ShareFailure(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_location_error() {
        assert_eq!(
            TrackingError::from(LocationError::PermissionDenied),
            TrackingError::PermissionDenied
        );
        assert_eq!(
            TrackingError::from(LocationError::Timeout),
            TrackingError::Timeout
        );
        assert!(matches!(
            TrackingError::from(LocationError::Unknown("x".to_string())),
            TrackingError::Unknown(_)
        ));
    }

    #[test]
    fn test_status_messages() {
        assert_eq!(
            TrackingError::PermissionDenied.status_message(),
            "Location permission denied"
        );
        assert_eq!(
            TrackingError::PositionUnavailable("gps off".to_string()).status_message(),
            "Location unavailable"
        );
        assert_eq!(
            TrackingError::Unknown("?".to_string()).status_message(),
            "Unknown location error"
        );
    }

    #[test]
    fn test_display_keeps_detail() {
        let err = TrackingError::from(MapError::ContainerNotFound("map".to_string()));
        assert_eq!(
            err.to_string(),
            "Map initialisation failed: Map container 'map' not found"
        );
    }
}
