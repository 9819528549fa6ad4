//! Error types for position acquisition.

use thiserror::Error;

/// Errors reported by the geolocation provider or raised while acquiring a fix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    /// The user or OS refused location access.
    #[error("Location permission denied")]
    PermissionDenied,

    /// The platform has no geolocation capability at all.
    #[error("Geolocation unavailable on this platform: {0}")]
    PermissionUnavailable(String),

    /// No fix arrived within the requested time.
    #[error("Location request timed out")]
    Timeout,

    /// The sensor could not produce a usable fix.
    #[error("Location unavailable: {0}")]
    PositionUnavailable(String),

    #[error("Unknown location error: {0}")]
    Unknown(String),
}

/// Error payload pushed by the provider, using the W3C geolocation codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionError {
    pub code: u16,
    pub message: String,
}

impl PositionError {
    pub const PERMISSION_DENIED: u16 = 1;
    pub const POSITION_UNAVAILABLE: u16 = 2;
    pub const TIMEOUT: u16 = 3;

    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<PositionError> for LocationError {
    fn from(err: PositionError) -> Self {
        match err.code {
            PositionError::PERMISSION_DENIED => LocationError::PermissionDenied,
            PositionError::POSITION_UNAVAILABLE => LocationError::PositionUnavailable(err.message),
            PositionError::TIMEOUT => LocationError::Timeout,
            _ => LocationError::Unknown(err.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifies_provider_codes() {
        assert_eq!(
            LocationError::from(PositionError::new(1, "denied")),
            LocationError::PermissionDenied
        );
        assert_eq!(
            LocationError::from(PositionError::new(2, "no signal")),
            LocationError::PositionUnavailable("no signal".to_string())
        );
        assert_eq!(
            LocationError::from(PositionError::new(3, "slow")),
            LocationError::Timeout
        );
        assert_eq!(
            LocationError::from(PositionError::new(99, "weird")),
            LocationError::Unknown("weird".to_string())
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(
            LocationError::PositionUnavailable("no signal".to_string()).to_string(),
            "Location unavailable: no signal"
        );
    }
}
