//! Error types for reverse geocoding.

use thiserror::Error;

/// Errors from an address lookup. Never shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeocodeError {
    /// Transport failure (DNS, TLS, connection, timeout).
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Non-2xx response.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// Body was not the expected JSON.
    #[error("Failed to parse geocoding response: {0}")]
    Parse(String),

    /// Response carried no usable `display_name`.
    #[error("Geocoding response has no display name")]
    MissingDisplayName,
}
