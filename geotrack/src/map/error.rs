//! Error types for map synchronisation.

use thiserror::Error;

/// Errors raised by [`MapSync`](super::MapSync) or its backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    /// The container element does not exist (yet).
    #[error("Map container '{0}' not found")]
    ContainerNotFound(String),

    /// The backend failed to create the map for another reason.
    #[error("Map backend error: {0}")]
    Backend(String),

    /// The map has not been initialised.
    #[error("Map not initialised")]
    NotReady,

    /// The map has been disposed and cannot be used again.
    #[error("Map disposed")]
    Disposed,
}
