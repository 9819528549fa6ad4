//! Geolocation provider abstraction.
//!
//! The provider is the device plugin that owns the sensor. The core never
//! talks to the sensor directly; it only calls this contract, which keeps
//! every component testable against [`SimulatedProvider`](super::SimulatedProvider).

use std::fmt;

use tokio::sync::mpsc;

use super::error::{LocationError, PositionError};
use super::options::LocationOptions;
use crate::permission::PermissionState;
use crate::sample::RawPosition;
use crate::BoxFuture;

/// Channel the provider pushes watch results into, one item per callback.
pub type PositionSink = mpsc::UnboundedSender<Result<RawPosition, PositionError>>;

/// Provider-assigned identifier of a continuous watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(pub u64);

impl fmt::Display for WatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "watch-{}", self.0)
    }
}

/// Device geolocation capability.
///
/// # Watch contract
///
/// `watch_position` registers `sink` and pushes every subsequent fix or error
/// into it, in arrival order. `clear_watch` must drop the sink so the
/// receiving stream terminates. Clearing an unknown id is a no-op.
pub trait GeolocationProvider: Send + Sync {
    /// Query the current permission without prompting.
    fn check_permission(&self) -> BoxFuture<'_, Result<PermissionState, LocationError>>;

    /// Prompt the user for permission and resolve with their answer.
    fn request_permission(&self) -> BoxFuture<'_, Result<PermissionState, LocationError>>;

    /// Request a single fix.
    fn get_current_position(
        &self,
        options: LocationOptions,
    ) -> BoxFuture<'_, Result<RawPosition, PositionError>>;

    /// Start a continuous watch feeding `sink`.
    fn watch_position(
        &self,
        options: LocationOptions,
        sink: PositionSink,
    ) -> BoxFuture<'_, Result<WatchId, LocationError>>;

    /// Stop a watch and release its sink.
    fn clear_watch(&self, id: WatchId);
}
