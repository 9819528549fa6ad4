//! Fire-and-forget device services: haptic feedback, share sheet, clipboard.

mod haptics;
mod share;

use thiserror::Error;

pub use haptics::{fire_impact, Haptics, ImpactStyle, NoHaptics, RecordingHaptics};
pub use share::{Clipboard, RecordingClipboard, RecordingShareTarget, SharePayload, ShareTarget};

/// Errors from device services.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    /// The service does not exist on this device.
    #[error("{0} not available")]
    Unavailable(String),

    /// The service exists but the call failed.
    #[error("{0}")]
    Failed(String),
}
