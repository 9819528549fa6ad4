//! Tracking session and observable screen state.

use crate::location::WatchHandle;
use crate::map::{BaseLayer, MapStatus};
use crate::permission::PermissionState;
use crate::sample::PositionSample;

/// Mutable tracking aggregate, exclusively owned by the controller.
#[derive(Debug, Default)]
pub struct TrackingSession {
    /// True once a watch has delivered a fix; cleared on stop or watch error.
    pub is_tracking: bool,
    /// Active watch subscription, if any.
    pub watch_handle: Option<WatchHandle>,
    /// Set when the watch reported an error but is still subscribed.
    pub watch_stalled: bool,
    pub last_sample: Option<PositionSample>,
    pub sample_count: u64,
    pub running_average_accuracy: f64,
}

impl TrackingSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a fix into the statistics.
    ///
    /// The running accuracy is a recency-weighted blend, not a mean: the
    /// first fix sets it, each later fix averages it with the previous value.
    pub fn record_sample(&mut self, sample: PositionSample) {
        let accuracy = sample.accuracy();
        self.running_average_accuracy = if self.sample_count == 0 {
            accuracy
        } else {
            (self.running_average_accuracy + accuracy) / 2.0
        };
        self.sample_count += 1;
        self.last_sample = Some(sample);
    }

    /// A watch is subscribed and has not errored.
    pub fn has_live_watch(&self) -> bool {
        !self.watch_stalled
            && self
                .watch_handle
                .as_ref()
                .is_some_and(|handle| !handle.is_stopped())
    }
}

/// Short-lived user notice (toast).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    LocationFound,
    LocationFailed,
    TrackingStarted,
    TrackingFailed,
    TrackingStopped,
    MapCentered,
    NoLocation,
    LocationCopied,
    PermissionGranted,
    PermissionDenied,
}

impl Notice {
    pub fn message(&self) -> &'static str {
        match self {
            Notice::LocationFound => "Location found!",
            Notice::LocationFailed => "Failed to get location",
            Notice::TrackingStarted => "Tracking started",
            Notice::TrackingFailed => "Failed to start tracking",
            Notice::TrackingStopped => "Tracking stopped",
            Notice::MapCentered => "Map centered",
            Notice::NoLocation => "No location available",
            Notice::LocationCopied => "Location copied!",
            Notice::PermissionGranted => "Permission granted!",
            Notice::PermissionDenied => "Permission denied",
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Point-in-time copy of everything the screen displays.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub is_loading: bool,
    pub is_tracking: bool,
    /// Short status line; empty when all is well.
    pub status: String,
    pub notice: Option<Notice>,
    /// Last resolved address; empty until a lookup succeeds.
    pub address: String,
    pub base_layer: BaseLayer,
    pub map_status: MapStatus,
    pub permission: PermissionState,
    pub last_sample: Option<PositionSample>,
    pub sample_count: u64,
    pub running_average_accuracy: f64,
}

impl ViewState {
    pub fn is_satellite(&self) -> bool {
        self.base_layer == BaseLayer::Satellite
    }

    pub fn has_error(&self) -> bool {
        !self.status.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix(accuracy: f64) -> PositionSample {
        PositionSample::new(0.0, 0.0, accuracy, 0).unwrap()
    }

    #[test]
    fn test_running_average_is_recency_weighted() {
        let mut session = TrackingSession::new();

        session.record_sample(fix(10.0));
        assert_eq!(session.running_average_accuracy, 10.0);
        session.record_sample(fix(20.0));
        assert_eq!(session.running_average_accuracy, 15.0);
        session.record_sample(fix(30.0));
        assert_eq!(session.running_average_accuracy, 22.5);
        assert_eq!(session.sample_count, 3);
    }

    #[test]
    fn test_running_average_depends_on_order() {
        let mut forward = TrackingSession::new();
        let mut backward = TrackingSession::new();
        for a in [10.0, 20.0, 30.0] {
            forward.record_sample(fix(a));
        }
        for a in [30.0, 20.0, 10.0] {
            backward.record_sample(fix(a));
        }
        assert_ne!(
            forward.running_average_accuracy,
            backward.running_average_accuracy
        );
    }

    #[test]
    fn test_zero_accuracy_first_fix() {
        let mut session = TrackingSession::new();
        session.record_sample(fix(0.0));
        session.record_sample(fix(8.0));
        assert_eq!(session.running_average_accuracy, 4.0);
    }

    #[test]
    fn test_no_live_watch_by_default() {
        let session = TrackingSession::new();
        assert!(!session.has_live_watch());
        assert!(session.last_sample.is_none());
    }

    #[test]
    fn test_notice_messages() {
        assert_eq!(Notice::TrackingStarted.to_string(), "Tracking started");
        assert_eq!(Notice::NoLocation.message(), "No location available");
    }
}
