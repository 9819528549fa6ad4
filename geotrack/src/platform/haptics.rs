//! Haptic feedback.

use std::sync::Arc;

use parking_lot::Mutex;

use super::PlatformError;
use crate::BoxFuture;

/// Impact intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImpactStyle {
    Light,
    Medium,
    Heavy,
}

/// Device haptic engine.
pub trait Haptics: Send + Sync {
    fn impact(&self, style: ImpactStyle) -> BoxFuture<'_, Result<(), PlatformError>>;
}

/// Fire an impact on a detached task. Failures are swallowed.
///
/// Outside a Tokio runtime the impact is skipped.
pub fn fire_impact(haptics: &Arc<dyn Haptics>, style: ImpactStyle) {
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        tracing::debug!(?style, "No runtime, skipping haptic impact");
        return;
    };
    let haptics = Arc::clone(haptics);
    runtime.spawn(async move {
        if let Err(e) = haptics.impact(style).await {
            tracing::debug!(error = %e, "Haptic impact failed");
        }
    });
}

/// Device without a haptic engine.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHaptics;

impl Haptics for NoHaptics {
    fn impact(&self, _style: ImpactStyle) -> BoxFuture<'_, Result<(), PlatformError>> {
        Box::pin(async { Err(PlatformError::Unavailable("haptics".to_string())) })
    }
}

/// Records impacts for assertions.
#[derive(Debug, Default)]
pub struct RecordingHaptics {
    impacts: Mutex<Vec<ImpactStyle>>,
}

impl RecordingHaptics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn impacts(&self) -> Vec<ImpactStyle> {
        self.impacts.lock().clone()
    }
}

impl Haptics for RecordingHaptics {
    fn impact(&self, style: ImpactStyle) -> BoxFuture<'_, Result<(), PlatformError>> {
        self.impacts.lock().push(style);
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fire_impact_runs_detached() {
        let recording = Arc::new(RecordingHaptics::new());
        let haptics: Arc<dyn Haptics> = recording.clone();

        fire_impact(&haptics, ImpactStyle::Light);
        tokio::task::yield_now().await;

        assert_eq!(recording.impacts(), vec![ImpactStyle::Light]);
    }

    #[tokio::test]
    async fn test_fire_impact_swallows_errors() {
        let haptics: Arc<dyn Haptics> = Arc::new(NoHaptics);
        fire_impact(&haptics, ImpactStyle::Heavy);
        tokio::task::yield_now().await;
    }

    #[test]
    fn test_fire_impact_without_runtime_is_noop() {
        let recording = Arc::new(RecordingHaptics::new());
        let haptics: Arc<dyn Haptics> = recording.clone();
        fire_impact(&haptics, ImpactStyle::Light);
        assert!(recording.impacts().is_empty());
    }
}
