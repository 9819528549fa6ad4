//! Position acquisition: single-shot requests and continuous watches.
//!
//! # Watch lifecycle
//!
//! ```text
//! watch() ──► provider.watch_position(sink) ──► PositionStream (rx)
//!                                                   │
//! stop_watch(handle) ──► token.cancel() ────────────┤ stream ends
//!                    └─► provider.clear_watch(id) ──┘ sink dropped
//! ```
//!
//! Raw provider output is normalised into [`PositionSample`]s here; invalid
//! fixes surface as [`LocationError::PositionUnavailable`] events.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::Stream;
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};

use super::error::{LocationError, PositionError};
use super::options::LocationOptions;
use super::provider::{GeolocationProvider, WatchId};
use crate::sample::{PositionSample, RawPosition};

/// Extra time allowed on top of the provider timeout before a single-shot
/// request is abandoned locally.
pub const ONE_SHOT_GRACE: Duration = Duration::from_secs(1);

/// One item of a continuous watch.
#[derive(Debug, Clone, PartialEq)]
pub enum WatchEvent {
    Fix(PositionSample),
    Error(LocationError),
}

impl WatchEvent {
    fn from_provider(item: Result<RawPosition, PositionError>) -> Self {
        match item {
            Ok(raw) => match normalize(raw) {
                Ok(sample) => WatchEvent::Fix(sample),
                Err(e) => WatchEvent::Error(e),
            },
            Err(e) => WatchEvent::Error(e.into()),
        }
    }
}

/// Handle to an active watch. Cloning shares the same subscription.
#[derive(Debug, Clone)]
pub struct WatchHandle {
    id: WatchId,
    token: CancellationToken,
}

impl WatchHandle {
    pub fn id(&self) -> WatchId {
        self.id
    }

    /// True once the watch has been stopped.
    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Stream of watch events, ending when the watch is stopped.
pub struct PositionStream {
    rx: mpsc::UnboundedReceiver<Result<RawPosition, PositionError>>,
    token: CancellationToken,
    cancelled: Pin<Box<WaitForCancellationFutureOwned>>,
}

impl PositionStream {
    fn new(
        rx: mpsc::UnboundedReceiver<Result<RawPosition, PositionError>>,
        token: CancellationToken,
    ) -> Self {
        let cancelled = Box::pin(token.clone().cancelled_owned());
        Self {
            rx,
            token,
            cancelled,
        }
    }

    /// Wait for the next event. Returns `None` once the watch is stopped or
    /// the provider has released the subscription.
    pub async fn next_event(&mut self) -> Option<WatchEvent> {
        futures::StreamExt::next(self).await
    }
}

impl Stream for PositionStream {
    type Item = WatchEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.token.is_cancelled() || self.cancelled.as_mut().poll(cx).is_ready() {
            return Poll::Ready(None);
        }
        self.rx
            .poll_recv(cx)
            .map(|item| item.map(WatchEvent::from_provider))
    }
}

/// A freshly opened watch: the handle to stop it and the stream to read it.
pub struct PositionWatch {
    pub handle: WatchHandle,
    pub stream: PositionStream,
}

/// Wraps the provider's position API.
pub struct LocationSource {
    provider: Arc<dyn GeolocationProvider>,
}

impl LocationSource {
    pub fn new(provider: Arc<dyn GeolocationProvider>) -> Self {
        Self { provider }
    }

    /// Request a single fix.
    ///
    /// Suspends until the provider answers. If the provider overruns its own
    /// timeout by more than [`ONE_SHOT_GRACE`], fails with `Timeout`.
    pub async fn get_once(&self, options: LocationOptions) -> Result<PositionSample, LocationError> {
        let request = self.provider.get_current_position(options);

        let raw = match tokio::time::timeout(options.timeout() + ONE_SHOT_GRACE, request).await {
            Ok(result) => result.map_err(LocationError::from)?,
            Err(_) => {
                tracing::debug!(timeout_ms = options.timeout_ms, "Single-shot request overran");
                return Err(LocationError::Timeout);
            }
        };

        normalize(raw)
    }

    /// Open a continuous watch.
    pub async fn watch(&self, options: LocationOptions) -> Result<PositionWatch, LocationError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.provider.watch_position(options, tx).await?;
        let token = CancellationToken::new();

        tracing::debug!(
            watch = %id,
            high_accuracy = options.high_accuracy,
            max_age_ms = options.max_age_ms,
            "Watch opened"
        );

        Ok(PositionWatch {
            handle: WatchHandle {
                id,
                token: token.clone(),
            },
            stream: PositionStream::new(rx, token),
        })
    }

    /// Stop a watch. Idempotent: returns `false` if it was already stopped.
    pub fn stop_watch(&self, handle: &WatchHandle) -> bool {
        if handle.token.is_cancelled() {
            return false;
        }
        handle.token.cancel();
        self.provider.clear_watch(handle.id);
        tracing::debug!(watch = %handle.id, "Watch stopped");
        true
    }
}

fn normalize(raw: RawPosition) -> Result<PositionSample, LocationError> {
    PositionSample::try_from(raw).map_err(|e| {
        tracing::warn!(error = %e, "Discarding invalid fix");
        LocationError::PositionUnavailable(e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::SimulatedProvider;

    fn source(provider: &Arc<SimulatedProvider>) -> LocationSource {
        LocationSource::new(Arc::clone(provider) as Arc<dyn GeolocationProvider>)
    }

    #[tokio::test]
    async fn test_get_once_returns_normalised_fix() {
        let provider = Arc::new(SimulatedProvider::new());
        provider.set_current_position(Ok(
            RawPosition::new(10.0, 20.0, 5.0, 1).with_motion(Some(1.0), Some(-45.0))
        ));

        let sample = source(&provider)
            .get_once(LocationOptions::one_shot())
            .await
            .unwrap();
        assert_eq!(sample.lat_lon(), (10.0, 20.0));
        assert_eq!(sample.heading(), Some(315.0));
    }

    #[tokio::test]
    async fn test_get_once_classifies_errors() {
        let provider = Arc::new(SimulatedProvider::new());
        let source = source(&provider);

        provider.set_current_position(Err(PositionError::new(1, "denied")));
        assert_eq!(
            source.get_once(LocationOptions::one_shot()).await,
            Err(LocationError::PermissionDenied)
        );

        provider.set_current_position(Ok(RawPosition::new(95.0, 0.0, 1.0, 0)));
        assert!(matches!(
            source.get_once(LocationOptions::one_shot()).await,
            Err(LocationError::PositionUnavailable(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_once_times_out_when_provider_hangs() {
        let provider = Arc::new(SimulatedProvider::new());
        provider.hang_current_position();

        let result = source(&provider)
            .get_once(LocationOptions::one_shot().with_timeout_ms(200))
            .await;
        assert_eq!(result, Err(LocationError::Timeout));
    }

    #[tokio::test]
    async fn test_watch_delivers_events_in_order() {
        let provider = Arc::new(SimulatedProvider::new());
        let source = source(&provider);
        let mut watch = source.watch(LocationOptions::watch()).await.unwrap();

        provider.push_fix(RawPosition::new(1.0, 1.0, 3.0, 100));
        provider.push_error(PositionError::new(3, "slow"));
        provider.push_fix(RawPosition::new(2.0, 2.0, 4.0, 200));

        let first = watch.stream.next_event().await.unwrap();
        assert!(matches!(first, WatchEvent::Fix(s) if s.timestamp() == 100));
        assert_eq!(
            watch.stream.next_event().await,
            Some(WatchEvent::Error(LocationError::Timeout))
        );
        let third = watch.stream.next_event().await.unwrap();
        assert!(matches!(third, WatchEvent::Fix(s) if s.timestamp() == 200));
    }

    #[tokio::test]
    async fn test_stop_watch_is_idempotent() {
        let provider = Arc::new(SimulatedProvider::new());
        let source = source(&provider);
        let mut watch = source.watch(LocationOptions::watch()).await.unwrap();
        assert_eq!(provider.active_watches(), 1);

        assert!(source.stop_watch(&watch.handle));
        assert!(watch.handle.is_stopped());
        assert_eq!(provider.active_watches(), 0);

        assert!(!source.stop_watch(&watch.handle));
        assert_eq!(provider.clear_calls(), 1);

        assert_eq!(watch.stream.next_event().await, None);
    }

    #[tokio::test]
    async fn test_stream_ends_on_cancel_even_with_buffered_items() {
        let provider = Arc::new(SimulatedProvider::new());
        let source = source(&provider);
        let mut watch = source.watch(LocationOptions::watch()).await.unwrap();

        provider.push_fix(RawPosition::new(1.0, 1.0, 3.0, 100));
        source.stop_watch(&watch.handle);

        assert_eq!(watch.stream.next_event().await, None);
    }
}
