//! In-process geolocation provider.
//!
//! Stands in for the device plugin in tests and in the CLI's `simulate`
//! command. Fixes are pushed explicitly with [`SimulatedProvider::push_fix`]
//! and fan out to every active watch.

use std::collections::HashMap;

use parking_lot::Mutex;

use super::error::{LocationError, PositionError};
use super::options::LocationOptions;
use super::provider::{GeolocationProvider, PositionSink, WatchId};
use crate::permission::PermissionState;
use crate::sample::RawPosition;
use crate::BoxFuture;

/// Scripted single-shot answer.
#[derive(Debug, Clone)]
enum OneShot {
    Answer(Result<RawPosition, PositionError>),
    /// Never resolves.
    Hang,
}

#[derive(Debug)]
struct SimulatedState {
    permission: PermissionState,
    request_outcome: PermissionState,
    unavailable: bool,
    one_shot: OneShot,
    watches: HashMap<WatchId, PositionSink>,
    next_watch_id: u64,
    last_watch_options: Option<LocationOptions>,
    check_calls: usize,
    request_calls: usize,
    clear_calls: usize,
}

/// Scriptable [`GeolocationProvider`].
///
/// Defaults: permission `Unknown`, a request answers `Granted`, single-shot
/// requests fail with "position unavailable" until scripted.
#[derive(Debug)]
pub struct SimulatedProvider {
    state: Mutex<SimulatedState>,
}

impl Default for SimulatedProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedProvider {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SimulatedState {
                permission: PermissionState::Unknown,
                request_outcome: PermissionState::Granted,
                unavailable: false,
                one_shot: OneShot::Answer(Err(PositionError::new(
                    PositionError::POSITION_UNAVAILABLE,
                    "no fix scripted",
                ))),
                watches: HashMap::new(),
                next_watch_id: 1,
                last_watch_options: None,
                check_calls: 0,
                request_calls: 0,
                clear_calls: 0,
            }),
        }
    }

    /// Provider already granted, the common case for tracking tests.
    pub fn granted() -> Self {
        let provider = Self::new();
        provider.set_permission(PermissionState::Granted);
        provider
    }

    /// Set what `check_permission` reports.
    pub fn set_permission(&self, state: PermissionState) {
        self.state.lock().permission = state;
    }

    /// Set what the user answers when prompted.
    pub fn set_request_outcome(&self, state: PermissionState) {
        self.state.lock().request_outcome = state;
    }

    /// Simulate a platform without geolocation.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unavailable = unavailable;
    }

    /// Script the answer to single-shot requests.
    pub fn set_current_position(&self, answer: Result<RawPosition, PositionError>) {
        self.state.lock().one_shot = OneShot::Answer(answer);
    }

    /// Make single-shot requests never resolve.
    pub fn hang_current_position(&self) {
        self.state.lock().one_shot = OneShot::Hang;
    }

    /// Push a fix to every active watch. Returns how many watches received it.
    pub fn push_fix(&self, raw: RawPosition) -> usize {
        self.broadcast(Ok(raw))
    }

    /// Push an error to every active watch.
    pub fn push_error(&self, error: PositionError) -> usize {
        self.broadcast(Err(error))
    }

    /// End every watch from the provider side, as a platform does when it
    /// revokes location access. Returns how many watches were closed.
    pub fn close_watches(&self) -> usize {
        let mut state = self.state.lock();
        let closed = state.watches.len();
        state.watches.clear();
        closed
    }

    fn broadcast(&self, item: Result<RawPosition, PositionError>) -> usize {
        let mut state = self.state.lock();
        // Receivers that went away are pruned
        state
            .watches
            .retain(|_, sink| sink.send(item.clone()).is_ok());
        state.watches.len()
    }

    pub fn active_watches(&self) -> usize {
        self.state.lock().watches.len()
    }

    pub fn last_watch_options(&self) -> Option<LocationOptions> {
        self.state.lock().last_watch_options
    }

    pub fn check_calls(&self) -> usize {
        self.state.lock().check_calls
    }

    pub fn request_calls(&self) -> usize {
        self.state.lock().request_calls
    }

    pub fn clear_calls(&self) -> usize {
        self.state.lock().clear_calls
    }

    fn unavailable_error() -> LocationError {
        LocationError::PermissionUnavailable("simulated platform has no geolocation".to_string())
    }
}

impl GeolocationProvider for SimulatedProvider {
    fn check_permission(&self) -> BoxFuture<'_, Result<PermissionState, LocationError>> {
        Box::pin(async move {
            let mut state = self.state.lock();
            state.check_calls += 1;
            if state.unavailable {
                return Err(Self::unavailable_error());
            }
            Ok(state.permission)
        })
    }

    fn request_permission(&self) -> BoxFuture<'_, Result<PermissionState, LocationError>> {
        Box::pin(async move {
            let mut state = self.state.lock();
            state.request_calls += 1;
            if state.unavailable {
                return Err(Self::unavailable_error());
            }
            state.permission = state.request_outcome;
            Ok(state.permission)
        })
    }

    fn get_current_position(
        &self,
        _options: LocationOptions,
    ) -> BoxFuture<'_, Result<RawPosition, PositionError>> {
        let one_shot = self.state.lock().one_shot.clone();
        Box::pin(async move {
            match one_shot {
                OneShot::Answer(answer) => answer,
                OneShot::Hang => std::future::pending().await,
            }
        })
    }

    fn watch_position(
        &self,
        options: LocationOptions,
        sink: PositionSink,
    ) -> BoxFuture<'_, Result<WatchId, LocationError>> {
        Box::pin(async move {
            let mut state = self.state.lock();
            if state.unavailable {
                return Err(Self::unavailable_error());
            }
            if state.permission == PermissionState::Denied {
                return Err(LocationError::PermissionDenied);
            }
            let id = WatchId(state.next_watch_id);
            state.next_watch_id += 1;
            state.last_watch_options = Some(options);
            state.watches.insert(id, sink);
            Ok(id)
        })
    }

    fn clear_watch(&self, id: WatchId) {
        let mut state = self.state.lock();
        state.clear_calls += 1;
        state.watches.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_fan_out_and_pruning() {
        let provider = SimulatedProvider::granted();
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, rx_b) = mpsc::unbounded_channel();

        provider
            .watch_position(LocationOptions::watch(), tx_a)
            .await
            .unwrap();
        provider
            .watch_position(LocationOptions::watch(), tx_b)
            .await
            .unwrap();
        drop(rx_b);

        assert_eq!(provider.push_fix(RawPosition::new(1.0, 2.0, 3.0, 4)), 1);
        assert_eq!(rx_a.recv().await, Some(Ok(RawPosition::new(1.0, 2.0, 3.0, 4))));
    }

    #[tokio::test]
    async fn test_watch_refused_when_denied() {
        let provider = SimulatedProvider::new();
        provider.set_permission(PermissionState::Denied);
        let (tx, _rx) = mpsc::unbounded_channel();

        let result = provider.watch_position(LocationOptions::watch(), tx).await;
        assert_eq!(result, Err(LocationError::PermissionDenied));
        assert_eq!(provider.active_watches(), 0);
    }

    #[test]
    fn test_clear_unknown_watch_is_noop() {
        let provider = SimulatedProvider::new();
        provider.clear_watch(WatchId(42));
        assert_eq!(provider.clear_calls(), 1);
        assert_eq!(provider.active_watches(), 0);
    }
}
