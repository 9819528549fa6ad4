//! Watch lifecycle and the per-fix pipeline.

use std::sync::Weak;

use tokio::time::Instant;

use super::{spawn_detached, Inner, TrackingSessionController};
use crate::error::{TrackingError, TrackingResult};
use crate::location::{LocationError, PositionStream, WatchEvent, WatchHandle};
use crate::map::{CameraMove, MapError};
use crate::sample::PositionSample;
use crate::session::Notice;

impl TrackingSessionController {
    /// Start continuous tracking.
    ///
    /// Requests permission first if it is still unknown. `is_tracking` turns
    /// on when the watch delivers its first fix. Calling this while a watch
    /// is live is a no-op; a stalled watch is replaced.
    pub async fn start_tracking(&self) -> TrackingResult<()> {
        {
            let mut state = self.inner.state.lock();
            if state.torn_down {
                return Err(TrackingError::Unknown("session torn down".to_string()));
            }
            if state.session.has_live_watch() {
                tracing::debug!("Tracking already active");
                return Ok(());
            }
            state.status.clear();
        }

        let permission = match self.inner.permission.ensure().await {
            Ok(permission) => permission,
            Err(e) => return Err(self.tracking_failed(e.into())),
        };
        if !permission.is_granted() {
            tracing::info!(permission = %permission, "Tracking refused");
            let err = TrackingError::PermissionDenied;
            let mut state = self.inner.state.lock();
            state.session.is_tracking = false;
            state.status = err.status_message().to_string();
            return Err(err);
        }

        let watch = match self.inner.source.watch(self.inner.config.location.watch).await {
            Ok(watch) => watch,
            Err(e) => return Err(self.tracking_failed(e.into())),
        };

        let replaced = {
            let mut state = self.inner.state.lock();
            if state.torn_down {
                drop(state);
                self.inner.source.stop_watch(&watch.handle);
                return Err(TrackingError::Unknown("session torn down".to_string()));
            }
            state.session.watch_stalled = false;
            state.session.watch_handle.replace(watch.handle.clone())
        };
        if let Some(old) = replaced {
            self.inner.source.stop_watch(&old);
        }

        tracing::info!(watch = %watch.handle.id(), "Tracking started");
        spawn_detached(
            "watch pump",
            pump(self.downgrade(), watch.handle, watch.stream),
        );
        self.notify(Notice::TrackingStarted);
        Ok(())
    }

    /// Stop tracking. Returns `false` if there was nothing to stop.
    ///
    /// The last rendered fix stays on the map.
    pub fn stop_tracking(&self) -> bool {
        let handle = {
            let mut state = self.inner.state.lock();
            let Some(handle) = state.session.watch_handle.take() else {
                return false;
            };
            state.session.is_tracking = false;
            state.session.watch_stalled = false;
            handle
        };
        self.inner.source.stop_watch(&handle);
        tracing::info!(watch = %handle.id(), "Tracking stopped");
        self.notify(Notice::TrackingStopped);
        true
    }

    /// Request a single fix and feed it through the same path as watch fixes.
    ///
    /// Independent of any active watch. `is_loading` is set for the duration.
    pub async fn get_current_location(&self) -> TrackingResult<PositionSample> {
        {
            let mut state = self.inner.state.lock();
            if state.torn_down {
                return Err(TrackingError::Unknown("session torn down".to_string()));
            }
            state.is_loading = true;
            state.status.clear();
        }

        let result = self
            .inner
            .source
            .get_once(self.inner.config.location.one_shot)
            .await;
        {
            let mut state = self.inner.state.lock();
            state.is_loading = false;
            if state.torn_down {
                tracing::debug!("Single-shot fix arrived after teardown");
                return Err(TrackingError::Unknown("session torn down".to_string()));
            }
        }

        match result {
            Ok(sample) => {
                self.apply_fix(sample);
                self.notify(Notice::LocationFound);
                Ok(sample)
            }
            Err(e) => {
                let err = TrackingError::from(e);
                tracing::warn!(error = %err, "Single-shot location failed");
                self.set_status(err.status_message());
                self.notify(Notice::LocationFailed);
                Err(err)
            }
        }
    }

    /// Fold a fix into the session and, if the throttle lets it through,
    /// redraw the map and start an address lookup.
    ///
    /// Returns the camera move when the map was redrawn.
    pub(crate) fn apply_fix(&self, sample: PositionSample) -> Option<CameraMove> {
        let now = Instant::now();
        let rendered = {
            let mut state = self.inner.state.lock();
            if state.torn_down {
                return None;
            }
            state.session.record_sample(sample);
            let decision = state.throttle.try_accept(now);
            tracing::debug!(
                lat = sample.latitude(),
                lon = sample.longitude(),
                accuracy_m = sample.accuracy(),
                count = state.session.sample_count,
                decision = %decision,
                "Fix"
            );
            if !decision.is_accepted() {
                return None;
            }
            self.inner.map.lock().render(&sample)
        };

        self.spawn_lookup(&sample);

        match rendered {
            Ok(camera) => Some(camera),
            Err(MapError::NotReady) => {
                tracing::debug!("Map not ready, fix kept for later render");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Map render failed");
                None
            }
        }
    }

    /// Resolve the address for `sample` on a detached task.
    ///
    /// Last write wins: a slow lookup may overwrite a newer address.
    /// Failures leave the address untouched.
    fn spawn_lookup(&self, sample: &PositionSample) {
        let weak = self.downgrade();
        let geocoder = self.inner.geocoder.clone();
        let (lat, lon) = sample.lat_lon();
        spawn_detached("reverse geocode", async move {
            match geocoder.lookup(lat, lon).await {
                Ok(address) => {
                    if let Some(inner) = weak.upgrade() {
                        tracing::debug!(address = %address, "Address resolved");
                        inner.state.lock().address = address;
                    }
                }
                Err(e) => tracing::debug!(error = %e, lat, lon, "Reverse geocoding failed"),
            }
        });
    }

    fn tracking_failed(&self, err: TrackingError) -> TrackingError {
        tracing::warn!(error = %err, "Failed to start tracking");
        {
            let mut state = self.inner.state.lock();
            state.session.is_tracking = false;
            state.status = err.status_message().to_string();
        }
        self.notify(Notice::TrackingFailed);
        err
    }

    fn is_current_watch(&self, handle: &WatchHandle) -> bool {
        self.inner
            .state
            .lock()
            .session
            .watch_handle
            .as_ref()
            .is_some_and(|current| current.id() == handle.id())
    }

    fn on_watch_fix(&self, handle: &WatchHandle, sample: PositionSample) {
        {
            let mut state = self.inner.state.lock();
            let current = state
                .session
                .watch_handle
                .as_ref()
                .is_some_and(|current| current.id() == handle.id());
            if !current || state.torn_down {
                return;
            }
            state.session.is_tracking = true;
            state.session.watch_stalled = false;
        }
        self.apply_fix(sample);
    }

    /// Returns `true` when the pump should stop.
    fn on_watch_error(&self, handle: &WatchHandle, err: LocationError) -> bool {
        let err = TrackingError::from(err);
        tracing::warn!(watch = %handle.id(), error = %err, "Watch error");

        let unsubscribe = self.inner.config.session.unsubscribe_on_error;
        let stale = {
            let mut state = self.inner.state.lock();
            let current = state
                .session
                .watch_handle
                .as_ref()
                .is_some_and(|current| current.id() == handle.id());
            if !current {
                return true;
            }
            state.session.is_tracking = false;
            state.status = err.status_message().to_string();
            if unsubscribe {
                state.session.watch_handle.take()
            } else {
                state.session.watch_stalled = true;
                None
            }
        };

        if let Some(stale) = stale {
            self.inner.source.stop_watch(&stale);
            tracing::info!(watch = %stale.id(), "Watch unsubscribed after error");
        }
        unsubscribe
    }

    /// The provider ended the watch without being asked to.
    fn on_watch_closed(&self, handle: &WatchHandle) {
        if handle.is_stopped() {
            return;
        }
        let closed = {
            let mut state = self.inner.state.lock();
            let current = state
                .session
                .watch_handle
                .as_ref()
                .is_some_and(|current| current.id() == handle.id());
            if !current {
                return;
            }
            let err = TrackingError::PositionUnavailable("watch closed by provider".to_string());
            state.session.is_tracking = false;
            state.session.watch_stalled = false;
            state.status = err.status_message().to_string();
            state.session.watch_handle.take()
        };

        if let Some(closed) = closed {
            self.inner.source.stop_watch(&closed);
            tracing::warn!(watch = %closed.id(), "Watch closed by provider");
        }
    }
}

/// Drain one watch into the controller until it is stopped.
async fn pump(weak: Weak<Inner>, handle: WatchHandle, mut stream: PositionStream) {
    loop {
        let event = stream.next_event().await;
        let Some(controller) = TrackingSessionController::upgrade(&weak) else {
            break;
        };
        let Some(event) = event else {
            controller.on_watch_closed(&handle);
            break;
        };
        if handle.is_stopped() || !controller.is_current_watch(&handle) {
            break;
        }
        match event {
            WatchEvent::Fix(sample) => controller.on_watch_fix(&handle, sample),
            WatchEvent::Error(e) => {
                if controller.on_watch_error(&handle, e) {
                    break;
                }
            }
        }
    }
    tracing::debug!(watch = %handle.id(), "Watch pump finished");
}
