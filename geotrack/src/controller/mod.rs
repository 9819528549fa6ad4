//! Tracking session controller.
//!
//! [`TrackingSessionController`] ties the permission gate, the location
//! source, the throttler, the map and the geocoder into the state a location
//! screen displays, and exposes the screen's actions.
//!
//! # Data flow
//!
//! ```text
//! PermissionGate ─► LocationSource ─► watch pump ─► apply_fix
//!                                                     │
//!                       stats (every fix) ◄───────────┤
//!                                                     ▼
//!                                            UpdateThrottler
//!                                              │ accepted
//!                                  ┌───────────┴───────────┐
//!                                  ▼                       ▼
//!                            MapSync::render      ReverseGeocoder (detached)
//! ```
//!
//! # Concurrency
//!
//! The controller is a cheap `Clone` over shared state. The session and the
//! map each sit behind a `parking_lot::Mutex`. Locks are taken in the order
//! state then map and are never held across an `.await`. Geocoding, haptics,
//! the map-init retry and the delayed resize run as detached tasks holding a
//! `Weak` reference, so they never keep a torn-down controller alive.

mod actions;
mod tracking;

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::runtime::Handle;

use crate::config::TrackerConfig;
use crate::geocode::ReverseGeocoder;
use crate::location::{GeolocationProvider, LocationSource};
use crate::map::{BaseLayer, MapBackend, MapSync, MapViewState};
use crate::permission::PermissionGate;
use crate::platform::{
    fire_impact, Clipboard, Haptics, ImpactStyle, NoHaptics, RecordingClipboard,
    RecordingShareTarget, ShareTarget,
};
use crate::session::{Notice, TrackingSession, ViewState};
use crate::throttle::{SampleThrottle, UpdateThrottler};

pub use actions::{maps_url, ShareOutcome, SHARE_TITLE};

/// External collaborators the controller drives.
pub struct TrackerDeps {
    pub provider: Arc<dyn GeolocationProvider>,
    pub map_backend: Arc<dyn MapBackend>,
    pub geocoder: Arc<dyn ReverseGeocoder>,
    pub haptics: Arc<dyn Haptics>,
    pub share: Arc<dyn ShareTarget>,
    pub clipboard: Arc<dyn Clipboard>,
}

impl TrackerDeps {
    /// Dependencies for a device without haptics or a share sheet; shares
    /// fall back to an in-memory clipboard.
    pub fn new(
        provider: Arc<dyn GeolocationProvider>,
        map_backend: Arc<dyn MapBackend>,
        geocoder: Arc<dyn ReverseGeocoder>,
    ) -> Self {
        Self {
            provider,
            map_backend,
            geocoder,
            haptics: Arc::new(NoHaptics),
            share: Arc::new(RecordingShareTarget::unavailable()),
            clipboard: Arc::new(RecordingClipboard::new()),
        }
    }

    pub fn with_haptics(mut self, haptics: Arc<dyn Haptics>) -> Self {
        self.haptics = haptics;
        self
    }

    pub fn with_share(mut self, share: Arc<dyn ShareTarget>) -> Self {
        self.share = share;
        self
    }

    pub fn with_clipboard(mut self, clipboard: Arc<dyn Clipboard>) -> Self {
        self.clipboard = clipboard;
        self
    }
}

struct ControllerState {
    session: TrackingSession,
    throttle: Box<dyn SampleThrottle>,
    status: String,
    notice: Option<Notice>,
    address: String,
    is_loading: bool,
    base_layer: BaseLayer,
    torn_down: bool,
}

struct Inner {
    config: TrackerConfig,
    permission: PermissionGate,
    source: LocationSource,
    geocoder: Arc<dyn ReverseGeocoder>,
    haptics: Arc<dyn Haptics>,
    share: Arc<dyn ShareTarget>,
    clipboard: Arc<dyn Clipboard>,
    state: Mutex<ControllerState>,
    map: Mutex<MapSync>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        // The provider would otherwise keep feeding a subscription nobody reads
        if let Some(handle) = self.state.get_mut().session.watch_handle.take() {
            self.source.stop_watch(&handle);
        }
    }
}

/// Orchestrates one tracking screen.
#[derive(Clone)]
pub struct TrackingSessionController {
    inner: Arc<Inner>,
}

impl fmt::Debug for TrackingSessionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackingSessionController")
            .field("view", &self.snapshot())
            .finish_non_exhaustive()
    }
}

impl TrackingSessionController {
    pub fn new(config: TrackerConfig, deps: TrackerDeps) -> Self {
        let throttle = UpdateThrottler::with_interval(config.session.min_render_interval);
        Self::with_throttle(config, deps, Box::new(throttle))
    }

    /// Build with a custom redraw throttle.
    pub fn with_throttle(
        config: TrackerConfig,
        deps: TrackerDeps,
        throttle: Box<dyn SampleThrottle>,
    ) -> Self {
        let map = MapSync::new(deps.map_backend, config.map.clone());
        let inner = Inner {
            permission: PermissionGate::new(Arc::clone(&deps.provider)),
            source: LocationSource::new(deps.provider),
            geocoder: deps.geocoder,
            haptics: deps.haptics,
            share: deps.share,
            clipboard: deps.clipboard,
            state: Mutex::new(ControllerState {
                session: TrackingSession::new(),
                throttle,
                status: String::new(),
                notice: None,
                address: String::new(),
                is_loading: false,
                base_layer: BaseLayer::default(),
                torn_down: false,
            }),
            map: Mutex::new(map),
            config,
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.inner.config
    }

    /// Copy of everything the screen displays.
    pub fn snapshot(&self) -> ViewState {
        let state = self.inner.state.lock();
        let map_status = self.inner.map.lock().status();
        ViewState {
            is_loading: state.is_loading,
            is_tracking: state.session.is_tracking,
            status: state.status.clone(),
            notice: state.notice,
            address: state.address.clone(),
            base_layer: state.base_layer,
            map_status,
            permission: self.inner.permission.state(),
            last_sample: state.session.last_sample,
            sample_count: state.session.sample_count,
            running_average_accuracy: state.session.running_average_accuracy,
        }
    }

    /// Copy of the map's overlay and camera state.
    pub fn map_view(&self) -> MapViewState {
        self.inner.map.lock().view().clone()
    }

    /// Hide the current notice.
    pub fn dismiss_notice(&self) {
        self.inner.state.lock().notice = None;
    }

    /// Stop tracking and release the map. Idempotent.
    ///
    /// In-flight lookups are not cancelled; their results land on the
    /// inactive session.
    pub fn teardown(&self) {
        let handle = {
            let mut state = self.inner.state.lock();
            if state.torn_down {
                return;
            }
            state.torn_down = true;
            state.session.is_tracking = false;
            state.session.watch_stalled = false;
            state.session.watch_handle.take()
        };
        if let Some(handle) = handle {
            self.inner.source.stop_watch(&handle);
        }
        self.inner.map.lock().dispose();
        tracing::info!("Tracking screen torn down");
    }

    pub fn is_torn_down(&self) -> bool {
        self.inner.state.lock().torn_down
    }

    fn set_status(&self, status: impl Into<String>) {
        self.inner.state.lock().status = status.into();
    }

    /// Show a notice with a light haptic tap.
    fn notify(&self, notice: Notice) {
        self.inner.state.lock().notice = Some(notice);
        tracing::debug!(notice = %notice, "Notice");
        fire_impact(&self.inner.haptics, ImpactStyle::Light);
    }

    fn downgrade(&self) -> Weak<Inner> {
        Arc::downgrade(&self.inner)
    }

    fn upgrade(weak: &Weak<Inner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }
}

/// Spawn a detached task on the current runtime, if there is one.
fn spawn_detached<F>(task: &'static str, future: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    match Handle::try_current() {
        Ok(runtime) => {
            runtime.spawn(future);
        }
        Err(_) => tracing::warn!(task, "No runtime, background task dropped"),
    }
}
