//! User-facing screen actions: permissions, map controls and sharing.

use tokio::time::Instant;

use super::{spawn_detached, TrackingSessionController};
use crate::error::{TrackingError, TrackingResult};
use crate::map::{BaseLayer, MapError};
use crate::permission::PermissionState;
use crate::platform::SharePayload;
use crate::sample::PositionSample;
use crate::session::Notice;

/// Share sheet title.
pub const SHARE_TITLE: &str = "My location";

/// How a location was shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareOutcome {
    /// Handed to the system share sheet.
    Shared,
    /// Copied to the clipboard instead.
    Copied,
    /// Nothing to share yet.
    NoLocation,
}

/// Google Maps link for a fix.
pub fn maps_url(sample: &PositionSample) -> String {
    format!(
        "https://maps.google.com/?q={},{}",
        sample.latitude(),
        sample.longitude()
    )
}

impl TrackingSessionController {
    /// Create the map in its container.
    ///
    /// On failure a single retry is scheduled after the configured delay;
    /// if that fails too the screen carries on without a map. On success any
    /// fix received before the map existed is drawn, and the container is
    /// re-measured after the resize delay.
    pub fn attach_map(&self) -> TrackingResult<()> {
        let result = self.inner.map.lock().init();
        match result {
            Ok(()) => {
                self.on_map_ready();
                Ok(())
            }
            Err(MapError::Disposed) => Err(TrackingError::MapInitFailure(MapError::Disposed)),
            Err(e) => {
                self.schedule_map_retry();
                Err(TrackingError::MapInitFailure(e))
            }
        }
    }

    fn schedule_map_retry(&self) {
        let weak = self.downgrade();
        let delay = self.inner.config.map.init_retry_delay;
        tracing::info!(delay_ms = delay.as_millis() as u64, "Map init retry scheduled");

        spawn_detached("map init retry", async move {
            tokio::time::sleep(delay).await;
            let Some(controller) = TrackingSessionController::upgrade(&weak) else {
                return;
            };
            if controller.is_torn_down() {
                return;
            }
            let result = controller.inner.map.lock().init();
            match result {
                Ok(()) => controller.on_map_ready(),
                Err(e) => tracing::error!(error = %e, "Map init retry failed, continuing without map"),
            }
        });
    }

    fn on_map_ready(&self) {
        {
            let mut state = self.inner.state.lock();
            if let Some(sample) = state.session.last_sample {
                match self.inner.map.lock().render(&sample) {
                    Ok(_) => state.throttle.record_render(Instant::now()),
                    Err(e) => tracing::warn!(error = %e, "Could not draw pending fix"),
                }
            }
        }

        let weak = self.downgrade();
        let delay = self.inner.config.map.resize_delay;
        spawn_detached("map resize", async move {
            tokio::time::sleep(delay).await;
            if let Some(controller) = TrackingSessionController::upgrade(&weak) {
                // Disposed in the meantime is fine
                let _ = controller.inner.map.lock().refresh_layout();
            }
        });
    }

    /// Query the permission without prompting and reflect it in the status.
    pub async fn check_permissions(&self) -> TrackingResult<PermissionState> {
        match self.inner.permission.check().await {
            Ok(state) => {
                if state.is_granted() {
                    self.set_status("");
                } else {
                    self.set_status("Location permission required");
                }
                Ok(state)
            }
            Err(e) => {
                self.set_status("Failed to check permissions");
                Err(e.into())
            }
        }
    }

    /// Prompt for permission.
    pub async fn request_permissions(&self) -> TrackingResult<PermissionState> {
        match self.inner.permission.request().await {
            Ok(PermissionState::Granted) => {
                self.set_status("");
                self.notify(Notice::PermissionGranted);
                Ok(PermissionState::Granted)
            }
            Ok(state) => {
                self.set_status(TrackingError::PermissionDenied.status_message());
                self.notify(Notice::PermissionDenied);
                Ok(state)
            }
            Err(e) => {
                self.set_status("Failed to request permissions");
                Err(e.into())
            }
        }
    }

    /// Recentre the map on the last fix.
    ///
    /// Without a fix or a map, only shows a "no location" notice.
    pub fn center_on_user(&self) -> bool {
        let centred = {
            let state = self.inner.state.lock();
            match state.session.last_sample {
                Some(sample) => self.inner.map.lock().center_on(&sample).is_ok(),
                None => false,
            }
        };
        self.notify(if centred {
            Notice::MapCentered
        } else {
            Notice::NoLocation
        });
        centred
    }

    pub fn zoom_in(&self) {
        if let Err(e) = self.inner.map.lock().zoom_in() {
            tracing::debug!(error = %e, "Zoom in ignored");
        }
    }

    pub fn zoom_out(&self) {
        if let Err(e) = self.inner.map.lock().zoom_out() {
            tracing::debug!(error = %e, "Zoom out ignored");
        }
    }

    /// Flip between standard and satellite tiles.
    ///
    /// The choice sticks even without a map and is applied once one exists.
    pub fn toggle_map_style(&self) -> BaseLayer {
        let mut state = self.inner.state.lock();
        let next = state.base_layer.toggled();
        state.base_layer = next;
        if let Err(e) = self.inner.map.lock().set_base_layer(next) {
            tracing::debug!(error = %e, base_layer = %next, "Base layer deferred");
        }
        next
    }

    /// Google Maps link for the last fix.
    pub fn open_in_maps(&self) -> Option<String> {
        self.inner.state.lock().session.last_sample.as_ref().map(maps_url)
    }

    /// Share the last fix.
    ///
    /// Uses the share sheet when available and falls back to the clipboard
    /// when it is missing or fails.
    pub async fn share_location(&self) -> TrackingResult<ShareOutcome> {
        let last_sample = self.inner.state.lock().session.last_sample;
        let Some(sample) = last_sample else {
            return Ok(ShareOutcome::NoLocation);
        };

        let url = maps_url(&sample);
        let payload = SharePayload {
            title: SHARE_TITLE.to_string(),
            text: format!("My current location: {url}"),
            url,
        };

        if self.inner.share.is_available() {
            match self.inner.share.share(&payload).await {
                Ok(()) => return Ok(ShareOutcome::Shared),
                Err(e) => tracing::warn!(error = %e, "Share sheet failed, copying instead"),
            }
        }

        match self.inner.clipboard.write_text(&payload.text).await {
            Ok(()) => {
                self.notify(Notice::LocationCopied);
                Ok(ShareOutcome::Copied)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Clipboard write failed");
                Err(TrackingError::ShareFailure(e))
            }
        }
    }
}
