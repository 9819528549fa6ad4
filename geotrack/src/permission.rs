//! Geolocation permission gate.
//!
//! Tracks the last known permission answer. The state only changes through
//! an explicit [`PermissionGate::check`] or [`PermissionGate::request`]; a
//! failed position read never flips it.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::location::{GeolocationProvider, LocationError};

/// Last known geolocation permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionState {
    /// Never asked, or the OS would prompt on next request.
    #[default]
    Unknown,
    Granted,
    Denied,
}

impl PermissionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionState::Unknown => "unknown",
            PermissionState::Granted => "granted",
            PermissionState::Denied => "denied",
        }
    }

    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionState::Granted)
    }
}

impl fmt::Display for PermissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Queries and requests geolocation permission through the provider.
pub struct PermissionGate {
    provider: Arc<dyn GeolocationProvider>,
    state: Mutex<PermissionState>,
}

impl PermissionGate {
    pub fn new(provider: Arc<dyn GeolocationProvider>) -> Self {
        Self {
            provider,
            state: Mutex::new(PermissionState::Unknown),
        }
    }

    /// Last answer seen from `check` or `request`.
    pub fn state(&self) -> PermissionState {
        *self.state.lock()
    }

    /// Query the permission without prompting.
    pub async fn check(&self) -> Result<PermissionState, LocationError> {
        let state = self.provider.check_permission().await.map_err(|e| {
            tracing::warn!(error = %e, "Permission check failed");
            e
        })?;
        self.store(state);
        Ok(state)
    }

    /// Prompt for permission. Suspends until the user answers.
    pub async fn request(&self) -> Result<PermissionState, LocationError> {
        let state = self.provider.request_permission().await.map_err(|e| {
            tracing::warn!(error = %e, "Permission request failed");
            e
        })?;
        self.store(state);
        Ok(state)
    }

    /// Check, and prompt only if the answer is still unknown.
    pub async fn ensure(&self) -> Result<PermissionState, LocationError> {
        match self.check().await? {
            PermissionState::Unknown => self.request().await,
            state => Ok(state),
        }
    }

    fn store(&self, state: PermissionState) {
        let previous = std::mem::replace(&mut *self.state.lock(), state);
        if previous != state {
            tracing::info!(from = %previous, to = %state, "Location permission changed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::SimulatedProvider;

    fn gate(provider: &Arc<SimulatedProvider>) -> PermissionGate {
        PermissionGate::new(Arc::clone(provider) as Arc<dyn GeolocationProvider>)
    }

    #[test]
    fn test_permission_state_display() {
        assert_eq!(PermissionState::Granted.to_string(), "granted");
        assert_eq!(PermissionState::default(), PermissionState::Unknown);
        assert!(!PermissionState::Denied.is_granted());
    }

    #[tokio::test]
    async fn test_check_updates_state_without_prompting() {
        let provider = Arc::new(SimulatedProvider::new());
        provider.set_permission(PermissionState::Granted);
        let gate = gate(&provider);

        assert_eq!(gate.state(), PermissionState::Unknown);
        assert_eq!(gate.check().await, Ok(PermissionState::Granted));
        assert_eq!(gate.state(), PermissionState::Granted);
        assert_eq!(provider.request_calls(), 0);
    }

    #[tokio::test]
    async fn test_ensure_requests_only_when_unknown() {
        let provider = Arc::new(SimulatedProvider::new());
        provider.set_request_outcome(PermissionState::Granted);
        let gate = gate(&provider);

        assert_eq!(gate.ensure().await, Ok(PermissionState::Granted));
        assert_eq!(provider.request_calls(), 1);

        provider.set_permission(PermissionState::Denied);
        assert_eq!(gate.ensure().await, Ok(PermissionState::Denied));
        assert_eq!(provider.request_calls(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_platform_keeps_state() {
        let provider = Arc::new(SimulatedProvider::new());
        provider.set_permission(PermissionState::Granted);
        let gate = gate(&provider);
        gate.check().await.unwrap();

        provider.set_unavailable(true);
        let result = gate.check().await;
        assert!(matches!(
            result,
            Err(LocationError::PermissionUnavailable(_))
        ));
        assert_eq!(gate.state(), PermissionState::Granted);
    }
}
