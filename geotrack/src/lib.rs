//! GeoTrack - live location tracking with map synchronisation
//!
//! This library drives a location screen: it asks for geolocation
//! permission, streams fixes from the device, throttles map redraws, keeps a
//! single marker and accuracy circle in sync with the latest fix, and
//! resolves a short address for display.
//!
//! The entry point is [`TrackingSessionController`]. Every external system
//! (geolocation provider, map widget, HTTP, haptics, share sheet) sits behind
//! a trait so the controller can run against in-process test doubles.

pub mod config;
pub mod controller;
pub mod error;
pub mod format;
pub mod geocode;
pub mod location;
pub mod logging;
pub mod map;
pub mod permission;
pub mod platform;
pub mod sample;
pub mod session;
pub mod throttle;

use std::future::Future;
use std::pin::Pin;

/// Boxed future used by the dyn-compatible collaborator traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub use config::TrackerConfig;
pub use controller::{ShareOutcome, TrackerDeps, TrackingSessionController};
pub use error::{TrackingError, TrackingResult};
pub use permission::{PermissionGate, PermissionState};
pub use sample::{PositionSample, RawPosition};
pub use session::{Notice, TrackingSession, ViewState};
pub use throttle::UpdateThrottler;
