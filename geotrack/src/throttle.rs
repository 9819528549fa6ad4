//! Map redraw throttling.
//!
//! The sensor can fire far faster than a marker redraw is worth paying for.
//! The throttler decides, per fix, whether the fix may propagate to the map.
//! It gates redraws (and the address lookup tied to them) only; statistics
//! see every fix.
//!
//! # Policy
//!
//! - The first fix always passes, so the map is never left empty.
//! - Afterwards a fix passes only if at least [`MIN_RENDER_INTERVAL`] has
//!   elapsed since the last accepted one.
//!
//! Timestamps are [`tokio::time::Instant`] so paused-clock tests can drive
//! the policy with `tokio::time::advance`.

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

/// Minimum spacing between two accepted fixes.
pub const MIN_RENDER_INTERVAL: Duration = Duration::from_millis(1000);

/// Outcome of a throttle check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleDecision {
    /// Nothing accepted yet.
    First,
    /// Interval elapsed.
    Accept,
    /// Too soon after the last accepted fix.
    Reject,
}

impl ThrottleDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThrottleDecision::First => "First",
            ThrottleDecision::Accept => "Accept",
            ThrottleDecision::Reject => "Reject",
        }
    }

    pub fn is_accepted(&self) -> bool {
        !matches!(self, ThrottleDecision::Reject)
    }
}

impl fmt::Display for ThrottleDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Pure throttle policy.
pub fn decide(now: Instant, last_accepted_at: Option<Instant>, min_interval: Duration) -> ThrottleDecision {
    match last_accepted_at {
        None => ThrottleDecision::First,
        Some(last) if now.saturating_duration_since(last) < min_interval => ThrottleDecision::Reject,
        Some(_) => ThrottleDecision::Accept,
    }
}

/// `true` if a fix observed at `now` may be rendered.
pub fn should_accept(now: Instant, last_accepted_at: Option<Instant>) -> bool {
    decide(now, last_accepted_at, MIN_RENDER_INTERVAL).is_accepted()
}

/// Decides whether a fix may propagate to the renderer.
///
/// # Implementors
///
/// - `UpdateThrottler` - interval-based, the production policy
/// - `NeverThrottle` - accepts every fix, for unthrottled simulation
pub trait SampleThrottle: Send {
    /// Check and, if accepted, record `now` as the last acceptance.
    fn try_accept(&mut self, now: Instant) -> ThrottleDecision;

    /// When the last fix was accepted, if ever.
    fn last_accepted_at(&self) -> Option<Instant>;

    /// Record a redraw that happened outside `try_accept`, so the next fix
    /// is measured from it.
    fn record_render(&mut self, now: Instant);
}

/// Interval-based throttler.
#[derive(Debug, Clone)]
pub struct UpdateThrottler {
    min_interval: Duration,
    last_accepted_at: Option<Instant>,
    accepted: u64,
    rejected: u64,
}

impl Default for UpdateThrottler {
    fn default() -> Self {
        Self::new()
    }
}

impl UpdateThrottler {
    pub fn new() -> Self {
        Self::with_interval(MIN_RENDER_INTERVAL)
    }

    pub fn with_interval(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_accepted_at: None,
            accepted: 0,
            rejected: 0,
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Check without recording.
    pub fn should_accept(&self, now: Instant) -> bool {
        decide(now, self.last_accepted_at, self.min_interval).is_accepted()
    }

    pub fn accepted_count(&self) -> u64 {
        self.accepted
    }

    pub fn rejected_count(&self) -> u64 {
        self.rejected
    }
}

impl SampleThrottle for UpdateThrottler {
    fn try_accept(&mut self, now: Instant) -> ThrottleDecision {
        let decision = decide(now, self.last_accepted_at, self.min_interval);
        if decision.is_accepted() {
            self.last_accepted_at = Some(now);
            self.accepted += 1;
        } else {
            self.rejected += 1;
        }
        decision
    }

    fn last_accepted_at(&self) -> Option<Instant> {
        self.last_accepted_at
    }

    fn record_render(&mut self, now: Instant) {
        self.last_accepted_at = Some(now);
    }
}

/// Throttle that accepts every fix.
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverThrottle {
    last_accepted_at: Option<Instant>,
}

impl SampleThrottle for NeverThrottle {
    fn try_accept(&mut self, now: Instant) -> ThrottleDecision {
        let decision = if self.last_accepted_at.is_none() {
            ThrottleDecision::First
        } else {
            ThrottleDecision::Accept
        };
        self.last_accepted_at = Some(now);
        decision
    }

    fn last_accepted_at(&self) -> Option<Instant> {
        self.last_accepted_at
    }

    fn record_render(&mut self, now: Instant) {
        self.last_accepted_at = Some(now);
    }
}
