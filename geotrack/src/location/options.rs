//! Position request options.

use std::time::Duration;

/// Options for a single-shot request or a continuous watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationOptions {
    /// Prefer GPS-grade fixes over network positioning.
    pub high_accuracy: bool,
    /// How long the provider may take to deliver a fix.
    pub timeout_ms: u64,
    /// Accept a cached fix no older than this. Zero forces a fresh fix.
    pub max_age_ms: u64,
}

impl LocationOptions {
    /// Defaults for a continuous watch (10 s timeout, 1 s cache).
    pub fn watch() -> Self {
        Self {
            high_accuracy: true,
            timeout_ms: 10_000,
            max_age_ms: 1_000,
        }
    }

    /// Defaults for a single-shot request (15 s timeout, no cache).
    pub fn one_shot() -> Self {
        Self {
            high_accuracy: true,
            timeout_ms: 15_000,
            max_age_ms: 0,
        }
    }

    pub fn with_high_accuracy(mut self, high_accuracy: bool) -> Self {
        self.high_accuracy = high_accuracy;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_max_age_ms(mut self, max_age_ms: u64) -> Self {
        self.max_age_ms = max_age_ms;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for LocationOptions {
    fn default() -> Self {
        Self::watch()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let watch = LocationOptions::watch();
        assert!(watch.high_accuracy);
        assert_eq!(watch.timeout_ms, 10_000);
        assert_eq!(watch.max_age_ms, 1_000);

        let once = LocationOptions::one_shot();
        assert_eq!(once.timeout(), Duration::from_secs(15));
        assert_eq!(once.max_age_ms, 0);
    }

    #[test]
    fn test_builder() {
        let opts = LocationOptions::watch()
            .with_high_accuracy(false)
            .with_timeout_ms(500)
            .with_max_age_ms(0);
        assert!(!opts.high_accuracy);
        assert_eq!(opts.timeout_ms, 500);
        assert_eq!(opts.max_age_ms, 0);
    }
}
