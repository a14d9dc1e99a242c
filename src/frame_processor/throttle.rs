// SPDX-License-Identifier: GPL-3.0-only

//! Failure throttle
//!
//! After a decoder failure, passes are skipped until the cooldown window
//! has fully elapsed. The window is inclusive: a failure at `T` with a
//! 1000ms window still suppresses a pass at exactly `T + 1000ms`.

use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct Throttle {
    window: Duration,
    failure_occurred: bool,
    failure_at: Option<Instant>,
}

impl Throttle {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            failure_occurred: false,
            failure_at: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Record a decoder failure at `now`
    pub fn record_failure(&mut self, now: Instant) {
        self.failure_occurred = true;
        self.failure_at = Some(now);
    }

    pub fn failure_occurred(&self) -> bool {
        self.failure_occurred
    }

    /// Whether a pass starting at `now` must be skipped
    pub fn should_skip(&self, now: Instant) -> bool {
        match (self.failure_occurred, self.failure_at) {
            (true, Some(at)) => now.saturating_duration_since(at) <= self.window,
            _ => false,
        }
    }

    /// Clear the failure flag at the start of a pass; the timestamp is kept
    pub fn begin_pass(&mut self) {
        self.failure_occurred = false;
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(crate::constants::throttle::WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_throttle_never_skips() {
        let throttle = Throttle::default();
        assert!(!throttle.should_skip(Instant::now()));
    }

    #[test]
    fn test_window_boundaries() {
        let mut throttle = Throttle::new(Duration::from_millis(1000));
        let t = Instant::now();
        throttle.record_failure(t);

        assert!(throttle.should_skip(t));
        assert!(throttle.should_skip(t + Duration::from_millis(999)));
        assert!(throttle.should_skip(t + Duration::from_millis(1000)));
        assert!(!throttle.should_skip(t + Duration::from_millis(1001)));
    }

    #[test]
    fn test_begin_pass_clears_flag() {
        let mut throttle = Throttle::default();
        let t = Instant::now();
        throttle.record_failure(t);
        throttle.begin_pass();

        assert!(!throttle.failure_occurred());
        assert!(!throttle.should_skip(t + Duration::from_millis(1)));
    }
}
