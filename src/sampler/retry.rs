use std::time::{Duration, Instant};

/// Caps immediate retries of failed fetches within a rolling window.
///
/// Failed cycles are retried right away until `max_per_window` retries have
/// happened inside the current window; after that the caller is told how
/// long to wait for the window to reset.
#[derive(Debug)]
pub struct RetryBudget {
    max_per_window: u32,
    window: Duration,
    window_start: Instant,
    used: u32,
}

impl RetryBudget {
    pub fn new(max_per_window: u32, window: Duration) -> Self {
        Self {
            max_per_window: max_per_window.max(1),
            window,
            window_start: Instant::now(),
            used: 0,
        }
    }

    /// Budget of `max_per_second` retries per second.
    pub fn per_second(max_per_second: u32) -> Self {
        Self::new(max_per_second, Duration::from_secs(1))
    }

    /// Record a failed attempt. Returns `None` to retry immediately, or the
    /// remaining time until the window resets once the budget is spent.
    pub fn record_failure(&mut self, now: Instant) -> Option<Duration> {
        if now.duration_since(self.window_start) >= self.window {
            self.window_start = now;
            self.used = 0;
        }

        if self.used < self.max_per_window {
            self.used += 1;
            return None;
        }

        // The attempt made after the wait is the first retry of the next window.
        let reset_at = self.window_start + self.window;
        self.window_start = reset_at;
        self.used = 1;
        Some(reset_at.saturating_duration_since(now))
    }

    /// Clear the budget after a successful cycle.
    pub fn mark_success(&mut self, now: Instant) {
        self.window_start = now;
        self.used = 0;
    }
}
