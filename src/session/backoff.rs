//! Reconnect delay with exponential growth and jitter.

use std::time::Duration;

use rand::Rng;

use crate::core::{INITIAL_RECONNECT_DELAY, MAX_RECONNECT_DELAY, RECONNECT_BACKOFF_MULTIPLIER};

/// Delay schedule between reconnect attempts.
///
/// Each delay is the current base plus up to 25% jitter; the base then grows
/// by the multiplier, capped at the maximum.
#[derive(Debug, Clone)]
pub struct ReconnectBackoff {
    initial: Duration,
    max: Duration,
    multiplier: u32,
    current: Duration,
    attempts: u32,
}

impl ReconnectBackoff {
    /// Schedule with the given bounds.
    pub fn new(initial: Duration, max: Duration, multiplier: u32) -> Self {
        Self {
            initial,
            max,
            multiplier: multiplier.max(1),
            current: initial,
            attempts: 0,
        }
    }

    /// Attempts since the last reset.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Delay before the next attempt.
    pub fn next_delay(&mut self) -> Duration {
        let base = self.current.min(self.max);
        let jitter_ms = (base.as_millis() as u64) / 4;
        let jitter = if jitter_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
        };

        self.attempts += 1;
        self.current = (self.current * self.multiplier).min(self.max);
        (base + jitter).min(self.max)
    }

    /// Back to the initial delay, after a successful connection.
    pub fn reset(&mut self) {
        self.current = self.initial;
        self.attempts = 0;
    }
}

impl Default for ReconnectBackoff {
    fn default() -> Self {
        Self::new(
            INITIAL_RECONNECT_DELAY,
            MAX_RECONNECT_DELAY,
            RECONNECT_BACKOFF_MULTIPLIER,
        )
    }
}
