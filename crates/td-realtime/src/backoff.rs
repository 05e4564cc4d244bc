//! Resubscription delays

use std::time::Duration;
use td_core::config::RealtimeConfig;

/// Exponential delay between resubscribe attempts, doubling from `initial`
/// up to `max`
#[derive(Debug, Clone, PartialEq)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    /// Zero means unlimited
    max_attempts: u32,
    attempts: u32,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration, max_attempts: u32) -> Self {
        Self {
            initial,
            max,
            max_attempts,
            attempts: 0,
        }
    }

    pub fn from_config(config: &RealtimeConfig) -> Self {
        Self::new(
            Duration::from_millis(config.reconnect_initial_delay_ms),
            Duration::from_millis(config.reconnect_max_delay_ms),
            config.max_reconnect_attempts,
        )
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Start over after a successful subscribe
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Delay before the next attempt, or `None` once attempts are exhausted
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.max_attempts != 0 && self.attempts >= self.max_attempts {
            return None;
        }
        let factor = 2u32.saturating_pow(self.attempts.min(16));
        let delay = self.initial.saturating_mul(factor).min(self.max);
        self.attempts += 1;
        Some(delay)
    }
}
