//! Backoff after failed sessions
//!
//! Consecutive failures wait 10 s, 20 s, 30 s, ... growing linearly up to
//! 1000 s at the hundredth failure. From then on the CPE retries every
//! 20 minutes without touching the counter.

use std::time::Duration;

use tracing::warn;

use crate::timer::{Dispatcher, TimerId};

/// Highest value the retry counter reaches
pub const MAX_RETRY_COUNT: u8 = 100;

/// Backoff growth per consecutive failure
pub const RETRY_STEP: Duration = Duration::from_millis(10_000);

/// Flat delay once the counter is saturated
pub const SATURATED_RETRY_DELAY: Duration = Duration::from_millis(1_200_000);

/// Capped linear-backoff state for failed sessions
#[derive(Debug, Clone, Default)]
pub struct RetryScheduler {
    retry_count: u8,
}

impl RetryScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn retry_count(&self) -> u8 {
        self.retry_count
    }

    /// Record a failed session and arm the retry timer
    ///
    /// Returns the delay that was armed.
    pub fn on_failure(&mut self, dispatcher: &mut dyn Dispatcher) -> Duration {
        let delay = if self.retry_count < MAX_RETRY_COUNT {
            self.retry_count += 1;
            RETRY_STEP * u32::from(self.retry_count)
        } else {
            SATURATED_RETRY_DELAY
        };

        warn!(
            "session failed (attempt {}), retrying in {}s",
            self.retry_count,
            delay.as_secs()
        );
        dispatcher.arm(TimerId::Retry, delay);
        delay
    }

    /// Forget previous failures
    pub fn reset(&mut self) {
        self.retry_count = 0;
    }
}
