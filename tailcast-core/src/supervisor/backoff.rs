//! Exponential restart backoff

use std::time::Duration;

use crate::config::{BackoffConfig, MIN_BACKOFF};

/// Growing delay between restarts.
///
/// The delay is non-decreasing across consecutive calls to [`next_delay`]
/// and only returns to the minimum through an explicit [`reset`].
///
/// [`next_delay`]: Backoff::next_delay
/// [`reset`]: Backoff::reset
#[derive(Debug, Clone)]
pub struct Backoff {
    current: Duration,
    min: Duration,
    max: Duration,
    multiplier: f64,
}

impl Backoff {
    pub fn new(config: &BackoffConfig) -> Self {
        let min = config.min.max(MIN_BACKOFF);
        let max = config.max.max(min);
        Self {
            current: min,
            min,
            max,
            multiplier: config.multiplier.max(1.0),
        }
    }

    /// Delay to wait now; advances the delay for the next failure.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        let grown = self.current.as_nanos() as f64 * self.multiplier;
        // `as` saturates, so an overflowing product lands on u64::MAX and is capped below.
        self.current = Duration::from_nanos(grown as u64).min(self.max);
        delay
    }

    /// Delay the next call to [`Backoff::next_delay`] will return
    pub fn current(&self) -> Duration {
        self.current
    }

    /// Return to the minimum delay
    pub fn reset(&mut self) {
        self.current = self.min;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(&BackoffConfig::default())
    }
}
