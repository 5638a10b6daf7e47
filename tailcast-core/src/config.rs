//! Configuration for the tailer and its supervisor.

use std::time::Duration;

/// Default interval between end-of-file polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Smallest restart delay. A zero delay would restart a failing tailer in a
/// tight loop.
pub const MIN_BACKOFF: Duration = Duration::from_millis(1);

/// Configuration for a single tailer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailConfig {
    /// How long to sleep after reaching end-of-file before re-checking the path.
    pub poll_interval: Duration,
}

impl Default for TailConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl TailConfig {
    /// Create a new config with a custom poll interval.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

/// Restart backoff for the supervisor.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffConfig {
    /// Delay before the first restart.
    pub min: Duration,
    /// Upper bound for the delay.
    pub max: Duration,
    /// Factor applied to the delay after every restart.
    pub multiplier: f64,
    /// Reset the delay to `min` after a run that lasted at least this long.
    ///
    /// `None` keeps the delay growing for the lifetime of the process.
    pub reset_after: Option<Duration>,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            min: Duration::from_millis(100),
            max: Duration::from_secs(30),
            multiplier: 2.0,
            reset_after: None,
        }
    }
}

impl BackoffConfig {
    /// Create a new config with custom bounds. `min` is raised to [`MIN_BACKOFF`].
    #[must_use]
    pub fn with_bounds(mut self, min: Duration, max: Duration) -> Self {
        self.min = min.max(MIN_BACKOFF);
        self.max = max.max(self.min);
        self
    }

    /// Create a new config with a custom multiplier.
    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Create a new config that resets after a healthy run of `healthy_for`.
    #[must_use]
    pub fn with_reset_after(mut self, healthy_for: Duration) -> Self {
        self.reset_after = Some(healthy_for);
        self
    }
}
