//! Restart-with-backoff supervision of the tailer
//!
//! ```text
//!            tailer exits (error)
//!   ┌─────────┐ ───────────────► ┌─────────┐
//!   │ Running │                  │ Backoff │
//!   └─────────┘ ◄─────────────── └─────────┘
//!               delay elapsed
//! ```
//!
//! There is no terminal state; the loop runs until the task is dropped.

mod backoff;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::config::{BackoffConfig, TailConfig};
use crate::error::TailError;
use crate::sink::LineSink;
use crate::tailer;

pub use backoff::Backoff;

/// Where the supervisor currently is in its restart cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Running,
    /// Waiting this long before the next run
    Backoff(Duration),
}

impl std::fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Backoff(delay) => write!(f, "backoff({:?})", delay),
        }
    }
}

/// Keeps a tailer running for the lifetime of the process.
pub struct Supervisor {
    path: PathBuf,
    tail: TailConfig,
    backoff: Backoff,
    reset_after: Option<Duration>,
    state: SupervisorState,
    restarts: u64,
}

impl Supervisor {
    pub fn new(path: impl Into<PathBuf>, tail: TailConfig, backoff: BackoffConfig) -> Self {
        Self {
            path: path.into(),
            tail,
            backoff: Backoff::new(&backoff),
            reset_after: backoff.reset_after,
            state: SupervisorState::Running,
            restarts: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    /// Number of times the tailer has been restarted
    pub fn restarts(&self) -> u64 {
        self.restarts
    }

    /// Move to `Backoff` after a run ended with `error` having lasted `ran_for`.
    ///
    /// Returns the delay to wait before the next run.
    pub fn on_exit(&mut self, error: &TailError, ran_for: Duration) -> Duration {
        if let Some(healthy_for) = self.reset_after
            && ran_for >= healthy_for
        {
            self.backoff.reset();
        }

        let delay = self.backoff.next_delay();
        self.state = SupervisorState::Backoff(delay);
        self.restarts += 1;

        warn!(
            path = %self.path.display(),
            error = %error,
            restarts = self.restarts,
            ran_ms = ran_for.as_millis() as u64,
            delay_ms = delay.as_millis() as u64,
            "Tailer stopped, restarting after backoff"
        );

        delay
    }

    /// Move back to `Running` once the backoff delay has elapsed.
    fn on_resume(&mut self) {
        self.state = SupervisorState::Running;
    }

    /// Run one tailer into `sink` until it fails, then enter `Backoff`.
    ///
    /// Returns the delay to wait before the next run.
    pub async fn run_once<S: LineSink + ?Sized>(&mut self, sink: &S) -> Duration {
        let started = Instant::now();
        let Err(error) = tailer::run(&self.path, sink, self.tail.clone()).await;
        self.on_exit(&error, started.elapsed())
    }

    /// Run the tailer into `sink` forever, restarting it after every failure.
    pub async fn run<S: LineSink + ?Sized>(mut self, sink: &S) {
        info!(path = %self.path.display(), "Starting tailer supervisor");

        loop {
            let delay = self.run_once(sink).await;
            tokio::time::sleep(delay).await;
            self.on_resume();
        }
    }
}
