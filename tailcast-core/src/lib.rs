//! tailcast-core: follow a log file and fan its new lines out to subscribers
//!
//! This crate provides the two halves of tailcast and the glue between them:
//!
//! - **Tailer** - [`Tailer`] follows one file across rotation and truncation
//!   and yields each appended line once
//! - **Fanout** - [`Fanout`] broadcasts lines to a dynamic set of
//!   [`Subscriber`]s, isolating slow or failed ones
//! - **Supervisor** - [`Supervisor`] restarts the tailer with exponential
//!   backoff after fatal errors
//!
//! The tailer talks to the fanout only through [`LineSink::deliver`].
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐  restart   ┌────────┐  deliver(line)  ┌────────┐  write/flush
//! │ Supervisor │ ─────────► │ Tailer │ ──────────────► │ Fanout │ ───────────► subscribers
//! └────────────┘  backoff   └────────┘                 └────────┘
//! ```

pub mod config;
pub mod error;
pub mod fanout;
pub mod sink;
pub mod supervisor;
pub mod tailer;

// Re-export key types for convenience
pub use config::{BackoffConfig, DEFAULT_POLL_INTERVAL, MIN_BACKOFF, TailConfig};
pub use error::{TailError, TailResult};
pub use fanout::{DEFAULT_WRITE_TIMEOUT, DeliveryReport, Fanout, Subscriber, SubscriberId};
pub use sink::LineSink;
pub use supervisor::{Backoff, Supervisor, SupervisorState};
pub use tailer::{FileIdentity, LineEvent, PollOutcome, Tailer};
