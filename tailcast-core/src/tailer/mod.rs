//! File tailer that survives rotation and truncation
//!
//! A [`Tailer`] owns a position in one file and turns appended bytes into
//! [`LineEvent`]s. It starts at the end of the file, drains bursts without
//! sleeping, and on reaching end-of-file sleeps for the poll interval before
//! re-checking the path:
//!
//! - path missing: keep waiting, the rotator has not created the new file yet
//! - identity changed: the file was replaced, reopen and read from byte 0
//! - size below our read position: truncated in place, rewind the same handle
//!
//! Partial trailing lines are buffered and only delivered once terminated.

mod identity;
mod line;

use std::convert::Infallible;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};
use tracing::{debug, info, instrument, trace};

use crate::config::TailConfig;
use crate::error::{TailError, TailResult};
use crate::sink::LineSink;

pub use identity::FileIdentity;
pub use line::LineEvent;

/// Result of re-checking the path after reaching end-of-file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Same file, no shrink. Keep reading from the current position.
    Unchanged,
    /// Nothing at the path right now.
    Missing,
    /// A different file now lives at the path and has been opened at byte 0.
    Rotated,
    /// The open file shrank below the read position and was rewound to byte 0.
    Truncated,
}

impl std::fmt::Display for PollOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unchanged => write!(f, "unchanged"),
            Self::Missing => write!(f, "missing"),
            Self::Rotated => write!(f, "rotated"),
            Self::Truncated => write!(f, "truncated"),
        }
    }
}

/// Open handle plus everything needed to resume reading it.
struct WatchState {
    reader: BufReader<File>,
    identity: FileIdentity,
    /// Start of the next undelivered line.
    offset: u64,
    /// Bytes of an unterminated line already read past `offset`.
    pending: Vec<u8>,
}

impl WatchState {
    fn new(file: File, identity: FileIdentity, offset: u64) -> Self {
        Self {
            reader: BufReader::new(file),
            identity,
            offset,
            pending: Vec::new(),
        }
    }

    /// Physical position of the handle
    fn read_position(&self) -> u64 {
        self.offset + self.pending.len() as u64
    }
}

/// Follows one file and yields each newly appended line exactly once.
pub struct Tailer {
    path: PathBuf,
    config: TailConfig,
    state: WatchState,
}

impl Tailer {
    /// Open `path` and position at its current end.
    ///
    /// Content already in the file is never delivered.
    pub async fn open(path: impl Into<PathBuf>, config: TailConfig) -> TailResult<Self> {
        let path = path.into();

        let mut file = File::open(&path).await.map_err(|source| TailError::Open {
            path: path.clone(),
            source,
        })?;
        let metadata = file.metadata().await.map_err(|source| TailError::Stat {
            path: path.clone(),
            source,
        })?;
        let identity = FileIdentity::from_metadata(&metadata);

        let offset = file
            .seek(SeekFrom::End(0))
            .await
            .map_err(|source| TailError::Seek {
                path: path.clone(),
                source,
            })?;

        debug!(path = %path.display(), %identity, offset, "Opened file for tailing");

        Ok(Self {
            path,
            config,
            state: WatchState::new(file, identity, offset),
        })
    }

    /// Path being followed
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Offset of the next undelivered line in the current file
    pub fn offset(&self) -> u64 {
        self.state.offset
    }

    /// Identity of the currently open file
    pub fn identity(&self) -> FileIdentity {
        self.state.identity
    }

    /// Wait for and return the next complete line.
    ///
    /// Cancel-safe: dropping the future keeps any partially read line buffered
    /// for the next call.
    pub async fn next_line(&mut self) -> TailResult<LineEvent> {
        loop {
            if let Some(line) = self.read_line().await? {
                return Ok(line);
            }

            tokio::time::sleep(self.config.poll_interval).await;

            let outcome = self.poll().await?;
            trace!(path = %self.path.display(), %outcome, "Polled tailed file");
        }
    }

    /// Deliver every line to `sink` until a fatal error ends the run.
    #[instrument(name = "tailer::run", skip_all, fields(path = %self.path.display()))]
    pub async fn run<S: LineSink + ?Sized>(mut self, sink: &S) -> TailResult<Infallible> {
        info!(offset = self.state.offset, "Tailing file");
        loop {
            let line = self.next_line().await?;
            sink.deliver(line).await;
        }
    }

    /// Read one terminated line, or `None` at end-of-file or mid-line.
    async fn read_line(&mut self) -> TailResult<Option<LineEvent>> {
        let state = &mut self.state;

        state
            .reader
            .read_until(b'\n', &mut state.pending)
            .await
            .map_err(|source| TailError::Read {
                path: self.path.clone(),
                source,
            })?;

        if state.pending.last() != Some(&b'\n') {
            return Ok(None);
        }

        let bytes = std::mem::take(&mut state.pending);
        let line = LineEvent::decode(&bytes, state.offset);
        state.offset += bytes.len() as u64;
        Ok(Some(line))
    }

    /// Re-stat the path and react to rotation or truncation.
    async fn poll(&mut self) -> TailResult<PollOutcome> {
        let metadata = match tokio::fs::metadata(&self.path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Tailed file is missing, waiting");
                return Ok(PollOutcome::Missing);
            }
            Err(source) => {
                return Err(TailError::Stat {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        if FileIdentity::from_metadata(&metadata) != self.state.identity {
            return self.reopen().await;
        }

        if metadata.len() < self.state.read_position() {
            return self.rewind(metadata.len()).await;
        }

        Ok(PollOutcome::Unchanged)
    }

    /// Switch to the file that replaced ours, starting at byte 0.
    async fn reopen(&mut self) -> TailResult<PollOutcome> {
        let file = match File::open(&self.path).await {
            Ok(file) => file,
            // Replaced and removed again between stat and open
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(PollOutcome::Missing);
            }
            Err(source) => {
                return Err(TailError::Open {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        let metadata = file.metadata().await.map_err(|source| TailError::Stat {
            path: self.path.clone(),
            source,
        })?;

        let identity = FileIdentity::from_metadata(&metadata);
        let previous = std::mem::replace(&mut self.state, WatchState::new(file, identity, 0));

        info!(
            path = %self.path.display(),
            old = %previous.identity,
            new = %identity,
            discarded_bytes = previous.pending.len(),
            "File rotated, reading replacement from start"
        );

        Ok(PollOutcome::Rotated)
    }

    /// Rewind the open handle after an in-place truncation.
    async fn rewind(&mut self, size: u64) -> TailResult<PollOutcome> {
        let state = &mut self.state;
        let previous = state.read_position();

        state
            .reader
            .seek(SeekFrom::Start(0))
            .await
            .map_err(|source| TailError::Seek {
                path: self.path.clone(),
                source,
            })?;
        state.offset = 0;
        state.pending.clear();

        info!(
            path = %self.path.display(),
            previous_position = previous,
            size,
            "File truncated, reading from start"
        );

        Ok(PollOutcome::Truncated)
    }
}

/// Open `path` and deliver its appended lines to `sink` until a fatal error.
pub async fn run<S: LineSink + ?Sized>(
    path: impl Into<PathBuf>,
    sink: &S,
    config: TailConfig,
) -> TailResult<Infallible> {
    Tailer::open(path, config).await?.run(sink).await
}
