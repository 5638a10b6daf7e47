//! Error types for tailcast-core

use std::path::PathBuf;

use thiserror::Error;

/// Conditions that end a tailer run.
///
/// Rotation, truncation, a momentarily missing file and a partial trailing
/// line are all handled inside the tail loop and never surface here. Anything
/// that does surface is fatal to the current run and left to the supervisor.
#[derive(Error, Debug)]
pub enum TailError {
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to seek {}: {source}", path.display())]
    Seek {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to stat {}: {source}", path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TailError {
    /// Path of the file the failing operation was applied to
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Open { path, .. }
            | Self::Read { path, .. }
            | Self::Seek { path, .. }
            | Self::Stat { path, .. } => path,
        }
    }
}

/// Result alias for tailer operations
pub type TailResult<T> = std::result::Result<T, TailError>;
