//! Server error types

use thiserror::Error;

/// Errors that end the tailcast server
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to the specified address
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Accepting a new subscriber connection failed
    #[error("failed to accept connection: {0}")]
    Accept(#[source] std::io::Error),

    /// Listener socket I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
