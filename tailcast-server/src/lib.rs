//! tailcast-server - TCP server streaming a tailed file to subscribers
//!
//! This crate owns the listener and the shared [`Fanout`]. The supervised
//! tailer runs in one background task and delivers into the fanout; every
//! accepted connection gets its own task that registers a subscriber and
//! holds it until the peer goes away.

pub mod connection;
mod error;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tokio_util::task::AbortOnDropHandle;
use tracing::info;

use tailcast_core::{BackoffConfig, DEFAULT_WRITE_TIMEOUT, Fanout, Supervisor, TailConfig};

pub use connection::{Disconnect, handle_connection};
pub use error::ServerError;

/// Default host for the listener (all interfaces)
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// The tailcast server
pub struct TailServer {
    config: ServerConfig,
    fanout: Arc<Fanout>,
}

impl TailServer {
    /// Create a new server with an empty subscriber set
    pub fn new(config: ServerConfig) -> Self {
        let fanout = Arc::new(Fanout::new(config.write_timeout));
        Self { config, fanout }
    }

    /// Get the server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get the shared subscriber set
    pub fn fanout(&self) -> Arc<Fanout> {
        Arc::clone(&self.fanout)
    }

    /// Run the server, binding to the configured address
    pub async fn run(self) -> Result<(), ServerError> {
        let addr = self.config.addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: addr.clone(),
                source: e,
            })?;

        self.run_with_listener(listener).await
    }

    /// Run the server on an already bound listener.
    ///
    /// Only returns on an accept error. Dropping the returned future stops the
    /// tailer and every connection task.
    pub async fn run_with_listener(self, listener: TcpListener) -> Result<(), ServerError> {
        let local_addr = listener.local_addr()?;
        info!(
            addr = %local_addr,
            path = %self.config.path.display(),
            "tailcast server listening"
        );

        let _tailer = self.start_tailer();
        let mut connections = JoinSet::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, peer) = accepted.map_err(ServerError::Accept)?;
                    connections.spawn(handle_connection(stream, peer, Arc::clone(&self.fanout)));
                }
                Some(_) = connections.join_next() => {}
            }
        }
    }

    /// Spawn the supervised tailer delivering into the fanout
    fn start_tailer(&self) -> AbortOnDropHandle<()> {
        let supervisor = Supervisor::new(
            self.config.path.clone(),
            self.config.tail.clone(),
            self.config.backoff.clone(),
        );
        let fanout = Arc::clone(&self.fanout);

        AbortOnDropHandle::new(tokio::spawn(async move {
            supervisor.run(fanout.as_ref()).await;
        }))
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// File to tail
    pub path: PathBuf,
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Tailer settings
    pub tail: TailConfig,
    /// Bound on each subscriber write and flush
    pub write_timeout: Duration,
    /// Tailer restart backoff
    pub backoff: BackoffConfig,
}

impl ServerConfig {
    /// Create a config tailing `path` on all interfaces at `port`
    pub fn new(path: impl Into<PathBuf>, port: u16) -> Self {
        Self {
            path: path.into(),
            host: DEFAULT_HOST.to_string(),
            port,
            tail: TailConfig::default(),
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            backoff: BackoffConfig::default(),
        }
    }

    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.tail = self.tail.with_poll_interval(interval);
        self
    }

    #[must_use]
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff;
        self
    }

    /// Returns the socket address string (e.g., "0.0.0.0:7432")
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
