//! Serve a tailed file to TCP subscribers until interrupted

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use tailcast_server::{DEFAULT_HOST, ServerConfig, TailServer};

/// Default poll interval in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 200;
/// Default subscriber write timeout in milliseconds
pub const DEFAULT_WRITE_TIMEOUT_MS: u64 = 5000;

/// Arguments for serving a file
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Path to logfile to tail
    pub logfile: PathBuf,

    /// Host to bind
    #[arg(long, default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on
    #[arg(short, long)]
    pub port: u16,

    /// Milliseconds to wait at end-of-file before checking for new data
    #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL_MS)]
    pub poll_interval_ms: u64,

    /// Milliseconds a subscriber may block a write before it is dropped
    #[arg(long, default_value_t = DEFAULT_WRITE_TIMEOUT_MS)]
    pub write_timeout_ms: u64,
}

impl ServeArgs {
    fn server_config(&self) -> ServerConfig {
        ServerConfig::new(&self.logfile, self.port)
            .with_host(&self.host)
            .with_poll_interval(Duration::from_millis(self.poll_interval_ms))
            .with_write_timeout(Duration::from_millis(self.write_timeout_ms))
    }
}

/// Run the server in the foreground until Ctrl-C
pub async fn run(args: ServeArgs) -> Result<()> {
    let config = args.server_config();
    info!(
        "Serving on {}, tailing {}",
        config.addr(),
        config.path.display()
    );

    let server = TailServer::new(config);

    tokio::select! {
        result = server.run() => result.context("tailcast server stopped"),
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for Ctrl-C")?;
            info!("Shutting down");
            Ok(())
        }
    }
}
