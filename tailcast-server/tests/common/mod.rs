//! Shared test utilities for tailcast-server integration tests

pub mod client;

use std::io::Write;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tailcast_core::{BackoffConfig, Fanout};
use tailcast_server::{ServerConfig, TailServer};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use client::{LineClient, Recv};

/// Poll interval used by every test server
pub const POLL: Duration = Duration::from_millis(10);

/// A running server tailing a file inside its own temp directory
pub struct TestServer {
    pub addr: SocketAddr,
    pub fanout: Arc<Fanout>,
    pub path: PathBuf,
    dir: TempDir,
    handle: JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Creates a test server tailing an empty `app.log`
#[allow(dead_code)]
pub async fn create_test_server() -> TestServer {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.log");
    std::fs::write(&path, "").unwrap();
    spawn_server(dir, path).await
}

/// Creates a test server whose file does not exist yet
#[allow(dead_code)]
pub async fn create_test_server_without_file() -> TestServer {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.log");
    spawn_server(dir, path).await
}

/// Spawns server in background task on an ephemeral port
async fn spawn_server(dir: TempDir, path: PathBuf) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let config = ServerConfig::new(&path, addr.port())
        .with_host("127.0.0.1")
        .with_poll_interval(POLL)
        .with_write_timeout(Duration::from_millis(500))
        .with_backoff(
            BackoffConfig::default()
                .with_bounds(Duration::from_millis(10), Duration::from_millis(50)),
        );
    let server = TailServer::new(config);
    let fanout = server.fanout();

    let handle = tokio::spawn(async move {
        let _ = server.run_with_listener(listener).await;
    });

    TestServer {
        addr,
        fanout,
        path,
        dir,
        handle,
    }
}

#[allow(dead_code)]
impl TestServer {
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Connect a client and wait until the server has registered it
    pub async fn connect(&self) -> LineClient {
        let expected = self.fanout.len().await + 1;
        let client = LineClient::connect(self.addr).await;
        self.wait_for_subscribers(expected).await;
        client
    }

    pub async fn wait_for_subscribers(&self, expected: usize) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while self.fanout.len().await != expected {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("never reached {} subscribers", expected));
    }

    pub fn append(&self, data: &str) {
        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .open(&self.path)
            .unwrap();
        file.write_all(data.as_bytes()).unwrap();
    }

    pub fn truncate(&self) {
        std::fs::OpenOptions::new()
            .write(true)
            .open(&self.path)
            .unwrap()
            .set_len(0)
            .unwrap();
    }

    /// Make sure the tailer has opened the file, then leave every client
    /// positioned right after a `ready` marker line.
    ///
    /// The tailer starts at end-of-file from a background task, so lines
    /// appended before it opened are never delivered.
    pub async fn sync(&self, clients: &mut [&mut LineClient]) {
        let (first, rest) = clients.split_first_mut().expect("at least one client");

        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                self.append("sync\n");
                if let Recv::Line(_) = first.recv(Duration::from_millis(50)).await {
                    break;
                }
            }
        })
        .await
        .expect("tailer never started delivering");

        self.append("ready\n");
        first.skip_until("ready\n").await;
        for client in rest {
            client.skip_until("ready\n").await;
        }
    }
}
