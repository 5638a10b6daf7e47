//! Line-oriented TCP test client
//!
//! Note: Some methods may appear unused because they're only used in specific
//! test files and clippy checks each test independently.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::timeout;

/// Default wait for an expected line
const WAIT: Duration = Duration::from_secs(2);

/// Wait used to assert that nothing arrives
const QUIET: Duration = Duration::from_millis(150);

/// Result of waiting for one line
#[derive(Debug, PartialEq, Eq)]
pub enum Recv {
    Line(String),
    Closed,
    TimedOut,
}

/// Subscriber connection reading newline-terminated text
pub struct LineClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    pending: Vec<u8>,
}

#[allow(dead_code)]
impl LineClient {
    pub async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.expect("Failed to connect");
        let (reader, writer) = stream.into_split();
        Self {
            reader: BufReader::new(reader),
            writer,
            pending: Vec::new(),
        }
    }

    /// Wait up to `wait` for the next line.
    ///
    /// Partial lines survive a timeout and are completed by the next call.
    pub async fn recv(&mut self, wait: Duration) -> Recv {
        match timeout(wait, self.reader.read_until(b'\n', &mut self.pending)).await {
            Err(_) => Recv::TimedOut,
            Ok(Err(_)) => Recv::Closed,
            Ok(Ok(_)) if self.pending.ends_with(b"\n") => {
                let bytes = std::mem::take(&mut self.pending);
                Recv::Line(String::from_utf8_lossy(&bytes).into_owned())
            }
            Ok(Ok(_)) => Recv::Closed,
        }
    }

    /// Next line, panicking if none arrives in time
    pub async fn expect_line(&mut self) -> String {
        match self.recv(WAIT).await {
            Recv::Line(line) => line,
            other => panic!("Expected a line, got {:?}", other),
        }
    }

    /// Assert that nothing arrives for a short while
    pub async fn expect_quiet(&mut self) {
        match self.recv(QUIET).await {
            Recv::TimedOut => {}
            other => panic!("Expected no data, got {:?}", other),
        }
    }

    /// Consume lines up to and including `marker`
    pub async fn skip_until(&mut self, marker: &str) {
        loop {
            if self.expect_line().await == marker {
                return;
            }
        }
    }

    /// Send bytes the server is expected to ignore
    pub async fn send(&mut self, data: &[u8]) {
        self.writer.write_all(data).await.unwrap();
    }
}
