//! Per-subscriber connection handling
//!
//! A connection is a one-way stream of raw line bytes. Whatever the peer sends
//! is read and thrown away; reading only exists to notice the disconnect.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tracing::{debug, info, trace};

use tailcast_core::{Fanout, Subscriber};

/// Size of the scratch buffer used to drain inbound bytes
const READ_BUFFER_SIZE: usize = 100;

/// Why a connection ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disconnect {
    /// Peer closed its side
    Closed,
    /// Reading from the peer failed
    ReadError,
    /// A failed delivery removed the subscriber
    Evicted,
}

impl std::fmt::Display for Disconnect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "closed by peer"),
            Self::ReadError => write!(f, "read error"),
            Self::Evicted => write!(f, "evicted"),
        }
    }
}

/// Register the connection, hold it open until it goes away, then unregister.
pub async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    fanout: Arc<Fanout>,
) -> Disconnect {
    let (mut reader, writer) = stream.into_split();
    let subscriber = Subscriber::new(peer, writer);
    let id = subscriber.id();

    fanout.register(Arc::clone(&subscriber)).await;
    info!(peer = %peer, subscriber = %id, "Subscriber connected");

    let mut buf = [0u8; READ_BUFFER_SIZE];
    let reason = loop {
        tokio::select! {
            _ = subscriber.evicted() => break Disconnect::Evicted,
            read = reader.read(&mut buf) => match read {
                Ok(0) => break Disconnect::Closed,
                Ok(n) => trace!(peer = %peer, bytes = n, "Discarding inbound bytes"),
                Err(e) => {
                    debug!(peer = %peer, error = %e, "Subscriber read failed");
                    break Disconnect::ReadError;
                }
            },
        }
    };

    fanout.unregister(id).await;
    info!(peer = %peer, subscriber = %id, %reason, "Subscriber disconnected");

    reason
}
