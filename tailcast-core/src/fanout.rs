//! Broadcast of tailed lines to connected subscribers
//!
//! The subscriber set is guarded by a single membership lock that is never
//! held across I/O. A broadcast snapshots the set, releases the lock, writes
//! the line into every subscriber's buffer, then flushes the survivors. Both
//! steps run concurrently across subscribers. Subscribers whose write or flush fails or exceeds the write
//! timeout are removed afterwards and their eviction token is cancelled so the
//! owning connection task can close the socket.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::sink::LineSink;
use crate::tailer::LineEvent;

/// Default bound on a single subscriber write or flush.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);

static NEXT_SUBSCRIBER_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque, process-unique subscriber identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    fn next() -> Self {
        Self(NEXT_SUBSCRIBER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// A connected consumer of lines.
pub struct Subscriber {
    id: SubscriberId,
    peer: SocketAddr,
    writer: Mutex<BufWriter<BoxedWriter>>,
    evicted: CancellationToken,
}

impl Subscriber {
    /// Wrap a writable sink. The returned handle is what gets registered.
    pub fn new<W>(peer: SocketAddr, writer: W) -> Arc<Self>
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let writer: BoxedWriter = Box::new(writer);
        Arc::new(Self {
            id: SubscriberId::next(),
            peer,
            writer: Mutex::new(BufWriter::new(writer)),
            evicted: CancellationToken::new(),
        })
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Whether a failed delivery has removed this subscriber
    pub fn is_evicted(&self) -> bool {
        self.evicted.is_cancelled()
    }

    /// Resolves once a failed delivery removes this subscriber.
    pub async fn evicted(&self) {
        self.evicted.cancelled().await;
    }

    async fn write(&self, bytes: &[u8]) -> std::io::Result<()> {
        self.writer.lock().await.write_all(bytes).await
    }

    async fn flush(&self) -> std::io::Result<()> {
        self.writer.lock().await.flush().await
    }
}

impl std::fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscriber")
            .field("id", &self.id)
            .field("peer", &self.peer)
            .field("evicted", &self.is_evicted())
            .finish_non_exhaustive()
    }
}

/// Outcome of broadcasting one line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Subscribers whose write and flush both succeeded
    pub delivered: usize,
    /// Subscribers removed because of this broadcast
    pub failed: usize,
}

/// Dynamic set of subscribers receiving every delivered line.
pub struct Fanout {
    subscribers: Mutex<BTreeMap<SubscriberId, Arc<Subscriber>>>,
    write_timeout: Duration,
}

impl Default for Fanout {
    fn default() -> Self {
        Self::new(DEFAULT_WRITE_TIMEOUT)
    }
}

impl Fanout {
    /// Create an empty fanout with the given per-subscriber write timeout
    pub fn new(write_timeout: Duration) -> Self {
        Self {
            subscribers: Mutex::new(BTreeMap::new()),
            write_timeout,
        }
    }

    /// Add a subscriber. It only sees lines broadcast after this returns.
    pub async fn register(&self, subscriber: Arc<Subscriber>) {
        let mut subscribers = self.subscribers.lock().await;
        subscribers.insert(subscriber.id(), subscriber);
        debug!(count = subscribers.len(), "Subscriber registered");
    }

    /// Remove a subscriber. Returns whether it was still registered.
    pub async fn unregister(&self, id: SubscriberId) -> bool {
        let mut subscribers = self.subscribers.lock().await;
        let removed = subscribers.remove(&id).is_some();
        if removed {
            debug!(subscriber = %id, count = subscribers.len(), "Subscriber unregistered");
        }
        removed
    }

    pub async fn contains(&self, id: SubscriberId) -> bool {
        self.subscribers.lock().await.contains_key(&id)
    }

    pub async fn len(&self) -> usize {
        self.subscribers.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.subscribers.lock().await.is_empty()
    }

    /// Point-in-time copy of the registered subscribers
    pub async fn subscribers(&self) -> Vec<Arc<Subscriber>> {
        self.subscribers.lock().await.values().cloned().collect()
    }

    /// Write `line` to every registered subscriber, evicting the ones that fail.
    pub async fn broadcast(&self, line: &LineEvent) -> DeliveryReport {
        let snapshot = self.subscribers().await;
        if snapshot.is_empty() {
            return DeliveryReport::default();
        }

        let bytes = line.as_bytes();
        let mut failed = Vec::new();
        let mut written = Vec::with_capacity(snapshot.len());

        // Lines longer than the write buffer reach the socket here and can block.
        let writes = snapshot.into_iter().map(|subscriber| async move {
            let result = timeout(self.write_timeout, subscriber.write(bytes)).await;
            (subscriber, result)
        });

        for (subscriber, result) in join_all(writes).await {
            match result {
                Ok(Ok(())) => written.push(subscriber),
                Ok(Err(e)) => {
                    warn!(peer = %subscriber.peer(), error = %e, "Subscriber write failed");
                    failed.push(subscriber);
                }
                Err(_) => {
                    warn!(peer = %subscriber.peer(), "Subscriber write timed out");
                    failed.push(subscriber);
                }
            }
        }

        let flushes = written.into_iter().map(|subscriber| async move {
            let result = timeout(self.write_timeout, subscriber.flush()).await;
            (subscriber, result)
        });

        let mut delivered = 0;
        for (subscriber, result) in join_all(flushes).await {
            match result {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => {
                    warn!(peer = %subscriber.peer(), error = %e, "Subscriber flush failed");
                    failed.push(subscriber);
                }
                Err(_) => {
                    warn!(peer = %subscriber.peer(), "Subscriber flush timed out");
                    failed.push(subscriber);
                }
            }
        }

        if !failed.is_empty() {
            let mut subscribers = self.subscribers.lock().await;
            for subscriber in &failed {
                subscribers.remove(&subscriber.id());
                subscriber.evicted.cancel();
            }
            debug!(
                evicted = failed.len(),
                remaining = subscribers.len(),
                "Removed failed subscribers"
            );
        }

        DeliveryReport {
            delivered,
            failed: failed.len(),
        }
    }
}

#[async_trait]
impl LineSink for Fanout {
    async fn deliver(&self, line: LineEvent) {
        let report = self.broadcast(&line).await;
        trace!(
            offset = line.offset(),
            bytes = line.len(),
            delivered = report.delivered,
            failed = report.failed,
            "Broadcast line"
        );
    }
}
