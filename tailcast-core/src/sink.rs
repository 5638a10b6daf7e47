//! The narrow interface between the tailer and whatever consumes its lines

use std::sync::Arc;

use async_trait::async_trait;

use crate::tailer::LineEvent;

/// Receiver of decoded lines.
///
/// Delivery cannot fail from the tailer's point of view: a sink absorbs its
/// own per-consumer failures.
#[async_trait]
pub trait LineSink: Send + Sync {
    /// Hand one line to the sink. Ownership of the line moves to the sink.
    async fn deliver(&self, line: LineEvent);
}

#[async_trait]
impl<S: LineSink + ?Sized> LineSink for Arc<S> {
    async fn deliver(&self, line: LineEvent) {
        (**self).deliver(line).await;
    }
}
