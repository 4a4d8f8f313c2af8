//! Connection handles and delivery sinks

use crate::message::ServerMessage;
use async_trait::async_trait;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

/// Opaque handle to a live connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Allocate the next connection id
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// The connection on the other end is gone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkClosed;

impl fmt::Display for SinkClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "connection closed")
    }
}

impl std::error::Error for SinkClosed {}

/// Delivery seam for one connection
///
/// The transport behind a sink is out of scope here; the hub only needs to
/// know whether a delivery landed or the connection is gone.
#[async_trait]
pub trait ClientSink: Send + Sync {
    async fn deliver(&self, message: ServerMessage) -> std::result::Result<(), SinkClosed>;
}

/// Sink backed by an in-process channel
///
/// Dropping the receiving half models a client disconnect.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ServerMessage>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<ServerMessage>) -> Self {
        Self { tx }
    }

    /// Create a sink together with its receiving half
    pub fn pair() -> (Self, mpsc::UnboundedReceiver<ServerMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl ClientSink for ChannelSink {
    async fn deliver(&self, message: ServerMessage) -> std::result::Result<(), SinkClosed> {
        self.tx.send(message).map_err(|_| SinkClosed)
    }
}
