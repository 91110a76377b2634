//! The abstract byte-stream transport and the session-backed adapters
//! that let `cashew-gossip`/`cashew-router` send through it.
//!
//! Raw socket I/O is treated as an external collaborator: the transport
//! is assumed reliable and ordered per session, exposed only as an
//! abstract byte-stream with connect/send/recv/close. This module defines
//! that contract as [`ByteTransport`] and provides [`InProcessTransport`],
//! an in-memory implementation good enough to drive the integration
//! tests and a local demo — a real deployment plugs in TCP/QUIC here
//! without touching the protocol crates above it.

use std::collections::HashMap;
use std::sync::Arc;

use cashew_session::manager::SessionManager;
use cashew_session::BandwidthLimiter;
use cashew_types::NodeId;
use tokio::sync::{mpsc, Mutex};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("no route to peer {0}")]
    Unreachable(NodeId),
    #[error("channel closed for peer {0}")]
    Closed(NodeId),
    #[error("outbound bandwidth budget exhausted for peer {0}")]
    BandwidthExceeded(NodeId),
}

/// Abstract reliable, ordered byte-stream transport. One frame in equals one frame out; framing
/// above this layer (the gossip envelope, the router's onion-wrapped
/// messages) is this crate's concern, not the transport's.
pub trait ByteTransport: Send + Sync {
    fn send(
        &self,
        peer: NodeId,
        bytes: Vec<u8>,
    ) -> impl std::future::Future<Output = Result<(), TransportError>> + Send;
}

/// An in-memory transport backed by one `mpsc` channel per directed edge.
/// Frames sent to a peer not wired up with [`InProcessTransport::link`]
/// are dropped with [`TransportError::Unreachable`], mirroring an
/// unreachable-peer transport failure.
#[derive(Default)]
pub struct InProcessTransport {
    routes: Mutex<HashMap<NodeId, mpsc::UnboundedSender<Vec<u8>>>>,
}

impl InProcessTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register how to deliver frames addressed to `peer`: push them onto
    /// `sender`. The receiving end's event loop reads from the paired
    /// `UnboundedReceiver`.
    pub async fn link(&self, peer: NodeId, sender: mpsc::UnboundedSender<Vec<u8>>) {
        self.routes.lock().await.insert(peer, sender);
    }
}

impl ByteTransport for InProcessTransport {
    async fn send(&self, peer: NodeId, bytes: Vec<u8>) -> Result<(), TransportError> {
        let routes = self.routes.lock().await;
        let sender = routes.get(&peer).ok_or(TransportError::Unreachable(peer))?;
        sender.send(bytes).map_err(|_| TransportError::Closed(peer))
    }
}

/// Adapts a [`ByteTransport`] plus the node's `SessionManager` into the
/// `GossipTransport`/`RouterTransport` traits those crates expect at their
/// send call sites: encrypt under the session to `peer`, then hand the
/// frame to the byte transport.
pub struct SessionTransport<T: ByteTransport> {
    sessions: Arc<Mutex<SessionManager>>,
    bytes: Arc<T>,
    bandwidth: Arc<BandwidthLimiter>,
}

impl<T: ByteTransport> SessionTransport<T> {
    pub fn new(sessions: Arc<Mutex<SessionManager>>, bytes: Arc<T>) -> Self {
        Self::with_bandwidth_limiter(
            sessions,
            bytes,
            Arc::new(BandwidthLimiter::new(
                crate::config::DEFAULT_BANDWIDTH_CAPACITY_BYTES,
                crate::config::DEFAULT_BANDWIDTH_REFILL_BYTES_PER_SEC,
                cashew_types::now_secs().unwrap_or(0),
            )),
        )
    }

    pub fn with_bandwidth_limiter(
        sessions: Arc<Mutex<SessionManager>>,
        bytes: Arc<T>,
        bandwidth: Arc<BandwidthLimiter>,
    ) -> Self {
        Self { sessions, bytes, bandwidth }
    }

    /// Encrypt `plaintext` for `peer` and hand the frame to the byte
    /// transport, after checking the outbound bandwidth budget. The
    /// limiter's own lock is only ever held for the lazy-refill
    /// arithmetic in `try_consume`, never across the `await` that follows
    /// (per spec.md §5: "the limiter lock is short and never held across
    /// I/O").
    async fn encrypt_and_send(&self, peer: NodeId, plaintext: &[u8]) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let frame = {
            let mut sessions = self.sessions.lock().await;
            sessions.encrypt_to(&peer, plaintext)?
        };

        let now = cashew_types::now_secs().unwrap_or(0);
        if !self.bandwidth.try_consume(frame.len() as u64, now) {
            return Err(Box::new(TransportError::BandwidthExceeded(peer)));
        }

        self.bytes.send(peer, frame).await?;
        Ok(())
    }
}

impl<T: ByteTransport> cashew_gossip::GossipTransport for SessionTransport<T> {
    async fn send_to(&self, peer: NodeId, frame: &[u8]) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.encrypt_and_send(peer, frame).await
    }
}

impl<T: ByteTransport> cashew_router::RouterTransport for SessionTransport<T> {
    async fn send_to(&self, peer: NodeId, frame: &[u8]) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.encrypt_and_send(peer, frame).await
    }
}
