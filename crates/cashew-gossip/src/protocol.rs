//! Epidemic propagation logic: acceptance rules, handler dispatch, and
//! fan-out forwarding.

use std::collections::HashMap;

use cashew_types::NodeId;
use rand::seq::SliceRandom;
use tracing::{debug, trace, warn};

use crate::message::{GossipMessage, MessageType};
use crate::seen_cache::SeenCache;
use crate::transport::GossipTransport;
use crate::{DEFAULT_FANOUT, MAX_HOP_COUNT, MESSAGE_MAX_AGE_SECS};

/// A registered callback invoked for every accepted message of its type.
pub type Handler = Box<dyn Fn(&GossipMessage) + Send + Sync>;

/// What happened to a message passed through [`GossipProtocol::receive_message`].
#[derive(Debug, PartialEq, Eq)]
pub enum GossipOutcome {
    /// Accepted: handlers invoked, forwarded to this many peers.
    Accepted { forwarded_to: usize },
    /// Already in the seen-cache.
    Duplicate,
    /// `now - timestamp > MESSAGE_MAX_AGE_SECS`.
    Expired,
    /// `hop_count >= MAX_HOP_COUNT`.
    TooManyHops,
}

/// Per-node gossip engine: seen-cache plus handler registry. Holds no peer
/// list of its own — callers pass the current candidate set at every call
/// (see [`crate::transport::GossipTransport`]).
pub struct GossipProtocol {
    local_node_id: NodeId,
    fanout: usize,
    seen: SeenCache,
    handlers: HashMap<MessageType, Vec<Handler>>,
}

impl GossipProtocol {
    pub fn new(local_node_id: NodeId) -> Self {
        Self::with_fanout(local_node_id, DEFAULT_FANOUT)
    }

    pub fn with_fanout(local_node_id: NodeId, fanout: usize) -> Self {
        Self {
            local_node_id,
            fanout,
            seen: SeenCache::default(),
            handlers: HashMap::new(),
        }
    }

    pub fn local_node_id(&self) -> NodeId {
        self.local_node_id
    }

    pub fn register_handler(&mut self, msg_type: MessageType, handler: Handler) {
        self.handlers.entry(msg_type).or_default().push(handler);
    }

    pub fn unregister_handlers(&mut self, msg_type: MessageType) {
        self.handlers.remove(&msg_type);
    }

    fn invoke_handlers(&self, msg: &GossipMessage) {
        if let Some(handlers) = self.handlers.get(&msg.msg_type) {
            for handler in handlers {
                handler(msg);
            }
        }
    }

    /// Process a message received from `from` (the immediate sender, or
    /// `None` for self-originated broadcasts). A message propagates iff:
    /// its id is unseen, its age is within bound, and its hop count is
    /// within bound. On acceptance it is marked seen, its handlers invoked,
    /// then forwarded with `hop_count + 1` to a uniform random subset of
    /// `peers` (excluding `from` and the local node) of size `fanout`.
    pub async fn receive_message<T: GossipTransport>(
        &mut self,
        msg: GossipMessage,
        from: Option<NodeId>,
        peers: &[NodeId],
        transport: &T,
        now: u64,
    ) -> GossipOutcome {
        if now.saturating_sub(msg.timestamp) > MESSAGE_MAX_AGE_SECS {
            trace!(message_id = hex::encode(msg.message_id), "gossip message expired");
            return GossipOutcome::Expired;
        }
        if msg.hop_count >= MAX_HOP_COUNT {
            trace!(message_id = hex::encode(msg.message_id), "gossip message exceeded hop ceiling");
            return GossipOutcome::TooManyHops;
        }
        if !self.seen.insert(msg.message_id, now) {
            trace!(message_id = hex::encode(msg.message_id), "gossip message already seen");
            return GossipOutcome::Duplicate;
        }

        self.invoke_handlers(&msg);

        let candidates: Vec<NodeId> = peers
            .iter()
            .copied()
            .filter(|p| *p != self.local_node_id && Some(*p) != from)
            .collect();
        let targets = Self::sample_peers(&candidates, self.fanout);
        let forwarded = msg.forwarded();

        let mut forwarded_to = 0usize;
        for peer in &targets {
            let frame = forwarded.to_bytes();
            match transport.send_to(*peer, &frame).await {
                Ok(()) => forwarded_to += 1,
                Err(e) => warn!(peer = %peer, error = %e, "gossip forward failed"),
            }
        }

        debug!(
            message_id = hex::encode(msg.message_id),
            msg_type = ?msg.msg_type,
            forwarded_to,
            "gossip message accepted"
        );
        GossipOutcome::Accepted { forwarded_to }
    }

    /// Originate and propagate a message created locally (e.g. a
    /// self peer-announcement). Equivalent to receiving it from no one.
    pub async fn broadcast_message<T: GossipTransport>(
        &mut self,
        msg: GossipMessage,
        peers: &[NodeId],
        transport: &T,
        now: u64,
    ) -> GossipOutcome {
        self.receive_message(msg, None, peers, transport, now).await
    }

    /// Periodic maintenance: drop seen-cache entries older than the purge
    /// window.
    pub fn cleanup_old_seen_messages(&mut self, now: u64) {
        self.seen.purge_expired(now);
    }

    pub fn has_seen_message(&self, message_id: &[u8; 32]) -> bool {
        self.seen.contains(message_id)
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    /// Uniform random sample of up to `count` peers, without replacement.
    pub fn sample_peers(peers: &[NodeId], count: usize) -> Vec<NodeId> {
        let mut rng = rand::thread_rng();
        let mut pool: Vec<NodeId> = peers.to_vec();
        pool.shuffle(&mut rng);
        pool.truncate(count);
        pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageType;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct RecordingTransport {
        sent: std::sync::Mutex<Vec<NodeId>>,
    }

    impl RecordingTransport {
        fn new() -> Self {
            Self {
                sent: std::sync::Mutex::new(Vec::new()),
            }
        }
    }

    impl GossipTransport for RecordingTransport {
        async fn send_to(&self, peer: NodeId, _frame: &[u8]) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
            self.sent.lock().expect("lock").push(peer);
            Ok(())
        }
    }

    fn node(byte: u8) -> NodeId {
        NodeId::from_bytes([byte; 32])
    }

    #[tokio::test]
    async fn test_dedup_invokes_handlers_once_and_forwards_at_most_once() {
        let local = node(0);
        let mut protocol = GossipProtocol::new(local);
        let call_count = Arc::new(AtomicUsize::new(0));
        let counter = call_count.clone();
        protocol.register_handler(
            MessageType::ContentAnnouncement,
            Box::new(move |_msg| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        let peers = vec![node(1), node(2), node(3), node(4)];
        let transport = RecordingTransport::new();
        let msg = GossipMessage::new(MessageType::ContentAnnouncement, vec![1, 2, 3], 1000);

        let first = protocol.receive_message(msg.clone(), None, &peers, &transport, 1000).await;
        assert!(matches!(first, GossipOutcome::Accepted { .. }));

        let second = protocol.receive_message(msg, None, &peers, &transport, 1001).await;
        assert_eq!(second, GossipOutcome::Duplicate);

        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_message_dropped() {
        let mut protocol = GossipProtocol::new(node(0));
        let transport = RecordingTransport::new();
        let msg = GossipMessage::new(MessageType::PeerAnnouncement, vec![1], 0);

        let outcome = protocol
            .receive_message(msg, None, &[node(1)], &transport, crate::MESSAGE_MAX_AGE_SECS + 1)
            .await;
        assert_eq!(outcome, GossipOutcome::Expired);
    }

    #[tokio::test]
    async fn test_hop_ceiling_enforced() {
        let mut protocol = GossipProtocol::new(node(0));
        let transport = RecordingTransport::new();
        let mut msg = GossipMessage::new(MessageType::PeerAnnouncement, vec![1], 1000);
        msg.hop_count = crate::MAX_HOP_COUNT;

        let outcome = protocol.receive_message(msg, None, &[node(1)], &transport, 1000).await;
        assert_eq!(outcome, GossipOutcome::TooManyHops);
    }

    #[tokio::test]
    async fn test_forward_excludes_sender_and_self() {
        let local = node(0);
        let sender = node(1);
        let mut protocol = GossipProtocol::with_fanout(local, 10);
        let transport = RecordingTransport::new();
        let peers = vec![local, sender, node(2)];
        let msg = GossipMessage::new(MessageType::PeerAnnouncement, vec![1], 1000);

        protocol
            .receive_message(msg, Some(sender), &peers, &transport, 1000)
            .await;

        let sent = transport.sent.lock().expect("lock");
        assert!(!sent.contains(&local));
        assert!(!sent.contains(&sender));
        assert!(sent.contains(&node(2)));
    }

    #[tokio::test]
    async fn test_fanout_caps_forward_count() {
        let local = node(0);
        let mut protocol = GossipProtocol::with_fanout(local, 2);
        let transport = RecordingTransport::new();
        let peers: Vec<NodeId> = (1..=10u8).map(node).collect();
        let msg = GossipMessage::new(MessageType::PeerAnnouncement, vec![1], 1000);

        let outcome = protocol.receive_message(msg, None, &peers, &transport, 1000).await;
        assert_eq!(outcome, GossipOutcome::Accepted { forwarded_to: 2 });
    }

    #[test]
    fn test_cleanup_purges_old_entries() {
        let mut protocol = GossipProtocol::new(node(0));
        protocol.seen.insert([1u8; 32], 1000);
        protocol.cleanup_old_seen_messages(1000 + crate::seen_cache::DEFAULT_PURGE_AGE_SECS + 1);
        assert_eq!(protocol.seen_count(), 0);
    }
}
