//! The Peer Manager: discovery bookkeeping, candidate scoring, and the
//! periodic maintenance cycle.
//!
//! `PeerManager` never owns a `Session` — it asks a `&mut SessionManager`
//! passed in at call time to do the actual connecting/disconnecting, and
//! only ever remembers peers by `NodeId`. This mirrors how
//! `cashew-gossip`/`cashew-router` take a transport at the call site
//! instead of owning one.

use std::collections::HashMap;

use cashew_session::manager::SessionManager;
use cashew_session::HandshakeMessage;
use cashew_types::NodeId;
use tracing::{debug, info};

use crate::discovery::{BootstrapNode, DiscoveredPeer};
use crate::policy::{ConnectionPolicy, DISCOVERED_PEER_STALE_SECS};
use crate::PeerError;

/// A fresh outbound handshake the caller must now serialize and send to
/// `peer` over the transport (the actual byte send is the node wiring's
/// job, not this crate's).
pub struct OutboundAttempt {
    pub peer: NodeId,
    pub handshake: HandshakeMessage,
}

/// What the maintenance cycle did, for logging/diagnostics.
#[derive(Debug, Default)]
pub struct MaintenanceReport {
    pub purged_stale_discovered: usize,
    pub disconnected_idle: usize,
    pub initiated: usize,
}

/// Tracks bootstrap nodes, gossip-discovered peers, and drives the
/// maintenance loop that keeps the active connection count near
/// `target_peers`.
pub struct PeerManager {
    local_node_id: NodeId,
    policy: ConnectionPolicy,
    bootstrap: HashMap<NodeId, BootstrapNode>,
    discovered: HashMap<NodeId, DiscoveredPeer>,
}

impl PeerManager {
    pub fn new(local_node_id: NodeId, policy: ConnectionPolicy) -> Self {
        Self {
            local_node_id,
            policy,
            bootstrap: HashMap::new(),
            discovered: HashMap::new(),
        }
    }

    pub fn policy(&self) -> &ConnectionPolicy {
        &self.policy
    }

    /// Register a configured bootstrap node, also seeding it into the
    /// discovered set so it participates in candidate scoring. Refuses
    /// once `max_bootstrap` is reached.
    pub fn add_bootstrap(&mut self, node: BootstrapNode, now: u64) -> Result<(), PeerError> {
        if self.bootstrap.len() >= self.policy.max_bootstrap && !self.bootstrap.contains_key(&node.node_id) {
            return Err(PeerError::BootstrapLimitReached);
        }
        self.discovered
            .entry(node.node_id)
            .or_insert_with(|| DiscoveredPeer::new(node.node_id, now, true));
        self.bootstrap.insert(node.node_id, node);
        Ok(())
    }

    /// Learn about (or refresh) a peer seen via gossip. A no-op for the
    /// local node itself.
    pub fn observe_peer(&mut self, node_id: NodeId, now: u64) {
        if node_id == self.local_node_id {
            return;
        }
        self.discovered
            .entry(node_id)
            .and_modify(|p| p.last_seen = now)
            .or_insert_with(|| DiscoveredPeer::new(node_id, now, false));
    }

    pub fn record_connection_attempt(&mut self, node_id: NodeId, now: u64) {
        if let Some(peer) = self.discovered.get_mut(&node_id) {
            peer.record_attempt(now);
        }
    }

    pub fn record_connection_success(&mut self, node_id: NodeId, now: u64) {
        if let Some(peer) = self.discovered.get_mut(&node_id) {
            peer.record_success(now);
        }
    }

    pub fn discovered_count(&self) -> usize {
        self.discovered.len()
    }

    pub fn is_bootstrap(&self, node_id: &NodeId) -> bool {
        self.bootstrap.contains_key(node_id)
    }

    /// Candidates for a new outbound connection: known peers (excluding
    /// `self.local_node_id` and anything in `exclude`) ranked by
    /// [`DiscoveredPeer::candidate_score`] descending, filtered to at or
    /// above `min_reliability`, capped at `count`.
    pub fn select_candidates(&self, exclude: &[NodeId], count: usize) -> Vec<NodeId> {
        let mut candidates: Vec<&DiscoveredPeer> = self
            .discovered
            .values()
            .filter(|p| p.node_id != self.local_node_id)
            .filter(|p| !exclude.contains(&p.node_id))
            .filter(|p| p.raw_reliability() >= self.policy.min_reliability)
            .collect();

        candidates.sort_by(|a, b| {
            b.candidate_score()
                .partial_cmp(&a.candidate_score())
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.node_id.cmp(&b.node_id))
        });

        candidates.into_iter().take(count).map(|p| p.node_id).collect()
    }

    /// Remove discovered peers not seen within
    /// [`crate::policy::DISCOVERED_PEER_STALE_SECS`]. Bootstrap nodes are
    /// never purged — they are reconsidered every cycle regardless of
    /// gossip freshness.
    pub fn purge_stale_discovered(&mut self, now: u64) -> usize {
        let stale: Vec<NodeId> = self
            .discovered
            .values()
            .filter(|p| !p.is_bootstrap && p.is_stale(now, DISCOVERED_PEER_STALE_SECS))
            .map(|p| p.node_id)
            .collect();
        for id in &stale {
            self.discovered.remove(id);
        }
        stale.len()
    }

    /// Run one maintenance pass: purge stale discovered
    /// peers, disconnect idle sessions, then initiate outbound handshakes
    /// toward top-scoring candidates until `target_peers` is reached or
    /// candidates are exhausted. Returns the handshakes the caller must
    /// now send, plus a report for diagnostics.
    pub fn run_maintenance_cycle(
        &mut self,
        sessions: &mut SessionManager,
        now: u64,
    ) -> (MaintenanceReport, Vec<OutboundAttempt>) {
        let mut report = MaintenanceReport::default();

        report.purged_stale_discovered = self.purge_stale_discovered(now);

        let idle = sessions.cleanup_timed_out(now);
        report.disconnected_idle = idle.len();
        for peer in &idle {
            debug!(peer = %peer, "disconnected idle session");
        }

        let mut connected = sessions.connected_peers();
        let mut attempts = Vec::new();

        while connected.len() < self.policy.target_peers {
            let needed = self.policy.target_peers - connected.len();
            let candidates = self.select_candidates(&connected, needed);
            if candidates.is_empty() {
                break;
            }

            for peer in candidates {
                if connected.len() >= self.policy.max_peers {
                    break;
                }
                self.record_connection_attempt(peer, now);
                match sessions.create_outbound(peer, now) {
                    Ok(handshake) => {
                        info!(peer = %peer, "initiating outbound connection");
                        attempts.push(OutboundAttempt { peer, handshake });
                        connected.push(peer);
                    }
                    Err(e) => {
                        debug!(peer = %peer, error = %e, "could not initiate outbound session");
                    }
                }
            }
            // `select_candidates` is deterministic given the same
            // exclusion set; if nothing new got connected this round,
            // further iterations would loop forever.
            break;
        }

        report.initiated = attempts.len();
        (report, attempts)
    }
}
