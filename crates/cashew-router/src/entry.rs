//! `RoutingEntry`, `RoutingTable`, and the coherent `ContentIndex`.

use std::collections::{HashMap, HashSet};

use cashew_types::NodeId;

use crate::{ema_step, ROUTING_ENTRY_STALE_SECS};

/// What a peer is known to advertise, and how reachable it has been.
#[derive(Clone, Debug, PartialEq)]
pub struct RoutingEntry {
    pub node_id: NodeId,
    pub advertised_content: HashSet<[u8; 32]>,
    pub hop_distance: u32,
    pub last_seen: u64,
    pub reliability: f64,
}

impl RoutingEntry {
    fn new(node_id: NodeId, hop_distance: u32, now: u64) -> Self {
        Self {
            node_id,
            advertised_content: HashSet::new(),
            hop_distance,
            last_seen: now,
            reliability: 1.0,
        }
    }

    pub fn is_stale(&self, now: u64) -> bool {
        now.saturating_sub(self.last_seen) > ROUTING_ENTRY_STALE_SECS
    }
}

/// Routing table keyed by peer, plus the inverse `content_hash -> {node_id}`
/// index kept coherent with each entry's `advertised_content`.
#[derive(Default)]
pub struct RoutingTable {
    entries: HashMap<NodeId, RoutingEntry>,
    content_index: HashMap<[u8; 32], HashSet<NodeId>>,
}

impl RoutingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `node_id` (`hop_distance` hops away) advertises
    /// `content_hash`. Idempotent: re-advertising refreshes `last_seen`
    /// without duplicating the entry.
    pub fn advertise_content(&mut self, node_id: NodeId, content_hash: [u8; 32], hop_distance: u32, now: u64) {
        let entry = self
            .entries
            .entry(node_id)
            .or_insert_with(|| RoutingEntry::new(node_id, hop_distance, now));
        entry.last_seen = now;
        entry.hop_distance = hop_distance;
        entry.advertised_content.insert(content_hash);

        self.content_index.entry(content_hash).or_default().insert(node_id);
    }

    /// Symmetric removal: drops `content_hash` from both the entry and the
    /// content index.
    pub fn remove_content(&mut self, node_id: NodeId, content_hash: &[u8; 32]) {
        if let Some(entry) = self.entries.get_mut(&node_id) {
            entry.advertised_content.remove(content_hash);
        }
        if let Some(hosts) = self.content_index.get_mut(content_hash) {
            hosts.remove(&node_id);
            if hosts.is_empty() {
                self.content_index.remove(content_hash);
            }
        }
    }

    /// Drop `node_id` entirely, from both structures.
    pub fn remove_node(&mut self, node_id: NodeId) {
        if let Some(entry) = self.entries.remove(&node_id) {
            for hash in &entry.advertised_content {
                if let Some(hosts) = self.content_index.get_mut(hash) {
                    hosts.remove(&node_id);
                    if hosts.is_empty() {
                        self.content_index.remove(hash);
                    }
                }
            }
        }
    }

    /// Purge stale entries (`now - last_seen > 3600s`) from both
    /// structures.
    pub fn cleanup(&mut self, now: u64) {
        let stale: Vec<NodeId> = self
            .entries
            .values()
            .filter(|e| e.is_stale(now))
            .map(|e| e.node_id)
            .collect();
        for node_id in stale {
            self.remove_node(node_id);
        }
    }

    pub fn entry(&self, node_id: NodeId) -> Option<&RoutingEntry> {
        self.entries.get(&node_id)
    }

    /// Nodes known to advertise `content_hash`, in no particular order.
    pub fn hosts_for(&self, content_hash: &[u8; 32]) -> Vec<NodeId> {
        self.content_index
            .get(content_hash)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Move `node_id`'s reliability toward `1.0` (successful delivery) or
    /// `0.0` (hash mismatch / integrity failure) by
    /// [`crate::RELIABILITY_EMA_FACTOR`].
    pub fn update_reliability(&mut self, node_id: NodeId, success: bool) {
        if let Some(entry) = self.entries.get_mut(&node_id) {
            let target = if success { 1.0 } else { 0.0 };
            entry.reliability = ema_step(entry.reliability, target);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
