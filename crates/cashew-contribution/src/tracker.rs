//! Per-node metric accounting.

use std::collections::HashMap;

use cashew_types::NodeId;

use crate::{ACTIVE_WINDOW_SECS, DEFAULT_INACTIVE_THRESHOLD_SECS};

/// Raw counters accumulated for one node. Not returned directly to
/// callers — see [`MetricsSnapshot`], which folds in live partial uptime.
#[derive(Clone, Debug, Default)]
struct NodeMetrics {
    first_seen: u64,
    last_seen: u64,
    online_since: Option<u64>,
    total_uptime_secs: u64,
    bytes_sent: u64,
    bytes_received: u64,
    bytes_routed: u64,
    things_hosted: u64,
    storage_bytes: u64,
    successful_routes: u64,
    failed_routes: u64,
    epochs_witnessed: u64,
    epochs_missed: u64,
}

/// A point-in-time view of a node's accumulated contribution metrics.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MetricsSnapshot {
    pub first_seen: u64,
    pub last_seen: u64,
    pub uptime_secs: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub bytes_routed: u64,
    pub things_hosted: u64,
    pub storage_bytes: u64,
    pub successful_routes: u64,
    pub failed_routes: u64,
    pub epochs_witnessed: u64,
    pub epochs_missed: u64,
}

impl MetricsSnapshot {
    /// `successful / (successful + failed)`, defaulting to `1.0` when no
    /// routes have been observed yet.
    pub fn routing_reliability(&self) -> f64 {
        let total = self.successful_routes + self.failed_routes;
        if total == 0 {
            1.0
        } else {
            self.successful_routes as f64 / total as f64
        }
    }
}

/// Tracks per-node contribution metrics: online/offline intervals,
/// bandwidth, storage, routing outcomes, and epoch witness participation.
#[derive(Default)]
pub struct ContributionTracker {
    nodes: HashMap<NodeId, NodeMetrics>,
}

impl ContributionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&mut self, node_id: NodeId, now: u64) -> &mut NodeMetrics {
        self.nodes.entry(node_id).or_insert_with(|| NodeMetrics {
            first_seen: now,
            last_seen: now,
            ..Default::default()
        })
    }

    pub fn record_online(&mut self, node_id: NodeId, now: u64) {
        let metrics = self.entry(node_id, now);
        metrics.last_seen = now;
        if metrics.online_since.is_none() {
            metrics.online_since = Some(now);
        }
    }

    pub fn record_offline(&mut self, node_id: NodeId, now: u64) {
        let metrics = self.entry(node_id, now);
        metrics.last_seen = now;
        if let Some(since) = metrics.online_since.take() {
            metrics.total_uptime_secs += now.saturating_sub(since);
        }
    }

    pub fn record_bytes_sent(&mut self, node_id: NodeId, bytes: u64, now: u64) {
        let metrics = self.entry(node_id, now);
        metrics.last_seen = now;
        metrics.bytes_sent += bytes;
    }

    pub fn record_bytes_received(&mut self, node_id: NodeId, bytes: u64, now: u64) {
        let metrics = self.entry(node_id, now);
        metrics.last_seen = now;
        metrics.bytes_received += bytes;
    }

    pub fn record_bytes_routed(&mut self, node_id: NodeId, bytes: u64, now: u64) {
        let metrics = self.entry(node_id, now);
        metrics.last_seen = now;
        metrics.bytes_routed += bytes;
    }

    pub fn record_hosted(&mut self, node_id: NodeId, size_bytes: u64, now: u64) {
        let metrics = self.entry(node_id, now);
        metrics.last_seen = now;
        metrics.things_hosted += 1;
        metrics.storage_bytes += size_bytes;
    }

    pub fn record_removed(&mut self, node_id: NodeId, size_bytes: u64, now: u64) {
        let metrics = self.entry(node_id, now);
        metrics.last_seen = now;
        metrics.things_hosted = metrics.things_hosted.saturating_sub(1);
        metrics.storage_bytes = metrics.storage_bytes.saturating_sub(size_bytes);
    }

    pub fn record_route_success(&mut self, node_id: NodeId, now: u64) {
        let metrics = self.entry(node_id, now);
        metrics.last_seen = now;
        metrics.successful_routes += 1;
    }

    pub fn record_route_failure(&mut self, node_id: NodeId, now: u64) {
        let metrics = self.entry(node_id, now);
        metrics.last_seen = now;
        metrics.failed_routes += 1;
    }

    pub fn record_epoch_witnessed(&mut self, node_id: NodeId, now: u64) {
        let metrics = self.entry(node_id, now);
        metrics.last_seen = now;
        metrics.epochs_witnessed += 1;
    }

    pub fn record_epoch_missed(&mut self, node_id: NodeId, now: u64) {
        let metrics = self.entry(node_id, now);
        metrics.last_seen = now;
        metrics.epochs_missed += 1;
    }

    /// A snapshot of `node_id`'s metrics as of `now`. If the node is
    /// currently online, the partial uptime of its live session is added
    /// to the stored total without mutating the tracker.
    pub fn get_metrics(&self, node_id: NodeId, now: u64) -> Option<MetricsSnapshot> {
        let metrics = self.nodes.get(&node_id)?;
        let live_uptime = match metrics.online_since {
            Some(since) => now.saturating_sub(since),
            None => 0,
        };
        Some(MetricsSnapshot {
            first_seen: metrics.first_seen,
            last_seen: metrics.last_seen,
            uptime_secs: metrics.total_uptime_secs + live_uptime,
            bytes_sent: metrics.bytes_sent,
            bytes_received: metrics.bytes_received,
            bytes_routed: metrics.bytes_routed,
            things_hosted: metrics.things_hosted,
            storage_bytes: metrics.storage_bytes,
            successful_routes: metrics.successful_routes,
            failed_routes: metrics.failed_routes,
            epochs_witnessed: metrics.epochs_witnessed,
            epochs_missed: metrics.epochs_missed,
        })
    }

    /// Node ids currently tracked whose `last_seen` is within
    /// [`crate::ACTIVE_WINDOW_SECS`] of `now`.
    pub fn active_contributors(&self, now: u64) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|(_, m)| now.saturating_sub(m.last_seen) <= ACTIVE_WINDOW_SECS)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Purge metrics for nodes not seen in more than `threshold` seconds.
    pub fn cleanup_inactive_nodes(&mut self, now: u64, threshold: u64) {
        self.nodes
            .retain(|_, m| now.saturating_sub(m.last_seen) <= threshold);
    }

    /// [`Self::cleanup_inactive_nodes`] with the default threshold (86400 s).
    pub fn cleanup_inactive_nodes_default(&mut self, now: u64) {
        self.cleanup_inactive_nodes(now, DEFAULT_INACTIVE_THRESHOLD_SECS);
    }

    pub fn tracked_count(&self) -> usize {
        self.nodes.len()
    }
}
