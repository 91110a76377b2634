//! Operator-facing node status snapshot.
//!
//! Assembled from read-only queries against the core managers; carries no
//! wire format of its own — it is an aggregate status struct handed to an
//! operator/UI rather than sent over the network.

use cashew_contribution::KeyReward;
use cashew_types::NodeId;

/// A point-in-time snapshot of this node's health and activity.
#[derive(Debug, Clone)]
pub struct NodeStatus {
    pub node_id: NodeId,
    pub uptime_secs: u64,
    pub connected_peer_count: usize,
    pub discovered_peer_count: usize,
    pub routing_table_size: usize,
    pub pending_request_count: usize,
    pub revocation_count: usize,
    pub current_epoch: Option<u64>,
    pub last_rewards: Vec<KeyReward>,
}

impl NodeStatus {
    pub fn summary(&self) -> String {
        format!(
            "node={} uptime={}s peers={} discovered={} routes={} pending={} revocations={} epoch={:?} rewards={}",
            self.node_id,
            self.uptime_secs,
            self.connected_peer_count,
            self.discovered_peer_count,
            self.routing_table_size,
            self.pending_request_count,
            self.revocation_count,
            self.current_epoch,
            self.last_rewards.len(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_mentions_node_id() {
        let status = NodeStatus {
            node_id: NodeId::from_bytes([7u8; 32]),
            uptime_secs: 10,
            connected_peer_count: 2,
            discovered_peer_count: 5,
            routing_table_size: 3,
            pending_request_count: 1,
            revocation_count: 0,
            current_epoch: Some(4),
            last_rewards: Vec::new(),
        };
        assert!(status.summary().contains(&status.node_id.to_string()));
    }
}
