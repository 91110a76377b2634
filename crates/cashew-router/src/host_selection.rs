//! Host scoring and selection for a content hash.

use cashew_types::NodeId;

use crate::entry::RoutingTable;
use crate::MIN_HOST_RELIABILITY;

/// `reliability / (1 + hop_distance)`.
fn score(reliability: f64, hop_distance: u32) -> f64 {
    reliability / (1.0 + hop_distance as f64)
}

/// Eligible (node_id, score) pairs for `content_hash`: hosts that are
/// neither stale nor below [`MIN_HOST_RELIABILITY`], sorted by descending
/// score with ties broken by ascending `NodeId`.
fn ranked_hosts(table: &RoutingTable, content_hash: &[u8; 32], now: u64) -> Vec<(NodeId, f64)> {
    let mut candidates: Vec<(NodeId, f64)> = table
        .hosts_for(content_hash)
        .into_iter()
        .filter_map(|node_id| {
            let entry = table.entry(node_id)?;
            if entry.is_stale(now) || entry.reliability < MIN_HOST_RELIABILITY {
                return None;
            }
            Some((node_id, score(entry.reliability, entry.hop_distance)))
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    candidates
}

/// The single highest-scoring eligible host for `content_hash`, or `None`
/// if there is no eligible host.
pub fn select_best_host(table: &RoutingTable, content_hash: &[u8; 32], now: u64) -> Option<NodeId> {
    ranked_hosts(table, content_hash, now).into_iter().next().map(|(id, _)| id)
}

/// The top `k` eligible hosts for `content_hash`, in score-descending
/// order.
pub fn select_multiple(table: &RoutingTable, content_hash: &[u8; 32], k: usize, now: u64) -> Vec<NodeId> {
    ranked_hosts(table, content_hash, now)
        .into_iter()
        .take(k)
        .map(|(id, _)| id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(byte: u8) -> NodeId {
        NodeId::from_bytes([byte; 32])
    }

    #[test]
    fn test_select_best_host_prefers_higher_score() {
        let mut table = RoutingTable::new();
        table.advertise_content(node(1), [7u8; 32], 5, 1000);
        table.advertise_content(node(2), [7u8; 32], 1, 1000);
        // node(2) is closer (lower hop_distance) so scores higher at equal reliability.
        assert_eq!(select_best_host(&table, &[7u8; 32], 1000), Some(node(2)));
    }

    #[test]
    fn test_select_best_host_skips_low_reliability() {
        let mut table = RoutingTable::new();
        table.advertise_content(node(1), [7u8; 32], 0, 1000);
        table.update_reliability(node(1), false);
        table.update_reliability(node(1), false);
        table.update_reliability(node(1), false);
        table.update_reliability(node(1), false);
        table.update_reliability(node(1), false);
        assert!(select_best_host(&table, &[7u8; 32], 1000).is_none());
    }

    #[test]
    fn test_select_best_host_skips_stale() {
        let mut table = RoutingTable::new();
        table.advertise_content(node(1), [7u8; 32], 0, 1000);
        let later = 1000 + crate::ROUTING_ENTRY_STALE_SECS + 1;
        assert!(select_best_host(&table, &[7u8; 32], later).is_none());
    }

    #[test]
    fn test_ties_broken_by_node_id_lexicographic() {
        let mut table = RoutingTable::new();
        table.advertise_content(node(2), [7u8; 32], 0, 1000);
        table.advertise_content(node(1), [7u8; 32], 0, 1000);
        assert_eq!(select_best_host(&table, &[7u8; 32], 1000), Some(node(1)));
    }

    #[test]
    fn test_select_multiple_ordered_descending() {
        let mut table = RoutingTable::new();
        table.advertise_content(node(1), [7u8; 32], 10, 1000);
        table.advertise_content(node(2), [7u8; 32], 0, 1000);
        table.advertise_content(node(3), [7u8; 32], 5, 1000);
        let top = select_multiple(&table, &[7u8; 32], 2, 1000);
        assert_eq!(top, vec![node(2), node(3)]);
    }

    #[test]
    fn test_no_hosts_returns_empty() {
        let table = RoutingTable::new();
        assert!(select_best_host(&table, &[7u8; 32], 1000).is_none());
        assert!(select_multiple(&table, &[7u8; 32], 5, 1000).is_empty());
    }
}
