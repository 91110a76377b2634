//! Key-type selection and `KeyReward` emission.

use cashew_types::wire::Writer;
use cashew_types::NodeId;

use crate::scoring::ScoreBreakdown;
use crate::tracker::MetricsSnapshot;

/// The class of key a node's dominant contribution dimension earns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum KeyType {
    /// Storage dominates: the node mostly hosts content.
    Service,
    /// Bandwidth dominates: the node mostly routes traffic.
    Routing,
    /// Neither dominates decisively: a general network-participation key.
    Network,
}

/// Per-key-type earning parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyEarningRate {
    pub points_per_key: u64,
    pub max_per_epoch: u64,
    pub min_score_required: u64,
}

impl KeyEarningRate {
    pub const fn for_key_type(key_type: KeyType) -> Self {
        match key_type {
            KeyType::Service => Self {
                points_per_key: 500,
                max_per_epoch: 5,
                min_score_required: 200,
            },
            KeyType::Routing => Self {
                points_per_key: 300,
                max_per_epoch: 10,
                min_score_required: 100,
            },
            KeyType::Network => Self {
                points_per_key: 400,
                max_per_epoch: 3,
                min_score_required: 150,
            },
        }
    }
}

/// A key reward emitted for a node at a given epoch.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct KeyReward {
    pub node_id: NodeId,
    pub epoch: u64,
    pub key_type: KeyType,
    pub key_count: u64,
    pub total_score: u64,
    pub proof_hash: [u8; 32],
}

/// Select the dominant dimension: storage first, then bandwidth, else
/// network (covers bandwidth-vs-routing ties and routing dominance).
fn select_key_type(score: &ScoreBreakdown) -> KeyType {
    if score.storage >= score.bandwidth && score.storage >= score.routing {
        KeyType::Service
    } else if score.bandwidth >= score.routing {
        KeyType::Routing
    } else {
        KeyType::Network
    }
}

/// `BLAKE3` over `(uptime, bytes_routed, storage_bytes, successful_routes,
/// epochs_witnessed)`, each serialized as a fixed-width little-endian
/// integer.
fn proof_hash(snapshot: &MetricsSnapshot) -> [u8; 32] {
    let mut w = Writer::with_capacity(5 * 8);
    w.u64(snapshot.uptime_secs)
        .u64(snapshot.bytes_routed)
        .u64(snapshot.storage_bytes)
        .u64(snapshot.successful_routes)
        .u64(snapshot.epochs_witnessed);
    cashew_crypto::blake3::hash(w.as_slice())
}

/// Determine the `KeyReward` a node earns for an epoch, given its metrics
/// snapshot and score breakdown, or `None` if its score falls below the
/// minimum for its dominant key type.
pub fn determine_reward(node_id: NodeId, epoch: u64, snapshot: &MetricsSnapshot, score: &ScoreBreakdown) -> Option<KeyReward> {
    let key_type = select_key_type(score);
    let rate = KeyEarningRate::for_key_type(key_type);
    let total_score = score.total.round().max(0.0) as u64;

    if total_score < rate.min_score_required {
        return None;
    }

    // A node that clears the minimum always earns at least one key; extra
    // keys accrue per full `points_per_key` beyond that, hence the ceiling.
    let key_count = total_score
        .div_ceil(rate.points_per_key)
        .min(rate.max_per_epoch);

    Some(KeyReward {
        node_id,
        epoch,
        key_type,
        key_count,
        total_score,
        proof_hash: proof_hash(snapshot),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> MetricsSnapshot {
        MetricsSnapshot {
            first_seen: 0,
            last_seen: 1000,
            uptime_secs: 1000,
            bytes_sent: 0,
            bytes_received: 0,
            bytes_routed: 0,
            things_hosted: 0,
            storage_bytes: 0,
            successful_routes: 0,
            failed_routes: 0,
            epochs_witnessed: 0,
            epochs_missed: 0,
        }
    }

    #[test]
    fn test_select_key_type_storage_dominant() {
        let score = ScoreBreakdown {
            uptime: 0.0,
            bandwidth: 10.0,
            storage: 50.0,
            routing: 5.0,
            witness: 0.0,
            total: 65.0,
        };
        assert_eq!(select_key_type(&score), KeyType::Service);
    }

    #[test]
    fn test_select_key_type_bandwidth_dominant() {
        let score = ScoreBreakdown {
            uptime: 0.0,
            bandwidth: 50.0,
            storage: 10.0,
            routing: 5.0,
            witness: 0.0,
            total: 65.0,
        };
        assert_eq!(select_key_type(&score), KeyType::Routing);
    }

    #[test]
    fn test_select_key_type_network_fallback() {
        let score = ScoreBreakdown {
            uptime: 0.0,
            bandwidth: 5.0,
            storage: 1.0,
            routing: 50.0,
            witness: 0.0,
            total: 56.0,
        };
        assert_eq!(select_key_type(&score), KeyType::Network);
    }

    #[test]
    fn test_below_minimum_score_yields_no_reward() {
        let score = ScoreBreakdown {
            uptime: 1.0,
            bandwidth: 1.0,
            storage: 1.0,
            routing: 1.0,
            witness: 1.0,
            total: 5.0,
        };
        assert!(determine_reward(NodeId::from_bytes([1u8; 32]), 1, &snapshot(), &score).is_none());
    }

    #[test]
    fn test_reward_key_count_capped_at_max_per_epoch() {
        let score = ScoreBreakdown {
            uptime: 0.0,
            bandwidth: 0.0,
            storage: 0.0,
            routing: 10_000.0,
            witness: 0.0,
            total: 10_000.0,
        };
        let reward = determine_reward(NodeId::from_bytes([1u8; 32]), 1, &snapshot(), &score).expect("reward");
        assert_eq!(reward.key_type, KeyType::Network);
        assert_eq!(reward.key_count, KeyEarningRate::for_key_type(KeyType::Network).max_per_epoch);
    }

    #[test]
    fn test_proof_hash_deterministic_for_same_metrics() {
        let a = determine_reward(
            NodeId::from_bytes([1u8; 32]),
            1,
            &snapshot(),
            &ScoreBreakdown {
                uptime: 0.0,
                bandwidth: 0.0,
                storage: 0.0,
                routing: 10_000.0,
                witness: 0.0,
                total: 10_000.0,
            },
        )
        .expect("reward");
        let b = determine_reward(
            NodeId::from_bytes([2u8; 32]),
            2,
            &snapshot(),
            &ScoreBreakdown {
                uptime: 0.0,
                bandwidth: 0.0,
                storage: 0.0,
                routing: 10_000.0,
                witness: 0.0,
                total: 10_000.0,
            },
        )
        .expect("reward");
        assert_eq!(a.proof_hash, b.proof_hash);
    }
}
