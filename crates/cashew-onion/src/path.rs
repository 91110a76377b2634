//! Path selection for onion circuits.

use cashew_crypto::x25519::PublicKey;
use cashew_types::NodeId;
use rand::seq::SliceRandom;

use crate::{OnionError, Result};

/// A candidate relay or destination: its identity and onion-peeling public
/// key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PathHop {
    pub node_id: NodeId,
    pub x25519_pk: PublicKey,
}

/// Choose `path_length` distinct relays from `candidates` (excluding the
/// local node and the destination) and append `destination` as the final
/// hop, so the returned path is ready to hand to [`crate::build_layers`]
/// directly.
pub fn select_path(
    candidates: &[PathHop],
    destination: PathHop,
    local_node_id: NodeId,
    path_length: usize,
) -> Result<Vec<PathHop>> {
    if path_length == 0 {
        return Err(OnionError::EmptyPath);
    }

    let relay_count = path_length - 1;
    let pool: Vec<PathHop> = candidates
        .iter()
        .copied()
        .filter(|hop| hop.node_id != local_node_id && hop.node_id != destination.node_id)
        .collect();

    if pool.len() < relay_count {
        return Err(OnionError::InsufficientPath {
            requested: relay_count,
            available: pool.len(),
        });
    }

    let mut rng = rand::thread_rng();
    let mut shuffled = pool;
    shuffled.shuffle(&mut rng);
    shuffled.truncate(relay_count);
    shuffled.push(destination);
    Ok(shuffled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cashew_crypto::x25519::StaticSecret;

    fn hop(byte: u8) -> PathHop {
        PathHop {
            node_id: NodeId::from_bytes([byte; 32]),
            x25519_pk: StaticSecret::generate().public_key(),
        }
    }

    #[test]
    fn test_select_path_excludes_local_and_destination() {
        let local = hop(0).node_id;
        let destination = hop(99);
        let candidates: Vec<PathHop> = (1..=10u8).map(hop).collect();

        let path = select_path(&candidates, destination, local, 3).expect("select");
        assert_eq!(path.len(), 3);
        assert_eq!(path.last().expect("last"), &destination);
        assert!(path.iter().all(|h| h.node_id != local));
    }

    #[test]
    fn test_select_path_never_repeats_a_hop() {
        let local = hop(0).node_id;
        let destination = hop(99);
        let candidates: Vec<PathHop> = (1..=5u8).map(hop).collect();

        let path = select_path(&candidates, destination, local, 4).expect("select");
        let mut ids: Vec<NodeId> = path.iter().map(|h| h.node_id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), path.len());
    }

    #[test]
    fn test_select_path_insufficient_candidates_errors() {
        let local = hop(0).node_id;
        let destination = hop(99);
        let candidates: Vec<PathHop> = (1..=2u8).map(hop).collect();

        let err = select_path(&candidates, destination, local, 5).unwrap_err();
        assert!(matches!(err, OnionError::InsufficientPath { .. }));
    }

    #[test]
    fn test_select_path_excludes_destination_even_if_in_candidates() {
        let local = hop(0).node_id;
        let destination = hop(7);
        let mut candidates: Vec<PathHop> = (1..=10u8).map(hop).collect();
        candidates.push(destination);

        let path = select_path(&candidates, destination, local, 3).expect("select");
        let relay_only = &path[..path.len() - 1];
        assert!(relay_only.iter().all(|h| h.node_id != destination.node_id));
    }
}
