//! Per-request return table.
//!
//! Every node that touches a `ContentRequest` — the originator and every
//! forwarding relay — records one [`PendingRequest`] keyed by `request_id`.
//! The originator's entry has `reverse_hop = None` (deliver locally when
//! the response arrives); a relay's entry carries the `NodeId` the request
//! came in on, so the matching `ContentResponse` can be sent straight back
//! along the path it was requested over with no source routing or gossip
//! fan-out required.

use std::collections::HashMap;

use cashew_types::NodeId;

use crate::PENDING_REQUEST_TIMEOUT_SECS;

/// One outstanding request this node is waiting to see a response for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingRequest {
    pub request_id: [u8; 32],
    pub content_hash: [u8; 32],
    /// Who to forward the matching response to. `None` means we originated
    /// the request ourselves and should deliver it locally.
    pub reverse_hop: Option<NodeId>,
    pub created_at: u64,
}

impl PendingRequest {
    pub fn is_timed_out(&self, now: u64) -> bool {
        now.saturating_sub(self.created_at) >= PENDING_REQUEST_TIMEOUT_SECS
    }
}

/// Table of outstanding requests, keyed by `request_id`.
#[derive(Default)]
pub struct PendingRequestTable {
    entries: HashMap<[u8; 32], PendingRequest>,
}

impl PendingRequestTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new pending request. Overwrites any stale entry under the
    /// same `request_id` (a re-issue after timeout).
    pub fn insert(&mut self, request_id: [u8; 32], content_hash: [u8; 32], reverse_hop: Option<NodeId>, now: u64) {
        self.entries.insert(
            request_id,
            PendingRequest {
                request_id,
                content_hash,
                reverse_hop,
                created_at: now,
            },
        );
    }

    pub fn get(&self, request_id: &[u8; 32]) -> Option<&PendingRequest> {
        self.entries.get(request_id)
    }

    /// Remove and return the entry for `request_id`, if any. A response is
    /// only ever matched against the table once: whether it is accepted or
    /// rejected for a hash mismatch, the entry is erased either way.
    pub fn remove(&mut self, request_id: &[u8; 32]) -> Option<PendingRequest> {
        self.entries.remove(request_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every outstanding `request_id`, in no particular order. Used for
    /// diagnostics (`NodeStatus`) and re-issue lookups.
    pub fn ids(&self) -> Vec<[u8; 32]> {
        self.entries.keys().copied().collect()
    }

    /// Remove and return every entry older than
    /// [`crate::PENDING_REQUEST_TIMEOUT_SECS`]; the caller invokes the
    /// not-found callback for each.
    pub fn purge_expired(&mut self, now: u64) -> Vec<PendingRequest> {
        let timed_out: Vec<[u8; 32]> = self
            .entries
            .values()
            .filter(|p| p.is_timed_out(now))
            .map(|p| p.request_id)
            .collect();
        timed_out
            .into_iter()
            .filter_map(|id| self.entries.remove(&id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(byte: u8) -> NodeId {
        NodeId::from_bytes([byte; 32])
    }

    #[test]
    fn test_insert_and_get() {
        let mut table = PendingRequestTable::new();
        table.insert([1u8; 32], [2u8; 32], None, 1000);
        let entry = table.get(&[1u8; 32]).expect("entry");
        assert_eq!(entry.content_hash, [2u8; 32]);
        assert!(entry.reverse_hop.is_none());
    }

    #[test]
    fn test_remove_erases_entry() {
        let mut table = PendingRequestTable::new();
        table.insert([1u8; 32], [2u8; 32], Some(node(9)), 1000);
        let removed = table.remove(&[1u8; 32]).expect("removed");
        assert_eq!(removed.reverse_hop, Some(node(9)));
        assert!(table.get(&[1u8; 32]).is_none());
    }

    #[test]
    fn test_remove_unknown_is_none() {
        let mut table = PendingRequestTable::new();
        assert!(table.remove(&[1u8; 32]).is_none());
    }

    #[test]
    fn test_purge_expired_removes_old_entries_only() {
        let mut table = PendingRequestTable::new();
        table.insert([1u8; 32], [2u8; 32], None, 1000);
        table.insert([3u8; 32], [4u8; 32], None, 1000 + PENDING_REQUEST_TIMEOUT_SECS);

        let expired = table.purge_expired(1000 + PENDING_REQUEST_TIMEOUT_SECS);
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].request_id, [1u8; 32]);
        assert_eq!(table.len(), 1);
        assert!(table.get(&[3u8; 32]).is_some());
    }

    #[test]
    fn test_reinsert_overwrites_stale_entry() {
        let mut table = PendingRequestTable::new();
        table.insert([1u8; 32], [2u8; 32], None, 1000);
        table.insert([1u8; 32], [2u8; 32], Some(node(5)), 2000);
        let entry = table.get(&[1u8; 32]).expect("entry");
        assert_eq!(entry.created_at, 2000);
        assert_eq!(entry.reverse_hop, Some(node(5)));
    }
}
