//! `NodeId` — the 32-byte opaque identifier every peer is addressed by.

use serde::{Deserialize, Serialize};
use std::fmt;

use cashew_crypto::ed25519::VerifyingKey;

/// Opaque 32-byte node identifier, derived deterministically from a node's
/// long-term Ed25519 public key (`BLAKE3(public_key)`). Ordered
/// byte-lexicographically so routing tie-breaks are deterministic across
/// implementations.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub [u8; 32]);

impl NodeId {
    /// Derive a `NodeId` from a node's long-term verifying key.
    pub fn from_public_key(public_key: &VerifyingKey) -> Self {
        Self(cashew_crypto::ed25519::derive_node_id(public_key))
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", hex::encode(&self.0[..8]))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}
