//! Gossip envelope and the canonical payload encodings for each message
//! type.

use cashew_crypto::ed25519::{Signature, SigningKey, VerifyingKey};
use cashew_types::wire::{Reader, Writer};
use cashew_types::{NodeCapabilities, NodeId};

use crate::{GossipError, Result};

/// Discriminant for a [`GossipMessage`]'s payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageType {
    PeerAnnouncement,
    ContentAnnouncement,
    NetworkStateUpdate,
    KeyRevocation,
    NodeCapability,
}

impl MessageType {
    pub fn to_u8(self) -> u8 {
        match self {
            Self::PeerAnnouncement => 0,
            Self::ContentAnnouncement => 1,
            Self::NetworkStateUpdate => 2,
            Self::KeyRevocation => 3,
            Self::NodeCapability => 4,
        }
    }

    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::PeerAnnouncement),
            1 => Some(Self::ContentAnnouncement),
            2 => Some(Self::NetworkStateUpdate),
            3 => Some(Self::KeyRevocation),
            4 => Some(Self::NodeCapability),
            _ => None,
        }
    }
}

/// The gossip envelope carried over the session transport:
/// `type(1) ∥ message_id(32) ∥ u32 payload_len ∥ payload ∥ timestamp(8) ∥
/// hop_count(1)`.
///
/// `message_id` is `BLAKE3(type ∥ payload)` — deliberately excluding
/// `timestamp` and `hop_count` so that re-forwarded copies of the same
/// announcement (which only differ in hop_count) still dedup to the same
/// id in the seen-cache.
#[derive(Clone, Debug)]
pub struct GossipMessage {
    pub msg_type: MessageType,
    pub message_id: [u8; 32],
    pub payload: Vec<u8>,
    pub timestamp: u64,
    pub hop_count: u8,
}

impl GossipMessage {
    /// Build a fresh envelope (`hop_count = 0`) around `payload`.
    pub fn new(msg_type: MessageType, payload: Vec<u8>, timestamp: u64) -> Self {
        let message_id = Self::compute_message_id(msg_type, &payload);
        Self {
            msg_type,
            message_id,
            payload,
            timestamp,
            hop_count: 0,
        }
    }

    pub fn compute_message_id(msg_type: MessageType, payload: &[u8]) -> [u8; 32] {
        cashew_crypto::blake3::hash_concat(&[&[msg_type.to_u8()], payload])
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = Writer::with_capacity(1 + 32 + 4 + self.payload.len() + 8 + 1);
        w.u8(self.msg_type.to_u8())
            .bytes(&self.message_id)
            .len_prefixed(&self.payload)
            .u64(self.timestamp)
            .u8(self.hop_count);
        w.into_vec()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut r = Reader::new(bytes);
        let type_byte = r.u8()?;
        let msg_type =
            MessageType::from_u8(type_byte).ok_or(GossipError::UnknownMessageType(type_byte))?;
        let message_id = r.array::<32>()?;
        let payload = r.len_prefixed()?.to_vec();
        let timestamp = r.u64()?;
        let hop_count = r.u8()?;
        r.finish()?;

        Ok(Self {
            msg_type,
            message_id,
            payload,
            timestamp,
            hop_count,
        })
    }

    /// A copy of this message forwarded one hop further.
    pub fn forwarded(&self) -> Self {
        Self {
            hop_count: self.hop_count + 1,
            ..self.clone()
        }
    }
}

/// Payload for [`MessageType::PeerAnnouncement`]: `node_id(32) ∥
/// public_key(32) ∥ NodeCapabilities(17) ∥ timestamp(8) ∥ signature(64)`.
///
/// Self-authenticating: the embedded `public_key` is what the signature is
/// checked against, and `node_id` must equal `BLAKE3(public_key)`. No
/// out-of-band key lookup is required to validate a peer announcement.
#[derive(Clone, Debug)]
pub struct PeerAnnouncement {
    pub node_id: NodeId,
    pub public_key: VerifyingKey,
    pub capabilities: NodeCapabilities,
    pub timestamp: u64,
    pub signature: Signature,
}

impl PeerAnnouncement {
    pub fn build(
        signing_key: &SigningKey,
        node_id: NodeId,
        capabilities: NodeCapabilities,
        timestamp: u64,
    ) -> Self {
        let public_key = signing_key.verifying_key();
        let signature = signing_key.sign(&Self::signed_bytes(
            &node_id,
            &public_key,
            &capabilities,
            timestamp,
        ));
        Self {
            node_id,
            public_key,
            capabilities,
            timestamp,
            signature,
        }
    }

    fn signed_bytes(
        node_id: &NodeId,
        public_key: &VerifyingKey,
        capabilities: &NodeCapabilities,
        timestamp: u64,
    ) -> Vec<u8> {
        let mut w = Writer::with_capacity(32 + 32 + 17 + 8);
        w.bytes(node_id.as_bytes()).bytes(public_key.as_bytes());
        capabilities.write_to(&mut w);
        w.u64(timestamp);
        w.into_vec()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = Writer::with_capacity(32 + 32 + 17 + 8 + 64);
        w.bytes(self.node_id.as_bytes())
            .bytes(self.public_key.as_bytes());
        self.capabilities.write_to(&mut w);
        w.u64(self.timestamp).bytes(&self.signature.to_bytes());
        w.into_vec()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut r = Reader::new(bytes);
        let node_id = NodeId::from_bytes(r.array::<32>()?);
        let public_key = VerifyingKey::from_bytes(&r.array::<32>()?)?;
        let capabilities = NodeCapabilities::read_from(&mut r)?;
        let timestamp = r.u64()?;
        let signature = Signature::from_bytes(&r.array::<64>()?);
        r.finish()?;

        Ok(Self {
            node_id,
            public_key,
            capabilities,
            timestamp,
            signature,
        })
    }

    /// Verify `node_id == BLAKE3(public_key)` and the embedded signature.
    pub fn validate(&self) -> Result<()> {
        if self.node_id != NodeId::from_public_key(&self.public_key) {
            return Err(GossipError::Unauthenticated(MessageType::PeerAnnouncement));
        }
        let signed = Self::signed_bytes(
            &self.node_id,
            &self.public_key,
            &self.capabilities,
            self.timestamp,
        );
        self.public_key
            .verify(&signed, &self.signature)
            .map_err(|_| GossipError::Unauthenticated(MessageType::PeerAnnouncement))
    }
}

/// Payload for [`MessageType::ContentAnnouncement`]: `content_hash(32) ∥
/// size(8) ∥ hosting_node(32) ∥ has_network(1) ∥ network_id(32)? ∥
/// timestamp(8) ∥ signature(64)`.
///
/// Signed by the hosting node's identity; the verifying key must be
/// resolved by the caller (typically from a previously-validated
/// [`PeerAnnouncement`]).
#[derive(Clone, Debug)]
pub struct ContentAnnouncement {
    pub content_hash: [u8; 32],
    pub size: u64,
    pub hosting_node: NodeId,
    pub network_id: Option<[u8; 32]>,
    pub timestamp: u64,
    pub signature: Signature,
}

impl ContentAnnouncement {
    pub fn build(
        signing_key: &SigningKey,
        content_hash: [u8; 32],
        size: u64,
        hosting_node: NodeId,
        network_id: Option<[u8; 32]>,
        timestamp: u64,
    ) -> Self {
        let signature = signing_key.sign(&Self::signed_bytes(
            &content_hash,
            size,
            &hosting_node,
            network_id.as_ref(),
            timestamp,
        ));
        Self {
            content_hash,
            size,
            hosting_node,
            network_id,
            timestamp,
            signature,
        }
    }

    fn signed_bytes(
        content_hash: &[u8; 32],
        size: u64,
        hosting_node: &NodeId,
        network_id: Option<&[u8; 32]>,
        timestamp: u64,
    ) -> Vec<u8> {
        let mut w = Writer::with_capacity(32 + 8 + 32 + 1 + 32 + 8);
        w.bytes(content_hash).u64(size).bytes(hosting_node.as_bytes());
        match network_id {
            Some(id) => {
                w.u8(1).bytes(id);
            }
            None => {
                w.u8(0);
            }
        }
        w.u64(timestamp);
        w.into_vec()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = Writer::with_capacity(32 + 8 + 32 + 1 + 32 + 8 + 64);
        w.bytes(&self.content_hash)
            .u64(self.size)
            .bytes(self.hosting_node.as_bytes());
        match &self.network_id {
            Some(id) => {
                w.u8(1).bytes(id);
            }
            None => {
                w.u8(0);
            }
        }
        w.u64(self.timestamp).bytes(&self.signature.to_bytes());
        w.into_vec()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut r = Reader::new(bytes);
        let content_hash = r.array::<32>()?;
        let size = r.u64()?;
        let hosting_node = NodeId::from_bytes(r.array::<32>()?);
        let has_network = r.u8()?;
        let network_id = if has_network != 0 {
            Some(r.array::<32>()?)
        } else {
            None
        };
        let timestamp = r.u64()?;
        let signature = Signature::from_bytes(&r.array::<64>()?);
        r.finish()?;

        Ok(Self {
            content_hash,
            size,
            hosting_node,
            network_id,
            timestamp,
            signature,
        })
    }

    pub fn validate(&self, hosting_verifying_key: &VerifyingKey) -> Result<()> {
        let signed = Self::signed_bytes(
            &self.content_hash,
            self.size,
            &self.hosting_node,
            self.network_id.as_ref(),
            self.timestamp,
        );
        hosting_verifying_key
            .verify(&signed, &self.signature)
            .map_err(|_| GossipError::Unauthenticated(MessageType::ContentAnnouncement))
    }
}

/// Payload for [`MessageType::NodeCapability`]: `node_id(32) ∥
/// NodeCapabilities(17) ∥ timestamp(8) ∥ signature(64)`.
///
/// A lighter-weight capability-only refresh for a peer already known via a
/// prior [`PeerAnnouncement`] — unlike that message, this one does not
/// repeat the public key, so the caller supplies the verifying key it
/// already has on file for `node_id`.
#[derive(Clone, Debug)]
pub struct NodeCapabilityUpdate {
    pub node_id: NodeId,
    pub capabilities: NodeCapabilities,
    pub timestamp: u64,
    pub signature: Signature,
}

impl NodeCapabilityUpdate {
    pub fn build(signing_key: &SigningKey, node_id: NodeId, capabilities: NodeCapabilities, timestamp: u64) -> Self {
        let signature = signing_key.sign(&Self::signed_bytes(&node_id, &capabilities, timestamp));
        Self {
            node_id,
            capabilities,
            timestamp,
            signature,
        }
    }

    fn signed_bytes(node_id: &NodeId, capabilities: &NodeCapabilities, timestamp: u64) -> Vec<u8> {
        let mut w = Writer::with_capacity(32 + 17 + 8);
        w.bytes(node_id.as_bytes());
        capabilities.write_to(&mut w);
        w.u64(timestamp);
        w.into_vec()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = Writer::with_capacity(32 + 17 + 8 + 64);
        w.bytes(self.node_id.as_bytes());
        self.capabilities.write_to(&mut w);
        w.u64(self.timestamp).bytes(&self.signature.to_bytes());
        w.into_vec()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut r = Reader::new(bytes);
        let node_id = NodeId::from_bytes(r.array::<32>()?);
        let capabilities = NodeCapabilities::read_from(&mut r)?;
        let timestamp = r.u64()?;
        let signature = Signature::from_bytes(&r.array::<64>()?);
        r.finish()?;

        Ok(Self {
            node_id,
            capabilities,
            timestamp,
            signature,
        })
    }

    pub fn validate(&self, verifying_key: &VerifyingKey) -> Result<()> {
        let signed = Self::signed_bytes(&self.node_id, &self.capabilities, self.timestamp);
        verifying_key
            .verify(&signed, &self.signature)
            .map_err(|_| GossipError::Unauthenticated(MessageType::NodeCapability))
    }
}

/// Payload for [`MessageType::NetworkStateUpdate`]: `node_id(32) ∥
/// connected_peers(u32) ∥ routing_table_size(u32) ∥ timestamp(8) ∥
/// signature(64)`.
///
/// Carries the periodic self-state summary the scheduler emits every
/// [`crate::STATE_UPDATE_INTERVAL_SECS`].
#[derive(Clone, Debug)]
pub struct NetworkStateUpdate {
    pub node_id: NodeId,
    pub connected_peers: u32,
    pub routing_table_size: u32,
    pub timestamp: u64,
    pub signature: Signature,
}

impl NetworkStateUpdate {
    pub fn build(
        signing_key: &SigningKey,
        node_id: NodeId,
        connected_peers: u32,
        routing_table_size: u32,
        timestamp: u64,
    ) -> Self {
        let signature = signing_key.sign(&Self::signed_bytes(
            &node_id,
            connected_peers,
            routing_table_size,
            timestamp,
        ));
        Self {
            node_id,
            connected_peers,
            routing_table_size,
            timestamp,
            signature,
        }
    }

    fn signed_bytes(node_id: &NodeId, connected_peers: u32, routing_table_size: u32, timestamp: u64) -> Vec<u8> {
        let mut w = Writer::with_capacity(32 + 4 + 4 + 8);
        w.bytes(node_id.as_bytes())
            .u32(connected_peers)
            .u32(routing_table_size)
            .u64(timestamp);
        w.into_vec()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = Writer::with_capacity(32 + 4 + 4 + 8 + 64);
        w.bytes(self.node_id.as_bytes())
            .u32(self.connected_peers)
            .u32(self.routing_table_size)
            .u64(self.timestamp)
            .bytes(&self.signature.to_bytes());
        w.into_vec()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut r = Reader::new(bytes);
        let node_id = NodeId::from_bytes(r.array::<32>()?);
        let connected_peers = r.u32()?;
        let routing_table_size = r.u32()?;
        let timestamp = r.u64()?;
        let signature = Signature::from_bytes(&r.array::<64>()?);
        r.finish()?;

        Ok(Self {
            node_id,
            connected_peers,
            routing_table_size,
            timestamp,
            signature,
        })
    }

    pub fn validate(&self, verifying_key: &VerifyingKey) -> Result<()> {
        let signed = Self::signed_bytes(
            &self.node_id,
            self.connected_peers,
            self.routing_table_size,
            self.timestamp,
        );
        verifying_key
            .verify(&signed, &self.signature)
            .map_err(|_| GossipError::Unauthenticated(MessageType::NetworkStateUpdate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cashew_crypto::ed25519::KeyPair;

    fn caps() -> NodeCapabilities {
        NodeCapabilities {
            can_host: true,
            can_route: true,
            can_store: false,
            storage_capacity: 0,
            bandwidth_mbps: 50,
        }
    }

    #[test]
    fn test_envelope_roundtrip() {
        let msg = GossipMessage::new(MessageType::PeerAnnouncement, vec![1, 2, 3, 4], 1000);
        let bytes = msg.to_bytes();
        let restored = GossipMessage::from_bytes(&bytes).expect("decode");
        assert_eq!(restored.msg_type, MessageType::PeerAnnouncement);
        assert_eq!(restored.payload, vec![1, 2, 3, 4]);
        assert_eq!(restored.message_id, msg.message_id);
        assert_eq!(restored.hop_count, 0);
    }

    #[test]
    fn test_message_id_ignores_hop_count_and_timestamp() {
        let a = GossipMessage::new(MessageType::ContentAnnouncement, vec![9, 9], 1000);
        let mut b = a.clone();
        b.timestamp = 2000;
        b.hop_count = 5;
        assert_eq!(a.message_id, b.message_id);
    }

    #[test]
    fn test_message_id_differs_by_payload() {
        let a = GossipMessage::new(MessageType::ContentAnnouncement, vec![1], 1000);
        let b = GossipMessage::new(MessageType::ContentAnnouncement, vec![2], 1000);
        assert_ne!(a.message_id, b.message_id);
    }

    #[test]
    fn test_peer_announcement_self_authenticating() {
        let identity = KeyPair::generate();
        let node_id = NodeId::from_public_key(&identity.verifying_key);
        let announcement = PeerAnnouncement::build(&identity.signing_key, node_id, caps(), 1000);

        let bytes = announcement.to_bytes();
        let restored = PeerAnnouncement::from_bytes(&bytes).expect("decode");
        assert!(restored.validate().is_ok());
    }

    #[test]
    fn test_peer_announcement_rejects_mismatched_node_id() {
        let identity = KeyPair::generate();
        let wrong_node_id = NodeId::from_bytes([0xAB; 32]);
        let mut announcement = PeerAnnouncement::build(&identity.signing_key, wrong_node_id, caps(), 1000);
        announcement.node_id = wrong_node_id;
        assert!(announcement.validate().is_err());
    }

    #[test]
    fn test_content_announcement_roundtrip_and_validate() {
        let identity = KeyPair::generate();
        let hosting_node = NodeId::from_public_key(&identity.verifying_key);
        let announcement = ContentAnnouncement::build(
            &identity.signing_key,
            [7u8; 32],
            4096,
            hosting_node,
            Some([3u8; 32]),
            1000,
        );
        let bytes = announcement.to_bytes();
        let restored = ContentAnnouncement::from_bytes(&bytes).expect("decode");
        assert!(restored.validate(&identity.verifying_key).is_ok());
        assert_eq!(restored.network_id, Some([3u8; 32]));
    }

    #[test]
    fn test_content_announcement_without_network_id() {
        let identity = KeyPair::generate();
        let hosting_node = NodeId::from_public_key(&identity.verifying_key);
        let announcement =
            ContentAnnouncement::build(&identity.signing_key, [7u8; 32], 4096, hosting_node, None, 1000);
        let bytes = announcement.to_bytes();
        let restored = ContentAnnouncement::from_bytes(&bytes).expect("decode");
        assert_eq!(restored.network_id, None);
    }

    #[test]
    fn test_content_announcement_wrong_key_rejected() {
        let identity = KeyPair::generate();
        let impostor = KeyPair::generate();
        let hosting_node = NodeId::from_public_key(&identity.verifying_key);
        let announcement =
            ContentAnnouncement::build(&identity.signing_key, [7u8; 32], 4096, hosting_node, None, 1000);
        assert!(announcement.validate(&impostor.verifying_key).is_err());
    }

    #[test]
    fn test_node_capability_update_roundtrip() {
        let identity = KeyPair::generate();
        let node_id = NodeId::from_public_key(&identity.verifying_key);
        let update = NodeCapabilityUpdate::build(&identity.signing_key, node_id, caps(), 1000);
        let bytes = update.to_bytes();
        let restored = NodeCapabilityUpdate::from_bytes(&bytes).expect("decode");
        assert!(restored.validate(&identity.verifying_key).is_ok());
    }

    #[test]
    fn test_network_state_update_roundtrip() {
        let identity = KeyPair::generate();
        let node_id = NodeId::from_public_key(&identity.verifying_key);
        let update = NetworkStateUpdate::build(&identity.signing_key, node_id, 12, 340, 1000);
        let bytes = update.to_bytes();
        let restored = NetworkStateUpdate::from_bytes(&bytes).expect("decode");
        assert!(restored.validate(&identity.verifying_key).is_ok());
        assert_eq!(restored.connected_peers, 12);
    }

    #[test]
    fn test_unknown_message_type_rejected() {
        let mut bytes = GossipMessage::new(MessageType::PeerAnnouncement, vec![1], 1000).to_bytes();
        bytes[0] = 99;
        assert!(matches!(
            GossipMessage::from_bytes(&bytes),
            Err(GossipError::UnknownMessageType(99))
        ));
    }
}
