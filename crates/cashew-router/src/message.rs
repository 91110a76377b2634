//! `ContentRequest` / `ContentResponse` wire encoding.

use cashew_crypto::ed25519::{Signature, SigningKey, VerifyingKey};
use cashew_types::wire::{Reader, Writer};
use cashew_types::NodeId;

use crate::{RouterError, Result};

/// `request_id = BLAKE3(content_hash ∥ requester_id ∥ timestamp)`.
pub fn compute_request_id(content_hash: &[u8; 32], requester_id: NodeId, timestamp: u64) -> [u8; 32] {
    cashew_crypto::blake3::hash_concat(&[content_hash, requester_id.as_bytes(), &timestamp.to_le_bytes()])
}

/// `content_hash(32) ∥ requester_id(32) ∥ request_id(32) ∥ hop_limit(u8) ∥
/// timestamp(u64) ∥ onion_layer_count(u16) ∥ (u32 len ∥ bytes) × count`.
/// Unsigned: each onion layer is itself signed/authenticated at the
/// session level, and the innermost unwrapped request is validated by its
/// effect (a correctly content-hashed response), not by a request-level
/// signature.
#[derive(Clone, Debug, PartialEq)]
pub struct ContentRequest {
    pub content_hash: [u8; 32],
    pub requester_id: NodeId,
    pub request_id: [u8; 32],
    pub hop_limit: u8,
    pub timestamp: u64,
    pub onion_layers: Vec<Vec<u8>>,
}

impl ContentRequest {
    pub fn new(content_hash: [u8; 32], requester_id: NodeId, hop_limit: u8, timestamp: u64) -> Self {
        let request_id = compute_request_id(&content_hash, requester_id, timestamp);
        Self {
            content_hash,
            requester_id,
            request_id,
            hop_limit,
            timestamp,
            onion_layers: Vec::new(),
        }
    }

    /// A copy ready to forward one hop further: `hop_limit` decremented by
    /// one, everything else unchanged.
    pub fn forwarded(&self) -> Self {
        Self {
            hop_limit: self.hop_limit.saturating_sub(1),
            ..self.clone()
        }
    }

    /// A copy carrying a replaced onion layer chain (the residual bytes
    /// left after peeling one layer off).
    pub fn with_onion_layers(&self, onion_layers: Vec<Vec<u8>>) -> Self {
        Self {
            onion_layers,
            ..self.clone()
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = Writer::with_capacity(32 + 32 + 32 + 1 + 8 + 2 + self.onion_layers.iter().map(|l| 4 + l.len()).sum::<usize>());
        w.bytes(&self.content_hash)
            .bytes(self.requester_id.as_bytes())
            .bytes(&self.request_id)
            .u8(self.hop_limit)
            .u64(self.timestamp)
            .u16(self.onion_layers.len() as u16);
        for layer in &self.onion_layers {
            w.len_prefixed(layer);
        }
        w.into_vec()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut r = Reader::new(bytes);
        let content_hash = r.array::<32>()?;
        let requester_id = NodeId::from_bytes(r.array::<32>()?);
        let request_id = r.array::<32>()?;
        let hop_limit = r.u8()?;
        let timestamp = r.u64()?;
        let count = r.u16()?;
        let mut onion_layers = Vec::with_capacity(count as usize);
        for _ in 0..count {
            onion_layers.push(r.len_prefixed()?.to_vec());
        }
        r.finish()?;
        Ok(Self {
            content_hash,
            requester_id,
            request_id,
            hop_limit,
            timestamp,
            onion_layers,
        })
    }
}

/// `content_hash(32) ∥ hosting_node(32) ∥ request_id(32) ∥ hop_count(u8) ∥
/// data_len(u32) ∥ data ∥ signature(64)`. Signed by the
/// hosting node's identity over every field up to but not including the
/// signature.
#[derive(Clone, Debug)]
pub struct ContentResponse {
    pub content_hash: [u8; 32],
    pub content_data: Vec<u8>,
    pub hosting_node: NodeId,
    pub request_id: [u8; 32],
    pub hop_count: u8,
    pub signature: Signature,
}

impl ContentResponse {
    /// Build and sign a response, rejecting data that does not hash to
    /// the claimed `content_hash`.
    pub fn build(
        signing_key: &SigningKey,
        content_hash: [u8; 32],
        content_data: Vec<u8>,
        hosting_node: NodeId,
        request_id: [u8; 32],
    ) -> Result<Self> {
        if cashew_crypto::blake3::hash(&content_data) != content_hash {
            return Err(RouterError::ContentHashMismatch);
        }
        let hop_count = 0;
        let signature = signing_key.sign(&Self::signed_bytes(
            &content_hash,
            &content_data,
            hosting_node,
            &request_id,
            hop_count,
        ));
        Ok(Self {
            content_hash,
            content_data,
            hosting_node,
            request_id,
            hop_count,
            signature,
        })
    }

    /// A copy forwarded one hop further (`hop_count + 1`).
    pub fn forwarded(&self) -> Self {
        Self {
            hop_count: self.hop_count + 1,
            ..self.clone()
        }
    }

    fn signed_bytes(
        content_hash: &[u8; 32],
        content_data: &[u8],
        hosting_node: NodeId,
        request_id: &[u8; 32],
        hop_count: u8,
    ) -> Vec<u8> {
        let mut w = Writer::with_capacity(32 + 32 + 32 + 1 + 4 + content_data.len());
        w.bytes(content_hash)
            .bytes(hosting_node.as_bytes())
            .bytes(request_id)
            .u8(hop_count)
            .len_prefixed(content_data);
        w.into_vec()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = Writer::with_capacity(32 + 32 + 32 + 1 + 4 + self.content_data.len() + 64);
        w.bytes(&self.content_hash)
            .bytes(self.hosting_node.as_bytes())
            .bytes(&self.request_id)
            .u8(self.hop_count)
            .len_prefixed(&self.content_data)
            .bytes(&self.signature.to_bytes());
        w.into_vec()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut r = Reader::new(bytes);
        let content_hash = r.array::<32>()?;
        let hosting_node = NodeId::from_bytes(r.array::<32>()?);
        let request_id = r.array::<32>()?;
        let hop_count = r.u8()?;
        let content_data = r.len_prefixed()?.to_vec();
        let signature = Signature::from_bytes(&r.array::<64>()?);
        r.finish()?;
        Ok(Self {
            content_hash,
            content_data,
            hosting_node,
            request_id,
            hop_count,
            signature,
        })
    }

    /// Verify both the embedded signature and `BLAKE3(content_data) ==
    /// content_hash`.
    pub fn validate(&self, hosting_key: &VerifyingKey) -> Result<()> {
        if cashew_crypto::blake3::hash(&self.content_data) != self.content_hash {
            return Err(RouterError::ContentHashMismatch);
        }
        let signed = Self::signed_bytes(
            &self.content_hash,
            &self.content_data,
            self.hosting_node,
            &self.request_id,
            self.hop_count,
        );
        hosting_key.verify(&signed, &self.signature)?;
        Ok(())
    }
}
