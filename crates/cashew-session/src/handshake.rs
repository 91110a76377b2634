//! Wire handshake message: `(version, ephemeral_pk, node_id, timestamp,
//! signature)`, 137 bytes on the wire.

use cashew_crypto::ed25519::{Signature, SigningKey, VerifyingKey};
use cashew_crypto::x25519::PublicKey as X25519PublicKey;
use cashew_types::wire::{Reader, Writer};
use cashew_types::NodeId;

use crate::{Result, SessionError};

/// Current (and only) handshake wire version.
pub const HANDSHAKE_VERSION: u8 = 1;

/// Wire size of an encoded `HandshakeMessage`: `version(1) ∥
/// ephemeral_pk(32) ∥ node_id(32) ∥ timestamp(8) ∥ signature(64)`.
pub const HANDSHAKE_WIRE_LEN: usize = 1 + 32 + 32 + 8 + 64;

/// Clock-skew tolerance for handshake timestamps.
pub const HANDSHAKE_SKEW_SECS: u64 = 60;

/// A signed handshake message exchanged to establish a [`crate::Session`].
#[derive(Clone, Debug)]
pub struct HandshakeMessage {
    pub version: u8,
    pub ephemeral_pk: X25519PublicKey,
    pub node_id: NodeId,
    pub timestamp: u64,
    pub signature: Signature,
}

impl HandshakeMessage {
    /// Build and sign a handshake message for `ephemeral_pk`, using
    /// `identity_signing_key` (the sender's long-term identity key) and
    /// `node_id` (the sender's own `NodeId`).
    pub fn build(
        identity_signing_key: &SigningKey,
        node_id: NodeId,
        ephemeral_pk: X25519PublicKey,
        timestamp: u64,
    ) -> Self {
        let signature = identity_signing_key.sign(&Self::signed_bytes(
            HANDSHAKE_VERSION,
            &ephemeral_pk,
            &node_id,
            timestamp,
        ));

        Self {
            version: HANDSHAKE_VERSION,
            ephemeral_pk,
            node_id,
            timestamp,
            signature,
        }
    }

    /// The bytes the signature covers: `version ∥ ephemeral_pk ∥ node_id ∥
    /// timestamp`.
    fn signed_bytes(version: u8, ephemeral_pk: &X25519PublicKey, node_id: &NodeId, timestamp: u64) -> Vec<u8> {
        let mut w = Writer::with_capacity(1 + 32 + 32 + 8);
        w.u8(version)
            .bytes(ephemeral_pk.as_bytes())
            .bytes(node_id.as_bytes())
            .u64(timestamp);
        w.into_vec()
    }

    pub fn to_bytes(&self) -> [u8; HANDSHAKE_WIRE_LEN] {
        let mut w = Writer::with_capacity(HANDSHAKE_WIRE_LEN);
        w.u8(self.version)
            .bytes(self.ephemeral_pk.as_bytes())
            .bytes(self.node_id.as_bytes())
            .u64(self.timestamp)
            .bytes(&self.signature.to_bytes());
        let v = w.into_vec();
        let mut out = [0u8; HANDSHAKE_WIRE_LEN];
        out.copy_from_slice(&v);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut r = Reader::new(bytes);
        let version = r.u8()?;
        let ephemeral_pk = X25519PublicKey::from_bytes(&r.array::<32>()?);
        let node_id = NodeId::from_bytes(r.array::<32>()?);
        let timestamp = r.u64()?;
        let signature = Signature::from_bytes(&r.array::<64>()?);
        r.finish()?;

        Ok(Self {
            version,
            ephemeral_pk,
            node_id,
            timestamp,
            signature,
        })
    }

    /// Validate this message against the sender's long-term verifying key
    /// and the current time: version must match, the timestamp must be
    /// within [`HANDSHAKE_SKEW_SECS`] of `now`, and the signature must
    /// verify over `version ∥ ephemeral_pk ∥ node_id ∥ timestamp`.
    pub fn validate(&self, sender_verifying_key: &VerifyingKey, now: u64) -> Result<()> {
        if self.version != HANDSHAKE_VERSION {
            return Err(SessionError::UnsupportedVersion(self.version));
        }

        let skew = now.abs_diff(self.timestamp);
        if skew > HANDSHAKE_SKEW_SECS {
            return Err(SessionError::HandshakeTimestampSkew);
        }

        let signed = Self::signed_bytes(self.version, &self.ephemeral_pk, &self.node_id, self.timestamp);
        sender_verifying_key
            .verify(&signed, &self.signature)
            .map_err(|_| SessionError::HandshakeAuthentication)?;

        Ok(())
    }
}
