//! X25519 Diffie-Hellman key agreement (RFC 7748).
//!
//! Used for session handshakes and onion layer construction.
//! Every agreement in this protocol uses a fresh ephemeral
//! keypair on at least one side; static X25519 secrets are only used for
//! peeling onion layers addressed to this node.

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::{CryptoError, Result};

/// An X25519 secret scalar. Used both as an ephemeral per-handshake/per-layer
/// secret and as a node's static onion-peeling secret.
pub struct StaticSecret {
    inner: x25519_dalek::StaticSecret,
}

impl Clone for StaticSecret {
    fn clone(&self) -> Self {
        Self {
            inner: x25519_dalek::StaticSecret::from(self.inner.to_bytes()),
        }
    }
}

impl Drop for StaticSecret {
    fn drop(&mut self) {
        let mut bytes = self.inner.to_bytes();
        bytes.zeroize();
    }
}

/// An X25519 public key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey {
    inner: x25519_dalek::PublicKey,
}

/// The output of a Diffie-Hellman key agreement. Not a session key itself —
/// callers must run this through a KDF (see [`crate::blake3::hash_concat`])
/// before using it for encryption.
pub struct SharedSecret {
    inner: x25519_dalek::SharedSecret,
}

impl Drop for SharedSecret {
    fn drop(&mut self) {
        let mut bytes = self.inner.to_bytes();
        bytes.zeroize();
    }
}

impl StaticSecret {
    /// Generate a new random secret.
    pub fn generate() -> Self {
        let mut csprng = rand::rngs::OsRng;
        Self {
            inner: x25519_dalek::StaticSecret::random_from_rng(&mut csprng),
        }
    }

    /// Create a secret from raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self {
            inner: x25519_dalek::StaticSecret::from(bytes),
        }
    }

    /// Get the raw bytes of this secret.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.inner.to_bytes()
    }

    /// Get the corresponding public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            inner: x25519_dalek::PublicKey::from(&self.inner),
        }
    }

    /// Perform a Diffie-Hellman key agreement with a peer's public key.
    pub fn diffie_hellman(&self, their_public: &PublicKey) -> SharedSecret {
        SharedSecret {
            inner: self.inner.diffie_hellman(&their_public.inner),
        }
    }
}

impl PublicKey {
    /// Create a public key from raw bytes.
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        Self {
            inner: x25519_dalek::PublicKey::from(*bytes),
        }
    }

    /// Create a public key from a byte slice, validating length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyLength {
                expected: 32,
                actual: bytes.len(),
            })?;
        Ok(Self::from_bytes(&arr))
    }

    /// Get the raw bytes of this public key.
    pub fn to_bytes(&self) -> [u8; 32] {
        *self.inner.as_bytes()
    }

    /// Get the raw bytes as a slice.
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.inner.as_bytes()
    }
}

impl SharedSecret {
    /// Get the raw bytes of this shared secret.
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.inner.as_bytes()
    }
}

/// Generate an ephemeral X25519 keypair for a single handshake or onion
/// layer, returning the secret and its public key.
pub fn ephemeral_keypair() -> (StaticSecret, PublicKey) {
    let secret = StaticSecret::generate();
    let public = secret.public_key();
    (secret, public)
}

/// Derive a node's static onion-peeling X25519 keypair from its Ed25519
/// identity signing key, using a domain-separated hash of the signing key
/// as the X25519 scalar's seed.
///
/// Onion peeling needs a static X25519 secret per node, but identities only
/// carry an Ed25519 keypair; this derives one deterministically so no second
/// key needs to be persisted in the identity blob.
pub fn static_secret_from_signing_key(signing_key: &crate::ed25519::SigningKey) -> StaticSecret {
    let seed = crate::blake3::hash_concat(&[&signing_key.to_bytes(), b"cashew_onion_x25519_v1"]);
    StaticSecret::from_bytes(seed)
}
