//! Long-lived node identity, key rotation history, and at-rest persistence.

use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use cashew_crypto::ed25519::{KeyPair, Signature, SigningKey, VerifyingKey};
use cashew_crypto::{argon2id, chacha20};

use crate::node_id::NodeId;
use crate::wire::{Reader, Writer};
use crate::{now_secs, Result, TypesError};

/// Why a key was rotated or revoked. Mirrors `KeyRevocation.reason` in the
/// gossip layer; kept here so a `RotationCertificate` can name its own
/// cause without depending on `cashew-revocation`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum RotationReason {
    Scheduled = 0,
    SuspectedCompromise = 1,
    DeviceLoss = 2,
    Other = 255,
}

impl RotationReason {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Scheduled),
            1 => Some(Self::SuspectedCompromise),
            2 => Some(Self::DeviceLoss),
            255 => Some(Self::Other),
            _ => None,
        }
    }
}

/// A signed statement that `old_pk` has been superseded by `new_pk`.
/// Immutable once signed; a chain of certificates links the current key
/// back to a genesis public key and is verifiable by anyone holding the
/// chain.
#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RotationCertificate {
    pub old_pk: [u8; 32],
    pub new_pk: [u8; 32],
    pub timestamp: u64,
    #[serde_as(as = "[_; 64]")]
    pub signature: [u8; 64],
    pub reason: RotationReason,
}

/// Fixed-width wire size of an encoded `RotationCertificate`:
/// `old_pk(32) ∥ new_pk(32) ∥ timestamp(8) ∥ signature(64) ∥ reason(1)`.
pub const ROTATION_CERTIFICATE_WIRE_LEN: usize = 32 + 32 + 8 + 64 + 1;

impl RotationCertificate {
    /// Sign a rotation from `old_key` to `new_public`. The signature covers
    /// `new_pk ∥ timestamp`.
    pub fn sign(
        old_key: &SigningKey,
        new_public: &VerifyingKey,
        timestamp: u64,
        reason: RotationReason,
    ) -> Self {
        let mut msg = Vec::with_capacity(32 + 8);
        msg.extend_from_slice(new_public.as_bytes());
        msg.extend_from_slice(&timestamp.to_le_bytes());
        let signature = old_key.sign(&msg);

        Self {
            old_pk: old_key.verifying_key().to_bytes(),
            new_pk: new_public.to_bytes(),
            timestamp,
            signature: signature.to_bytes(),
            reason,
        }
    }

    /// Verify the signature covers `new_pk ∥ timestamp` under `old_pk`.
    pub fn verify(&self) -> Result<()> {
        let old_verifying = VerifyingKey::from_bytes(&self.old_pk)?;
        let mut msg = Vec::with_capacity(32 + 8);
        msg.extend_from_slice(&self.new_pk);
        msg.extend_from_slice(&self.timestamp.to_le_bytes());
        let signature = Signature::from_bytes(&self.signature);
        old_verifying.verify(&msg, &signature)?;
        Ok(())
    }

    pub fn to_bytes(&self) -> [u8; ROTATION_CERTIFICATE_WIRE_LEN] {
        let mut w = Writer::with_capacity(ROTATION_CERTIFICATE_WIRE_LEN);
        w.bytes(&self.old_pk)
            .bytes(&self.new_pk)
            .u64(self.timestamp)
            .bytes(&self.signature)
            .u8(self.reason as u8);
        let v = w.into_vec();
        let mut out = [0u8; ROTATION_CERTIFICATE_WIRE_LEN];
        out.copy_from_slice(&v);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut r = Reader::new(bytes);
        let old_pk = r.array::<32>()?;
        let new_pk = r.array::<32>()?;
        let timestamp = r.u64()?;
        let signature = r.array::<64>()?;
        let reason_byte = r.u8()?;
        r.finish()?;

        let reason = RotationReason::from_u8(reason_byte)
            .ok_or(crate::wire::WireError::InvalidDiscriminant(reason_byte))?;

        Ok(Self {
            old_pk,
            new_pk,
            timestamp,
            signature,
            reason,
        })
    }
}

/// A node's long-lived Ed25519 keypair plus its rotation history. Created
/// with [`Identity::generate`]; mutated only through [`Identity::rotate`],
/// which returns a new `Identity` referencing this one via an appended
/// certificate.
pub struct Identity {
    pub signing_key: SigningKey,
    pub verifying_key: VerifyingKey,
    pub created_at: u64,
    pub rotation_certs: Vec<RotationCertificate>,
}

impl Identity {
    /// Generate a fresh identity with no rotation history.
    pub fn generate() -> Result<Self> {
        let keypair = KeyPair::generate();
        Ok(Self {
            verifying_key: keypair.verifying_key,
            signing_key: keypair.signing_key,
            created_at: now_secs()?,
            rotation_certs: Vec::new(),
        })
    }

    /// This identity's `NodeId`, derived from the current public key.
    pub fn node_id(&self) -> NodeId {
        NodeId::from_public_key(&self.verifying_key)
    }

    /// Rotate to a fresh keypair, appending a certificate signed by the
    /// current key over the new key. The returned `Identity` carries the
    /// full rotation history, including the new certificate.
    pub fn rotate(&self, reason: RotationReason) -> Result<Self> {
        let new_keypair = KeyPair::generate();
        let timestamp = now_secs()?;
        let cert = RotationCertificate::sign(
            &self.signing_key,
            &new_keypair.verifying_key,
            timestamp,
            reason,
        );

        let mut rotation_certs = self.rotation_certs.clone();
        rotation_certs.push(cert);

        Ok(Self {
            verifying_key: new_keypair.verifying_key,
            signing_key: new_keypair.signing_key,
            created_at: self.created_at,
            rotation_certs,
        })
    }

    /// Verify that every certificate in the rotation chain is internally
    /// consistent: each certificate's `old_pk` matches the previous
    /// certificate's `new_pk` (or the genesis key for the first), and each
    /// signature verifies.
    pub fn verify_rotation_chain(&self, genesis_pk: &[u8; 32]) -> Result<()> {
        let mut expected_old = *genesis_pk;
        for cert in &self.rotation_certs {
            if cert.old_pk != expected_old {
                return Err(TypesError::IdentityDecryption);
            }
            cert.verify()?;
            expected_old = cert.new_pk;
        }
        Ok(())
    }

    /// Encrypt and serialize this identity under a password.
    ///
    /// Layout: `salt(16) ∥ nonce(12) ∥ ciphertext`, where the ciphertext
    /// seals `signing_key(32) ∥ created_at(8) ∥ rotation_count(4) ∥
    /// rotation_certs[]` under an Argon2id(password, salt)-derived key.
    pub fn save(&self, password: &[u8]) -> Result<Vec<u8>> {
        let salt = argon2id::generate_salt();
        let key = argon2id::derive_identity_key(password, &salt)?;

        let mut payload = Writer::with_capacity(
            32 + 8 + 4 + self.rotation_certs.len() * ROTATION_CERTIFICATE_WIRE_LEN,
        );
        payload
            .bytes(&self.signing_key.to_bytes())
            .u64(self.created_at)
            .u32(self.rotation_certs.len() as u32);
        for cert in &self.rotation_certs {
            payload.bytes(&cert.to_bytes());
        }
        let payload = payload.into_vec();

        let mut nonce = [0u8; chacha20::NONCE_SIZE];
        rand::RngCore::fill_bytes(&mut rand::rngs::OsRng, &mut nonce);

        let ciphertext = chacha20::encrypt(&key, &nonce, &payload, b"")?;

        let mut out = Writer::with_capacity(16 + chacha20::NONCE_SIZE + ciphertext.len());
        out.bytes(&salt).bytes(&nonce).bytes(&ciphertext);
        Ok(out.into_vec())
    }

    /// Decrypt and parse an identity blob produced by [`Identity::save`].
    /// Returns [`TypesError::IdentityDecryption`] on a wrong password or a
    /// corrupted blob — the two are indistinguishable, by design, since
    /// AEAD failure carries no information about which.
    pub fn load(blob: &[u8], password: &[u8]) -> Result<Self> {
        let mut r = Reader::new(blob);
        let salt = r.array::<16>()?;
        let nonce = r.array::<{ chacha20::NONCE_SIZE }>()?;
        let ciphertext = r.bytes(r.remaining())?;

        let key = argon2id::derive_identity_key(password, &salt)?;
        let payload = chacha20::decrypt(&key, &nonce, ciphertext, b"")
            .map_err(|_| TypesError::IdentityDecryption)?;

        let mut pr = Reader::new(&payload);
        let secret = pr.array::<32>()?;
        let created_at = pr.u64()?;
        let rotation_count = pr.u32()? as usize;

        let mut rotation_certs = Vec::with_capacity(rotation_count);
        for _ in 0..rotation_count {
            let cert_bytes = pr.bytes(ROTATION_CERTIFICATE_WIRE_LEN)?;
            rotation_certs.push(RotationCertificate::from_bytes(cert_bytes)?);
        }
        pr.finish()?;

        let keypair = KeyPair::from_bytes(&secret);
        Ok(Self {
            verifying_key: keypair.verifying_key,
            signing_key: keypair.signing_key,
            created_at,
            rotation_certs,
        })
    }
}
