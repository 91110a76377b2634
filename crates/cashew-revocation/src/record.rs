//! `KeyRevocation` wire encoding, signing, and verification.

use cashew_crypto::ed25519::{Signature, SigningKey, VerifyingKey};
use cashew_types::wire::{Reader, Writer};
use cashew_types::{NodeId, RotationCertificate};

use crate::{Result, RevocationError};

/// A signed statement that `revoked_pk` should no longer be trusted,
/// optionally naming a replacement key and the rotation certificate
/// linking the two.
///
/// `(revoked_pk, reason, revoked_at, revoker_id, replacement_pk?,
/// rotation_cert?, signature)`. Signed by `replacement_pk` if
/// present, else by `revoked_pk` itself (self-revocation).
#[derive(Clone, Debug)]
pub struct KeyRevocation {
    pub revoked_pk: [u8; 32],
    pub reason: u8,
    pub revoked_at: u64,
    pub revoker: NodeId,
    pub replacement_pk: Option<[u8; 32]>,
    pub rotation_cert: Option<RotationCertificate>,
    pub signature: Signature,
}

impl KeyRevocation {
    /// Build and sign a revocation. `signing_key` must correspond to
    /// `replacement_pk` when one is given, or to `revoked_pk` for a
    /// self-revocation.
    pub fn build(
        signing_key: &SigningKey,
        revoked_pk: [u8; 32],
        reason: u8,
        revoked_at: u64,
        revoker: NodeId,
        replacement_pk: Option<[u8; 32]>,
        rotation_cert: Option<RotationCertificate>,
    ) -> Self {
        let signature = signing_key.sign(&Self::signed_bytes(
            &revoked_pk,
            reason,
            revoked_at,
            revoker,
            replacement_pk.as_ref(),
            rotation_cert.as_ref(),
        ));
        Self {
            revoked_pk,
            reason,
            revoked_at,
            revoker,
            replacement_pk,
            rotation_cert,
            signature,
        }
    }

    fn signed_bytes(
        revoked_pk: &[u8; 32],
        reason: u8,
        revoked_at: u64,
        revoker: NodeId,
        replacement_pk: Option<&[u8; 32]>,
        rotation_cert: Option<&RotationCertificate>,
    ) -> Vec<u8> {
        let mut w = Writer::with_capacity(32 + 1 + 8 + 32 + 1 + 32 + 1 + 4 + 165);
        w.bytes(revoked_pk).u8(reason).u64(revoked_at).bytes(revoker.as_bytes());
        match replacement_pk {
            Some(pk) => {
                w.u8(1).bytes(pk);
            }
            None => {
                w.u8(0);
            }
        }
        match rotation_cert {
            Some(cert) => {
                let cert_bytes = cert.to_bytes();
                w.u8(1).len_prefixed(&cert_bytes);
            }
            None => {
                w.u8(0);
            }
        }
        w.into_vec()
    }

    /// The key whose signature must validate this record: `replacement_pk`
    /// if present, else `revoked_pk`.
    pub fn signer_pk(&self) -> [u8; 32] {
        self.replacement_pk.unwrap_or(self.revoked_pk)
    }

    /// Verify the signature against [`Self::signer_pk`].
    pub fn verify_signature(&self) -> Result<()> {
        let signer = VerifyingKey::from_bytes(&self.signer_pk())?;
        let signed = Self::signed_bytes(
            &self.revoked_pk,
            self.reason,
            self.revoked_at,
            self.revoker,
            self.replacement_pk.as_ref(),
            self.rotation_cert.as_ref(),
        );
        signer.verify(&signed, &self.signature)?;
        Ok(())
    }

    /// Verify the attached rotation certificate, if any, links `old_pk ==
    /// revoked_pk` and is itself correctly signed.
    pub fn verify_rotation_cert(&self) -> Result<()> {
        match &self.rotation_cert {
            Some(cert) => {
                if cert.old_pk != self.revoked_pk {
                    return Err(RevocationError::CertificateMismatch);
                }
                cert.verify().map_err(|_| RevocationError::InvalidCertificate)
            }
            None => Ok(()),
        }
    }

    /// `BLAKE3` over the signed bytes plus the signature: the identity used
    /// for seen-set dedup. Two independently-built revocations for the
    /// same key with different signers hash differently, so each is
    /// tracked and accepted on its own merits.
    pub fn hash(&self) -> [u8; 32] {
        let signed = Self::signed_bytes(
            &self.revoked_pk,
            self.reason,
            self.revoked_at,
            self.revoker,
            self.replacement_pk.as_ref(),
            self.rotation_cert.as_ref(),
        );
        cashew_crypto::blake3::hash_concat(&[&signed, &self.signature.to_bytes()])
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = Writer::with_capacity(32 + 1 + 8 + 32 + 1 + 32 + 1 + 4 + 165 + 64);
        w.bytes(&self.revoked_pk).u8(self.reason).u64(self.revoked_at).bytes(self.revoker.as_bytes());
        match self.replacement_pk {
            Some(pk) => {
                w.u8(1).bytes(&pk);
            }
            None => {
                w.u8(0);
            }
        }
        match &self.rotation_cert {
            Some(cert) => {
                let cert_bytes = cert.to_bytes();
                w.u8(1).len_prefixed(&cert_bytes);
            }
            None => {
                w.u8(0);
            }
        }
        w.bytes(&self.signature.to_bytes());
        w.into_vec()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut r = Reader::new(bytes);
        let revoked_pk = r.array::<32>()?;
        let reason = r.u8()?;
        let revoked_at = r.u64()?;
        let revoker = NodeId::from_bytes(r.array::<32>()?);

        let has_replacement = r.u8()?;
        let replacement_pk = if has_replacement != 0 { Some(r.array::<32>()?) } else { None };

        let has_cert = r.u8()?;
        let rotation_cert = if has_cert != 0 {
            let cert_bytes = r.len_prefixed()?;
            Some(RotationCertificate::from_bytes(cert_bytes)?)
        } else {
            None
        };

        let signature = Signature::from_bytes(&r.array::<64>()?);
        r.finish()?;

        Ok(Self {
            revoked_pk,
            reason,
            revoked_at,
            revoker,
            replacement_pk,
            rotation_cert,
            signature,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cashew_crypto::ed25519::KeyPair;
    use cashew_types::RotationReason;

    fn node(byte: u8) -> NodeId {
        NodeId::from_bytes([byte; 32])
    }

    #[test]
    fn test_self_revocation_roundtrip_and_verify() {
        let identity = KeyPair::generate();
        let revocation = KeyRevocation::build(
            &identity.signing_key,
            identity.verifying_key.to_bytes(),
            0,
            1000,
            node(1),
            None,
            None,
        );
        let bytes = revocation.to_bytes();
        let restored = KeyRevocation::from_bytes(&bytes).expect("decode");
        assert!(restored.verify_signature().is_ok());
    }

    #[test]
    fn test_revocation_with_replacement_and_cert_roundtrip() {
        let old_identity = KeyPair::generate();
        let new_identity = KeyPair::generate();
        let cert = RotationCertificate::sign(
            &old_identity.signing_key,
            &new_identity.verifying_key,
            1000,
            RotationReason::Scheduled,
        );

        let revocation = KeyRevocation::build(
            &new_identity.signing_key,
            old_identity.verifying_key.to_bytes(),
            0,
            1000,
            node(2),
            Some(new_identity.verifying_key.to_bytes()),
            Some(cert),
        );

        let bytes = revocation.to_bytes();
        let restored = KeyRevocation::from_bytes(&bytes).expect("decode");
        assert!(restored.verify_signature().is_ok());
        assert!(restored.verify_rotation_cert().is_ok());
    }

    #[test]
    fn test_verify_rejects_wrong_signer() {
        let identity = KeyPair::generate();
        let impostor = KeyPair::generate();
        let mut revocation = KeyRevocation::build(
            &identity.signing_key,
            identity.verifying_key.to_bytes(),
            0,
            1000,
            node(1),
            None,
            None,
        );
        revocation.signature = impostor.signing_key.sign(b"unrelated");
        assert!(revocation.verify_signature().is_err());
    }

    #[test]
    fn test_rotation_cert_mismatch_rejected() {
        let old_identity = KeyPair::generate();
        let new_identity = KeyPair::generate();
        let unrelated_pk = KeyPair::generate().verifying_key.to_bytes();
        let cert = RotationCertificate::sign(
            &old_identity.signing_key,
            &new_identity.verifying_key,
            1000,
            RotationReason::Scheduled,
        );

        let revocation = KeyRevocation::build(
            &new_identity.signing_key,
            unrelated_pk,
            0,
            1000,
            node(2),
            Some(new_identity.verifying_key.to_bytes()),
            Some(cert),
        );
        assert!(revocation.verify_rotation_cert().is_err());
    }

    #[test]
    fn test_hash_stable_for_identical_record() {
        let identity = KeyPair::generate();
        let revocation = KeyRevocation::build(
            &identity.signing_key,
            identity.verifying_key.to_bytes(),
            0,
            1000,
            node(1),
            None,
            None,
        );
        let bytes = revocation.to_bytes();
        let restored = KeyRevocation::from_bytes(&bytes).expect("decode");
        assert_eq!(revocation.hash(), restored.hash());
    }
}
