//! Per-peer session state machine, key derivation, and AEAD framing.

use cashew_crypto::x25519::{PublicKey as X25519PublicKey, StaticSecret as X25519StaticSecret};
use cashew_crypto::{blake3, chacha20};
use cashew_types::NodeId;

use crate::{Result, SessionError};

/// Rekey threshold: age of the current keys.
pub const REKEY_AGE_SECS: u64 = 3600;
/// Rekey threshold: total bytes transferred under the current keys.
pub const REKEY_BYTES: u64 = 1 << 30;
/// A session with no activity for this long is considered timed out.
pub const SESSION_IDLE_TIMEOUT_SECS: u64 = 1800;

/// Which side of the handshake this session played.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionRole {
    Initiator,
    Responder,
}

/// The handshake/session lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    HandshakeInit,
    HandshakeResponse,
    Established,
    Closing,
    Closed,
}

/// An ephemeral encrypted channel to a single remote peer.
///
/// `tx_key`/`rx_key` are derived once at handshake completion and never
/// changed in place; [`Session::should_rekey`] signals when the caller
/// should tear the session down and build a fresh one.
pub struct Session {
    pub local_node_id: NodeId,
    pub remote_node_id: NodeId,
    pub role: SessionRole,
    state: SessionState,

    ephemeral_secret: Option<X25519StaticSecret>,
    pub ephemeral_public: X25519PublicKey,
    pub peer_ephemeral_public: Option<X25519PublicKey>,

    tx_key: Option<[u8; 32]>,
    rx_key: Option<[u8; 32]>,
    nonce_salt: [u8; 4],
    send_counter: u64,

    pub created_at: u64,
    pub established_at: Option<u64>,
    pub last_activity: u64,

    pub bytes_sent: u64,
    pub bytes_received: u64,
}

impl Session {
    /// Begin an outbound session: generate our ephemeral keypair and move
    /// to `HandshakeInit`. The caller is responsible for sending the
    /// resulting [`crate::HandshakeMessage`] built from `ephemeral_public`.
    pub fn new_outbound(local_node_id: NodeId, remote_node_id: NodeId, now: u64) -> Self {
        let (ephemeral_secret, ephemeral_public) = cashew_crypto::x25519::ephemeral_keypair();
        Self {
            local_node_id,
            remote_node_id,
            role: SessionRole::Initiator,
            state: SessionState::HandshakeInit,
            ephemeral_secret: Some(ephemeral_secret),
            ephemeral_public,
            peer_ephemeral_public: None,
            tx_key: None,
            rx_key: None,
            nonce_salt: random_salt(),
            send_counter: 0,
            created_at: now,
            established_at: None,
            last_activity: now,
            bytes_sent: 0,
            bytes_received: 0,
        }
    }

    /// Begin an inbound session in response to a received handshake:
    /// generate our ephemeral keypair and move to `HandshakeResponse`.
    pub fn new_inbound(local_node_id: NodeId, remote_node_id: NodeId, now: u64) -> Self {
        let (ephemeral_secret, ephemeral_public) = cashew_crypto::x25519::ephemeral_keypair();
        Self {
            local_node_id,
            remote_node_id,
            role: SessionRole::Responder,
            state: SessionState::HandshakeResponse,
            ephemeral_secret: Some(ephemeral_secret),
            ephemeral_public,
            peer_ephemeral_public: None,
            tx_key: None,
            rx_key: None,
            nonce_salt: random_salt(),
            send_counter: 0,
            created_at: now,
            established_at: None,
            last_activity: now,
            bytes_sent: 0,
            bytes_received: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Complete the handshake given the peer's ephemeral public key,
    /// deriving per-direction keys from the shared secret.
    ///
    /// `k0 = BLAKE3(ss ∥ "cashew_session_v1")`, `k1 = BLAKE3(ss ∥
    /// "cashew_session_v1" ∥ 0x01)`. The initiator takes `tx_key = k0`,
    /// `rx_key = k1`; the responder takes the mirror image, so both sides
    /// agree on per-direction keys from a single shared secret with no
    /// extra round trip.
    pub fn complete_handshake(&mut self, peer_ephemeral_public: X25519PublicKey, now: u64) -> Result<()> {
        let secret = self
            .ephemeral_secret
            .as_ref()
            .ok_or(SessionError::SessionClosed)?;
        let shared = secret.diffie_hellman(&peer_ephemeral_public);

        let k0 = blake3::hash_concat(&[shared.as_bytes(), blake3::SESSION_DOMAIN.as_bytes()]);
        let k1 = blake3::hash_concat(&[shared.as_bytes(), blake3::SESSION_DOMAIN.as_bytes(), &[0x01]]);

        let (tx_key, rx_key) = match self.role {
            SessionRole::Initiator => (k0, k1),
            SessionRole::Responder => (k1, k0),
        };

        self.tx_key = Some(tx_key);
        self.rx_key = Some(rx_key);
        self.peer_ephemeral_public = Some(peer_ephemeral_public);
        self.state = SessionState::Established;
        self.established_at = Some(now);
        self.last_activity = now;

        Ok(())
    }

    /// Encrypt `plaintext` under the session's `tx_key`, returning the
    /// wire frame `nonce(12) ∥ ciphertext ∥ tag`.
    pub fn encrypt_message(&mut self, plaintext: &[u8]) -> Result<Vec<u8>> {
        if self.state != SessionState::Established {
            return Err(SessionError::NotEstablished);
        }
        let tx_key = self.tx_key.ok_or(SessionError::SessionClosed)?;

        let nonce = chacha20::frame_nonce(self.send_counter, &self.nonce_salt);
        self.send_counter += 1;

        let ciphertext = chacha20::encrypt(&tx_key, &nonce, plaintext, b"")?;

        let mut frame = Vec::with_capacity(chacha20::NONCE_SIZE + ciphertext.len());
        frame.extend_from_slice(&nonce);
        frame.extend_from_slice(&ciphertext);

        self.bytes_sent += frame.len() as u64;
        Ok(frame)
    }

    /// Decrypt a wire frame received from the peer under the session's
    /// `rx_key`. Any failure (truncated frame or AEAD authentication
    /// failure) is an [`SessionError`]; the caller must close the session
    /// on this path.
    pub fn decrypt_message(&mut self, frame: &[u8]) -> Result<Vec<u8>> {
        if self.state != SessionState::Established {
            return Err(SessionError::NotEstablished);
        }
        let rx_key = self.rx_key.ok_or(SessionError::SessionClosed)?;

        if frame.len() < chacha20::NONCE_SIZE {
            return Err(SessionError::Crypto(cashew_crypto::CryptoError::InvalidInput(
                "frame shorter than nonce".to_string(),
            )));
        }
        let (nonce_bytes, ciphertext) = frame.split_at(chacha20::NONCE_SIZE);
        let mut nonce = [0u8; chacha20::NONCE_SIZE];
        nonce.copy_from_slice(nonce_bytes);

        let plaintext = chacha20::decrypt(&rx_key, &nonce, ciphertext, b"")?;
        self.bytes_received += frame.len() as u64;
        Ok(plaintext)
    }

    /// True once the session's keys have been live long enough, or enough
    /// bytes have flowed, that it should be torn down and rebuilt.
    pub fn should_rekey(&self, now: u64) -> bool {
        match self.established_at {
            Some(established_at) => {
                now.saturating_sub(established_at) >= REKEY_AGE_SECS
                    || self.bytes_sent + self.bytes_received >= REKEY_BYTES
            }
            None => false,
        }
    }

    /// True when the session has had no activity for
    /// [`SESSION_IDLE_TIMEOUT_SECS`].
    pub fn has_timed_out(&self, now: u64) -> bool {
        now.saturating_sub(self.last_activity) >= SESSION_IDLE_TIMEOUT_SECS
    }

    pub fn touch(&mut self, now: u64) {
        self.last_activity = now;
    }

    /// Zero all key material and ephemeral secrets and move to `Closed`.
    /// Subsequent `encrypt_message`/`decrypt_message` calls return an
    /// error.
    pub fn close(&mut self) {
        use zeroize::Zeroize;

        if let Some(mut key) = self.tx_key.take() {
            key.zeroize();
        }
        if let Some(mut key) = self.rx_key.take() {
            key.zeroize();
        }
        self.ephemeral_secret = None;
        self.state = SessionState::Closed;
    }

    /// Whether the session is in the `Established` state.
    pub fn is_established(&self) -> bool {
        self.state == SessionState::Established
    }

    /// Test/debug accessor for the current tx/rx keys. Returns `None` once
    /// the session has been closed.
    #[doc(hidden)]
    pub fn keys_for_test(&self) -> (Option<[u8; 32]>, Option<[u8; 32]>) {
        (self.tx_key, self.rx_key)
    }
}

fn random_salt() -> [u8; 4] {
    let mut salt = [0u8; 4];
    rand::RngCore::fill_bytes(&mut rand::rngs::OsRng, &mut salt);
    salt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_id(byte: u8) -> NodeId {
        NodeId::from_bytes([byte; 32])
    }

    fn handshake_pair(now: u64) -> (Session, Session) {
        let mut a = Session::new_outbound(node_id(1), node_id(2), now);
        let mut b = Session::new_inbound(node_id(2), node_id(1), now);

        let a_pub = a.ephemeral_public;
        let b_pub = b.ephemeral_public;

        a.complete_handshake(b_pub, now).expect("a handshake");
        b.complete_handshake(a_pub, now).expect("b handshake");

        (a, b)
    }

    #[test]
    fn test_session_mirror() {
        let (a, b) = handshake_pair(1000);
        let (a_tx, a_rx) = a.keys_for_test();
        let (b_tx, b_rx) = b.keys_for_test();

        assert_eq!(a_tx, b_rx);
        assert_eq!(a_rx, b_tx);
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let (mut a, mut b) = handshake_pair(1000);

        let frame = a.encrypt_message(b"ping").expect("encrypt");
        let decrypted = b.decrypt_message(&frame).expect("decrypt");
        assert_eq!(decrypted, b"ping");

        let frame = b.encrypt_message(b"pong").expect("encrypt");
        let decrypted = a.decrypt_message(&frame).expect("decrypt");
        assert_eq!(decrypted, b"pong");
    }

    #[test]
    fn test_bitflip_breaks_decrypt() {
        let (mut a, mut b) = handshake_pair(1000);
        let mut frame = a.encrypt_message(b"ping").expect("encrypt");
        let last = frame.len() - 1;
        frame[last] ^= 0xff;

        assert!(b.decrypt_message(&frame).is_err());
    }

    #[test]
    fn test_close_zeroes_keys() {
        let (mut a, _b) = handshake_pair(1000);
        a.close();
        let (tx, rx) = a.keys_for_test();
        assert!(tx.is_none());
        assert!(rx.is_none());
        assert!(a.encrypt_message(b"data").is_err());
    }

    #[test]
    fn test_should_rekey_by_age() {
        let (a, _b) = handshake_pair(1000);
        assert!(!a.should_rekey(1000 + REKEY_AGE_SECS - 1));
        assert!(a.should_rekey(1000 + REKEY_AGE_SECS));
    }

    #[test]
    fn test_has_timed_out() {
        let (mut a, _b) = handshake_pair(1000);
        assert!(!a.has_timed_out(1000 + SESSION_IDLE_TIMEOUT_SECS - 1));
        assert!(a.has_timed_out(1000 + SESSION_IDLE_TIMEOUT_SECS));
        a.touch(2000);
        assert!(!a.has_timed_out(2000 + 10));
    }

    #[test]
    fn test_nonce_counter_monotonic_and_frame_unique() {
        let (mut a, mut b) = handshake_pair(1000);
        let frame1 = a.encrypt_message(b"one").expect("encrypt");
        let frame2 = a.encrypt_message(b"two").expect("encrypt");
        assert_ne!(frame1[0..8], frame2[0..8]);

        assert_eq!(b.decrypt_message(&frame1).expect("decrypt"), b"one");
        assert_eq!(b.decrypt_message(&frame2).expect("decrypt"), b"two");
    }
}
