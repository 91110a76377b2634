//! ChaCha20-Poly1305 AEAD (RFC 8439).
//!
//! Used for session frame encryption and onion layer
//! encryption. Both constructions supply a unique key per
//! encryption (derived per-session, per-layer, or via an explicit nonce
//! counter), so nonce reuse is the caller's responsibility to avoid, not
//! this module's.

use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};

use crate::{CryptoError, Result};

/// Size of a ChaCha20-Poly1305 key in bytes.
pub const KEY_SIZE: usize = 32;
/// Size of a ChaCha20-Poly1305 nonce in bytes.
pub const NONCE_SIZE: usize = 12;
/// Size of the Poly1305 authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// Encrypt `plaintext` under `key`/`nonce`, authenticating `aad` but not
/// encrypting it. Returns `ciphertext ∥ tag`.
pub fn encrypt(
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
    plaintext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    let nonce = Nonce::from_slice(nonce);
    cipher
        .encrypt(
            nonce,
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|_| CryptoError::AeadDecryption)
}

/// Decrypt `ciphertext` (which must include the trailing tag) under
/// `key`/`nonce`, verifying `aad`.
pub fn decrypt(
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
    ciphertext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    let nonce = Nonce::from_slice(nonce);
    cipher
        .decrypt(
            nonce,
            Payload {
                msg: ciphertext,
                aad,
            },
        )
        .map_err(|_| CryptoError::AeadDecryption)
}

/// Build a session frame nonce from an 8-byte little-endian counter and a
/// 4-byte random salt fixed for the life of the session key:
/// `nonce = counter(8B LE) ∥ random(4B)`.
pub fn frame_nonce(counter: u64, salt: &[u8; 4]) -> [u8; NONCE_SIZE] {
    let mut nonce = [0u8; NONCE_SIZE];
    nonce[0..8].copy_from_slice(&counter.to_le_bytes());
    nonce[8..12].copy_from_slice(salt);
    nonce
}
