//! # cashew-crypto
//!
//! Cryptographic primitives for the Cashew overlay network. No algorithm
//! negotiation is permitted — the cryptographic suite is fixed: X25519 for
//! key agreement, Ed25519 for signatures, ChaCha20-Poly1305 for AEAD,
//! BLAKE3 for hashing, Argon2id for password hashing and memory-hard
//! Proof-of-Work.
//!
//! ## Modules
//!
//! - [`blake3`] — content hashing and session key derivation
//! - [`ed25519`] — long-term identity signing and verification
//! - [`x25519`] — ephemeral key agreement for sessions and onion layers
//! - [`chacha20`] — AEAD framing and onion layer encryption
//! - [`argon2id`] — password-based key derivation and PoW hashing

pub mod argon2id;
pub mod blake3;
pub mod chacha20;
pub mod ed25519;
pub mod x25519;

/// Error types for cryptographic operations.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// Ed25519 signature verification failed.
    #[error("signature verification failed")]
    SignatureVerification,

    /// AEAD decryption failed (authentication tag mismatch).
    #[error("AEAD decryption failed")]
    AeadDecryption,

    /// Invalid key length.
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// Argon2id hashing failed (e.g. allocation failure for the requested
    /// memory cost). Callers should surface this as a resource failure,
    /// not retry silently.
    #[error("argon2id error: {0}")]
    Argon2(String),

    /// Invalid input data (malformed key bytes, wrong slice length, etc.).
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Convenience result type for cryptographic operations.
pub type Result<T> = std::result::Result<T, CryptoError>;
