//! BLAKE3 hashing for the Cashew protocol.
//!
//! BLAKE3 is used throughout the protocol for content addressing (NodeId
//! derivation, content hashes), message identifiers (`message_id`,
//! `request_id`), and session key derivation. Session key derivation uses
//! plain `hash` over a domain-tagged input rather than BLAKE3's
//! `derive_key` mode: `k0 = BLAKE3(ss ∥ "cashew_session_v1")`.

/// Domain separation tag for session key derivation.
pub const SESSION_DOMAIN: &str = "cashew_session_v1";

/// Compute the BLAKE3 hash of the input data.
///
/// Used for content addressing (`NodeId`, `content_hash`) and message
/// identifiers (`message_id`, `request_id`).
pub fn hash(data: &[u8]) -> [u8; 32] {
    *::blake3::hash(data).as_bytes()
}

/// Compute a keyed BLAKE3 hash (MAC/PRF).
pub fn keyed_hash(key: &[u8; 32], message: &[u8]) -> [u8; 32] {
    *::blake3::keyed_hash(key, message).as_bytes()
}

/// Hash several fields in sequence, as if they had been concatenated.
///
/// Avoids an intermediate allocation-and-copy for the common case of
/// hashing `a ∥ b ∥ c`.
pub fn hash_concat(fields: &[&[u8]]) -> [u8; 32] {
    let mut hasher = ::blake3::Hasher::new();
    for field in fields {
        hasher.update(field);
    }
    *hasher.finalize().as_bytes()
}
