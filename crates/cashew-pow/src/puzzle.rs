//! Puzzle construction and the puzzle-hash function.

use cashew_crypto::argon2id::{self, PowParams};
use cashew_crypto::blake3;

use crate::difficulty::clamp_difficulty;
use crate::Result;

/// A challenge the solver must answer with a qualifying nonce.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PowPuzzle {
    pub challenge: Vec<u8>,
    pub difficulty: u32,
    pub epoch: u64,
    pub issued_at: u64,
}

impl PowPuzzle {
    pub fn new(challenge: Vec<u8>, difficulty: u32, epoch: u64, issued_at: u64) -> Self {
        Self {
            challenge,
            difficulty: clamp_difficulty(difficulty),
            epoch,
            issued_at,
        }
    }

    /// Build a puzzle whose challenge ties it to a specific epoch, so a
    /// solution cannot be replayed against a different epoch's puzzle.
    pub fn for_epoch(epoch: u64, difficulty: u32, issued_at: u64) -> Self {
        Self::new(format!("epoch-{epoch}").into_bytes(), difficulty, epoch, issued_at)
    }

    pub fn params(&self) -> PowParams {
        argon2id::pow_params_for_difficulty(self.difficulty)
    }
}

/// `H(challenge, nonce) = Argon2id(password = challenge ∥ LE64(nonce),
/// salt = BLAKE3(challenge)[0..16], params, outlen = 32)`.
pub fn puzzle_hash(challenge: &[u8], nonce: u64, difficulty: u32) -> Result<[u8; 32]> {
    let params = argon2id::pow_params_for_difficulty(difficulty);
    let mut password = Vec::with_capacity(challenge.len() + 8);
    password.extend_from_slice(challenge);
    password.extend_from_slice(&nonce.to_le_bytes());

    let salt_full = blake3::hash(challenge);
    let salt = &salt_full[0..16];

    let out = argon2id::derive_key_custom(&password, salt, params.m_cost, params.t_cost, params.p_cost, 32)?;
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&out);
    Ok(hash)
}

/// Number of leading zero bits in a 32-byte hash, treated as a big-endian
/// bit string.
pub fn leading_zero_bits(hash: &[u8; 32]) -> u32 {
    let mut bits = 0u32;
    for byte in hash {
        if *byte == 0 {
            bits += 8;
        } else {
            bits += byte.leading_zeros();
            break;
        }
    }
    bits
}
