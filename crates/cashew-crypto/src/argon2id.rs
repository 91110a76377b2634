//! Argon2id memory-hard hashing.
//!
//! Used for:
//! - Identity-at-rest key derivation (m=256MB, t=3, p=4).
//! - Proof-of-Work puzzle hashing with difficulty-tiered parameters.

use argon2::{Algorithm, Argon2, Params, Version};

use crate::{CryptoError, Result};

/// Default Argon2id parameters for identity-at-rest key derivation.
/// m=256MB, t=3 iterations, p=4 parallelism lanes.
pub const IDENTITY_M_COST: u32 = 262144; // 256 * 1024 KiB
pub const IDENTITY_T_COST: u32 = 3;
pub const IDENTITY_P_COST: u32 = 4;
pub const IDENTITY_OUTPUT_LEN: usize = 32;

/// Proof-of-Work Argon2id parameters for a given difficulty tier:
/// difficulty ≤ 8 uses 64 MiB/t=2/p=1, ≤ 16 uses 256 MiB/t=3/p=1,
/// otherwise 1 GiB/t=4/p=1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PowParams {
    pub m_cost: u32,
    pub t_cost: u32,
    pub p_cost: u32,
}

/// Select the Argon2id parameter tier for a given PoW difficulty.
pub fn pow_params_for_difficulty(difficulty: u32) -> PowParams {
    if difficulty <= 8 {
        PowParams {
            m_cost: 65536, // 64 MiB
            t_cost: 2,
            p_cost: 1,
        }
    } else if difficulty <= 16 {
        PowParams {
            m_cost: 262144, // 256 MiB
            t_cost: 3,
            p_cost: 1,
        }
    } else {
        PowParams {
            m_cost: 1048576, // 1 GiB
            t_cost: 4,
            p_cost: 1,
        }
    }
}

/// Derive a key from a password using Argon2id with identity-at-rest
/// parameters (m=256MB, t=3, p=4).
pub fn derive_identity_key(password: &[u8], salt: &[u8]) -> Result<[u8; IDENTITY_OUTPUT_LEN]> {
    let params = Params::new(
        IDENTITY_M_COST,
        IDENTITY_T_COST,
        IDENTITY_P_COST,
        Some(IDENTITY_OUTPUT_LEN),
    )
    .map_err(|e| CryptoError::Argon2(e.to_string()))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut output = [0u8; IDENTITY_OUTPUT_LEN];
    argon2
        .hash_password_into(password, salt, &mut output)
        .map_err(|e| CryptoError::Argon2(e.to_string()))?;

    Ok(output)
}

/// Derive a key with custom Argon2id parameters.
///
/// Used directly by `cashew-pow` for puzzle hashing, where the memory/time
/// cost varies with the puzzle's difficulty.
pub fn derive_key_custom(
    password: &[u8],
    salt: &[u8],
    m_cost: u32,
    t_cost: u32,
    p_cost: u32,
    output_len: usize,
) -> Result<Vec<u8>> {
    let params = Params::new(m_cost, t_cost, p_cost, Some(output_len))
        .map_err(|e| CryptoError::Argon2(e.to_string()))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut output = vec![0u8; output_len];
    argon2
        .hash_password_into(password, salt, &mut output)
        .map_err(|e| CryptoError::Argon2(e.to_string()))?;

    Ok(output)
}

/// Generate a random 16-byte salt for Argon2id.
pub fn generate_salt() -> [u8; 16] {
    let mut salt = [0u8; 16];
    rand::RngCore::fill_bytes(&mut rand::rngs::OsRng, &mut salt);
    salt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_key_custom_deterministic() {
        let password = b"test password";
        let salt = b"1234567890123456";

        let key1 = derive_key_custom(password, salt, 1024, 1, 1, 32).expect("derive");
        let key2 = derive_key_custom(password, salt, 1024, 1, 1, 32).expect("derive");
        assert_eq!(key1, key2);
    }

    #[test]
    fn test_derive_key_different_passwords() {
        let salt = b"1234567890123456";
        let key1 = derive_key_custom(b"pass1", salt, 1024, 1, 1, 32).expect("derive");
        let key2 = derive_key_custom(b"pass2", salt, 1024, 1, 1, 32).expect("derive");
        assert_ne!(key1, key2);
    }

    #[test]
    fn test_derive_key_different_salts() {
        let password = b"password";
        let key1 =
            derive_key_custom(password, b"salt111111111111", 1024, 1, 1, 32).expect("derive");
        let key2 =
            derive_key_custom(password, b"salt222222222222", 1024, 1, 1, 32).expect("derive");
        assert_ne!(key1, key2);
    }

    #[test]
    fn test_generate_salt() {
        let salt1 = generate_salt();
        let salt2 = generate_salt();
        assert_ne!(salt1, salt2);
        assert_eq!(salt1.len(), 16);
    }

    #[test]
    fn test_pow_params_tiers() {
        assert_eq!(
            pow_params_for_difficulty(8),
            PowParams {
                m_cost: 65536,
                t_cost: 2,
                p_cost: 1
            }
        );
        assert_eq!(
            pow_params_for_difficulty(16),
            PowParams {
                m_cost: 262144,
                t_cost: 3,
                p_cost: 1
            }
        );
        assert_eq!(
            pow_params_for_difficulty(32),
            PowParams {
                m_cost: 1048576,
                t_cost: 4,
                p_cost: 1
            }
        );
    }

    #[test]
    fn test_identity_key_derivation_deterministic() {
        let salt = generate_salt();
        let key1 = derive_identity_key(b"correct horse battery staple", &salt).expect("derive");
        let key2 = derive_identity_key(b"correct horse battery staple", &salt).expect("derive");
        assert_eq!(key1, key2);
    }
}
