//! # cashew-types
//!
//! Shared domain types used across the Cashew workspace: node identity,
//! rotation history, node capabilities, and the fixed-width wire-encoding
//! primitives every protocol crate builds its own message types on top of.

pub mod capabilities;
pub mod identity;
pub mod node_id;
pub mod wire;

pub use capabilities::NodeCapabilities;
pub use identity::{Identity, RotationCertificate, RotationReason};
pub use node_id::NodeId;

/// Nominal epoch duration (10 minutes), per the glossary.
pub const EPOCH_DURATION_SECS: u64 = 600;

/// Handshake and gossip message clock-skew tolerance.
pub const CLOCK_SKEW_TOLERANCE_SECS: u64 = 60;

/// Errors shared by the domain types in this crate.
#[derive(Debug, thiserror::Error)]
pub enum TypesError {
    #[error(transparent)]
    Crypto(#[from] cashew_crypto::CryptoError),

    #[error(transparent)]
    Wire(#[from] wire::WireError),

    #[error("identity decryption failed: wrong password or corrupted blob")]
    IdentityDecryption,

    #[error("system clock error: {0}")]
    ClockError(String),
}

/// Convenience result type for this crate.
pub type Result<T> = std::result::Result<T, TypesError>;

/// Current Unix timestamp in seconds.
pub fn now_secs() -> Result<u64> {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| TypesError::ClockError(e.to_string()))
}
