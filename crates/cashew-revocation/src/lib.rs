//! # cashew-revocation
//!
//! Signed key-revocation records and the broadcaster that accepts, stores,
//! and deduplicates them across the network.
//!
//! Like `cashew-gossip` and `cashew-router`, this crate owns no peer set
//! and opens no socket: dissemination happens over `cashew-gossip`, with
//! the broadcaster supplying the signed payload and consuming what gossip
//! hands back through its `KeyRevocation` message handler.

pub mod broadcaster;
pub mod record;

pub use broadcaster::RevocationBroadcaster;
pub use record::KeyRevocation;

/// Default tolerance for how far a revocation's `revoked_at` may sit in the
/// future, to absorb clock skew between nodes.
pub const CLOCK_SKEW_TOLERANCE_SECS: u64 = 300;

/// Default validity window after which a revocation is no longer accepted
/// or retained.
pub const DEFAULT_EXPIRY_DAYS: u64 = 365;

/// Window considered "recent" by [`broadcaster::RevocationBroadcaster::create_revocation_list`].
pub const RECENT_WINDOW_SECS: u64 = 3600;

/// Cap on the number of entries returned by `create_revocation_list`.
pub const RECENT_LIST_MAX_ENTRIES: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum RevocationError {
    #[error(transparent)]
    Crypto(#[from] cashew_crypto::CryptoError),

    #[error(transparent)]
    Wire(#[from] cashew_types::wire::WireError),

    #[error("rotation certificate's old_pk does not match the revoked key")]
    CertificateMismatch,

    #[error("attached rotation certificate failed verification")]
    InvalidCertificate,

    #[error("revocation already seen")]
    Duplicate,

    #[error("revoked_at is too far in the future (beyond clock-skew tolerance)")]
    TooFarInFuture,

    #[error("revocation has expired")]
    Expired,
}

pub type Result<T> = std::result::Result<T, RevocationError>;
