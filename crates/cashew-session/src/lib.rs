//! # cashew-session
//!
//! Outbound-only, forward-secret, authenticated encrypted sessions between
//! Cashew nodes. See [`handshake`] for the wire handshake, [`session`] for
//! the per-peer state machine and AEAD framing, and [`manager`] for the
//! node-wide session table.

pub mod bandwidth;
pub mod handshake;
pub mod manager;
pub mod session;

pub use bandwidth::BandwidthLimiter;
pub use handshake::HandshakeMessage;
pub use manager::SessionManager;
pub use session::{Session, SessionRole, SessionState};

/// Errors produced by the session layer.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Crypto(#[from] cashew_crypto::CryptoError),

    #[error(transparent)]
    Wire(#[from] cashew_types::wire::WireError),

    #[error("unsupported handshake version: {0}")]
    UnsupportedVersion(u8),

    #[error("handshake timestamp outside clock-skew tolerance")]
    HandshakeTimestampSkew,

    #[error("handshake signature verification failed")]
    HandshakeAuthentication,

    #[error("session with peer already exists")]
    DuplicateSession,

    #[error("no session for peer")]
    NoSuchSession,

    #[error("session is not in the Established state")]
    NotEstablished,

    #[error("session is closed")]
    SessionClosed,

    #[error("system clock error: {0}")]
    ClockError(String),
}

pub type Result<T> = std::result::Result<T, SessionError>;
