//! # cashew-gossip
//!
//! Epidemic message propagation between Cashew nodes: a bounded seen-cache
//! for deduplication, hop/age-bounded forwarding, and the canonical byte
//! encodings for the five announcement types.
//!
//! This crate never opens a socket. Forwarding and broadcast take the
//! candidate peer list and a [`transport::GossipTransport`] at the call
//! site, the same shape the send-side of the node wiring (`cashew-node`)
//! already uses for sessions — gossip has no business owning a peer set of
//! its own.

pub mod message;
pub mod protocol;
pub mod scheduler;
pub mod seen_cache;
pub mod transport;

pub use message::{GossipMessage, MessageType};
pub use protocol::{GossipOutcome, GossipProtocol};
pub use scheduler::GossipScheduler;
pub use seen_cache::SeenCache;
pub use transport::GossipTransport;

/// Errors produced by the gossip layer.
#[derive(Debug, thiserror::Error)]
pub enum GossipError {
    #[error(transparent)]
    Crypto(#[from] cashew_crypto::CryptoError),

    #[error(transparent)]
    Wire(#[from] cashew_types::wire::WireError),

    #[error("unsigned or unverifiable payload for message type {0:?}")]
    Unauthenticated(MessageType),

    #[error("unknown message type discriminant: {0}")]
    UnknownMessageType(u8),

    #[error("no handler registered for message type {0:?}")]
    NoHandler(MessageType),

    #[error("transport send to peer failed: {0}")]
    Transport(String),
}

pub type Result<T> = std::result::Result<T, GossipError>;

/// Maximum age, in seconds, before a gossip message is dropped.
pub const MESSAGE_MAX_AGE_SECS: u64 = 300;

/// Maximum hop count before a gossip message is dropped.
pub const MAX_HOP_COUNT: u8 = 10;

/// Default number of peers a message is forwarded to on acceptance.
pub const DEFAULT_FANOUT: usize = 3;

/// Interval at which the scheduler emits a self peer-announcement.
pub const PEER_ANNOUNCE_INTERVAL_SECS: u64 = 300;

/// Interval at which the scheduler emits a network state update.
pub const STATE_UPDATE_INTERVAL_SECS: u64 = 600;
