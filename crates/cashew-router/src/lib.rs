//! # cashew-router
//!
//! Content-addressed routing: the routing table and content index, host
//! selection, the `ContentRequest`/`ContentResponse` wire types, and the
//! onion-aware request/response router that ties them together.
//!
//! Like `cashew-gossip`, this crate never opens a socket — forwarding
//! takes a [`transport::RouterTransport`] at the call site so the node
//! wiring can back it with `cashew-session` without a dependency cycle.
//!
//! ## Modules
//!
//! - [`entry`] — `RoutingEntry` / `RoutingTable` / `ContentIndex`
//! - [`host_selection`] — scoring and selecting hosts for a content hash
//! - [`message`] — `ContentRequest` / `ContentResponse` wire encoding
//! - [`pending`] — `PendingRequest` tracking and the per-request return table
//! - [`transport`] — send-side abstraction
//! - [`router`] — the `Router` that dispatches incoming requests/responses

pub mod entry;
pub mod host_selection;
pub mod message;
pub mod pending;
pub mod router;
pub mod transport;

pub use entry::{RoutingEntry, RoutingTable};
pub use message::{ContentRequest, ContentResponse};
pub use pending::{PendingRequest, PendingRequestTable};
pub use router::{ContentStore, DropReason, Router, RequestOutcome, ResponseOutcome};
pub use transport::RouterTransport;

/// `RoutingEntry`s not refreshed within this many seconds are stale.
pub const ROUTING_ENTRY_STALE_SECS: u64 = 3600;

/// Hosts scored below this reliability are skipped during selection.
pub const MIN_HOST_RELIABILITY: f64 = 0.3;

/// Ceiling on `ContentRequest::hop_limit`.
pub const MAX_HOP_LIMIT: u8 = 16;

/// A `PendingRequest` older than this is timed out.
pub const PENDING_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Exponential-moving-average step applied to a host's reliability on
/// both successful delivery (toward 1.0) and hash-mismatch (toward 0.0).
pub const RELIABILITY_EMA_FACTOR: f64 = 0.3;

#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error(transparent)]
    Crypto(#[from] cashew_crypto::CryptoError),

    #[error(transparent)]
    Wire(#[from] cashew_types::wire::WireError),

    #[error(transparent)]
    Onion(#[from] cashew_onion::OnionError),

    #[error("content data does not hash to the claimed content_hash")]
    ContentHashMismatch,

    #[error("transport send to peer failed: {0}")]
    Transport(String),
}

pub type Result<T> = std::result::Result<T, RouterError>;

/// Move `current` toward `target` by [`RELIABILITY_EMA_FACTOR`].
pub(crate) fn ema_step(current: f64, target: f64) -> f64 {
    current + RELIABILITY_EMA_FACTOR * (target - current)
}
