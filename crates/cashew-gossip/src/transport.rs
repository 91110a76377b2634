//! Send-side abstraction gossip forwarding is built on.
//!
//! The underlying byte transport is treated as an external collaborator.
//! `GossipTransport` is the seam: the protocol logic in [`crate::protocol`]
//! only ever calls `send_to`, letting the node wiring (`cashew-node`) supply
//! an implementation backed by `cashew-session`'s `SessionManager` without
//! this crate depending on it.

use cashew_types::NodeId;

/// Delivers an already-encoded gossip envelope to one peer.
pub trait GossipTransport {
    /// Send `frame` to `peer`. Errors are logged by the caller and do not
    /// abort the remainder of a fan-out — one unreachable peer must not
    /// prevent delivery to the others.
    fn send_to(
        &self,
        peer: NodeId,
        frame: &[u8],
    ) -> impl std::future::Future<Output = std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>> + Send;
}
