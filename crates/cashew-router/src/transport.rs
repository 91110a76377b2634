//! Send-side abstraction the router's forward/reply logic is built on.
//!
//! Mirrors [`cashew_gossip::transport::GossipTransport`]: the router never
//! opens a socket itself, so the node wiring can back this with
//! `cashew-session`'s `SessionManager` without a dependency cycle.

use cashew_types::NodeId;

/// Delivers an already-encoded router frame (an onion-wrapped
/// `ContentRequest`/`ContentResponse`, or a bare one for the final hop) to
/// one peer.
pub trait RouterTransport {
    /// Send `frame` to `peer`. Failure is reported to the caller, who
    /// decides whether to mark the peer unreliable or simply drop (e.g. a
    /// single unreachable forwarding hop must not crash request handling).
    fn send_to(
        &self,
        peer: NodeId,
        frame: &[u8],
    ) -> impl std::future::Future<Output = std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>> + Send;
}
