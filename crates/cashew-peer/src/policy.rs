//! Connection policy knobs.

/// Tunables governing how the [`crate::manager::PeerManager`] maintains its
/// connection set. `cashew-node`'s configuration layer may override any
/// of them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConnectionPolicy {
    /// Hard ceiling on simultaneous active connections.
    pub max_peers: usize,
    /// Steady-state connection count the maintenance loop tries to reach.
    pub target_peers: usize,
    /// Below this many active connections, maintenance is urgent.
    pub min_peers: usize,
    /// Ceiling on configured bootstrap nodes considered as candidates.
    pub max_bootstrap: usize,
    /// This core only ever dials out; it never accepts being the
    /// initiator's target for policy purposes (inbound handshakes are
    /// still accepted at the session layer regardless of this flag).
    pub outbound_only: bool,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub reconnect_delay_secs: u64,
    pub max_attempts: u32,
    /// Discovered peers scoring below this reliability are not selected
    /// as connection candidates.
    pub min_reliability: f64,
}

impl Default for ConnectionPolicy {
    fn default() -> Self {
        Self {
            max_peers: 50,
            target_peers: 20,
            min_peers: 5,
            max_bootstrap: 10,
            outbound_only: true,
            connect_timeout_secs: 30,
            idle_timeout_secs: 300,
            reconnect_delay_secs: 60,
            max_attempts: 5,
            min_reliability: 0.3,
        }
    }
}

/// Bonus added to a bootstrap node's reliability score during candidate
/// selection, so the initial connection set favors known-good nodes over
/// as-yet-unproven discovered peers.
pub const BOOTSTRAP_SCORE_BONUS: f64 = 0.5;

/// Discovered peers not seen for longer than this are purged by the
/// maintenance cycle. Reuses the routing table's staleness horizon
/// (`cashew-router::ROUTING_ENTRY_STALE_SECS`) rather than pinning a
/// separate constant.
pub const DISCOVERED_PEER_STALE_SECS: u64 = 3600;

/// Default interval between maintenance cycle invocations.
pub const MAINTENANCE_INTERVAL_SECS: u64 = 10;
