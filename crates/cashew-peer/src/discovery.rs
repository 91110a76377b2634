//! Bootstrap and discovered-peer bookkeeping.

use cashew_types::NodeId;

use crate::policy::BOOTSTRAP_SCORE_BONUS;

/// A peer configured at startup rather than learned through gossip.
/// `address`/`public_key` resolution is the external config loader's
/// concern; this crate only tracks what it needs for connection scoring.
#[derive(Clone, Debug)]
pub struct BootstrapNode {
    pub node_id: NodeId,
    pub address: String,
    pub description: String,
}

/// A peer learned via gossip (typically a `PeerAnnouncement`), tracked
/// purely by `NodeId` — the PeerManager never owns a `Session`.
#[derive(Clone, Debug)]
pub struct DiscoveredPeer {
    pub node_id: NodeId,
    pub last_seen: u64,
    pub connection_attempts: u32,
    pub successful_connections: u32,
    pub is_bootstrap: bool,
}

impl DiscoveredPeer {
    pub fn new(node_id: NodeId, now: u64, is_bootstrap: bool) -> Self {
        Self {
            node_id,
            last_seen: now,
            connection_attempts: 0,
            successful_connections: 0,
            is_bootstrap,
        }
    }

    /// Raw reliability: `successful / attempts`, optimistically 1.0 before
    /// any attempt has been made.
    pub fn raw_reliability(&self) -> f64 {
        if self.connection_attempts == 0 {
            1.0
        } else {
            self.successful_connections as f64 / self.connection_attempts as f64
        }
    }

    /// Reliability used for candidate scoring: bootstrap peers have their
    /// raw score compressed toward 1.0 (`0.5*raw + 0.5`) to resist
    /// transient flap bias; discovered peers use the raw score plus the
    /// flat bootstrap bonus where applicable.
    pub fn scored_reliability(&self) -> f64 {
        let raw = self.raw_reliability();
        if self.is_bootstrap {
            0.5 * raw + 0.5
        } else {
            raw
        }
    }

    /// Score used for ranking connection candidates: scored reliability
    /// plus the bootstrap bonus (the bonus and the compression are
    /// distinct effects — the compression resists flap bias, the bonus
    /// additionally favors bootstrap nodes at equal reliability).
    pub fn candidate_score(&self) -> f64 {
        let score = self.scored_reliability();
        if self.is_bootstrap {
            score + BOOTSTRAP_SCORE_BONUS
        } else {
            score
        }
    }

    pub fn is_stale(&self, now: u64, stale_after_secs: u64) -> bool {
        now.saturating_sub(self.last_seen) > stale_after_secs
    }

    pub fn record_attempt(&mut self, now: u64) {
        self.connection_attempts += 1;
        self.last_seen = now;
    }

    pub fn record_success(&mut self, now: u64) {
        self.successful_connections += 1;
        self.last_seen = now;
    }
}
