//! Periodic self-announcement timing.
//!
//! `GossipScheduler` holds no clock and spawns no task itself — it is a
//! plain due/not-due decision the node's event loop consults on each tick,
//! the same explicit-`now` style used throughout this workspace so the
//! logic is deterministic and testable without real time.

use crate::{PEER_ANNOUNCE_INTERVAL_SECS, STATE_UPDATE_INTERVAL_SECS};

/// Tracks when the self peer-announcement and network-state-update were
/// last emitted, and reports whether either is due.
pub struct GossipScheduler {
    last_peer_announce: u64,
    last_state_update: u64,
    peer_announce_interval: u64,
    state_update_interval: u64,
}

impl GossipScheduler {
    pub fn new(now: u64) -> Self {
        Self::with_intervals(now, PEER_ANNOUNCE_INTERVAL_SECS, STATE_UPDATE_INTERVAL_SECS)
    }

    pub fn with_intervals(now: u64, peer_announce_interval: u64, state_update_interval: u64) -> Self {
        Self {
            last_peer_announce: now,
            last_state_update: now,
            peer_announce_interval,
            state_update_interval,
        }
    }

    pub fn peer_announce_due(&self, now: u64) -> bool {
        now.saturating_sub(self.last_peer_announce) >= self.peer_announce_interval
    }

    pub fn state_update_due(&self, now: u64) -> bool {
        now.saturating_sub(self.last_state_update) >= self.state_update_interval
    }

    pub fn mark_peer_announced(&mut self, now: u64) {
        self.last_peer_announce = now;
    }

    pub fn mark_state_updated(&mut self, now: u64) {
        self.last_state_update = now;
    }
}
