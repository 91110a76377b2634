//! Fan-in of Session and Router events into the contribution tracker.
//!
//! A thin adapter: the event loop calls these methods as Sessions rise and
//! fall and as the Router resolves content requests, and the monitor
//! translates each into the corresponding [`ContributionTracker`] update.
//! It holds no state of its own.

use cashew_types::NodeId;

use crate::tracker::ContributionTracker;

pub struct ActivityMonitor<'a> {
    tracker: &'a mut ContributionTracker,
}

impl<'a> ActivityMonitor<'a> {
    pub fn new(tracker: &'a mut ContributionTracker) -> Self {
        Self { tracker }
    }

    pub fn on_session_established(&mut self, peer: NodeId, now: u64) {
        self.tracker.record_online(peer, now);
    }

    pub fn on_session_closed(&mut self, peer: NodeId, now: u64) {
        self.tracker.record_offline(peer, now);
    }

    pub fn on_bytes_sent(&mut self, peer: NodeId, bytes: u64, now: u64) {
        self.tracker.record_bytes_sent(peer, bytes, now);
    }

    pub fn on_bytes_received(&mut self, peer: NodeId, bytes: u64, now: u64) {
        self.tracker.record_bytes_received(peer, bytes, now);
    }

    pub fn on_bytes_routed(&mut self, peer: NodeId, bytes: u64, now: u64) {
        self.tracker.record_bytes_routed(peer, bytes, now);
    }

    pub fn on_content_hosted(&mut self, peer: NodeId, size_bytes: u64, now: u64) {
        self.tracker.record_hosted(peer, size_bytes, now);
    }

    pub fn on_content_removed(&mut self, peer: NodeId, size_bytes: u64, now: u64) {
        self.tracker.record_removed(peer, size_bytes, now);
    }

    pub fn on_route_outcome(&mut self, peer: NodeId, success: bool, now: u64) {
        if success {
            self.tracker.record_route_success(peer, now);
        } else {
            self.tracker.record_route_failure(peer, now);
        }
    }

    pub fn on_epoch_witnessed(&mut self, peer: NodeId, now: u64) {
        self.tracker.record_epoch_witnessed(peer, now);
    }

    pub fn on_epoch_missed(&mut self, peer: NodeId, now: u64) {
        self.tracker.record_epoch_missed(peer, now);
    }
}
