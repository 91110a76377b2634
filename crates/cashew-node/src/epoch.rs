//! Epoch boundary timing used to batch key rewards and PoW puzzles.
//!
//! Epochs are externally agreed timestamps, not BFT-ordered: every node
//! derives the same epoch index from `now` alone via integer division,
//! at a fixed 10-minute granularity.

use cashew_types::EPOCH_DURATION_SECS;

/// The epoch index containing `now`.
pub fn current_epoch(now: u64) -> u64 {
    now / EPOCH_DURATION_SECS
}

/// Seconds remaining until the next epoch boundary strictly after `now`.
pub fn seconds_until_next_epoch(now: u64) -> u64 {
    EPOCH_DURATION_SECS - (now % EPOCH_DURATION_SECS)
}

/// Tracks the last epoch this node processed, so the event loop can ask
/// "is a new epoch due" once per tick without re-deriving the index
/// itself or risking a double-call into
/// `ContributionEngine::process_epoch` (which would reject it anyway, but
/// the caller should not rely on that for normal operation).
pub struct EpochScheduler {
    last_processed: Option<u64>,
}

impl EpochScheduler {
    pub fn new() -> Self {
        Self { last_processed: None }
    }

    /// If `now` falls in an epoch not yet processed, returns its index
    /// and marks it processed. Returns `None` otherwise.
    pub fn poll(&mut self, now: u64) -> Option<u64> {
        let epoch = current_epoch(now);
        if self.last_processed == Some(epoch) {
            return None;
        }
        self.last_processed = Some(epoch);
        Some(epoch)
    }

    pub fn last_processed(&self) -> Option<u64> {
        self.last_processed
    }
}

impl Default for EpochScheduler {
    fn default() -> Self {
        Self::new()
    }
}
