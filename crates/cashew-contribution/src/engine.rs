//! Epoch processing: snapshot metrics, score, and emit key rewards.

use std::collections::HashSet;

use crate::reward::{determine_reward, KeyReward};
use crate::scoring::compute_score;
use crate::tracker::ContributionTracker;
use crate::{ContributionError, Result};

/// Owns the [`ContributionTracker`] and drives epoch-boundary reward
/// calculation. `process_epoch` must be invoked at most once per epoch
/// index by the caller; a repeat call for an already-processed epoch is
/// rejected rather than silently re-emitting rewards.
pub struct ContributionEngine {
    tracker: ContributionTracker,
    processed_epochs: HashSet<u64>,
}

impl ContributionEngine {
    pub fn new() -> Self {
        Self {
            tracker: ContributionTracker::new(),
            processed_epochs: HashSet::new(),
        }
    }

    pub fn tracker(&self) -> &ContributionTracker {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut ContributionTracker {
        &mut self.tracker
    }

    /// Snapshot every active contributor's metrics as of `now`, score
    /// them, and emit the key rewards each earns for `epoch`.
    pub fn process_epoch(&mut self, epoch: u64, now: u64) -> Result<Vec<KeyReward>> {
        if !self.processed_epochs.insert(epoch) {
            return Err(ContributionError::EpochAlreadyProcessed(epoch));
        }

        let mut rewards = Vec::new();
        for node_id in self.tracker.active_contributors(now) {
            let Some(snapshot) = self.tracker.get_metrics(node_id, now) else {
                continue;
            };
            let score = compute_score(&snapshot);
            if let Some(reward) = determine_reward(node_id, epoch, &snapshot, &score) {
                tracing::debug!(node = %node_id, epoch, key_count = reward.key_count, "contribution reward emitted");
                rewards.push(reward);
            }
        }
        Ok(rewards)
    }

    pub fn is_epoch_processed(&self, epoch: u64) -> bool {
        self.processed_epochs.contains(&epoch)
    }
}

impl Default for ContributionEngine {
    fn default() -> Self {
        Self::new()
    }
}
