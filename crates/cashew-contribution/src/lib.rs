//! # cashew-contribution
//!
//! Proof-of-Stake contribution accounting: per-node metrics, composite
//! scoring, and epoch-based key rewards, fed by the
//! [`monitor::ActivityMonitor`] fan-in from the Session and Router layers.
//!
//! ## Modules
//!
//! - [`tracker`] — per-node metric accounting and snapshotting
//! - [`scoring`] — the five-dimension weighted composite score
//! - [`reward`] — key-type selection and `KeyReward` emission
//! - [`engine`] — epoch processing, tying the above together
//! - [`monitor`] — fan-in of Session/Router events into the tracker

pub mod engine;
pub mod monitor;
pub mod reward;
pub mod scoring;
pub mod tracker;

pub use engine::ContributionEngine;
pub use monitor::ActivityMonitor;
pub use reward::{KeyEarningRate, KeyReward, KeyType};
pub use scoring::ScoreBreakdown;
pub use tracker::{ContributionTracker, MetricsSnapshot};

/// A node is considered an active contributor while its last-seen
/// timestamp is within this many seconds of now.
pub const ACTIVE_WINDOW_SECS: u64 = 300;

/// `cleanup_inactive_nodes` default absence threshold.
pub const DEFAULT_INACTIVE_THRESHOLD_SECS: u64 = 86_400;

/// Reference window for the uptime longevity bonus (approximately one
/// month).
pub const LONGEVITY_MONTH_SECS: u64 = 30 * 86_400;

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

#[derive(Debug, thiserror::Error)]
pub enum ContributionError {
    #[error("epoch {0} was already processed")]
    EpochAlreadyProcessed(u64),

    #[error("node not tracked: {0}")]
    NodeNotTracked(cashew_types::NodeId),
}

pub type Result<T> = std::result::Result<T, ContributionError>;
