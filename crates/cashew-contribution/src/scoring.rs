//! Five-dimension weighted composite contribution score.
//!
//! Modeled on the PoSrv weighted-composite pattern (a bounded-per-dimension
//! score, summed with fixed weights), generalized from four dimensions to
//! five and from fractional inputs to the raw counters
//! [`crate::tracker::MetricsSnapshot`] accumulates.

use crate::tracker::MetricsSnapshot;
use crate::{GIB, LONGEVITY_MONTH_SECS};

pub const W_UPTIME: f64 = 0.30;
pub const W_BANDWIDTH: f64 = 0.25;
pub const W_STORAGE: f64 = 0.25;
pub const W_ROUTING: f64 = 0.15;
pub const W_WITNESS: f64 = 0.05;

/// Per-dimension and total composite contribution score.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScoreBreakdown {
    pub uptime: f64,
    pub bandwidth: f64,
    pub storage: f64,
    pub routing: f64,
    pub witness: f64,
    pub total: f64,
}

/// Compute the composite score for a node's metrics snapshot.
pub fn compute_score(snapshot: &MetricsSnapshot) -> ScoreBreakdown {
    let reliability = snapshot.routing_reliability();

    let uptime_pct = if snapshot.first_seen < snapshot.last_seen || snapshot.uptime_secs > 0 {
        let lifetime = snapshot
            .last_seen
            .saturating_sub(snapshot.first_seen)
            .max(1);
        (snapshot.uptime_secs as f64 * 100.0 / lifetime as f64).min(100.0)
    } else {
        100.0
    };
    let longevity_bonus = (snapshot.uptime_secs as f64 * 100.0 / LONGEVITY_MONTH_SECS as f64).min(100.0);
    let uptime = (uptime_pct + longevity_bonus) * W_UPTIME;

    let bandwidth = (snapshot.bytes_routed as f64 / GIB).min(200.0) * W_BANDWIDTH;

    let storage_raw = 10.0 * snapshot.things_hosted as f64 + snapshot.storage_bytes as f64 / GIB;
    let storage = storage_raw.min(200.0) * W_STORAGE;

    let routing = (snapshot.successful_routes as f64).min(100.0) * reliability * W_ROUTING;

    let epoch_total = snapshot.epochs_witnessed + snapshot.epochs_missed;
    let witness = if epoch_total == 0 {
        0.0
    } else {
        (snapshot.epochs_witnessed as f64 * 100.0 / epoch_total as f64) * W_WITNESS
    };

    ScoreBreakdown {
        uptime,
        bandwidth,
        storage,
        routing,
        witness,
        total: uptime + bandwidth + storage + routing + witness,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> MetricsSnapshot {
        MetricsSnapshot {
            first_seen: 0,
            last_seen: LONGEVITY_MONTH_SECS,
            uptime_secs: LONGEVITY_MONTH_SECS,
            bytes_sent: 0,
            bytes_received: 0,
            bytes_routed: 0,
            things_hosted: 0,
            storage_bytes: 0,
            successful_routes: 0,
            failed_routes: 0,
            epochs_witnessed: 0,
            epochs_missed: 0,
        }
    }

    #[test]
    fn test_weights_sum_to_one() {
        let total = W_UPTIME + W_BANDWIDTH + W_STORAGE + W_ROUTING + W_WITNESS;
        assert!((total - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_full_month_uptime_caps_both_uptime_terms() {
        let breakdown = compute_score(&snapshot());
        // uptime_pct = 100 (online the entire lifetime), longevity_bonus = 100.
        assert!((breakdown.uptime - 60.0).abs() < 0.001);
    }

    #[test]
    fn test_bandwidth_capped_at_200() {
        let mut s = snapshot();
        s.bytes_routed = (1000.0 * GIB) as u64;
        let breakdown = compute_score(&s);
        assert!((breakdown.bandwidth - 200.0 * W_BANDWIDTH).abs() < 0.001);
    }

    #[test]
    fn test_storage_combines_count_and_bytes() {
        let mut s = snapshot();
        s.things_hosted = 5;
        s.storage_bytes = 0;
        let breakdown = compute_score(&s);
        // 10*5 = 50, capped at 200, weighted 0.25.
        assert!((breakdown.storage - 50.0 * W_STORAGE).abs() < 0.001);
    }

    #[test]
    fn test_routing_scaled_by_reliability() {
        let mut s = snapshot();
        s.successful_routes = 50;
        s.failed_routes = 50;
        let breakdown = compute_score(&s);
        // min(100, 50) * 0.5 reliability * 0.15
        assert!((breakdown.routing - 50.0 * 0.5 * W_ROUTING).abs() < 0.001);
    }

    #[test]
    fn test_witness_zero_when_no_epochs_observed() {
        let breakdown = compute_score(&snapshot());
        assert_eq!(breakdown.witness, 0.0);
    }

    #[test]
    fn test_witness_ratio_of_witnessed_to_total() {
        let mut s = snapshot();
        s.epochs_witnessed = 9;
        s.epochs_missed = 1;
        let breakdown = compute_score(&s);
        assert!((breakdown.witness - 90.0 * W_WITNESS).abs() < 0.001);
    }

    #[test]
    fn test_total_is_sum_of_dimensions() {
        let mut s = snapshot();
        s.bytes_routed = GIB as u64;
        s.things_hosted = 2;
        s.successful_routes = 10;
        s.epochs_witnessed = 5;
        let breakdown = compute_score(&s);
        let sum = breakdown.uptime + breakdown.bandwidth + breakdown.storage + breakdown.routing + breakdown.witness;
        assert!((breakdown.total - sum).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_metrics_zero_score_except_uptime_default() {
        let s = MetricsSnapshot {
            first_seen: 1000,
            last_seen: 1000,
            uptime_secs: 0,
            bytes_sent: 0,
            bytes_received: 0,
            bytes_routed: 0,
            things_hosted: 0,
            storage_bytes: 0,
            successful_routes: 0,
            failed_routes: 0,
            epochs_witnessed: 0,
            epochs_missed: 0,
        };
        let breakdown = compute_score(&s);
        assert_eq!(breakdown.bandwidth, 0.0);
        assert_eq!(breakdown.storage, 0.0);
        assert_eq!(breakdown.routing, 0.0);
        assert_eq!(breakdown.witness, 0.0);
    }

    #[test]
    fn test_mixed_metrics_score_is_deterministic_and_reproducible() {
        let s = MetricsSnapshot {
            first_seen: 0,
            last_seen: LONGEVITY_MONTH_SECS / 2,
            uptime_secs: LONGEVITY_MONTH_SECS / 2,
            bytes_sent: 0,
            bytes_received: 0,
            bytes_routed: 100 * (GIB as u64),
            things_hosted: 5,
            storage_bytes: 20 * (GIB as u64),
            successful_routes: 80,
            failed_routes: 20,
            epochs_witnessed: 9,
            epochs_missed: 1,
        };
        let first = compute_score(&s);
        let second = compute_score(&s);
        assert_eq!(first, second);
        assert!((first.uptime - 45.0).abs() < 1e-9);
        assert!((first.bandwidth - 25.0).abs() < 1e-9);
        assert!((first.storage - 17.5).abs() < 1e-9);
        assert!((first.routing - 9.6).abs() < 1e-9);
        assert!((first.witness - 4.5).abs() < 1e-9);
        assert!((first.total - 101.6).abs() < 1e-9);
    }
}
