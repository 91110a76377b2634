//! Adaptive difficulty adjustment and hashrate benchmarking.

use std::time::Instant;

use rand::RngCore;

use crate::puzzle::{leading_zero_bits, puzzle_hash};

pub const MIN_DIFFICULTY: u32 = 4;
pub const MAX_DIFFICULTY: u32 = 32;

/// Target solve time a well-behaved solver should land near.
pub const TARGET_SOLVE_MS: u64 = 600_000;

pub fn clamp_difficulty(difficulty: u32) -> u32 {
    difficulty.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
}

/// Given the previous solve time and the difficulty that produced it,
/// decide the next difficulty: ease up if solves came in under half the
/// target, tighten if they took more than double, otherwise hold steady.
pub fn adjust_difficulty(previous_solve_time_ms: u64, current_difficulty: u32) -> u32 {
    if previous_solve_time_ms < TARGET_SOLVE_MS / 2 {
        clamp_difficulty(current_difficulty.saturating_add(1))
    } else if previous_solve_time_ms > TARGET_SOLVE_MS * 2 {
        current_difficulty.saturating_sub(1).max(MIN_DIFFICULTY)
    } else {
        current_difficulty
    }
}

/// Run the solve-loop at the lowest difficulty tier for `duration_ms` and
/// return a rough hashes-per-second estimate.
pub fn benchmark_hashrate(duration_ms: u64) -> crate::Result<f64> {
    let challenge = b"cashew-pow-benchmark";
    let start = Instant::now();
    let mut rng = rand::thread_rng();
    let mut attempts: u64 = 0;

    while start.elapsed().as_millis() < duration_ms as u128 {
        let nonce = rng.next_u64();
        let hash = puzzle_hash(challenge, nonce, MIN_DIFFICULTY)?;
        // Keep the result observed so the optimizer can't elide the hash.
        let _ = leading_zero_bits(&hash);
        attempts += 1;
    }

    let elapsed_ms = start.elapsed().as_millis().max(1) as f64;
    Ok(attempts as f64 * 1000.0 / elapsed_ms)
}

/// Map a benchmarked hashrate to a starting difficulty tier.
pub fn starting_difficulty_for_hashrate(hashes_per_sec: f64) -> u32 {
    if hashes_per_sec < 10.0 {
        MIN_DIFFICULTY
    } else if hashes_per_sec < 50.0 {
        MIN_DIFFICULTY + 2
    } else if hashes_per_sec < 100.0 {
        MIN_DIFFICULTY + 4
    } else {
        MIN_DIFFICULTY + 6
    }
}
