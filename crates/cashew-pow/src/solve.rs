//! Solving and verifying Proof-of-Work puzzles.

use std::time::Instant;

use rand::RngCore;

use crate::puzzle::{leading_zero_bits, puzzle_hash};
use crate::Result;

/// A solution to a [`crate::PowPuzzle`]: the nonce that produced a
/// qualifying hash, the hash itself, and how long it took to find.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PowSolution {
    pub hash: [u8; 32],
    pub nonce: u64,
    pub difficulty: u32,
    pub compute_time_ms: u64,
}

/// Yield to other tasks every this many attempts, so a long-running solve
/// never monopolizes the worker it's spawned on.
const YIELD_EVERY: u64 = 16;

/// Draw random nonces and compute `H(challenge, nonce)` until one meets
/// `difficulty`. Returns `None` if `max_attempts` is exceeded; `0` means
/// unbounded.
pub fn solve(challenge: &[u8], difficulty: u32, max_attempts: u64) -> Result<Option<PowSolution>> {
    let difficulty = crate::difficulty::clamp_difficulty(difficulty);
    let start = Instant::now();
    let mut rng = rand::thread_rng();
    let mut attempts: u64 = 0;

    loop {
        if max_attempts != 0 && attempts >= max_attempts {
            return Ok(None);
        }

        let nonce = rng.next_u64();
        let hash = puzzle_hash(challenge, nonce, difficulty)?;
        attempts += 1;

        if leading_zero_bits(&hash) >= difficulty {
            return Ok(Some(PowSolution {
                hash,
                nonce,
                difficulty,
                compute_time_ms: start.elapsed().as_millis() as u64,
            }));
        }

        if attempts % YIELD_EVERY == 0 {
            std::thread::yield_now();
        }
    }
}

/// Recompute `H` with the claimed nonce; accept iff the hash matches and
/// meets `difficulty`.
pub fn verify(challenge: &[u8], difficulty: u32, solution: &PowSolution) -> bool {
    if solution.difficulty != difficulty {
        return false;
    }
    match puzzle_hash(challenge, solution.nonce, difficulty) {
        Ok(hash) => hash == solution.hash && leading_zero_bits(&hash) >= difficulty,
        Err(_) => false,
    }
}
