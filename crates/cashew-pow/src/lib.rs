//! # cashew-pow
//!
//! Memory-hard Proof-of-Work puzzles, used to rate-limit
//! costly operations (session establishment under load, identity
//! registration) without a central gatekeeper.
//!
//! ## Modules
//!
//! - [`puzzle`] — puzzle construction and the puzzle-hash function
//! - [`solve`] — solving and verifying puzzles
//! - [`difficulty`] — adaptive difficulty adjustment and hashrate benchmarking

pub mod difficulty;
pub mod puzzle;
pub mod solve;

pub use difficulty::{
    adjust_difficulty, benchmark_hashrate, clamp_difficulty, starting_difficulty_for_hashrate,
    MAX_DIFFICULTY, MIN_DIFFICULTY, TARGET_SOLVE_MS,
};
pub use puzzle::PowPuzzle;
pub use solve::{solve, verify, PowSolution};

#[derive(Debug, thiserror::Error)]
pub enum PowError {
    #[error("crypto error: {0}")]
    Crypto(#[from] cashew_crypto::CryptoError),
}

pub type Result<T> = std::result::Result<T, PowError>;
