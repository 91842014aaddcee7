//! Seeded RNG for pair selection.
//!
//! The engine never touches ambient randomness. Same seed -> same run.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Create the deterministic RNG for one generation run.
pub fn run_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}
