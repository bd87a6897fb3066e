//! Random source construction.

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Creates a deterministic RNG from a seed.
pub fn create_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Creates an RNG from an optional seed, drawing a fresh seed when absent.
pub fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => create_rng(s),
        None => create_rng(rand::random()),
    }
}
