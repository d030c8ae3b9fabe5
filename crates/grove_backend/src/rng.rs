//! Seedable random source shared by sampling and noise injection

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Generator threaded through every sampling path
pub type SimRng = ChaCha8Rng;

/// Generator from `seed`, or from OS entropy when `None`
pub fn seeded_rng(seed: Option<u64>) -> SimRng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}
