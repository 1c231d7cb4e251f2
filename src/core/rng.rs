//! Deterministic random number generation for matches.
//!
//! Same seed, same draws, deals and coin flips. Multiplayer peers never
//! share a seed; randomness a move depends on is baked into the move
//! payload instead (see `CardInstance::resolved_stat`).
//!
//! ```
//! use duelogue::core::GameRng;
//!
//! let mut a = GameRng::new(42);
//! let mut b = GameRng::new(42);
//! assert_eq!(a.gen_range_usize(0..100), b.gen_range_usize(0..100));
//! ```

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::stats::Stat;

/// Deterministic RNG backed by ChaCha8.
#[derive(Clone, Debug)]
pub struct GameRng {
    inner: ChaCha8Rng,
}

impl GameRng {
    /// Create a new RNG with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Uniform float in `[0, 1)`.
    pub fn gen_f64(&mut self) -> f64 {
        self.inner.gen::<f64>()
    }

    /// `true` with the given probability.
    ///
    /// Probabilities below 0 never fire and above 1 always fire; stat
    /// weights leave `[0, 1]` once stats go negative.
    pub fn chance(&mut self, probability: f64) -> bool {
        self.gen_f64() < probability
    }

    /// Generate a random usize in the given range.
    pub fn gen_range_usize(&mut self, range: std::ops::Range<usize>) -> usize {
        self.inner.gen_range(range)
    }

    /// Fair coin flip.
    pub fn coin_flip(&mut self) -> bool {
        self.gen_f64() > 0.5
    }

    /// Coin flip between the two stats (heads = logic).
    pub fn pick_stat(&mut self) -> Stat {
        if self.coin_flip() {
            Stat::Logic
        } else {
            Stat::Emotion
        }
    }

    /// Choose a random element from a slice.
    #[must_use]
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        use rand::seq::SliceRandom;
        slice.choose(&mut self.inner)
    }

    /// Choose a random index into a collection of `len` elements.
    pub fn choose_index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            None
        } else {
            Some(self.gen_range_usize(0..len))
        }
    }
}
