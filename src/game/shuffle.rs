use rand::prelude::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Source of the permutations used for dealing roles and policy cards.
///
/// The shuffler lives inside the game record, so its state is persisted
/// along with the rest of the game and every transition stays a pure
/// function of the stored snapshot.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub enum Shuffler {
    /// Uniform Fisher–Yates permutations driven by a seeded ChaCha8 stream.
    Seeded(ChaCha8Rng),
    /// Leaves every sequence in its original order; random picks return 0.
    Fixed,
}

impl Shuffler {
    /// Creates a seeded shuffler, drawing a seed from the OS if none is given.
    pub fn new(seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(|| rand::thread_rng().gen());
        Shuffler::Seeded(ChaCha8Rng::seed_from_u64(seed))
    }

    /// Permutes the items in place.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        match self {
            Shuffler::Seeded(rng) => items.shuffle(rng),
            Shuffler::Fixed => {}
        }
    }

    /// Returns a permutation of the given items.
    pub fn shuffled<T>(&mut self, mut items: Vec<T>) -> Vec<T> {
        self.shuffle(&mut items);
        items
    }

    /// Picks an index uniformly from `0..n`.
    pub fn pick(&mut self, n: usize) -> usize {
        match self {
            Shuffler::Seeded(rng) if n > 0 => rng.gen_range(0..n),
            _ => 0,
        }
    }
}
