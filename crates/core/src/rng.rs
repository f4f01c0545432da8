use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

/// Source of the random draws the prize engine and the reveal sequencer make.
pub trait Randomness {
    /// Uniform index in `0..bound`. `bound` is never zero.
    fn index(&mut self, bound: usize) -> usize;
    /// Uniform permutation in place.
    fn shuffle<T>(&mut self, items: &mut [T]);
    /// Uniform value in `[0, 1)`.
    fn unit(&mut self) -> f64;
}

#[derive(Debug, Clone)]
pub struct RngState {
    seed: u64,
    rng: StdRng,
}

impl RngState {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self::from_seed(rand::random())
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl Randomness for RngState {
    fn index(&mut self, bound: usize) -> usize {
        self.rng.gen_range(0..bound)
    }

    fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }

    fn unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}
