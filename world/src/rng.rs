//! Seeded random stream driving maze generation.

use rand_core::{impls, Error, RngCore, SeedableRng};

const MIXING_INCREMENT: u32 = 0x6d2b_79f5;
const UNIT_SCALE: f64 = 4_294_967_296.0;

/// Deterministic 32-bit random stream.
///
/// The stream is a pure function of the seed and the number of draws, so the
/// same seed reproduces the same maze on every platform. Generation code draws
/// through [`MazeRng::next_unit`], [`MazeRng::below`] and [`MazeRng::chance`]
/// rather than through `rand`'s distribution machinery so results never depend
/// on how a particular `rand` release maps raw words onto ranges.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MazeRng {
    state: u32,
}

impl MazeRng {
    /// Creates a stream from the provided seed.
    #[must_use]
    pub const fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Advances the state by one mixing step and returns the raw word.
    pub fn next_word(&mut self) -> u32 {
        self.state = self.state.wrapping_add(MIXING_INCREMENT);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }

    /// Uniform sample in `[0, 1)`.
    pub fn next_unit(&mut self) -> f64 {
        f64::from(self.next_word()) / UNIT_SCALE
    }

    /// Uniform index in `0..bound`; returns zero for an empty range.
    pub fn below(&mut self, bound: usize) -> usize {
        if bound == 0 {
            return 0;
        }
        let scaled = (self.next_unit() * bound as f64) as usize;
        scaled.min(bound - 1)
    }

    /// Returns `true` with probability `probability`.
    pub fn chance(&mut self, probability: f64) -> bool {
        self.next_unit() < probability
    }

    /// Uniform signed offset in `-radius..=radius`.
    pub fn jitter(&mut self, radius: u32) -> i64 {
        let span = usize::try_from(radius).unwrap_or(0) * 2 + 1;
        self.below(span) as i64 - i64::from(radius)
    }

    /// Fisher–Yates shuffle driven by [`MazeRng::below`].
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for index in (1..items.len()).rev() {
            let swap_index = self.below(index + 1);
            items.swap(index, swap_index);
        }
    }
}

impl RngCore for MazeRng {
    fn next_u32(&mut self) -> u32 {
        self.next_word()
    }

    fn next_u64(&mut self) -> u64 {
        impls::next_u64_via_u32(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        impls::fill_bytes_via_next(self, dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for MazeRng {
    type Seed = [u8; 4];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u32::from_le_bytes(seed))
    }
}
