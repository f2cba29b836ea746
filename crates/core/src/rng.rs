//! Deterministic RNG for the built-in engines.
//!
//! A plain LCG is enough to place targets and pick prompts; seeding it per
//! episode makes every episode reproducible from its seed.

/// Linear congruential generator with the Numerical Recipes constants
/// (a=1664525, c=1013904223, m=2^32).
#[derive(Debug, Clone)]
pub struct Lcg {
    state: u32,
}

impl Lcg {
    pub fn new(seed: u32) -> Self {
        // A zero state still advances under these constants, but keep the
        // first outputs from all landing near c.
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        self.state
    }

    /// Uniform-ish value in `[0, max)`. `max` of zero yields zero.
    pub fn next_below(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        // High bits of an LCG are better distributed than the low ones.
        ((self.next_u32() as u64 * max as u64) >> 32) as u32
    }
}
