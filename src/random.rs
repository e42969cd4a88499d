//! Seeded random source for jiggling coincident nodes.
//!
//! The only randomness in the engine is the tiny offset used when two nodes
//! sit at exactly the same coordinate. It comes from a linear congruential
//! generator so layouts are reproducible for a given seed.

const MULTIPLIER: u32 = 1_664_525;
const INCREMENT: u32 = 1_013_904_223;
const MODULUS: f64 = 4_294_967_296.0;

/// Default seed.
pub const DEFAULT_SEED: u32 = 1;

/// Linear congruential generator over `u32`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lcg {
    state: u32,
}

impl Lcg {
    /// Create a generator from a seed.
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Next value in [0, 1).
    #[inline]
    pub fn next_f64(&mut self) -> f64 {
        self.state = self
            .state
            .wrapping_mul(MULTIPLIER)
            .wrapping_add(INCREMENT);
        self.state as f64 / MODULUS
    }

    /// A tiny offset in [-5e-7, 5e-7).
    #[inline]
    pub fn jiggle(&mut self) -> f64 {
        (self.next_f64() - 0.5) * 1e-6
    }
}

impl Default for Lcg {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_is_reproducible() {
        let mut a = Lcg::new(7);
        let mut b = Lcg::new(7);
        for _ in 0..100 {
            assert_eq!(a.next_f64(), b.next_f64());
        }
    }

    #[test]
    fn test_first_value() {
        let mut rng = Lcg::default();
        // (1664525 * 1 + 1013904223) / 2^32
        assert_eq!(rng.next_f64(), 1_015_568_748.0 / MODULUS);
    }

    #[test]
    fn test_range() {
        let mut rng = Lcg::new(12345);
        for _ in 0..1000 {
            let value = rng.next_f64();
            assert!((0.0..1.0).contains(&value));
            assert!(rng.jiggle().abs() <= 5e-7);
        }
    }
}
