//! Seedable pseudo-random numbers for the randomized lessons.
//!
//! The dots, squares and cactus field are generated from a [`Xorshift64`], so a lesson started
//! twice with the same seed draws the same scene.

use serde::{Deserialize, Serialize};

/// Xorshift64 generator with the (13, 7, 17) shift triple.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Xorshift64 {
    state: u64,
}

impl Xorshift64 {
    /// Zero is a fixed point of xorshift; it gets replaced by this seed.
    const FALLBACK_SEED: u64 = 0x5EED_DEAD_BEEF_CAFE;

    pub fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { Self::FALLBACK_SEED } else { seed },
        }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state
    }

    /// Uniform in `[0, 1)`, from the upper 53 bits.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform in `[0, 1)`.
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u32 << 24) as f32
    }

    /// Uniform in `[min, max)`.
    pub fn next_range(&mut self, min: f32, max: f32) -> f32 {
        min + self.next_f32() * (max - min)
    }

    /// `1.` or `-1.` with equal probability.
    pub fn next_sign(&mut self) -> f32 {
        if self.next_f32() > 0.5 {
            1.
        } else {
            -1.
        }
    }

    /// Opaque RGBA color with uniform channels.
    pub fn next_color(&mut self) -> [f32; 4] {
        [self.next_f32(), self.next_f32(), self.next_f32(), 1.]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn golden_value_for_seed_42() {
        let mut rng = Xorshift64::new(42);
        assert_eq!(rng.next_u64(), 45_454_805_674);
    }

    #[test]
    fn zero_seed_is_replaced() {
        let mut rng = Xorshift64::new(0);
        assert_ne!(rng.next_u64(), 0);
        assert_ne!(rng.next_u64(), 0);
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = Xorshift64::new(1234);
        let mut b = Xorshift64::new(1234);

        for i in 0..1000 {
            assert_eq!(a.next_u64(), b.next_u64(), "diverged at {i}");
        }
    }

    #[test]
    fn floats_stay_in_unit_interval() {
        let mut rng = Xorshift64::new(12345);

        for _ in 0..10_000 {
            assert!((0.0..1.0).contains(&rng.next_f32()));
            assert!((0.0..1.0).contains(&rng.next_f64()));
        }
    }

    #[test]
    fn range_bounds() {
        let mut rng = Xorshift64::new(9999);

        for _ in 0..10_000 {
            let v = rng.next_range(0.1, 2.);
            assert!((0.1..2.).contains(&v), "{v} out of [0.1, 2)");
        }
    }

    #[test]
    fn signs_are_unit_and_both_occur() {
        let mut rng = Xorshift64::new(7);
        let signs: Vec<f32> = (0..100).map(|_| rng.next_sign()).collect();

        assert!(signs.iter().all(|s| *s == 1. || *s == -1.));
        assert!(signs.contains(&1.));
        assert!(signs.contains(&-1.));
    }

    #[test]
    fn colors_are_opaque() {
        let mut rng = Xorshift64::new(3);

        for _ in 0..100 {
            let [r, g, b, a] = rng.next_color();
            assert_eq!(a, 1.);
            assert!([r, g, b].iter().all(|c| (0.0..1.0).contains(c)));
        }
    }
}
