//! Bit-exact model of the `java.util.Random` linear congruential generator
//!
//! The search engine only talks to generators through [`PrngModel`]; the
//! `JavaRandom` implementation reproduces the 48-bit LCG including its
//! constructor scramble and every output derivation.

/// LCG multiplier (also the constructor scramble constant).
pub const MULTIPLIER: i64 = 0x5DEE_CE66D;
/// LCG additive increment.
pub const ADDEND: i64 = 0xB;
/// 48-bit state mask.
pub const MASK: i64 = (1 << 48) - 1;

const DOUBLE_UNIT: f64 = 1.0 / (1u64 << 53) as f64;
const LEGACY_DOUBLE_UNIT: f64 = 1.0 / (1u64 << 54) as f64;
const FLOAT_UNIT: f32 = 1.0 / (1u32 << 24) as f32;

/// Capability interface over a seedable generator.
///
/// Implementors provide construction from a raw seed and the raw bit source;
/// every output function is derived from `next_bits` exactly the way
/// `java.util.Random` derives it, so a model only overrides them when the
/// generator under study differs.
pub trait PrngModel: Sized + Send + Sync {
    /// Build an instance exactly as the target's seeded constructor would.
    fn from_seed(seed: i64) -> Self;

    /// Advance the state once and return the top `bits` bits (1..=32).
    fn next_bits(&mut self, bits: u32) -> i32;

    fn next_int(&mut self) -> i32 {
        self.next_bits(32)
    }

    /// Uniform value in `[0, bound)`.
    ///
    /// # Panics
    /// Panics if `bound <= 0`.
    fn next_int_bounded(&mut self, bound: i32) -> i32 {
        assert!(bound > 0, "bound must be positive, got {bound}");

        if bound & (bound - 1) == 0 {
            return ((bound as i64 * self.next_bits(31) as i64) >> 31) as i32;
        }

        // Rejection loop relies on 32-bit wraparound to detect the biased tail
        loop {
            let bits = self.next_bits(31);
            let val = bits % bound;
            if bits.wrapping_sub(val).wrapping_add(bound - 1) >= 0 {
                return val;
            }
        }
    }

    fn next_long(&mut self) -> i64 {
        let high = self.next_bits(32) as i64;
        let low = self.next_bits(32) as i64;
        (high << 32).wrapping_add(low)
    }

    fn next_boolean(&mut self) -> bool {
        self.next_bits(1) != 0
    }

    fn next_float(&mut self) -> f32 {
        self.next_bits(24) as f32 * FLOAT_UNIT
    }

    /// `nextDouble` as shipped since Java 1.5 (26 + 27 bits).
    fn next_double(&mut self) -> f64 {
        let high = self.next_bits(26) as i64;
        let low = self.next_bits(27) as i64;
        ((high << 27) + low) as f64 * DOUBLE_UNIT
    }

    /// The pre-1.5 `nextDouble`, which consumes 27 + 27 bits.
    fn next_double_legacy(&mut self) -> f64 {
        let high = self.next_bits(27) as i64;
        let low = self.next_bits(27) as i64;
        ((high << 27) + low) as f64 * LEGACY_DOUBLE_UNIT
    }
}

/// Apply the constructor scramble. The transform is its own inverse on the
/// low 48 bits.
#[inline]
pub fn scramble(seed: i64) -> i64 {
    (seed ^ MULTIPLIER) & MASK
}

/// A faithful reproduction of `java.util.Random`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JavaRandom {
    state: i64,
}

impl JavaRandom {
    pub fn new(seed: i64) -> Self {
        Self {
            state: scramble(seed),
        }
    }

    /// Current scrambled 48-bit state.
    pub fn state(&self) -> i64 {
        self.state
    }
}

impl PrngModel for JavaRandom {
    fn from_seed(seed: i64) -> Self {
        Self::new(seed)
    }

    #[inline]
    fn next_bits(&mut self, bits: u32) -> i32 {
        debug_assert!((1..=32).contains(&bits));
        self.state = self.state.wrapping_mul(MULTIPLIER).wrapping_add(ADDEND) & MASK;
        (self.state >> (48 - bits)) as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Reference outputs captured from the JDK.

    #[test]
    fn test_scramble_is_an_involution() {
        for seed in [0i64, 1, -1, 0x1234_5678_9ABC, i64::MIN] {
            assert_eq!(scramble(scramble(seed)), seed & MASK);
        }
        assert_eq!(JavaRandom::new(MULTIPLIER).state(), 0);
    }

    #[test]
    fn test_next_int_bounded_matches_jdk() {
        let mut rng = JavaRandom::new(0);
        let expected = [60, 48, 29, 47, 15, 53, 91, 61, 19, 54];
        for &e in &expected {
            assert_eq!(rng.next_int_bounded(100), e);
        }
    }

    #[test]
    fn test_next_long_matches_jdk() {
        let mut rng = JavaRandom::new(0);
        assert_eq!(rng.next_long(), -4962768465676381896);
        assert_eq!(rng.next_long(), 4437113781045784766);
    }

    #[test]
    fn test_next_double_matches_jdk() {
        let mut rng = JavaRandom::new(0);
        assert_eq!(rng.next_double(), 0.730967787376657);
        assert_eq!(rng.next_double(), 0.24053641567148587);
    }

    #[test]
    fn test_legacy_double_consumes_an_extra_bit() {
        let mut modern = JavaRandom::new(99);
        let mut legacy = JavaRandom::new(99);
        let m = modern.next_double();
        let l = legacy.next_double_legacy();

        // Both land in [0, 1) and agree to within the dropped low bits
        assert!((0.0..1.0).contains(&l));
        assert!((m - l).abs() < 1e-7);
        // Each variant made exactly two state steps
        assert_eq!(modern.state(), legacy.state());
    }

    #[test]
    fn test_power_of_two_bound_uses_high_bits() {
        let mut a = JavaRandom::new(12345);
        let mut b = JavaRandom::new(12345);
        for _ in 0..32 {
            let expected = ((8i64 * b.next_bits(31) as i64) >> 31) as i32;
            assert_eq!(a.next_int_bounded(8), expected);
        }
    }

    #[test]
    fn test_rejection_loop_handles_large_bounds() {
        let bound = (1 << 30) + 1;
        let mut rng = JavaRandom::new(-7);
        for _ in 0..1_000 {
            let v = rng.next_int_bounded(bound);
            assert!((0..bound).contains(&v));
        }
    }

    #[test]
    fn test_outputs_stay_in_range() {
        let mut rng = JavaRandom::new(42);
        for _ in 0..1_000 {
            let f = rng.next_float();
            assert!((0.0..1.0).contains(&f));
            let d = rng.next_double();
            assert!((0.0..1.0).contains(&d));
        }
    }

    #[test]
    #[should_panic(expected = "bound must be positive")]
    fn test_zero_bound_panics() {
        JavaRandom::new(0).next_int_bounded(0);
    }
}
