//! Constraints on candidate seeds
//!
//! A constraint is one observed call on the real generator: it performs the
//! same call on a candidate instance and reports whether the outputs agree.
//! Constraints are only meaningful when replayed in call order against a
//! single streaming instance, which is what [`CandidateFilter`] does.

use crate::error::SearchError;
use crate::prng::PrngModel;
use std::fmt;

/// A single-step predicate over a generator instance.
///
/// Every implementation must consume exactly the calls the real program made,
/// even when it rejects, so later constraints line up with the output stream.
pub trait Constraint<M>: Send + Sync {
    fn accepts(&self, rng: &mut M) -> bool;

    /// Reject observations that could never have been produced, before they
    /// reach the ledger. `accepts` may assume this has passed.
    fn validate(&self) -> Result<(), SearchError> {
        Ok(())
    }
}

impl<M, F> Constraint<M> for F
where
    F: Fn(&mut M) -> bool + Send + Sync,
{
    fn accepts(&self, rng: &mut M) -> bool {
        self(rng)
    }
}

/// Which `nextDouble` derivation the target runtime uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoubleVariant {
    /// 26 + 27 bits, Java 1.5 onwards.
    Modern,
    /// 27 + 27 bits, earlier runtimes.
    Legacy,
}

/// A generator call whose result was not seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    NextInt,
    NextIntBounded(i32),
    NextLong,
    NextBoolean,
    NextFloat,
    NextDouble(DoubleVariant),
}

fn invalid(reason: String) -> SearchError {
    SearchError::InvalidObservation { reason }
}

fn check_bound(bound: i32) -> Result<(), SearchError> {
    if bound <= 0 {
        return Err(invalid(format!("bound must be positive, got {bound}")));
    }
    Ok(())
}

fn check_unit(value: f64) -> Result<(), SearchError> {
    if !(0.0..1.0).contains(&value) {
        return Err(invalid(format!("value {value} is outside [0, 1)")));
    }
    Ok(())
}

impl Call {
    pub fn validate(&self) -> Result<(), SearchError> {
        match *self {
            Call::NextIntBounded(bound) => check_bound(bound),
            _ => Ok(()),
        }
    }

    /// Perform the call, discarding its output.
    pub fn consume<M: PrngModel>(self, rng: &mut M) {
        match self {
            Call::NextInt => {
                rng.next_int();
            }
            Call::NextIntBounded(bound) => {
                rng.next_int_bounded(bound);
            }
            Call::NextLong => {
                rng.next_long();
            }
            Call::NextBoolean => {
                rng.next_boolean();
            }
            Call::NextFloat => {
                rng.next_float();
            }
            Call::NextDouble(DoubleVariant::Modern) => {
                rng.next_double();
            }
            Call::NextDouble(DoubleVariant::Legacy) => {
                rng.next_double_legacy();
            }
        }
    }
}

/// Built-in constraints covering the generator's output functions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Observed {
    NextInt(i32),
    NextIntBounded { value: i32, bound: i32 },
    NextLong(i64),
    NextBoolean(bool),
    NextFloat(f32),
    NextDouble { value: f64, variant: DoubleVariant },
    /// The call happened but its result is unknown.
    Unobserved(Call),
}

impl Observed {
    /// Bounds must be positive and values inside the call's range.
    pub fn validate(&self) -> Result<(), SearchError> {
        match *self {
            Observed::NextIntBounded { value, bound } => {
                check_bound(bound)?;
                if !(0..bound).contains(&value) {
                    return Err(invalid(format!("value {value} is outside [0, {bound})")));
                }
                Ok(())
            }
            Observed::NextFloat(value) => check_unit(value as f64),
            Observed::NextDouble { value, .. } => check_unit(value),
            Observed::Unobserved(call) => call.validate(),
            Observed::NextInt(_) | Observed::NextLong(_) | Observed::NextBoolean(_) => Ok(()),
        }
    }
}

impl<M: PrngModel> Constraint<M> for Observed {
    fn accepts(&self, rng: &mut M) -> bool {
        match *self {
            Observed::NextInt(v) => rng.next_int() == v,
            Observed::NextIntBounded { value, bound } => rng.next_int_bounded(bound) == value,
            Observed::NextLong(v) => rng.next_long() == v,
            Observed::NextBoolean(b) => rng.next_boolean() == b,
            Observed::NextFloat(f) => rng.next_float().to_bits() == f.to_bits(),
            Observed::NextDouble { value, variant } => {
                let actual = match variant {
                    DoubleVariant::Modern => rng.next_double(),
                    DoubleVariant::Legacy => rng.next_double_legacy(),
                };
                actual.to_bits() == value.to_bits()
            }
            Observed::Unobserved(call) => {
                call.consume(rng);
                true
            }
        }
    }

    fn validate(&self) -> Result<(), SearchError> {
        Observed::validate(self)
    }
}

/// Conjunction of constraints, evaluated in order on one fresh instance.
pub struct CandidateFilter<M> {
    constraints: Vec<Box<dyn Constraint<M>>>,
}

impl<M: PrngModel> CandidateFilter<M> {
    pub fn new() -> Self {
        Self {
            constraints: Vec::new(),
        }
    }

    pub fn push(&mut self, constraint: Box<dyn Constraint<M>>) {
        self.constraints.push(constraint);
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Instantiate the model from `seed` and replay every constraint.
    pub fn accepts(&self, seed: i64) -> bool {
        let mut rng = M::from_seed(seed);
        self.accepts_instance(&mut rng)
    }

    /// Replay every constraint on an existing instance. Stops at the first
    /// rejection, leaving the instance partially advanced.
    pub fn accepts_instance(&self, rng: &mut M) -> bool {
        self.constraints.iter().all(|c| c.accepts(rng))
    }
}

impl<M: PrngModel> Default for CandidateFilter<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> fmt::Debug for CandidateFilter<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CandidateFilter")
            .field("constraints", &self.constraints.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prng::{JavaRandom, MASK, MULTIPLIER};

    /// Scrambles to a state with no bits set.
    const GOOD_STARTING_SEED: i64 = MULTIPLIER;
    /// Scrambles to a state with every significant bit set.
    const BAD_STARTING_SEED: i64 = MASK ^ MULTIPLIER;

    #[test]
    fn test_empty_filter_accepts_everything() {
        let filter = CandidateFilter::<JavaRandom>::new();
        assert!(filter.accepts(GOOD_STARTING_SEED));
        assert!(filter.accepts(BAD_STARTING_SEED));
    }

    #[test]
    fn test_single_int_constraint() {
        let expected = JavaRandom::new(GOOD_STARTING_SEED).next_int();
        let constraint = Observed::NextInt(expected);

        assert!(constraint.accepts(&mut JavaRandom::new(GOOD_STARTING_SEED)));
        assert!(!constraint.accepts(&mut JavaRandom::new(BAD_STARTING_SEED)));
    }

    #[test]
    fn test_mixed_constraints_in_order() {
        let mut source = JavaRandom::new(GOOD_STARTING_SEED);
        let mut filter = CandidateFilter::<JavaRandom>::new();
        for _ in 0..10 {
            filter.push(Box::new(Observed::NextInt(source.next_int())));
            filter.push(Box::new(Observed::NextDouble {
                value: source.next_double(),
                variant: DoubleVariant::Modern,
            }));
        }
        filter.push(Box::new(Observed::NextFloat(source.next_float())));
        filter.push(Box::new(Observed::NextBoolean(source.next_boolean())));
        filter.push(Box::new(Observed::NextLong(source.next_long())));

        assert_eq!(filter.len(), 23);
        assert!(filter.accepts(GOOD_STARTING_SEED));
        assert!(!filter.accepts(BAD_STARTING_SEED));
    }

    #[test]
    fn test_order_matters() {
        let mut source = JavaRandom::new(7);
        let first = source.next_int();
        let second = source.next_int();

        let mut filter = CandidateFilter::<JavaRandom>::new();
        filter.push(Box::new(Observed::NextInt(second)));
        filter.push(Box::new(Observed::NextInt(first)));
        assert!(!filter.accepts(7));
    }

    #[test]
    fn test_unobserved_call_keeps_stream_aligned() {
        let mut source = JavaRandom::new(31);
        source.next_long();
        let after = source.next_int_bounded(6);

        let mut filter = CandidateFilter::<JavaRandom>::new();
        filter.push(Box::new(Observed::Unobserved(Call::NextLong)));
        filter.push(Box::new(Observed::NextIntBounded { value: after, bound: 6 }));
        assert!(filter.accepts(31));
    }

    #[test]
    fn test_legacy_double_variant() {
        let value = JavaRandom::new(5).next_double_legacy();
        let legacy = Observed::NextDouble { value, variant: DoubleVariant::Legacy };
        let modern = Observed::NextDouble { value, variant: DoubleVariant::Modern };

        assert!(legacy.accepts(&mut JavaRandom::new(5)));
        assert!(!modern.accepts(&mut JavaRandom::new(5)));
    }

    #[test]
    fn test_validate_rejects_impossible_observations() {
        let bad = [
            Observed::NextIntBounded { value: 0, bound: 0 },
            Observed::NextIntBounded { value: 6, bound: 6 },
            Observed::NextIntBounded { value: -1, bound: 6 },
            Observed::Unobserved(Call::NextIntBounded(-3)),
            Observed::NextFloat(1.0),
            Observed::NextDouble { value: f64::NAN, variant: DoubleVariant::Modern },
        ];
        for observed in bad {
            assert!(
                matches!(observed.validate(), Err(SearchError::InvalidObservation { .. })),
                "{observed:?} should be rejected"
            );
        }

        assert!(Observed::NextIntBounded { value: 5, bound: 6 }.validate().is_ok());
        assert!(Observed::Unobserved(Call::NextIntBounded(1)).validate().is_ok());
        assert!(Observed::NextDouble { value: 0.0, variant: DoubleVariant::Legacy }
            .validate()
            .is_ok());

        // Closures have nothing to check
        let closure = |_: &mut JavaRandom| true;
        assert!(Constraint::<JavaRandom>::validate(&closure).is_ok());
    }

    #[test]
    fn test_closures_are_constraints() {
        let expected = JavaRandom::new(11).next_int() % 4;
        let mut filter = CandidateFilter::<JavaRandom>::new();
        filter.push(Box::new(move |rng: &mut JavaRandom| rng.next_int() % 4 == expected));
        assert!(filter.accepts(11));
    }
}
