//! Ordered record of the calls observed on the real generator

use crate::error::SearchError;
use crate::filter::{CandidateFilter, Constraint};
use crate::prng::PrngModel;

/// Append-only list of observations plus their combined reduction factor.
///
/// The combined factor saturates at `u64::MAX`; once saturated the estimate
/// is 0 for any realistic space, which is what an overflowing product means.
#[derive(Debug)]
pub struct ObservationLedger<M> {
    filter: CandidateFilter<M>,
    reduction: u64,
}

impl<M: PrngModel> ObservationLedger<M> {
    pub fn new() -> Self {
        Self {
            filter: CandidateFilter::new(),
            reduction: 1,
        }
    }

    /// Append an observation that is expected to shrink a uniform population
    /// by `reduction_factor`. Rejected (and the ledger left untouched) unless
    /// the constraint validates and the factor is positive.
    pub fn record(
        &mut self,
        constraint: Box<dyn Constraint<M>>,
        reduction_factor: i64,
    ) -> Result<(), SearchError> {
        constraint.validate()?;
        if reduction_factor <= 0 {
            return Err(SearchError::InvalidObservation {
                reason: format!("reduction factor must be positive, got {reduction_factor}"),
            });
        }

        self.filter.push(constraint);
        self.reduction = self.reduction.saturating_mul(reduction_factor as u64);
        Ok(())
    }

    /// `full_space / product(factors)`.
    pub fn estimated_remaining(&self, full_space: u64) -> u64 {
        full_space / self.reduction
    }

    /// Product of every recorded factor (saturating).
    pub fn reduction(&self) -> u64 {
        self.reduction
    }

    /// Does a generator seeded with `seed` reproduce every observation?
    pub fn test(&self, seed: i64) -> bool {
        self.filter.accepts(seed)
    }

    /// Replay every observation on `rng`. On success the instance is
    /// positioned just after the last observed call.
    pub fn test_instance(&self, rng: &mut M) -> bool {
        self.filter.accepts_instance(rng)
    }

    pub fn count(&self) -> usize {
        self.filter.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filter.is_empty()
    }
}

impl<M: PrngModel> Default for ObservationLedger<M> {
    fn default() -> Self {
        Self::new()
    }
}
