use crate::engine::SearchState;
use thiserror::Error;

/// Errors raised by the ledger and the search engine.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid observation: {reason}")]
    InvalidObservation { reason: String },

    #[error("engine has not fixated on a seed (state {state})")]
    NotFixed { state: SearchState },

    #[error("fixed seed {seed} no longer satisfies the {observations} recorded observations")]
    FixedSeedRejected { seed: i64, observations: usize },

    #[error("candidate window arithmetic overflowed in round {round}")]
    Overflow { round: u32 },

    #[error("search space exhausted: {rounds} rounds materialized without a surviving seed")]
    Exhausted { rounds: u32 },

    #[error("search halted after an earlier fault: {cause}")]
    Halted { cause: String },

    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("failed to build filtering thread pool")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl SearchError {
    /// Faults that end the search; everything else leaves the engine usable.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SearchError::Overflow { .. } | SearchError::Exhausted { .. } | SearchError::Halted { .. }
        )
    }
}
