//! Seed Oracle Core
//!
//! Recovers the seed of a time-seeded `java.util.Random`-style generator
//! from the outputs it has produced:
//! - Bit-exact generator model (`prng`)
//! - Observation ledger and candidate filters
//! - Time × uniquifier candidate enumeration
//! - The narrowing state machine (`engine`)

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod generator;
pub mod ledger;
pub mod prng;
pub mod uniquifier;

pub use config::SearchConfig;
pub use engine::{SearchEngine, SearchMetrics, SearchReport, SearchState};
pub use error::SearchError;
pub use filter::{Call, CandidateFilter, Constraint, DoubleVariant, Observed};
pub use generator::{CandidateGenerator, Direction, TimeWindow};
pub use ledger::ObservationLedger;
pub use prng::{JavaRandom, PrngModel};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
