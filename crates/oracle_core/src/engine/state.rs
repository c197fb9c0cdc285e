// state.rs - Search states and the transition function
//
// The state tag carries no data. Everything the transitions read or mutate
// (ledger, population, round, validation counter) lives in `SearchContext`,
// so a transition is a plain function of (state, event, context).

use super::SearchContext;
use crate::config::{TRANSITION_THRESHOLD, VALIDATION_ROUNDS};
use crate::error::SearchError;
use crate::prng::PrngModel;
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

/// Where the engine is in narrowing the seed space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SearchState {
    /// No candidates materialized; size is an estimate.
    Open,
    /// A concrete (possibly empty) population is being narrowed.
    Limited,
    /// One candidate remains and is being checked against further calls.
    Validating,
    /// The seed is known. Terminal.
    Fixed,
}

impl fmt::Display for SearchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SearchState::Open => "OPEN",
            SearchState::Limited => "LIMITED",
            SearchState::Validating => "VALIDATING",
            SearchState::Fixed => "FIXED",
        };
        f.write_str(name)
    }
}

/// Inputs to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Event {
    /// A call was appended to the ledger. `informative` is false for calls
    /// with a reduction factor of 1, which cannot distinguish candidates.
    Observed { informative: bool },
    /// Spare time to make progress without a new observation.
    Tick,
}

impl SearchState {
    /// Apply `event`, returning the next state.
    ///
    /// On error the caller keeps the previous state. A failed pass never
    /// installs a population, so the context still matches that state.
    pub(crate) fn on_event<M: PrngModel>(
        self,
        event: Event,
        cx: &mut SearchContext<M>,
    ) -> Result<SearchState, SearchError> {
        use SearchState::*;

        match (self, event) {
            (Open, Event::Observed { .. }) => {
                let estimate = cx.estimate();
                if estimate >= TRANSITION_THRESHOLD {
                    debug!(estimate, "estimate above transition threshold");
                    return Ok(Open);
                }
                cx.materialize_next_round()?;
                Ok(settle(cx))
            }
            (Limited, Event::Observed { .. }) => {
                if cx.population_len() > 0 {
                    cx.reduce();
                }
                if cx.population_len() == 0 {
                    cx.materialize_next_round()?;
                }
                Ok(settle(cx))
            }
            (Limited, Event::Tick) => {
                if cx.population_len() == 0 {
                    cx.materialize_next_round()?;
                }
                Ok(settle(cx))
            }
            (Validating, Event::Observed { informative }) => {
                cx.reduce();
                let Some(seed) = cx.lone_candidate() else {
                    warn!(
                        validated = cx.validation_round,
                        "lone candidate failed validation"
                    );
                    return Ok(Limited);
                };
                if informative {
                    cx.validation_round += 1;
                }
                if cx.validation_round >= VALIDATION_ROUNDS {
                    cx.fix(seed);
                    Ok(Fixed)
                } else {
                    Ok(Validating)
                }
            }
            (Open, Event::Tick) | (Validating, Event::Tick) | (Fixed, _) => Ok(self),
        }
    }
}

/// State implied by a freshly narrowed or materialized population.
fn settle<M: PrngModel>(cx: &mut SearchContext<M>) -> SearchState {
    if cx.population_len() == 1 {
        cx.validation_round = 0;
        SearchState::Validating
    } else {
        SearchState::Limited
    }
}
