//! The seed oracle
//!
//! A `SearchEngine` is fed every call made on the generator under study, in
//! program order. While the remaining space is huge it only estimates; once
//! the estimate drops under [`TRANSITION_THRESHOLD`] it enumerates a window of
//! candidates, filters them against the ledger in parallel, and narrows the
//! survivors with each later observation until a single seed has passed
//! [`VALIDATION_ROUNDS`] further checks.
//!
//! ```ignore
//! let mut engine = SearchEngine::new(clock::nano_time());
//! loop {
//!     let roll = target.next_int_bounded(6);
//!     engine.record_next_int_bounded(roll, 6)?;
//!     if engine.is_fixed() {
//!         break;
//!     }
//!     engine.tick()?;
//! }
//! let mut clone = engine.predicted_generator()?;
//! ```
//!
//! [`TRANSITION_THRESHOLD`]: crate::config::TRANSITION_THRESHOLD
//! [`VALIDATION_ROUNDS`]: crate::config::VALIDATION_ROUNDS

mod state;

pub use state::SearchState;

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::filter::{Call, Constraint, DoubleVariant, Observed};
use crate::generator::CandidateGenerator;
use crate::ledger::ObservationLedger;
use crate::prng::{JavaRandom, PrngModel};
use crate::uniquifier;
use oracle_metrics::{Counter, PassTimer, PhaseProfiler};
use rayon::prelude::*;
use serde::Serialize;
use state::Event;
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, error, info};

/// A 48-bit state admits at most this many distinct outcomes for any call.
const STATE_SPACE: i64 = 1 << 48;

/// Passes kept for rolling throughput figures.
const PASS_HISTORY: usize = 32;

/// Instrumentation collected while searching.
pub struct SearchMetrics {
    pub counters: Counter,
    pub phases: PhaseProfiler,
    pub passes: PassTimer,
}

impl SearchMetrics {
    fn new() -> Self {
        Self {
            counters: Counter::new(),
            phases: PhaseProfiler::new(),
            passes: PassTimer::new(PASS_HISTORY),
        }
    }
}

/// Serializable snapshot of the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchReport {
    pub state: SearchState,
    pub size: u64,
    pub round: u32,
    pub observations: usize,
    pub validation_round: u32,
    pub fixed_seed: Option<i64>,
}

/// Everything the state transitions read or write.
pub(crate) struct SearchContext<M> {
    generator: CandidateGenerator,
    ledger: ObservationLedger<M>,
    /// `None` until the first round is materialized.
    population: Option<HashSet<i64>>,
    round: u32,
    max_rounds: u32,
    validation_round: u32,
    fixed_seed: Option<i64>,
    pool: Option<rayon::ThreadPool>,
    metrics: SearchMetrics,
}

impl<M: PrngModel> SearchContext<M> {
    fn estimate(&self) -> u64 {
        self.ledger
            .estimated_remaining(self.generator.population_size())
    }

    fn population_len(&self) -> usize {
        self.population.as_ref().map_or(0, HashSet::len)
    }

    /// Generate the next round and keep the candidates that satisfy the
    /// whole ledger. The previous population is replaced only on success.
    fn materialize_next_round(&mut self) -> Result<(), SearchError> {
        let round = self.round;
        if round >= self.max_rounds {
            return Err(SearchError::Exhausted { rounds: round });
        }

        let window = self.generator.window(round)?;
        let candidates = self.generator.population_size();
        info!(
            round,
            direction = ?window.direction,
            start = window.ticks.start,
            end = window.ticks.end,
            candidates,
            observations = self.ledger.count(),
            "filtering round"
        );

        let started = Instant::now();
        let generator = &self.generator;
        let ledger = &self.ledger;
        let pool = self.pool.as_ref();

        self.metrics.passes.begin();
        let survivors = self.metrics.phases.time_phase("materialize", || {
            run_in(pool, || {
                generator
                    .par_candidates(round)
                    .map(|seeds| collect_survivors(seeds, ledger))
            })
        })?;
        self.metrics.passes.end(candidates);
        self.metrics.counters.increment("rounds_materialized", 1);
        self.metrics.counters.increment("candidates_tested", candidates);

        info!(
            round,
            survivors = survivors.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "round filtered"
        );
        oracle_metrics::metrics! {
            debug!(
                rate = self.metrics.passes.candidates_per_sec(),
                "candidates per second"
            );
        }

        self.round += 1;
        self.population = Some(survivors);
        Ok(())
    }

    /// Re-filter the current population against the whole ledger.
    fn reduce(&mut self) {
        let Some(current) = self.population.as_ref() else {
            return;
        };
        let before = current.len();
        let ledger = &self.ledger;
        let pool = self.pool.as_ref();

        self.metrics.passes.begin();
        let survivors = self.metrics.phases.time_phase("reduce", || {
            run_in(pool, || collect_survivors(current.par_iter().copied(), ledger))
        });
        self.metrics.passes.end(before as u64);
        self.metrics.counters.increment("reductions", 1);
        self.metrics.counters.increment("candidates_tested", before as u64);

        debug!(before, after = survivors.len(), "population reduced");
        self.population = Some(survivors);
    }

    /// The only survivor, if exactly one remains.
    fn lone_candidate(&self) -> Option<i64> {
        self.population
            .as_ref()
            .filter(|p| p.len() == 1)
            .and_then(|p| p.iter().next().copied())
    }

    fn fix(&mut self, seed: i64) {
        info!(seed, observations = self.ledger.count(), "seed fixed");
        self.fixed_seed = Some(seed);
    }
}

/// Run `f` on the dedicated pool when one is configured.
fn run_in<R, F>(pool: Option<&rayon::ThreadPool>, f: F) -> R
where
    R: Send,
    F: FnOnce() -> R + Send,
{
    match pool {
        Some(pool) => pool.install(f),
        None => f(),
    }
}

/// Filter `seeds` by the ledger. Each worker folds into its own set and the
/// sets are merged, so duplicates collapse and completion order is irrelevant.
fn collect_survivors<M, I>(seeds: I, ledger: &ObservationLedger<M>) -> HashSet<i64>
where
    M: PrngModel,
    I: ParallelIterator<Item = i64>,
{
    seeds
        .filter(|&seed| ledger.test(seed))
        .fold(HashSet::new, |mut local, seed| {
            local.insert(seed);
            local
        })
        .reduce(HashSet::new, |mut a, mut b| {
            if a.len() < b.len() {
                std::mem::swap(&mut a, &mut b);
            }
            a.extend(b);
            a
        })
}

/// Recovers the seed of a time-seeded generator from its observed outputs.
///
/// Single-writer: observations must arrive in the order the real generator
/// produced them, exactly once per call.
pub struct SearchEngine<M: PrngModel = JavaRandom> {
    state: SearchState,
    cx: SearchContext<M>,
    config: SearchConfig,
    /// Set once a fatal fault ends the search.
    halted: Option<String>,
}

impl SearchEngine<JavaRandom> {
    /// Engine with the default configuration, anchored at `anchor`: the
    /// target generator is assumed to have been created at or before it.
    pub fn new(anchor: i64) -> Self {
        Self::assemble(anchor, SearchConfig::default(), None)
    }
}

impl<M: PrngModel> SearchEngine<M> {
    pub fn with_config(anchor: i64, config: SearchConfig) -> Result<Self, SearchError> {
        config.validate()?;
        let pool = match config.worker_threads {
            Some(threads) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("oracle-filter-{i}"))
                    .build()?,
            ),
            None => None,
        };
        Ok(Self::assemble(anchor, config, pool))
    }

    fn assemble(anchor: i64, config: SearchConfig, pool: Option<rayon::ThreadPool>) -> Self {
        let generator = CandidateGenerator::new(
            anchor,
            config.window_width_nanos,
            uniquifier::table_for(config.uniquifier_count),
        );
        info!(
            anchor,
            window = config.window_width_nanos,
            uniquifiers = config.uniquifier_count,
            space = generator.population_size(),
            "search engine created"
        );
        Self {
            state: SearchState::Open,
            cx: SearchContext {
                generator,
                ledger: ObservationLedger::new(),
                population: None,
                round: 0,
                max_rounds: config.max_rounds,
                validation_round: 0,
                fixed_seed: None,
                pool,
                metrics: SearchMetrics::new(),
            },
            config,
            halted: None,
        }
    }

    /// Record one call on the real generator. Invalid observations (see
    /// [`Constraint::validate`]) are rejected without touching the engine.
    pub fn record_observation<C>(&mut self, constraint: C, reduction_factor: i64) -> Result<(), SearchError>
    where
        C: Constraint<M> + 'static,
    {
        if let Some(cause) = &self.halted {
            return Err(SearchError::Halted {
                cause: cause.clone(),
            });
        }
        self.cx.ledger.record(Box::new(constraint), reduction_factor)?;
        debug!(
            observations = self.cx.ledger.count(),
            reduction_factor,
            state = %self.state,
            "observation recorded"
        );
        self.dispatch(Event::Observed {
            informative: reduction_factor > 1,
        })
    }

    /// `nextInt()` returned `value`.
    pub fn record_next_int(&mut self, value: i32) -> Result<(), SearchError> {
        self.record_observation(Observed::NextInt(value), 1 << 32)
    }

    /// `nextInt(bound)` returned `value`.
    pub fn record_next_int_bounded(&mut self, value: i32, bound: i32) -> Result<(), SearchError> {
        self.record_observation(Observed::NextIntBounded { value, bound }, bound as i64)
    }

    /// `nextLong()` returned `value`.
    pub fn record_next_long(&mut self, value: i64) -> Result<(), SearchError> {
        self.record_observation(Observed::NextLong(value), STATE_SPACE)
    }

    /// `nextBoolean()` returned `value`.
    pub fn record_next_boolean(&mut self, value: bool) -> Result<(), SearchError> {
        self.record_observation(Observed::NextBoolean(value), 2)
    }

    /// `nextFloat()` returned `value`.
    pub fn record_next_float(&mut self, value: f32) -> Result<(), SearchError> {
        self.record_observation(Observed::NextFloat(value), 1 << 24)
    }

    /// `nextDouble()` returned `value` under the given derivation.
    pub fn record_next_double(&mut self, value: f64, variant: DoubleVariant) -> Result<(), SearchError> {
        self.record_observation(Observed::NextDouble { value, variant }, STATE_SPACE)
    }

    /// A call happened whose result was not seen.
    pub fn record_unobserved(&mut self, call: Call) -> Result<(), SearchError> {
        self.record_observation(Observed::Unobserved(call), 1)
    }

    /// Let the engine make progress between observations.
    pub fn tick(&mut self) -> Result<(), SearchError> {
        if let Some(cause) = &self.halted {
            return Err(SearchError::Halted {
                cause: cause.clone(),
            });
        }
        self.dispatch(Event::Tick)
    }

    fn dispatch(&mut self, event: Event) -> Result<(), SearchError> {
        match self.state.on_event(event, &mut self.cx) {
            Ok(next) => {
                if next != self.state {
                    info!(from = %self.state, to = %next, "state transition");
                    self.state = next;
                }
                Ok(())
            }
            Err(err) if err.is_fatal() => {
                error!(state = %self.state, error = %err, "search halted");
                self.halted = Some(err.to_string());
                self.cx.population = None;
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Remaining candidates: an estimate in OPEN, exact afterwards.
    pub fn size(&self) -> u64 {
        match self.state {
            SearchState::Open => self.cx.estimate(),
            SearchState::Limited => self.cx.population_len() as u64,
            SearchState::Validating | SearchState::Fixed => 1,
        }
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    pub fn is_fixed(&self) -> bool {
        self.state == SearchState::Fixed
    }

    pub fn is_halted(&self) -> bool {
        self.halted.is_some()
    }

    /// Next round to be materialized.
    pub fn round(&self) -> u32 {
        self.cx.round
    }

    pub fn observations(&self) -> usize {
        self.cx.ledger.count()
    }

    pub fn anchor(&self) -> i64 {
        self.cx.generator.anchor()
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn generator(&self) -> &CandidateGenerator {
        &self.cx.generator
    }

    pub fn metrics(&self) -> &SearchMetrics {
        &self.cx.metrics
    }

    pub fn report(&self) -> SearchReport {
        SearchReport {
            state: self.state,
            size: self.size(),
            round: self.cx.round,
            observations: self.cx.ledger.count(),
            validation_round: self.cx.validation_round,
            fixed_seed: self.cx.fixed_seed,
        }
    }

    /// A generator synchronized with the real one: seeded with the fixed seed
    /// and advanced past every recorded call.
    ///
    /// The clone stays faithful only while every later call on the real
    /// generator is also recorded here.
    pub fn predicted_generator(&self) -> Result<M, SearchError> {
        let seed = match (self.state, self.cx.fixed_seed) {
            (SearchState::Fixed, Some(seed)) => seed,
            _ => return Err(SearchError::NotFixed { state: self.state }),
        };

        let mut rng = M::from_seed(seed);
        if !self.cx.ledger.test_instance(&mut rng) {
            return Err(SearchError::FixedSeedRejected {
                seed,
                observations: self.cx.ledger.count(),
            });
        }
        Ok(rng)
    }
}
