//! Seed Oracle Runtime
//!
//! Simulates a process that creates a few time-seeded generators, watches
//! one of them roll dice, and lets the engine recover its seed.
//!
//! Usage: `oracle-demo [config.json]`

use anyhow::{bail, Context, Result};
use oracle_core::uniquifier::UniquifierSequence;
use oracle_core::{clock, JavaRandom, PrngModel, SearchConfig, SearchEngine};
use std::path::Path;

/// Generators created by the simulated process before the one we watch.
const TARGET_INDEX: usize = 3;
const DIE_SIDES: i32 = 6;
const MAX_OBSERVATIONS: usize = 2_000;
const PREDICTIONS: usize = 100;

fn load_config(path: Option<&Path>) -> Result<SearchConfig> {
    let Some(path) = path else {
        return Ok(SearchConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    tracing::info!("Seed Oracle v{}", oracle_core::VERSION);

    let arg = std::env::args().nth(1);
    let config = load_config(arg.as_deref().map(Path::new))?;
    if TARGET_INDEX >= config.uniquifier_count {
        bail!(
            "target generator #{TARGET_INDEX} is outside the {} searched uniquifiers",
            config.uniquifier_count
        );
    }

    let uniquifier = UniquifierSequence::new()
        .nth(TARGET_INDEX)
        .context("uniquifier sequence ended")?;
    let target_seed = clock::nano_time() ^ uniquifier;
    let mut target = JavaRandom::new(target_seed);
    let initial_state = target.state();

    let mut engine: SearchEngine = SearchEngine::with_config(clock::nano_time(), config)?;
    tracing::info!(
        created_ticks_before_anchor =
            clock::creation_offset(initial_state, uniquifier, engine.anchor()),
        "target generator created"
    );

    for _ in 0..MAX_OBSERVATIONS {
        let roll = target.next_int_bounded(DIE_SIDES);
        engine.record_next_int_bounded(roll, DIE_SIDES)?;
        tracing::debug!(roll, size = engine.size(), state = %engine.state(), "observed");
        if engine.is_fixed() {
            break;
        }
        engine.tick()?;
    }

    if !engine.is_fixed() {
        bail!(
            "no fixation after {MAX_OBSERVATIONS} observations: {}",
            serde_json::to_string(&engine.report())?
        );
    }

    let mut clone = engine.predicted_generator()?;
    let mut hits = 0;
    for _ in 0..PREDICTIONS {
        if clone.next_int_bounded(DIE_SIDES) == target.next_int_bounded(DIE_SIDES) {
            hits += 1;
        }
    }
    tracing::info!(hits, of = PREDICTIONS, "predictions checked");

    if oracle_metrics::ENABLED {
        let metrics = engine.metrics();
        for (name, value) in metrics.counters.iter() {
            tracing::info!(name, value, "counter");
        }
        for (phase, spent) in metrics.phases.iter() {
            tracing::info!(phase, ms = spent.as_millis() as u64, "phase time");
        }
        tracing::info!(
            passes = metrics.passes.passes(),
            avg_ms = metrics.passes.pass_time_ms(),
            rate = metrics.passes.candidates_per_sec(),
            "filter passes"
        );
    }

    println!("{}", serde_json::to_string_pretty(&engine.report())?);

    if hits != PREDICTIONS {
        bail!("oracle mispredicted {} of {PREDICTIONS} rolls", PREDICTIONS - hits);
    }
    Ok(())
}
