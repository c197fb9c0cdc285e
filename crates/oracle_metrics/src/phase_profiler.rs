//! Accumulated wall time per named search phase

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

pub struct PhaseProfiler {
    timings: BTreeMap<&'static str, Duration>,
}

impl PhaseProfiler {
    pub fn new() -> Self {
        Self {
            timings: BTreeMap::new(),
        }
    }

    pub fn time_phase<F, R>(&mut self, name: &'static str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let start = Instant::now();
        let result = f();
        *self.timings.entry(name).or_insert(Duration::ZERO) += start.elapsed();
        result
    }

    pub fn get_timing(&self, name: &str) -> Duration {
        self.timings.get(name).copied().unwrap_or(Duration::ZERO)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, Duration)> + '_ {
        self.timings.iter().map(|(name, d)| (*name, *d))
    }
}

impl Default for PhaseProfiler {
    fn default() -> Self {
        Self::new()
    }
}
