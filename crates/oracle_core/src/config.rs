//! Search configuration

use crate::error::SearchError;
use serde::{Deserialize, Serialize};

/// Estimate below which the engine stops estimating and starts enumerating.
pub const TRANSITION_THRESHOLD: u64 = 100;

/// Additional informative observations a lone survivor must pass before the
/// engine fixates on it.
pub const VALIDATION_ROUNDS: u32 = 25;

/// Default time window per round (5 ms of nanosecond ticks).
pub const DEFAULT_WINDOW_WIDTH_NANOS: i64 = 5_000_000;

/// Default number of uniquifier values crossed with each tick.
pub const DEFAULT_UNIQUIFIER_COUNT: usize = 20;

/// Default cap on materialized rounds before the search gives up.
pub const DEFAULT_MAX_ROUNDS: u32 = 400;

/// Engine settings, fixed for the lifetime of an engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Width of one sweep window, in ticks.
    pub window_width_nanos: i64,
    /// How many uniquifier values each tick is crossed with.
    pub uniquifier_count: usize,
    /// Rounds that may be materialized without a survivor before the search
    /// is declared exhausted.
    pub max_rounds: u32,
    /// Size of a dedicated filtering pool; `None` uses rayon's global pool.
    pub worker_threads: Option<usize>,
}

impl SearchConfig {
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.window_width_nanos <= 0 {
            return Err(SearchError::InvalidConfig {
                reason: format!(
                    "window width must be positive, got {}",
                    self.window_width_nanos
                ),
            });
        }
        if self.uniquifier_count == 0 {
            return Err(SearchError::InvalidConfig {
                reason: "at least one uniquifier is required".to_string(),
            });
        }
        if (self.window_width_nanos as u64)
            .checked_mul(self.uniquifier_count as u64)
            .is_none()
        {
            return Err(SearchError::InvalidConfig {
                reason: "window width × uniquifier count overflows".to_string(),
            });
        }
        if self.max_rounds == 0 {
            return Err(SearchError::InvalidConfig {
                reason: "max_rounds must be at least 1".to_string(),
            });
        }
        if self.worker_threads == Some(0) {
            return Err(SearchError::InvalidConfig {
                reason: "worker_threads must be at least 1 when set".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            window_width_nanos: DEFAULT_WINDOW_WIDTH_NANOS,
            uniquifier_count: DEFAULT_UNIQUIFIER_COUNT,
            max_rounds: DEFAULT_MAX_ROUNDS,
            worker_threads: None,
        }
    }
}
