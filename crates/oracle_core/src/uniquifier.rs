//! Seed uniquifier constants
//!
//! Every unseeded generator constructed in a process advances a shared value
//! by `x -> x * FACTOR` (wrapping) and XORs the result into its timestamp.
//! Only the first few constructions of a process matter in practice, so the
//! candidate space crosses each time tick with the first `count` values.

use crate::config::DEFAULT_UNIQUIFIER_COUNT;
use once_cell::sync::Lazy;
use std::sync::Arc;

/// Starting value of the process-wide uniquifier.
pub const INITIAL: i64 = 8_682_522_807_148_012;
/// Multiplicative step (L'Ecuyer 1999).
pub const FACTOR: i64 = 181_783_497_276_652_981;

/// The default table, computed on first use.
pub static DEFAULT_UNIQUIFIERS: Lazy<Arc<[i64]>> =
    Lazy::new(|| uniquifier_table(DEFAULT_UNIQUIFIER_COUNT));

/// Replays the uniquifier recurrence one construction at a time.
///
/// The first value yielded is the one handed to the first generator, i.e.
/// `INITIAL * FACTOR`; `INITIAL` itself is never used.
#[derive(Debug, Clone)]
pub struct UniquifierSequence {
    current: i64,
}

impl UniquifierSequence {
    pub fn new() -> Self {
        Self { current: INITIAL }
    }
}

impl Default for UniquifierSequence {
    fn default() -> Self {
        Self::new()
    }
}

impl Iterator for UniquifierSequence {
    type Item = i64;

    fn next(&mut self) -> Option<i64> {
        self.current = self.current.wrapping_mul(FACTOR);
        Some(self.current)
    }
}

/// The first `count` uniquifiers, in construction order.
pub fn uniquifier_table(count: usize) -> Arc<[i64]> {
    UniquifierSequence::new().take(count).collect()
}

/// Table of `count` values, sharing the lazily computed default table when
/// the counts match.
pub fn table_for(count: usize) -> Arc<[i64]> {
    if count == DEFAULT_UNIQUIFIERS.len() {
        Arc::clone(&*DEFAULT_UNIQUIFIERS)
    } else {
        uniquifier_table(count)
    }
}
