//! Candidate seed enumeration
//!
//! Candidates are `tick ^ uniquifier` for every tick in a round's window and
//! every uniquifier in the table. Rounds sweep outward from the anchor,
//! alternating direction:
//!
//! ```text
//! round:      ... 4    2    0 | 1    3    5 ...
//! window:  ...[-3W][-2W][-1W]A[+1W][+2W][+3W]...
//! ```
//!
//! Round 0 ends at (and includes) the anchor tick. Windows tile the time
//! line, so rounds `0..2k` cover `(A - kW, A + kW]` exactly once.

use crate::error::SearchError;
use rayon::prelude::*;
use std::ops::Range;
use std::sync::Arc;

/// Which side of the anchor a round scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Before,
    After,
}

/// Half-open range of ticks scanned by one round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeWindow {
    pub round: u32,
    pub direction: Direction,
    pub ticks: Range<i64>,
}

impl TimeWindow {
    pub fn contains(&self, tick: i64) -> bool {
        self.ticks.contains(&tick)
    }
}

/// Produces the candidate population of each round.
#[derive(Debug, Clone)]
pub struct CandidateGenerator {
    anchor: i64,
    window_width: i64,
    uniquifiers: Arc<[i64]>,
}

impl CandidateGenerator {
    /// # Panics
    /// Panics if `window_width` is not positive or the table is empty; the
    /// engine validates both through `SearchConfig` first.
    pub fn new(anchor: i64, window_width: i64, uniquifiers: Arc<[i64]>) -> Self {
        assert!(window_width > 0, "window width must be positive");
        assert!(!uniquifiers.is_empty(), "uniquifier table must not be empty");
        Self {
            anchor,
            window_width,
            uniquifiers,
        }
    }

    pub fn anchor(&self) -> i64 {
        self.anchor
    }

    pub fn uniquifiers(&self) -> &[i64] {
        &self.uniquifiers
    }

    /// Candidates per round: `window_width × uniquifier_count`.
    pub fn population_size(&self) -> u64 {
        (self.window_width as u64).saturating_mul(self.uniquifiers.len() as u64)
    }

    /// The window scanned by `round`.
    pub fn window(&self, round: u32) -> Result<TimeWindow, SearchError> {
        let overflow = || SearchError::Overflow { round };
        let offset = (round / 2) as i64;
        let near = offset.checked_mul(self.window_width).ok_or_else(overflow)?;
        let far = (offset + 1).checked_mul(self.window_width).ok_or_else(overflow)?;

        let (direction, start, end) = if round % 2 == 0 {
            let start = self
                .anchor
                .checked_sub(far)
                .and_then(|t| t.checked_add(1))
                .ok_or_else(overflow)?;
            let end = self
                .anchor
                .checked_sub(near)
                .and_then(|t| t.checked_add(1))
                .ok_or_else(overflow)?;
            (Direction::Before, start, end)
        } else {
            let start = self
                .anchor
                .checked_add(near)
                .and_then(|t| t.checked_add(1))
                .ok_or_else(overflow)?;
            let end = self
                .anchor
                .checked_add(far)
                .and_then(|t| t.checked_add(1))
                .ok_or_else(overflow)?;
            (Direction::After, start, end)
        };

        Ok(TimeWindow {
            round,
            direction,
            ticks: start..end,
        })
    }

    /// Sequential candidates of `round`, tick-major.
    pub fn candidates(&self, round: u32) -> Result<impl Iterator<Item = i64> + '_, SearchError> {
        let window = self.window(round)?;
        let uniquifiers = &self.uniquifiers;
        Ok(window
            .ticks
            .flat_map(move |tick| uniquifiers.iter().map(move |u| tick ^ u)))
    }

    /// The same candidates as [`candidates`](Self::candidates), split across
    /// rayon workers.
    pub fn par_candidates(
        &self,
        round: u32,
    ) -> Result<impl ParallelIterator<Item = i64> + '_, SearchError> {
        let window = self.window(round)?;
        let uniquifiers = &self.uniquifiers;
        Ok(window
            .ticks
            .into_par_iter()
            .flat_map_iter(move |tick| uniquifiers.iter().map(move |u| tick ^ u)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uniquifier::uniquifier_table;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn generator(anchor: i64, width: i64, count: usize) -> CandidateGenerator {
        CandidateGenerator::new(anchor, width, uniquifier_table(count))
    }

    #[test]
    fn test_population_size() {
        assert_eq!(generator(0, 1_000, 10).population_size(), 10_000);
    }

    #[test]
    fn test_first_rounds_hug_the_anchor() {
        let g = generator(1_000, 10, 1);

        let w0 = g.window(0).unwrap();
        assert_eq!(w0.direction, Direction::Before);
        assert_eq!(w0.ticks, 991..1_001);
        assert!(w0.contains(1_000));

        let w1 = g.window(1).unwrap();
        assert_eq!(w1.direction, Direction::After);
        assert_eq!(w1.ticks, 1_001..1_011);

        assert_eq!(g.window(2).unwrap().ticks, 981..991);
        assert_eq!(g.window(3).unwrap().ticks, 1_011..1_021);
    }

    #[test]
    fn test_candidates_cross_every_uniquifier() {
        let g = generator(500, 4, 3);
        let seeds: Vec<i64> = g.candidates(0).unwrap().collect();
        assert_eq!(seeds.len() as u64, g.population_size());

        let u = g.uniquifiers().to_vec();
        for tick in 497..=500 {
            for &unique in &u {
                assert!(seeds.contains(&(tick ^ unique)));
            }
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let g = generator(-12_345, 257, 7);
        for round in 0..4 {
            let seq: HashSet<i64> = g.candidates(round).unwrap().collect();
            let par: HashSet<i64> = g.par_candidates(round).unwrap().collect();
            assert_eq!(seq, par);
        }
    }

    #[test]
    fn test_overflow_is_reported() {
        let g = generator(i64::MAX - 5, 10, 1);
        assert!(matches!(g.window(1), Err(SearchError::Overflow { round: 1 })));
        assert!(g.window(0).is_ok());

        let g = generator(i64::MIN + 5, 10, 1);
        assert!(matches!(g.window(0), Err(SearchError::Overflow { round: 0 })));
    }

    proptest! {
        #[test]
        fn prop_rounds_tile_both_sides(
            anchor in -1_000_000_000i64..1_000_000_000,
            width in 1i64..500,
            k in 1u32..12,
        ) {
            let g = generator(anchor, width, 1);
            let mut before = Vec::new();
            let mut after = Vec::new();
            for round in 0..2 * k {
                let w = g.window(round).unwrap();
                prop_assert_eq!(w.ticks.end - w.ticks.start, width);
                match w.direction {
                    Direction::Before => before.push(w.ticks),
                    Direction::After => after.push(w.ticks),
                }
            }
            prop_assert_eq!(before.len() as u32, k);
            prop_assert_eq!(after.len() as u32, k);

            // Nearest first, each window abutting the previous one
            prop_assert_eq!(before[0].end, anchor + 1);
            prop_assert_eq!(after[0].start, anchor + 1);
            for pair in before.windows(2) {
                prop_assert_eq!(pair[1].end, pair[0].start);
            }
            for pair in after.windows(2) {
                prop_assert_eq!(pair[1].start, pair[0].end);
            }
            prop_assert_eq!(before[k as usize - 1].start, anchor - k as i64 * width + 1);
            prop_assert_eq!(after[k as usize - 1].end, anchor + k as i64 * width + 1);
        }
    }
}
