//! Named counters for search events (candidates tested, rounds, ...)

use std::collections::BTreeMap;

pub struct Counter {
    counters: BTreeMap<&'static str, u64>,
}

impl Counter {
    pub fn new() -> Self {
        Self {
            counters: BTreeMap::new(),
        }
    }

    pub fn increment(&mut self, name: &'static str, value: u64) {
        let slot = self.counters.entry(name).or_insert(0);
        *slot = slot.saturating_add(value);
    }

    pub fn get(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    pub fn reset_all(&mut self) {
        self.counters.clear();
    }

    /// Counters in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, u64)> + '_ {
        self.counters.iter().map(|(name, value)| (*name, *value))
    }
}

impl Default for Counter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_accumulates_and_saturates() {
        let mut counter = Counter::new();
        counter.increment("candidates_tested", 10);
        counter.increment("candidates_tested", 5);
        assert_eq!(counter.get("candidates_tested"), 15);
        assert_eq!(counter.get("rounds"), 0);

        counter.increment("candidates_tested", u64::MAX);
        assert_eq!(counter.get("candidates_tested"), u64::MAX);

        counter.increment("rounds", 1);
        let names: Vec<_> = counter.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["candidates_tested", "rounds"]);

        counter.reset_all();
        assert_eq!(counter.iter().count(), 0);
    }
}
