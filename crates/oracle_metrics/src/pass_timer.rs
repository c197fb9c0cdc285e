//! Timing of narrowing passes (materializations and reductions)

use super::ring_buffer::RingBuffer;
use std::time::{Duration, Instant};

pub struct PassTimer {
    pass_start: Instant,
    pass_times: RingBuffer<Duration>,
    pass_candidates: RingBuffer<u64>,
    passes: u64,
}

impl PassTimer {
    pub fn new(capacity: usize) -> Self {
        Self {
            pass_start: Instant::now(),
            pass_times: RingBuffer::new(capacity),
            pass_candidates: RingBuffer::new(capacity),
            passes: 0,
        }
    }

    pub fn begin(&mut self) {
        self.pass_start = Instant::now();
    }

    /// Close the current pass, which examined `candidates` seeds.
    pub fn end(&mut self, candidates: u64) {
        self.pass_times.push(self.pass_start.elapsed());
        self.pass_candidates.push(candidates);
        self.passes += 1;
    }

    pub fn passes(&self) -> u64 {
        self.passes
    }

    pub fn pass_time_ms(&self) -> f64 {
        self.pass_times.average().as_secs_f64() * 1000.0
    }

    /// Candidates examined per second across the recent passes.
    pub fn candidates_per_sec(&self) -> f64 {
        let secs = self.pass_times.average().as_secs_f64() * self.pass_times.len() as f64;
        if secs > 0.0 {
            self.pass_candidates.sum() as f64 / secs
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_timer_counts_passes() {
        let mut timer = PassTimer::new(4);
        assert_eq!(timer.passes(), 0);
        assert_eq!(timer.candidates_per_sec(), 0.0);

        timer.begin();
        std::thread::sleep(Duration::from_millis(2));
        timer.end(1_000);

        assert_eq!(timer.passes(), 1);
        assert!(timer.pass_time_ms() >= 2.0);
        assert!(timer.candidates_per_sec() > 0.0);
    }
}
