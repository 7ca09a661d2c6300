//! Per-run search scope.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::statistics::StatisticsCollector;

/// Mutable state of one algorithm run that is not specific to a strategy.
///
/// Holds the seeded random number generator, the start time, step and
/// solution counters, and the shared statistics collector. Termination
/// conditions observe the scope.
#[derive(Debug)]
pub struct SearchScope {
    rng: ChaCha8Rng,
    seed: u64,
    start_time: Option<Instant>,
    step_count: u64,
    solution_count: u64,
    statistics: Arc<StatisticsCollector>,
}

impl SearchScope {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            start_time: None,
            step_count: 0,
            solution_count: 0,
            statistics: Arc::new(StatisticsCollector::new()),
        }
    }

    pub fn with_statistics(mut self, statistics: Arc<StatisticsCollector>) -> Self {
        self.statistics = statistics;
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    /// Marks the start of the run. Later calls keep the first instant.
    pub fn start(&mut self) {
        if self.start_time.is_none() {
            self.start_time = Some(Instant::now());
        }
    }

    pub fn start_time(&self) -> Option<Instant> {
        self.start_time
    }

    /// Time since [`SearchScope::start`], `None` before the run started.
    pub fn elapsed(&self) -> Option<Duration> {
        self.start_time.map(|t| t.elapsed())
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn increment_step_count(&mut self) -> u64 {
        self.step_count += 1;
        self.step_count
    }

    pub fn solution_count(&self) -> u64 {
        self.solution_count
    }

    pub fn increment_solution_count(&mut self) -> u64 {
        self.solution_count += 1;
        self.statistics.record_solution();
        self.solution_count
    }

    pub fn expansion_count(&self) -> u64 {
        self.statistics.current_expansions()
    }

    pub fn statistics(&self) -> &Arc<StatisticsCollector> {
        &self.statistics
    }
}

impl Default for SearchScope {
    fn default() -> Self {
        Self::new(0)
    }
}
