//! Search statistics collection and reporting.
//!
//! This module provides types for tracking search effort while an algorithm
//! runs: expansions, evaluations, pruned and failed nodes, solutions and
//! Monte-Carlo playouts, plus the progression of the best solution score.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Record of a best-solution improvement.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreImprovement {
    /// Time since the collector was created.
    pub time_offset: Duration,
    /// Expansions performed when the improvement occurred.
    pub expansion_count: u64,
    /// The new best score, as `f64`.
    pub score: f64,
}

/// Snapshot of the statistics of one search run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchStatistics {
    /// Time since the collector was created.
    pub total_duration: Duration,
    /// Nodes whose successors were generated.
    pub expansions: u64,
    /// Calls to the node evaluator.
    pub evaluations: u64,
    /// Nodes dropped because the evaluator returned no score.
    pub pruned: u64,
    /// Nodes dropped because their evaluation failed locally.
    pub failed: u64,
    /// Solution candidates reported.
    pub solutions: u64,
    /// Completed Monte-Carlo playouts.
    pub playouts: u64,
    /// History of best-score improvements.
    pub score_history: Vec<ScoreImprovement>,
}

impl SearchStatistics {
    /// Returns the best score recorded, if any.
    pub fn best_score(&self) -> Option<f64> {
        self.score_history.last().map(|s| s.score)
    }

    pub fn improvement_count(&self) -> usize {
        self.score_history.len()
    }

    /// Returns the fraction of evaluations that led to a dropped node.
    pub fn drop_rate(&self) -> f64 {
        if self.evaluations == 0 {
            0.0
        } else {
            (self.pruned + self.failed) as f64 / self.evaluations as f64
        }
    }
}

/// Thread-safe collector for search statistics.
///
/// Shared through an `Arc` between an algorithm and anyone who wants to
/// watch it; call [`StatisticsCollector::snapshot`] at any time.
#[derive(Debug)]
pub struct StatisticsCollector {
    start_time: Instant,
    expansions: AtomicU64,
    evaluations: AtomicU64,
    pruned: AtomicU64,
    failed: AtomicU64,
    solutions: AtomicU64,
    playouts: AtomicU64,
    score_history: Mutex<Vec<ScoreImprovement>>,
}

impl StatisticsCollector {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            expansions: AtomicU64::new(0),
            evaluations: AtomicU64::new(0),
            pruned: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            solutions: AtomicU64::new(0),
            playouts: AtomicU64::new(0),
            score_history: Mutex::new(Vec::new()),
        }
    }

    pub fn record_expansion(&self) {
        self.expansions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_evaluation(&self) {
        self.evaluations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_pruned(&self) {
        self.pruned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_solution(&self) {
        self.solutions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_playout(&self) {
        self.playouts.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a new best solution score.
    pub fn record_improvement(&self, score: f64) {
        let improvement = ScoreImprovement {
            time_offset: self.start_time.elapsed(),
            expansion_count: self.expansions.load(Ordering::Relaxed),
            score,
        };
        self.score_history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(improvement);
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn current_expansions(&self) -> u64 {
        self.expansions.load(Ordering::Relaxed)
    }

    pub fn current_solutions(&self) -> u64 {
        self.solutions.load(Ordering::Relaxed)
    }

    pub fn current_playouts(&self) -> u64 {
        self.playouts.load(Ordering::Relaxed)
    }

    /// Takes a snapshot of current statistics without consuming the collector.
    pub fn snapshot(&self) -> SearchStatistics {
        SearchStatistics {
            total_duration: self.start_time.elapsed(),
            expansions: self.expansions.load(Ordering::Relaxed),
            evaluations: self.evaluations.load(Ordering::Relaxed),
            pruned: self.pruned.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            solutions: self.solutions.load(Ordering::Relaxed),
            playouts: self.playouts.load(Ordering::Relaxed),
            score_history: self
                .score_history
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        }
    }

    /// Converts this collector into final statistics.
    pub fn into_statistics(self) -> SearchStatistics {
        SearchStatistics {
            total_duration: self.start_time.elapsed(),
            expansions: self.expansions.into_inner(),
            evaluations: self.evaluations.into_inner(),
            pruned: self.pruned.into_inner(),
            failed: self.failed.into_inner(),
            solutions: self.solutions.into_inner(),
            playouts: self.playouts.into_inner(),
            score_history: self
                .score_history
                .into_inner()
                .unwrap_or_else(PoisonError::into_inner),
        }
    }
}

impl Default for StatisticsCollector {
    fn default() -> Self {
        Self::new()
    }
}
