//! Solution paths reported by algorithms.

use std::time::Duration;

use crate::node::Path;
use crate::score::Score;

/// A root-to-goal path together with its score.
#[derive(Debug)]
pub struct EvaluatedPath<S, A, V> {
    pub path: Path<S, A>,
    /// Aggregate score of the path; `None` when the algorithm does not score.
    pub score: Option<V>,
    /// Time since the algorithm became active.
    pub found_after: Duration,
}

impl<S, A: Clone, V: Clone> Clone for EvaluatedPath<S, A, V> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            score: self.score.clone(),
            found_after: self.found_after,
        }
    }
}

impl<S, A, V: Score> EvaluatedPath<S, A, V> {
    pub fn new(path: Path<S, A>, score: Option<V>, found_after: Duration) -> Self {
        Self {
            path,
            score,
            found_after,
        }
    }

    /// Returns true if this path has a strictly lower score than `other`.
    ///
    /// A scored path always beats an unscored one.
    pub fn is_better_than(&self, other: &Self) -> bool {
        match (&self.score, &other.score) {
            (Some(a), Some(b)) => a.compare(b).is_lt(),
            (Some(_), None) => true,
            _ => false,
        }
    }
}
