//! Wall-clock budgets for search runs.

use std::time::Duration;

use super::Termination;
use crate::scope::SearchScope;

/// Ends a search once it has run for `budget`, measured from its first step.
///
/// The check happens between steps, so a slow evaluation is never cut short
/// and the run ends with the solutions already found. To interrupt work in
/// flight and report a timeout instead, use
/// [`crate::SearchAlgorithm::set_timeout`].
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use graphsearch_algorithms::termination::TimeTermination;
/// use graphsearch_algorithms::{AlgorithmState, BestFirst, SearchAlgorithm};
/// use graphsearch_core::InterruptRegistry;
/// use graphsearch_eval::ConstantEvaluator;
/// use graphsearch_test::TernaryGraph;
///
/// // The goal sits far below anything reachable in 20ms.
/// let tree = Arc::new(TernaryGraph::new(u64::MAX));
/// let registry = Arc::new(InterruptRegistry::new());
/// let mut search = BestFirst::new(tree, ConstantEvaluator::new(0u32), registry)
///     .with_termination(Box::new(TimeTermination::millis(20)));
///
/// assert!(search.run().unwrap().is_none());
/// assert_eq!(search.state(), AlgorithmState::Inactive);
/// assert!(search.statistics().expansions > 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeTermination {
    budget: Duration,
}

impl TimeTermination {
    pub fn new(budget: Duration) -> Self {
        Self { budget }
    }

    pub fn millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    pub fn seconds(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Time left before the search stops; the full budget until it starts.
    pub fn remaining(&self, scope: &SearchScope) -> Duration {
        scope
            .elapsed()
            .map_or(self.budget, |spent| self.budget.saturating_sub(spent))
    }
}

impl Termination for TimeTermination {
    fn is_terminated(&self, scope: &SearchScope) -> bool {
        scope.elapsed().is_some() && self.remaining(scope).is_zero()
    }
}
