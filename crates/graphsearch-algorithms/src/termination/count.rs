//! Counter-based terminations.

use super::Termination;
use crate::scope::SearchScope;

/// Terminates after a number of steps.
///
/// # Example
///
/// ```
/// use graphsearch_algorithms::termination::StepCountTermination;
///
/// let term = StepCountTermination::new(1000);
/// ```
#[derive(Debug, Clone)]
pub struct StepCountTermination {
    limit: u64,
}

impl StepCountTermination {
    pub fn new(limit: u64) -> Self {
        Self { limit }
    }
}

impl Termination for StepCountTermination {
    fn is_terminated(&self, scope: &SearchScope) -> bool {
        scope.step_count() >= self.limit
    }
}

/// Terminates after a number of node expansions.
#[derive(Debug, Clone)]
pub struct ExpansionCountTermination {
    limit: u64,
}

impl ExpansionCountTermination {
    pub fn new(limit: u64) -> Self {
        Self { limit }
    }
}

impl Termination for ExpansionCountTermination {
    fn is_terminated(&self, scope: &SearchScope) -> bool {
        scope.expansion_count() >= self.limit
    }
}

/// Terminates once a number of solutions was reported.
#[derive(Debug, Clone)]
pub struct SolutionCountTermination {
    limit: u64,
}

impl SolutionCountTermination {
    pub fn new(limit: u64) -> Self {
        Self { limit }
    }
}

impl Termination for SolutionCountTermination {
    fn is_terminated(&self, scope: &SearchScope) -> bool {
        scope.solution_count() >= self.limit
    }
}
