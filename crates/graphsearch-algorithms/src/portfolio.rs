//! Parallel portfolio of independent searches over the same graph.
//!
//! Every member runs to completion on a rayon pool; the best solution across
//! members wins. Members share nothing but the merge slot, so a member that
//! fails does not stop the others.

use std::sync::{Mutex, PoisonError};

use graphsearch_config::{Objective, ThreadCount};
use graphsearch_core::{EvaluatedPath, Result, Score, SearchAction, SearchError, SearchState};
use rayon::ThreadPoolBuilder;
use tracing::{info, warn};

use crate::algorithm::{BoxedAlgorithm, SearchAlgorithm};
use crate::context::improves;
use crate::lifecycle::CancelHandle;
use crate::statistics::SearchStatistics;

/// How one member of a portfolio ended.
#[derive(Debug)]
pub struct MemberReport {
    pub name: &'static str,
    pub statistics: SearchStatistics,
    /// Set when the member aborted with an error.
    pub error: Option<SearchError>,
}

/// Result of [`Portfolio::run`].
#[derive(Debug)]
pub struct PortfolioOutcome<S, A, V> {
    pub best: Option<EvaluatedPath<S, A, V>>,
    /// Index of the member that produced `best`.
    pub winner: Option<usize>,
    /// One report per member, in insertion order.
    pub members: Vec<MemberReport>,
}

/// A set of algorithms run concurrently against each other.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use graphsearch_algorithms::{BestFirst, DepthFirst, Portfolio};
/// use graphsearch_core::InterruptRegistry;
/// use graphsearch_eval::AdditiveEvaluator;
/// use graphsearch_test::WeightedDag;
///
/// let dag = Arc::new(WeightedDag::sample());
/// let registry = Arc::new(InterruptRegistry::new());
/// let cost = || AdditiveEvaluator::dijkstra(WeightedDag::edge_cost);
///
/// let mut portfolio = Portfolio::new()
///     .with_member(BestFirst::new(Arc::clone(&dag), cost(), Arc::clone(&registry)))
///     .with_member(DepthFirst::new(dag, cost(), registry));
///
/// let outcome = portfolio.run().unwrap();
/// assert_eq!(outcome.best.unwrap().score, Some(7));
/// ```
pub struct Portfolio<S, A, V>
where
    S: SearchState,
    A: SearchAction,
    V: Score,
{
    members: Vec<BoxedAlgorithm<S, A, V>>,
    thread_count: ThreadCount,
    objective: Objective,
}

impl<S, A, V> Portfolio<S, A, V>
where
    S: SearchState,
    A: SearchAction,
    V: Score,
{
    pub fn new() -> Self {
        Self {
            members: Vec::new(),
            thread_count: ThreadCount::Auto,
            objective: Objective::Minimize,
        }
    }

    pub fn with_member<T>(mut self, algorithm: T) -> Self
    where
        T: SearchAlgorithm<State = S, Action = A, Score = V> + 'static,
    {
        self.push(Box::new(algorithm));
        self
    }

    pub fn push(&mut self, algorithm: BoxedAlgorithm<S, A, V>) {
        self.members.push(algorithm);
    }

    pub fn with_thread_count(mut self, thread_count: ThreadCount) -> Self {
        self.thread_count = thread_count;
        self
    }

    /// Direction used to pick the winner among member solutions.
    pub fn with_objective(mut self, objective: Objective) -> Self {
        self.objective = objective;
        self
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> &[BoxedAlgorithm<S, A, V>] {
        &self.members
    }

    /// Cancel handles of every member, in insertion order.
    pub fn cancel_handles(&self) -> Vec<CancelHandle> {
        self.members.iter().map(|m| m.cancel_handle()).collect()
    }

    /// Runs every member to completion and merges their results.
    ///
    /// Fails only when no member produced a solution and at least one
    /// failed; the first failure is returned.
    pub fn run(&mut self) -> Result<PortfolioOutcome<S, A, V>> {
        if self.members.is_empty() {
            return Err(SearchError::Config("portfolio has no members".to_string()));
        }

        let threads = self.thread_count.resolve(self.members.len());
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("graphsearch-portfolio-{i}"))
            .build()
            .map_err(|e| SearchError::Computation(format!("failed to build thread pool: {e}")))?;

        info!(event = "portfolio_start", members = self.members.len(), threads);

        let objective = self.objective;
        let best: Mutex<Option<(usize, EvaluatedPath<S, A, V>)>> = Mutex::new(None);
        let reports: Mutex<Vec<Option<MemberReport>>> =
            Mutex::new((0..self.members.len()).map(|_| None).collect());

        pool.scope(|scope| {
            for (index, member) in self.members.iter_mut().enumerate() {
                let best = &best;
                let reports = &reports;
                scope.spawn(move |_| {
                    let name = member.name();
                    let error = match member.run() {
                        Ok(Some(solution)) => {
                            let mut slot = best.lock().unwrap_or_else(PoisonError::into_inner);
                            if replaces(objective, index, &solution, slot.as_ref()) {
                                *slot = Some((index, solution));
                            }
                            None
                        }
                        Ok(None) => None,
                        Err(e) => {
                            warn!(
                                event = "member_failed",
                                member = index,
                                algorithm = name,
                                error = %e
                            );
                            Some(e)
                        }
                    };
                    let report = MemberReport {
                        name,
                        statistics: member.statistics(),
                        error,
                    };
                    reports.lock().unwrap_or_else(PoisonError::into_inner)[index] = Some(report);
                });
            }
        });

        let best = best.into_inner().unwrap_or_else(PoisonError::into_inner);
        let mut members: Vec<MemberReport> = reports
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .into_iter()
            .flatten()
            .collect();

        if best.is_none() {
            if let Some(failed) = members.iter_mut().find(|m| m.error.is_some()) {
                if let Some(error) = failed.error.take() {
                    return Err(error);
                }
            }
        }

        let (winner, best) = match best {
            Some((index, solution)) => (Some(index), Some(solution)),
            None => (None, None),
        };

        info!(
            event = "portfolio_complete",
            winner = winner.and_then(|i| members.get(i)).map(|m| m.name),
            best_score = best.as_ref().and_then(|b| b.score.as_ref()).map(|s| s.as_f64()),
        );

        Ok(PortfolioOutcome {
            best,
            winner,
            members,
        })
    }
}

/// Returns true if the solution of member `index` should replace the
/// current winner. Equal scores go to the lower member index.
fn replaces<S, A, V: Score>(
    objective: Objective,
    index: usize,
    candidate: &EvaluatedPath<S, A, V>,
    current: Option<&(usize, EvaluatedPath<S, A, V>)>,
) -> bool {
    match current {
        None => true,
        Some((current_index, incumbent)) => {
            improves(objective, candidate, incumbent)
                || (index < *current_index && !improves(objective, incumbent, candidate))
        }
    }
}

impl<S, A, V> Default for Portfolio<S, A, V>
where
    S: SearchState,
    A: SearchAction,
    V: Score,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S, A, V> std::fmt::Debug for Portfolio<S, A, V>
where
    S: SearchState,
    A: SearchAction,
    V: Score,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Portfolio")
            .field("members", &self.members.iter().map(|m| m.name()).collect::<Vec<_>>())
            .field("thread_count", &self.thread_count)
            .field("objective", &self.objective)
            .finish()
    }
}

#[cfg(test)]
#[path = "portfolio_tests.rs"]
mod tests;
