//! Deadline-bounded evaluation.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use graphsearch_core::{
    BoundedComputer, DynGraphGenerator, EvaluatedPath, Path, Result, Score, SearchAction,
    SearchError, SearchState,
};
use tracing::{trace, warn};

use crate::evaluator::{Capabilities, NodeEvaluator};

/// What a [`TimeAware`] evaluator reports when the wrapped evaluator runs
/// out of time.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum TimeoutPolicy<V> {
    /// Prune the node.
    #[default]
    Prune,
    /// Label the node with a fixed score.
    Fallback(V),
    /// Report a local evaluation failure; the node is dropped.
    Fail,
    /// Return the timeout error, aborting the search.
    Propagate,
}

/// Runs the wrapped evaluator under a per-node deadline.
///
/// Evaluation happens on a detached thread so that evaluators which never
/// poll for cancellation can still be abandoned. A node timeout is always
/// handled by the [`TimeoutPolicy`]; a cancellation of the surrounding
/// search is passed through as [`SearchError::Canceled`].
pub struct TimeAware<E, V> {
    inner: Arc<E>,
    computer: BoundedComputer,
    deadline: Duration,
    policy: TimeoutPolicy<V>,
}

impl<E, V> TimeAware<E, V> {
    pub fn new(inner: E, computer: BoundedComputer, deadline: Duration) -> Self {
        Self {
            inner: Arc::new(inner),
            computer,
            deadline,
            policy: TimeoutPolicy::Prune,
        }
    }

    pub fn with_policy(mut self, policy: TimeoutPolicy<V>) -> Self {
        self.policy = policy;
        self
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    pub fn policy(&self) -> &TimeoutPolicy<V> {
        &self.policy
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }
}

impl<E: fmt::Debug, V: fmt::Debug> fmt::Debug for TimeAware<E, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeAware")
            .field("inner", &self.inner)
            .field("deadline", &self.deadline)
            .field("policy", &self.policy)
            .finish()
    }
}

impl<S, A, V, E> NodeEvaluator<S, A> for TimeAware<E, V>
where
    S: SearchState,
    A: SearchAction,
    V: Score,
    E: NodeEvaluator<S, A, Score = V> + 'static,
{
    type Score = V;

    fn evaluate(&self, path: &Path<S, A>) -> Result<Option<V>> {
        let inner = Arc::clone(&self.inner);
        let path = path.clone();
        let depth = path.depth();
        let outcome = self
            .computer
            .compute_detached(self.deadline, "node evaluation", move || {
                Ok(inner.evaluate(&path))
            });

        match outcome {
            Ok(result) => result,
            Err(SearchError::Timeout { budget, overrun }) => match self.policy {
                TimeoutPolicy::Prune => {
                    trace!(depth, ?budget, "Node evaluation timed out; pruning");
                    Ok(None)
                }
                TimeoutPolicy::Fallback(score) => {
                    trace!(depth, ?budget, ?score, "Node evaluation timed out; using fallback");
                    Ok(Some(score))
                }
                TimeoutPolicy::Fail => Err(SearchError::NodeEvaluationFailed(format!(
                    "evaluation exceeded {:?}",
                    budget
                ))),
                TimeoutPolicy::Propagate => {
                    warn!(depth, ?budget, "Node evaluation timed out; aborting search");
                    Err(SearchError::Timeout { budget, overrun })
                }
            },
            Err(e) => Err(e),
        }
    }

    fn capabilities(&self) -> Capabilities {
        self.inner.capabilities() | Capabilities::time_aware()
    }

    fn set_graph_generator(&self, generator: DynGraphGenerator<S, A>) -> Result<()> {
        self.inner.set_graph_generator(generator)
    }

    fn observe_solution(&self, solution: &EvaluatedPath<S, A, V>) {
        self.inner.observe_solution(solution)
    }

    fn cancel(&self) {
        self.inner.cancel()
    }
}
