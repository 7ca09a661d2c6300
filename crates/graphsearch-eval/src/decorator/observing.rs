//! Solution-observing decorator.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use graphsearch_core::{
    DynGraphGenerator, EvaluatedPath, Path, Result, Score, SearchAction, SearchState,
};

use crate::evaluator::{Capabilities, NodeEvaluator};

/// Callback invoked for every observed solution.
pub type SolutionListener<S, A, V> = Box<dyn Fn(&EvaluatedPath<S, A, V>) + Send + Sync>;

/// Records the solutions the search reports and the best score among them.
pub struct SolutionObserving<S, A, E>
where
    S: SearchState,
    A: SearchAction,
    E: NodeEvaluator<S, A>,
{
    inner: E,
    observed: AtomicU64,
    best: Mutex<Option<E::Score>>,
    listener: Option<SolutionListener<S, A, E::Score>>,
}

impl<S, A, E> SolutionObserving<S, A, E>
where
    S: SearchState,
    A: SearchAction,
    E: NodeEvaluator<S, A>,
{
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            observed: AtomicU64::new(0),
            best: Mutex::new(None),
            listener: None,
        }
    }

    pub fn with_listener(
        mut self,
        listener: impl Fn(&EvaluatedPath<S, A, E::Score>) + Send + Sync + 'static,
    ) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }

    /// Number of solutions observed so far.
    pub fn observed_count(&self) -> u64 {
        self.observed.load(Ordering::SeqCst)
    }

    /// Lowest score among the observed solutions.
    pub fn best_score(&self) -> Option<E::Score> {
        *self.best.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }
}

impl<S, A, E> fmt::Debug for SolutionObserving<S, A, E>
where
    S: SearchState,
    A: SearchAction,
    E: NodeEvaluator<S, A>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolutionObserving")
            .field("inner", &self.inner)
            .field("observed", &self.observed_count())
            .field("best", &self.best_score())
            .finish()
    }
}

impl<S, A, E> NodeEvaluator<S, A> for SolutionObserving<S, A, E>
where
    S: SearchState,
    A: SearchAction,
    E: NodeEvaluator<S, A>,
{
    type Score = E::Score;

    fn evaluate(&self, path: &Path<S, A>) -> Result<Option<Self::Score>> {
        self.inner.evaluate(path)
    }

    fn capabilities(&self) -> Capabilities {
        self.inner.capabilities() | Capabilities::solution_observing()
    }

    fn set_graph_generator(&self, generator: DynGraphGenerator<S, A>) -> Result<()> {
        self.inner.set_graph_generator(generator)
    }

    fn observe_solution(&self, solution: &EvaluatedPath<S, A, Self::Score>) {
        self.observed.fetch_add(1, Ordering::SeqCst);
        if let Some(score) = solution.score {
            let mut best = self.best.lock().unwrap_or_else(PoisonError::into_inner);
            if best.map_or(true, |b| score.compare(&b).is_lt()) {
                *best = Some(score);
            }
        }
        if let Some(listener) = &self.listener {
            listener(solution);
        }
        self.inner.observe_solution(solution);
    }

    fn cancel(&self) {
        self.inner.cancel()
    }
}
