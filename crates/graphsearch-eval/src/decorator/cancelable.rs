//! Cancelable decorator.

use std::sync::atomic::{AtomicBool, Ordering};

use graphsearch_core::{
    DynGraphGenerator, EvaluatedPath, Path, Result, SearchAction, SearchError, SearchState,
};
use tracing::debug;

use crate::evaluator::{Capabilities, NodeEvaluator};

/// Rejects evaluations after [`NodeEvaluator::cancel`] and forwards the
/// cancellation to the wrapped evaluator at most once.
#[derive(Debug)]
pub struct Cancelable<E> {
    inner: E,
    canceled: AtomicBool,
}

impl<E> Cancelable<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            canceled: AtomicBool::new(false),
        }
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }
}

impl<S, A, E> NodeEvaluator<S, A> for Cancelable<E>
where
    S: SearchState,
    A: SearchAction,
    E: NodeEvaluator<S, A>,
{
    type Score = E::Score;

    fn evaluate(&self, path: &Path<S, A>) -> Result<Option<Self::Score>> {
        if self.is_canceled() {
            return Err(SearchError::IllegalState(
                "evaluator has been canceled".to_string(),
            ));
        }
        self.inner.evaluate(path)
    }

    fn capabilities(&self) -> Capabilities {
        self.inner.capabilities() | Capabilities::cancelable()
    }

    fn set_graph_generator(&self, generator: DynGraphGenerator<S, A>) -> Result<()> {
        self.inner.set_graph_generator(generator)
    }

    fn observe_solution(&self, solution: &EvaluatedPath<S, A, Self::Score>) {
        self.inner.observe_solution(solution)
    }

    fn cancel(&self) {
        if !self.canceled.swap(true, Ordering::SeqCst) {
            debug!(event = "evaluator_canceled");
            self.inner.cancel();
        }
    }
}
