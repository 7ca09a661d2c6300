//! Primary/fallback evaluator pair.

use graphsearch_core::{
    DynGraphGenerator, EvaluatedPath, Path, Result, SearchAction, SearchState,
};
use tracing::trace;

use crate::evaluator::{Capabilities, NodeEvaluator};

/// Asks `primary` first and falls back to `fallback` when it prunes.
///
/// Useful when the primary evaluator only covers part of the graph, e.g. a
/// random completion that may fail to reach a goal.
#[derive(Debug)]
pub struct AlternativeEvaluator<P, F> {
    primary: P,
    fallback: F,
}

impl<P, F> AlternativeEvaluator<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }

    pub fn primary(&self) -> &P {
        &self.primary
    }

    pub fn fallback(&self) -> &F {
        &self.fallback
    }
}

impl<S, A, P, F> NodeEvaluator<S, A> for AlternativeEvaluator<P, F>
where
    S: SearchState,
    A: SearchAction,
    P: NodeEvaluator<S, A>,
    F: NodeEvaluator<S, A, Score = P::Score>,
{
    type Score = P::Score;

    fn evaluate(&self, path: &Path<S, A>) -> Result<Option<Self::Score>> {
        match self.primary.evaluate(path)? {
            Some(score) => Ok(Some(score)),
            None => {
                trace!(depth = path.depth(), "Primary evaluator pruned; using fallback");
                self.fallback.evaluate(path)
            }
        }
    }

    fn capabilities(&self) -> Capabilities {
        self.primary.capabilities() | self.fallback.capabilities()
    }

    fn set_graph_generator(&self, generator: DynGraphGenerator<S, A>) -> Result<()> {
        self.primary.set_graph_generator(generator.clone())?;
        self.fallback.set_graph_generator(generator)
    }

    fn observe_solution(&self, solution: &EvaluatedPath<S, A, Self::Score>) {
        self.primary.observe_solution(solution);
        self.fallback.observe_solution(solution);
    }

    fn cancel(&self) {
        self.primary.cancel();
        self.fallback.cancel();
    }
}
