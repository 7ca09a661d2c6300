//! The node evaluator contract.

use std::fmt::Debug;
use std::ops::BitOr;
use std::sync::Arc;

use graphsearch_core::{
    DynGraphGenerator, EvaluatedPath, Path, Result, Score, SearchAction, SearchState,
};

/// Optional behaviours an evaluator chain supports.
///
/// Decorators report the union of their own capability and everything
/// reported by the evaluator they wrap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// Needs [`NodeEvaluator::set_graph_generator`] before the first use.
    pub graph_dependent: bool,
    /// Wants to see every solution through [`NodeEvaluator::observe_solution`].
    pub solution_observing: bool,
    /// Stops accepting work after [`NodeEvaluator::cancel`].
    pub cancelable: bool,
    /// Evaluates under a deadline.
    pub time_aware: bool,
}

impl Capabilities {
    pub const NONE: Capabilities = Capabilities {
        graph_dependent: false,
        solution_observing: false,
        cancelable: false,
        time_aware: false,
    };

    pub fn graph_dependent() -> Self {
        Self {
            graph_dependent: true,
            ..Self::NONE
        }
    }

    pub fn solution_observing() -> Self {
        Self {
            solution_observing: true,
            ..Self::NONE
        }
    }

    pub fn cancelable() -> Self {
        Self {
            cancelable: true,
            ..Self::NONE
        }
    }

    pub fn time_aware() -> Self {
        Self {
            time_aware: true,
            ..Self::NONE
        }
    }
}

impl BitOr for Capabilities {
    type Output = Capabilities;

    fn bitor(self, rhs: Self) -> Self::Output {
        Capabilities {
            graph_dependent: self.graph_dependent || rhs.graph_dependent,
            solution_observing: self.solution_observing || rhs.solution_observing,
            cancelable: self.cancelable || rhs.cancelable,
            time_aware: self.time_aware || rhs.time_aware,
        }
    }
}

/// Scores root paths.
///
/// `Ok(Some(score))` keeps the node with that label, `Ok(None)` prunes it,
/// and `Err(SearchError::NodeEvaluationFailed)` drops just that node. Any
/// other error aborts the search.
///
/// All methods take `&self` so evaluators can be shared with worker threads;
/// stateful evaluators use interior mutability.
pub trait NodeEvaluator<S: SearchState, A: SearchAction>: Send + Sync + Debug {
    type Score: Score;

    fn evaluate(&self, path: &Path<S, A>) -> Result<Option<Self::Score>>;

    fn capabilities(&self) -> Capabilities {
        Capabilities::NONE
    }

    /// Binds the graph this evaluator scores paths of.
    fn set_graph_generator(&self, _generator: DynGraphGenerator<S, A>) -> Result<()> {
        Ok(())
    }

    /// Called once for every solution the search reports.
    fn observe_solution(&self, _solution: &EvaluatedPath<S, A, Self::Score>) {}

    /// Stops the evaluator. Idempotent.
    fn cancel(&self) {}
}

impl<S, A, E> NodeEvaluator<S, A> for Box<E>
where
    S: SearchState,
    A: SearchAction,
    E: NodeEvaluator<S, A> + ?Sized,
{
    type Score = E::Score;

    fn evaluate(&self, path: &Path<S, A>) -> Result<Option<Self::Score>> {
        (**self).evaluate(path)
    }

    fn capabilities(&self) -> Capabilities {
        (**self).capabilities()
    }

    fn set_graph_generator(&self, generator: DynGraphGenerator<S, A>) -> Result<()> {
        (**self).set_graph_generator(generator)
    }

    fn observe_solution(&self, solution: &EvaluatedPath<S, A, Self::Score>) {
        (**self).observe_solution(solution)
    }

    fn cancel(&self) {
        (**self).cancel()
    }
}

impl<S, A, E> NodeEvaluator<S, A> for Arc<E>
where
    S: SearchState,
    A: SearchAction,
    E: NodeEvaluator<S, A> + ?Sized,
{
    type Score = E::Score;

    fn evaluate(&self, path: &Path<S, A>) -> Result<Option<Self::Score>> {
        (**self).evaluate(path)
    }

    fn capabilities(&self) -> Capabilities {
        (**self).capabilities()
    }

    fn set_graph_generator(&self, generator: DynGraphGenerator<S, A>) -> Result<()> {
        (**self).set_graph_generator(generator)
    }

    fn observe_solution(&self, solution: &EvaluatedPath<S, A, Self::Score>) {
        (**self).observe_solution(solution)
    }

    fn cancel(&self) {
        (**self).cancel()
    }
}

/// Type-erased evaluator with a fixed score type.
pub type BoxedEvaluator<S, A, V> = Box<dyn NodeEvaluator<S, A, Score = V>>;
