//! Basic evaluators: closures, constants and `g + h`.

use std::fmt;
use std::marker::PhantomData;

use graphsearch_core::{Path, Result, Score, SearchAction, SearchState};
use tracing::trace;

use crate::evaluator::NodeEvaluator;

/// Evaluator backed by a closure.
pub struct FnEvaluator<F, V> {
    name: &'static str,
    f: F,
    _score: PhantomData<fn() -> V>,
}

impl<F, V> FnEvaluator<F, V> {
    pub fn new(name: &'static str, f: F) -> Self {
        Self {
            name,
            f,
            _score: PhantomData,
        }
    }
}

impl<F, V> fmt::Debug for FnEvaluator<F, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnEvaluator").field("name", &self.name).finish()
    }
}

impl<S, A, V, F> NodeEvaluator<S, A> for FnEvaluator<F, V>
where
    S: SearchState,
    A: SearchAction,
    V: Score,
    F: Fn(&Path<S, A>) -> Result<Option<V>> + Send + Sync,
{
    type Score = V;

    fn evaluate(&self, path: &Path<S, A>) -> Result<Option<V>> {
        (self.f)(path)
    }
}

/// Scores every path with the same value.
#[derive(Debug, Clone, Copy)]
pub struct ConstantEvaluator<V> {
    value: V,
}

impl<V> ConstantEvaluator<V> {
    pub fn new(value: V) -> Self {
        Self { value }
    }
}

impl<S: SearchState, A: SearchAction, V: Score> NodeEvaluator<S, A> for ConstantEvaluator<V> {
    type Score = V;

    fn evaluate(&self, _path: &Path<S, A>) -> Result<Option<V>> {
        Ok(Some(self.value))
    }
}

type EdgeCost<S, A, V> = Box<dyn Fn(&S, &A, &S) -> V + Send + Sync>;
type Heuristic<S, V> = Box<dyn Fn(&S) -> V + Send + Sync>;

/// Path cost plus heuristic estimate, `f = g + h`.
///
/// `g` sums the edge costs along the path and `h` estimates the remaining
/// cost from the last state. With `h ≡ 0` best-first search behaves like
/// Dijkstra's algorithm; with `g ≡ 0` it is greedy best-first.
pub struct AdditiveEvaluator<S, A, V> {
    edge_cost: Option<EdgeCost<S, A, V>>,
    heuristic: Option<Heuristic<S, V>>,
}

impl<S, A, V> fmt::Debug for AdditiveEvaluator<S, A, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdditiveEvaluator")
            .field("has_edge_cost", &self.edge_cost.is_some())
            .field("has_heuristic", &self.heuristic.is_some())
            .finish()
    }
}

impl<S, A, V> AdditiveEvaluator<S, A, V> {
    /// A* evaluation: accumulated cost plus heuristic.
    pub fn a_star(
        edge_cost: impl Fn(&S, &A, &S) -> V + Send + Sync + 'static,
        heuristic: impl Fn(&S) -> V + Send + Sync + 'static,
    ) -> Self {
        Self {
            edge_cost: Some(Box::new(edge_cost)),
            heuristic: Some(Box::new(heuristic)),
        }
    }

    /// Uniform-cost evaluation, no heuristic.
    pub fn dijkstra(edge_cost: impl Fn(&S, &A, &S) -> V + Send + Sync + 'static) -> Self {
        Self {
            edge_cost: Some(Box::new(edge_cost)),
            heuristic: None,
        }
    }

    /// Heuristic only, ignoring the cost so far.
    pub fn greedy(heuristic: impl Fn(&S) -> V + Send + Sync + 'static) -> Self {
        Self {
            edge_cost: None,
            heuristic: Some(Box::new(heuristic)),
        }
    }
}

impl<S: SearchState, A: SearchAction, V: Score> NodeEvaluator<S, A> for AdditiveEvaluator<S, A, V> {
    type Score = V;

    fn evaluate(&self, path: &Path<S, A>) -> Result<Option<V>> {
        let g = match &self.edge_cost {
            Some(cost) => path
                .edges()
                .fold(V::zero(), |acc, (from, action, to)| acc + cost(from, action, to)),
            None => V::zero(),
        };
        let h = match &self.heuristic {
            Some(heuristic) => heuristic(path.head()),
            None => V::zero(),
        };
        trace!(depth = path.depth(), g = ?g, h = ?h, "Additive evaluation");
        Ok(Some(g + h))
    }
}

#[cfg(test)]
#[path = "base_tests.rs"]
mod tests;
