//! Graph generator contract.
//!
//! The problem encoding supplies the implicit graph: a root, a successor
//! function and a goal test. The engine never inspects states; generators
//! receive and return plain domain values and never see the node arena.

use std::fmt::Debug;
use std::sync::Arc;

use rand::{Rng, RngCore};

use crate::error::Result;
use crate::node::{NodeType, Path};

/// Bounds every search state satisfies.
pub trait SearchState: Debug + Send + Sync + 'static {}

impl<T: Debug + Send + Sync + 'static> SearchState for T {}

/// Bounds every edge action satisfies.
pub trait SearchAction: Debug + Clone + Send + Sync + 'static {}

impl<T: Debug + Clone + Send + Sync + 'static> SearchAction for T {}

/// One outgoing edge produced by a successor call.
#[derive(Debug, Clone)]
pub struct Expansion<S, A> {
    /// The successor state.
    pub state: S,
    /// The action labelling the edge.
    pub action: A,
    /// AND/OR type of the new node.
    pub kind: NodeType,
}

impl<S, A> Expansion<S, A> {
    /// Creates an OR expansion.
    pub fn new(state: S, action: A) -> Self {
        Self {
            state,
            action,
            kind: NodeType::Or,
        }
    }

    pub fn with_kind(mut self, kind: NodeType) -> Self {
        self.kind = kind;
        self
    }
}

/// An implicitly defined search graph.
pub trait GraphGenerator: Send + Sync {
    type State: SearchState;
    type Action: SearchAction;

    /// Produces the root state.
    fn root(&self) -> Result<Self::State>;

    /// Produces all successors of a state, in the generator's preferred order.
    fn successors(&self, state: &Self::State) -> Result<Vec<Expansion<Self::State, Self::Action>>>;

    /// Goal test on a single state.
    fn is_goal(&self, state: &Self::State) -> bool;

    /// Goal test on a whole root path. Defaults to testing the last state.
    fn is_goal_path(&self, path: &Path<Self::State, Self::Action>) -> bool {
        self.is_goal(path.head())
    }

    /// Draws one successor uniformly at random, `None` at a dead end.
    ///
    /// Generators that can sample without enumerating every successor
    /// should override this; rollouts call it once per step.
    fn random_successor(
        &self,
        state: &Self::State,
        rng: &mut dyn RngCore,
    ) -> Result<Option<Expansion<Self::State, Self::Action>>> {
        let mut successors = self.successors(state)?;
        if successors.is_empty() {
            return Ok(None);
        }
        let index = rng.random_range(0..successors.len());
        Ok(Some(successors.swap_remove(index)))
    }
}

/// Type-erased shared generator, as handed to graph-dependent evaluators.
pub type DynGraphGenerator<S, A> = Arc<dyn GraphGenerator<State = S, Action = A>>;

impl<G: GraphGenerator + ?Sized> GraphGenerator for Arc<G> {
    type State = G::State;
    type Action = G::Action;

    fn root(&self) -> Result<Self::State> {
        (**self).root()
    }

    fn successors(&self, state: &Self::State) -> Result<Vec<Expansion<Self::State, Self::Action>>> {
        (**self).successors(state)
    }

    fn is_goal(&self, state: &Self::State) -> bool {
        (**self).is_goal(state)
    }

    fn is_goal_path(&self, path: &Path<Self::State, Self::Action>) -> bool {
        (**self).is_goal_path(path)
    }

    fn random_successor(
        &self,
        state: &Self::State,
        rng: &mut dyn RngCore,
    ) -> Result<Option<Expansion<Self::State, Self::Action>>> {
        (**self).random_successor(state, rng)
    }
}
