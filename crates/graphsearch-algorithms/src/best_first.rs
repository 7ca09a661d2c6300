//! Generic best-first search.
//!
//! Expands the open node with the lowest f-value, where f is whatever the
//! node evaluator computes for the node's root path. With an
//! [`AdditiveEvaluator`](graphsearch_eval::AdditiveEvaluator) this is A*
//! (`g + h`), Dijkstra (`h ≡ 0`) or greedy best-first (`g ≡ 0`).
//!
//! Goal tests happen when a node is taken from the open list, so with an
//! admissible heuristic the first solution is optimal.

use std::sync::Arc;
use std::time::Duration;

use graphsearch_config::TieBreak;
use graphsearch_core::{EvaluatedPath, GraphGenerator, InterruptRegistry, NodeId, Result};
use graphsearch_eval::NodeEvaluator;
use tracing::debug;

use crate::algorithm::{SearchAlgorithm, StepOutcome};
use crate::context::{Advance, Evaluation, SearchContext, SolutionOf};
use crate::event::{NodeStatus, SearchEventListener};
use crate::frontier::{Membership, OpenList};
use crate::lifecycle::{AlgorithmState, CancelHandle, StepGate};
use crate::statistics::SearchStatistics;
use crate::termination::{ExpansionCountTermination, Termination};

/// Best-first search over an implicit graph.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use graphsearch_algorithms::{BestFirst, SearchAlgorithm};
/// use graphsearch_core::InterruptRegistry;
/// use graphsearch_eval::AdditiveEvaluator;
/// use graphsearch_test::WeightedDag;
///
/// let dag = Arc::new(WeightedDag::sample());
/// let h = Arc::clone(&dag);
/// let evaluator = AdditiveEvaluator::a_star(WeightedDag::edge_cost, move |s| h.heuristic(s));
///
/// let mut search = BestFirst::new(dag, evaluator, Arc::new(InterruptRegistry::new()));
/// let solution = search.next_solution().unwrap().unwrap();
/// assert_eq!(solution.score, Some(7));
/// ```
pub struct BestFirst<G, E>
where
    G: GraphGenerator + 'static,
    E: NodeEvaluator<G::State, G::Action>,
{
    ctx: SearchContext<G, E>,
    open: OpenList<E::Score>,
    membership: Membership,
}

impl<G, E> BestFirst<G, E>
where
    G: GraphGenerator + 'static,
    E: NodeEvaluator<G::State, G::Action>,
{
    pub fn new(generator: Arc<G>, evaluator: E, registry: Arc<InterruptRegistry>) -> Self {
        Self {
            ctx: SearchContext::new("best_first", generator, evaluator, registry),
            open: OpenList::new(TieBreak::Fifo),
            membership: Membership::new(),
        }
    }

    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.open = OpenList::new(tie_break);
        self
    }

    /// Seeds the random tie-break.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.ctx.reseed(seed);
        self
    }

    pub fn with_termination(mut self, termination: Box<dyn Termination>) -> Self {
        self.ctx.lifecycle.add_termination(termination);
        self
    }

    /// Stops after `limit` expansions.
    pub fn with_max_expansions(self, limit: u64) -> Self {
        self.with_termination(Box::new(ExpansionCountTermination::new(limit)))
    }

    pub fn evaluator(&self) -> &E {
        &self.ctx.evaluator
    }

    pub fn open_len(&self) -> usize {
        self.open.len()
    }

    pub fn closed_len(&self) -> usize {
        self.membership.count(NodeStatus::Closed)
    }

    pub fn node_count(&self) -> usize {
        self.ctx.arena.len()
    }

    fn insert_open(&mut self, node: NodeId, f: E::Score) {
        self.open.push(node, f, self.ctx.scope.rng());
        self.membership.set(node, NodeStatus::Open);
    }

    fn advance(&mut self) -> Result<Advance<SolutionOf<G, E>>> {
        match self.ctx.begin_step()? {
            StepGate::Terminated => return Ok(Advance::Terminated),
            StepGate::Initialize => {
                let Some(root) = self.ctx.initialize_root(true)? else {
                    return Ok(Advance::Exhausted);
                };
                return match self.ctx.arena[root].label().copied() {
                    Some(f) => {
                        self.insert_open(root, f);
                        Ok(Advance::Progress)
                    }
                    None => Ok(Advance::Exhausted),
                };
            }
            StepGate::Continue => {}
        }

        let Some((node, f)) = self.open.pop() else {
            return Ok(Advance::Exhausted);
        };
        self.membership.set(node, NodeStatus::Closed);
        self.ctx.switch(node, NodeStatus::Closed);

        let path = self.ctx.arena.path(node);
        if self.ctx.generator.is_goal_path(&path) {
            self.ctx.switch(node, NodeStatus::Solution);
            let (solution, _) = self.ctx.report_solution(path, Some(f));
            return Ok(Advance::Solution(solution));
        }

        let successors = self.ctx.successors(node)?;
        let mut added = 0usize;
        for expansion in successors {
            self.ctx.check()?;
            let state = Arc::new(expansion.state);
            let child_path = path.extended(Arc::clone(&state), expansion.action.clone());
            if let Evaluation::Scored(score) = self.ctx.evaluate(&child_path)? {
                let child = self.ctx.add_child(
                    node,
                    state,
                    expansion.action,
                    expansion.kind,
                    Some(score),
                    NodeStatus::Open,
                );
                self.insert_open(child, score);
                added += 1;
            }
        }
        debug!(
            event = "expanded",
            node = %node,
            depth = path.depth(),
            f = ?f,
            added,
            open = self.open.len()
        );
        Ok(Advance::Progress)
    }
}

impl<G, E> SearchAlgorithm for BestFirst<G, E>
where
    G: GraphGenerator + 'static,
    E: NodeEvaluator<G::State, G::Action> + 'static,
{
    type State = G::State;
    type Action = G::Action;
    type Score = E::Score;

    fn name(&self) -> &'static str {
        self.ctx.name()
    }

    fn state(&self) -> AlgorithmState {
        self.ctx.lifecycle.state()
    }

    fn step(&mut self) -> Result<StepOutcome<G::State, G::Action, E::Score>> {
        let _bound = self.ctx.lifecycle.bind();
        let advance = self.advance();
        self.ctx.settle(advance)
    }

    fn cancel_handle(&self) -> CancelHandle {
        self.ctx.lifecycle.cancel_handle()
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.ctx.lifecycle.set_timeout(timeout, &self.ctx.scope)
    }

    fn best_solution(&self) -> Option<&EvaluatedPath<G::State, G::Action, E::Score>> {
        self.ctx.best()
    }

    fn statistics(&self) -> SearchStatistics {
        self.ctx.scope.statistics().snapshot()
    }

    fn add_listener(
        &mut self,
        listener: Arc<dyn SearchEventListener<G::State, G::Action, E::Score>>,
    ) {
        self.ctx.events.add_listener(listener);
    }
}

impl<G, E> std::fmt::Debug for BestFirst<G, E>
where
    G: GraphGenerator + 'static,
    E: NodeEvaluator<G::State, G::Action>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BestFirst")
            .field("context", &self.ctx)
            .field("open", &self.open)
            .finish()
    }
}

#[cfg(test)]
#[path = "best_first_tests.rs"]
mod tests;
