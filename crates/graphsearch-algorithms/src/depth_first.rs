//! Depth-first and randomized depth-first search.
//!
//! The frontier is a stack. Successors are pushed in reverse so that the
//! generator's first successor is explored first; the randomized variant
//! shuffles every successor list with the seeded search RNG instead.
//!
//! Children are inserted unevaluated. Only goal paths are scored, and every
//! goal leaf whose path the evaluator accepts is a solution.

use std::sync::Arc;
use std::time::Duration;

use graphsearch_config::DepthFirstConfig;
use graphsearch_core::{EvaluatedPath, GraphGenerator, InterruptRegistry, NodeId, Result};
use graphsearch_eval::NodeEvaluator;
use rand::seq::SliceRandom;
use tracing::{debug, trace};

use crate::algorithm::{SearchAlgorithm, StepOutcome};
use crate::context::{Advance, Evaluation, SearchContext, SolutionOf};
use crate::event::{NodeStatus, SearchEventListener};
use crate::lifecycle::{AlgorithmState, CancelHandle, StepGate};
use crate::statistics::SearchStatistics;
use crate::termination::{ExpansionCountTermination, Termination};

/// Depth-first search over an implicit graph.
pub struct DepthFirst<G, E>
where
    G: GraphGenerator + 'static,
    E: NodeEvaluator<G::State, G::Action>,
{
    ctx: SearchContext<G, E>,
    stack: Vec<NodeId>,
    randomized: bool,
    depth_limit: Option<usize>,
}

impl<G, E> DepthFirst<G, E>
where
    G: GraphGenerator + 'static,
    E: NodeEvaluator<G::State, G::Action>,
{
    pub fn new(generator: Arc<G>, evaluator: E, registry: Arc<InterruptRegistry>) -> Self {
        Self {
            ctx: SearchContext::new("depth_first", generator, evaluator, registry),
            stack: Vec::new(),
            randomized: false,
            depth_limit: None,
        }
    }

    /// Randomized depth-first search seeded with `seed`.
    pub fn randomized(
        generator: Arc<G>,
        evaluator: E,
        registry: Arc<InterruptRegistry>,
        seed: u64,
    ) -> Self {
        Self::new(generator, evaluator, registry)
            .with_randomized(true)
            .with_seed(seed)
    }

    /// Creates a search from its configuration section.
    pub fn from_config(
        generator: Arc<G>,
        evaluator: E,
        registry: Arc<InterruptRegistry>,
        config: &DepthFirstConfig,
    ) -> Self {
        let search = Self::new(generator, evaluator, registry).with_randomized(config.randomized);
        match config.depth_limit {
            Some(limit) => search.with_depth_limit(limit),
            None => search,
        }
    }

    pub fn with_randomized(mut self, randomized: bool) -> Self {
        self.randomized = randomized;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.ctx.reseed(seed);
        self
    }

    /// Nodes at `limit` edges from the root are not expanded.
    pub fn with_depth_limit(mut self, limit: usize) -> Self {
        self.depth_limit = Some(limit);
        self
    }

    pub fn with_termination(mut self, termination: Box<dyn Termination>) -> Self {
        self.ctx.lifecycle.add_termination(termination);
        self
    }

    pub fn with_max_expansions(self, limit: u64) -> Self {
        self.with_termination(Box::new(ExpansionCountTermination::new(limit)))
    }

    pub fn is_randomized(&self) -> bool {
        self.randomized
    }

    pub fn depth_limit(&self) -> Option<usize> {
        self.depth_limit
    }

    pub fn stack_len(&self) -> usize {
        self.stack.len()
    }

    pub fn node_count(&self) -> usize {
        self.ctx.arena.len()
    }

    fn advance(&mut self) -> Result<Advance<SolutionOf<G, E>>> {
        match self.ctx.begin_step()? {
            StepGate::Terminated => return Ok(Advance::Terminated),
            StepGate::Initialize => {
                return match self.ctx.initialize_root(false)? {
                    Some(root) => {
                        self.stack.push(root);
                        Ok(Advance::Progress)
                    }
                    None => Ok(Advance::Exhausted),
                };
            }
            StepGate::Continue => {}
        }

        let Some(node) = self.stack.pop() else {
            return Ok(Advance::Exhausted);
        };
        self.ctx.switch(node, NodeStatus::Closed);
        let path = self.ctx.arena.path(node);

        if self.ctx.generator.is_goal_path(&path) {
            return match self.ctx.evaluate(&path)? {
                Evaluation::Scored(score) => {
                    self.ctx.switch(node, NodeStatus::Solution);
                    let (solution, _) = self.ctx.report_solution(path, Some(score));
                    Ok(Advance::Solution(solution))
                }
                Evaluation::Pruned | Evaluation::Failed => {
                    trace!(node = %node, "Goal path rejected by evaluator");
                    self.ctx.switch(node, NodeStatus::Dead);
                    Ok(Advance::Progress)
                }
            };
        }

        if self.depth_limit.is_some_and(|limit| path.depth() >= limit) {
            self.ctx.switch(node, NodeStatus::Dead);
            return Ok(Advance::Progress);
        }

        let mut successors = self.ctx.successors(node)?;
        if successors.is_empty() {
            self.ctx.switch(node, NodeStatus::Dead);
            return Ok(Advance::Progress);
        }
        if self.randomized {
            successors.shuffle(self.ctx.scope.rng());
        }

        let added = successors.len();
        let mut children = Vec::with_capacity(added);
        for expansion in successors {
            let child = self.ctx.add_child(
                node,
                Arc::new(expansion.state),
                expansion.action,
                expansion.kind,
                None,
                NodeStatus::Open,
            );
            children.push(child);
        }
        self.stack.extend(children.into_iter().rev());
        debug!(
            event = "expanded",
            node = %node,
            depth = path.depth(),
            added,
            stack = self.stack.len()
        );
        Ok(Advance::Progress)
    }
}

impl<G, E> SearchAlgorithm for DepthFirst<G, E>
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

    fn is_anytime(&self) -> bool {
        true
    }
}

impl<G, E> std::fmt::Debug for DepthFirst<G, E>
where
    G: GraphGenerator + 'static,
    E: NodeEvaluator<G::State, G::Action>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DepthFirst")
            .field("context", &self.ctx)
            .field("stack", &self.stack.len())
            .field("randomized", &self.randomized)
            .field("depth_limit", &self.depth_limit)
            .finish()
    }
}

#[cfg(test)]
#[path = "depth_first_tests.rs"]
mod tests;
