//! Anytime Window A*.
//!
//! Runs windowed A* passes with a growing window. During a pass only nodes
//! close to the deepest level reached so far are expanded; shallower nodes
//! are suspended. A pass ends at the first goal or when open runs empty.
//! Afterwards the window grows by one and closed and suspended nodes are
//! merged back into open.
//!
//! Nodes whose f-value is not better than the incumbent are pruned, so each
//! reported solution strictly improves on the previous one. The search is
//! complete once a pass exhausts open without suspending anything; with an
//! admissible evaluator the incumbent is then optimal.

use std::sync::Arc;
use std::time::Duration;

use graphsearch_config::TieBreak;
use graphsearch_core::{EvaluatedPath, GraphGenerator, InterruptRegistry, NodeId, Result, Score};
use graphsearch_eval::NodeEvaluator;
use tracing::debug;

use crate::algorithm::{SearchAlgorithm, StepOutcome};
use crate::context::{Advance, Evaluation, SearchContext, SolutionOf};
use crate::event::{NodeStatus, SearchEventListener};
use crate::frontier::{Membership, OpenList};
use crate::lifecycle::{AlgorithmState, CancelHandle, StepGate};
use crate::statistics::SearchStatistics;
use crate::termination::{ExpansionCountTermination, Termination};

/// Anytime Window A* over an implicit graph.
pub struct AwaStar<G, E>
where
    G: GraphGenerator + 'static,
    E: NodeEvaluator<G::State, G::Action>,
{
    ctx: SearchContext<G, E>,
    open: OpenList<E::Score>,
    closed: Vec<NodeId>,
    suspended: Vec<NodeId>,
    membership: Membership,
    expanded: Vec<bool>,
    window: usize,
    current_level: Option<usize>,
    iteration_best: Vec<Option<E::Score>>,
    complete: bool,
}

impl<G, E> AwaStar<G, E>
where
    G: GraphGenerator + 'static,
    E: NodeEvaluator<G::State, G::Action>,
{
    pub fn new(generator: Arc<G>, evaluator: E, registry: Arc<InterruptRegistry>) -> Self {
        Self {
            ctx: SearchContext::new("awa_star", generator, evaluator, registry),
            open: OpenList::new(TieBreak::Fifo),
            closed: Vec::new(),
            suspended: Vec::new(),
            membership: Membership::new(),
            expanded: Vec::new(),
            window: 0,
            current_level: None,
            iteration_best: Vec::new(),
            complete: false,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.ctx.reseed(seed);
        self
    }

    pub fn with_termination(mut self, termination: Box<dyn Termination>) -> Self {
        self.ctx.lifecycle.add_termination(termination);
        self
    }

    pub fn with_max_expansions(self, limit: u64) -> Self {
        self.with_termination(Box::new(ExpansionCountTermination::new(limit)))
    }

    /// Current window size.
    pub fn window(&self) -> usize {
        self.window
    }

    /// Incumbent score at the end of every completed pass.
    pub fn iteration_best(&self) -> &[Option<E::Score>] {
        &self.iteration_best
    }

    pub fn open_len(&self) -> usize {
        self.open.len()
    }

    pub fn suspended_len(&self) -> usize {
        self.suspended.len()
    }

    pub fn closed_len(&self) -> usize {
        self.closed.len()
    }

    pub fn node_count(&self) -> usize {
        self.ctx.arena.len()
    }

    /// Set the node currently belongs to, `None` if it was never queued.
    pub fn node_status(&self, node: NodeId) -> Option<NodeStatus> {
        self.membership.get(node)
    }

    fn insert_open(&mut self, node: NodeId, f: E::Score) {
        self.open.push(node, f, self.ctx.scope.rng());
        self.membership.set(node, NodeStatus::Open);
    }

    /// Returns true if `f` can still lead to a strictly better solution.
    fn beats_incumbent(&self, f: &E::Score) -> bool {
        match self.ctx.best().and_then(|best| best.score) {
            Some(best) => f.compare(&best).is_lt(),
            None => true,
        }
    }

    fn mark_expanded(&mut self, node: NodeId) -> bool {
        let index = node.index();
        if index >= self.expanded.len() {
            self.expanded.resize(index + 1, false);
        }
        !std::mem::replace(&mut self.expanded[index], true)
    }

    /// Ends the current pass and prepares the next one.
    ///
    /// Returns `false` when nothing is left to search.
    fn end_pass(&mut self) -> bool {
        let incumbent = self.ctx.best().and_then(|best| best.score);
        self.iteration_best.push(incumbent);
        if self.open.is_empty() && self.suspended.is_empty() {
            return false;
        }

        self.window += 1;
        self.current_level = None;
        let merged: Vec<NodeId> = self.closed.drain(..).chain(self.suspended.drain(..)).collect();
        let count = merged.len();
        for node in merged {
            if let Some(f) = self.ctx.arena[node].label().copied() {
                self.insert_open(node, f);
            }
        }
        self.ctx.events.fire_window_increased(self.window);
        debug!(
            event = "window_increased",
            window = self.window,
            merged = count,
            open = self.open.len(),
            best = ?incumbent
        );
        true
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
            StepGate::Continue if self.complete => return Ok(Advance::Exhausted),
            StepGate::Continue => {}
        }

        let Some((node, f)) = self.open.pop() else {
            return Ok(if self.end_pass() {
                Advance::Progress
            } else {
                Advance::Exhausted
            });
        };

        if !self.beats_incumbent(&f) {
            self.membership.set(node, NodeStatus::Dead);
            self.ctx.switch(node, NodeStatus::Dead);
            return Ok(Advance::Progress);
        }

        let depth = self.ctx.arena[node].depth();
        if self
            .current_level
            .is_some_and(|level| depth + self.window <= level)
        {
            self.suspended.push(node);
            self.membership.set(node, NodeStatus::Suspended);
            self.ctx.switch(node, NodeStatus::Suspended);
            return Ok(Advance::Progress);
        }
        self.current_level = Some(self.current_level.map_or(depth, |level| level.max(depth)));

        let path = self.ctx.arena.path(node);
        if self.ctx.generator.is_goal_path(&path) {
            self.membership.set(node, NodeStatus::Solution);
            self.ctx.switch(node, NodeStatus::Solution);
            let (solution, improved) = self.ctx.report_solution(path, Some(f));
            self.complete = !self.end_pass();
            return Ok(match (improved, self.complete) {
                (true, _) => Advance::Solution(solution),
                (false, true) => Advance::Exhausted,
                (false, false) => Advance::Progress,
            });
        }

        self.closed.push(node);
        self.membership.set(node, NodeStatus::Closed);
        self.ctx.switch(node, NodeStatus::Closed);
        if !self.mark_expanded(node) {
            return Ok(Advance::Progress);
        }

        let successors = self.ctx.successors(node)?;
        let mut added = 0usize;
        for expansion in successors {
            self.ctx.check()?;
            let state = Arc::new(expansion.state);
            let child_path = path.extended(Arc::clone(&state), expansion.action.clone());
            let Evaluation::Scored(score) = self.ctx.evaluate(&child_path)? else {
                continue;
            };
            if !self.beats_incumbent(&score) {
                continue;
            }
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
        debug!(
            event = "expanded",
            node = %node,
            depth,
            f = ?f,
            window = self.window,
            added
        );
        Ok(Advance::Progress)
    }
}

impl<G, E> SearchAlgorithm for AwaStar<G, E>
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

impl<G, E> std::fmt::Debug for AwaStar<G, E>
where
    G: GraphGenerator + 'static,
    E: NodeEvaluator<G::State, G::Action>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwaStar")
            .field("context", &self.ctx)
            .field("window", &self.window)
            .field("open", &self.open.len())
            .field("closed", &self.closed.len())
            .field("suspended", &self.suspended.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "awa_star_tests.rs"]
mod tests;
