//! Monte-Carlo tree search over an implicit graph.

use std::sync::Arc;
use std::time::Duration;

use graphsearch_config::{MctsConfig, Objective};
use graphsearch_core::{
    EvaluatedPath, GraphGenerator, InterruptRegistry, NodeId, Path, Result, Score,
};
use graphsearch_eval::NodeEvaluator;
use tracing::{debug, trace};

use super::policy::{policy_from_config, TreePolicy, Ucb1Policy};
use super::tree::SearchTree;
use crate::algorithm::{SearchAlgorithm, StepOutcome};
use crate::context::{Advance, Evaluation, SearchContext, SolutionOf};
use crate::event::{NodeStatus, SearchEventListener};
use crate::lifecycle::{AlgorithmState, CancelHandle, StepGate};
use crate::statistics::SearchStatistics;
use crate::termination::Termination;

const PROGRESS_INTERVAL: u64 = 1000;

/// Monte-Carlo tree search.
///
/// Every step runs one playout: descend the explored tree with the tree
/// policy, expanding the first node that was never expanded, complete the
/// path with random successors, score it and backpropagate the reward.
/// Goal paths are scored by the evaluator and reported as solution
/// candidates; rollouts that end anywhere else earn the failure reward.
///
/// Subtrees in which every leaf has been scored are exhausted and skipped.
/// Once the root is exhausted the search is complete.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use graphsearch_algorithms::{Mcts, SearchAlgorithm};
/// use graphsearch_core::InterruptRegistry;
/// use graphsearch_eval::AdditiveEvaluator;
/// use graphsearch_test::WeightedDag;
///
/// let dag = Arc::new(WeightedDag::sample());
/// let evaluator = AdditiveEvaluator::dijkstra(WeightedDag::edge_cost);
///
/// let mut search = Mcts::new(dag, evaluator, Arc::new(InterruptRegistry::new())).with_seed(7);
/// let best = search.run().unwrap().unwrap();
/// assert_eq!(best.score, Some(7));
/// ```
pub struct Mcts<G, E>
where
    G: GraphGenerator + 'static,
    E: NodeEvaluator<G::State, G::Action>,
{
    ctx: SearchContext<G, E>,
    policy: Box<dyn TreePolicy>,
    tree: SearchTree,
    root: Option<NodeId>,
    objective: Objective,
    max_playouts: Option<u64>,
    rollout_depth_limit: Option<usize>,
    failure_reward: Option<f64>,
    playouts: u64,
}

impl<G, E> Mcts<G, E>
where
    G: GraphGenerator + 'static,
    E: NodeEvaluator<G::State, G::Action>,
{
    /// Creates a minimizing search guided by UCB1.
    pub fn new(generator: Arc<G>, evaluator: E, registry: Arc<InterruptRegistry>) -> Self {
        Self {
            ctx: SearchContext::new("mcts", generator, evaluator, registry),
            policy: Box::new(Ucb1Policy::default()),
            tree: SearchTree::default(),
            root: None,
            objective: Objective::Minimize,
            max_playouts: None,
            rollout_depth_limit: None,
            failure_reward: None,
            playouts: 0,
        }
    }

    /// Creates a search from its configuration section.
    pub fn from_config(
        generator: Arc<G>,
        evaluator: E,
        registry: Arc<InterruptRegistry>,
        config: &MctsConfig,
    ) -> Self {
        let mut search = Self::new(generator, evaluator, registry)
            .with_policy(policy_from_config(config))
            .with_objective(config.objective);
        search.max_playouts = config.max_playouts;
        search.rollout_depth_limit = config.rollout_depth_limit;
        search
    }

    pub fn with_policy(mut self, policy: Box<dyn TreePolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_objective(mut self, objective: Objective) -> Self {
        self.objective = objective;
        self.ctx.set_objective(objective);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.ctx.reseed(seed);
        self
    }

    pub fn with_max_playouts(mut self, limit: u64) -> Self {
        self.max_playouts = Some(limit);
        self
    }

    /// Caps the number of random steps below the tree.
    pub fn with_rollout_depth_limit(mut self, limit: usize) -> Self {
        self.rollout_depth_limit = Some(limit);
        self
    }

    /// Reward for playouts that do not end in an accepted goal.
    ///
    /// Defaults to the lowest reward seen so far, or 0 before any goal.
    pub fn with_failure_reward(mut self, reward: f64) -> Self {
        self.failure_reward = Some(reward);
        self
    }

    pub fn with_termination(mut self, termination: Box<dyn Termination>) -> Self {
        self.ctx.lifecycle.add_termination(termination);
        self
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    pub fn objective(&self) -> Objective {
        self.objective
    }

    pub fn max_playouts(&self) -> Option<u64> {
        self.max_playouts
    }

    pub fn rollout_depth_limit(&self) -> Option<usize> {
        self.rollout_depth_limit
    }

    pub fn playouts(&self) -> u64 {
        self.playouts
    }

    pub fn root_visits(&self) -> u64 {
        self.root.map_or(0, |root| self.tree.visits(root))
    }

    pub fn is_root_exhausted(&self) -> bool {
        self.root.is_some_and(|root| self.tree.is_exhausted(root))
    }

    pub fn node_count(&self) -> usize {
        self.ctx.arena.len()
    }

    fn reward_of(&self, score: E::Score) -> f64 {
        match self.objective {
            Objective::Minimize => -score.as_f64(),
            Objective::Maximize => score.as_f64(),
        }
    }

    fn expand(&mut self, node: NodeId) -> Result<()> {
        let successors = self.ctx.successors(node)?;
        let mut children = Vec::with_capacity(successors.len());
        for expansion in successors {
            children.push(self.ctx.add_child(
                node,
                Arc::new(expansion.state),
                expansion.action,
                expansion.kind,
                None,
                NodeStatus::Open,
            ));
        }
        if children.is_empty() {
            self.ctx.switch(node, NodeStatus::Dead);
        } else {
            self.ctx.switch(node, NodeStatus::Closed);
        }
        self.tree.entry(node).children = Some(children);
        Ok(())
    }

    /// Marks goal nodes as terminal tree leaves.
    fn is_terminal_goal(&mut self, node: NodeId) -> bool {
        let path = self.ctx.arena.path(node);
        if !self.ctx.generator.is_goal_path(&path) {
            return false;
        }
        self.tree.entry(node).children = Some(Vec::new());
        true
    }

    /// Descends from the root to the node the playout starts from.
    ///
    /// Returns the node and whether it is a terminal leaf of the tree.
    fn descend(&mut self, root: NodeId) -> Result<(NodeId, bool)> {
        let mut node = root;
        loop {
            self.ctx.check()?;
            if self.tree.children(node).is_none() {
                if self.is_terminal_goal(node) {
                    return Ok((node, true));
                }
                self.expand(node)?;
            }

            let open: Vec<NodeId> = self
                .tree
                .children(node)
                .unwrap_or_default()
                .iter()
                .copied()
                .filter(|child| !self.tree.is_exhausted(*child))
                .collect();
            if open.is_empty() {
                return Ok((node, true));
            }

            let fresh = open.iter().copied().find(|child| self.tree.visits(*child) == 0);
            if let Some(fresh) = fresh {
                let terminal = self.is_terminal_goal(fresh);
                return Ok((fresh, terminal));
            }

            let stats = self.tree.child_stats(&open);
            let parent_visits = self.tree.visits(node);
            let index = self
                .policy
                .select(parent_visits, &stats, self.ctx.scope.rng())
                .min(open.len() - 1);
            node = open[index];
        }
    }

    /// Completes the root path of `leaf` with random successors.
    fn rollout(&mut self, leaf: NodeId) -> Result<Path<G::State, G::Action>> {
        let mut path = self.ctx.arena.path(leaf);
        let mut steps = 0usize;
        while !self.ctx.generator.is_goal_path(&path) {
            if self.rollout_depth_limit.is_some_and(|limit| steps >= limit) {
                break;
            }
            self.ctx.check()?;
            match self
                .ctx
                .generator
                .random_successor(path.head(), self.ctx.scope.rng())?
            {
                Some(expansion) => path.push(Arc::new(expansion.state), expansion.action),
                None => break,
            }
            steps += 1;
        }
        Ok(path)
    }

    fn backpropagate(&mut self, leaf: NodeId, reward: f64) {
        for node in self.ctx.arena.ancestors(leaf) {
            let stats = self.tree.entry(node);
            stats.visits += 1;
            stats.reward_sum += reward;
        }
    }

    fn propagate_exhaustion(&mut self, leaf: NodeId) {
        self.tree.entry(leaf).exhausted = true;
        let mut current = self.ctx.arena[leaf].parent();
        while let Some(node) = current {
            let done = self
                .tree
                .children(node)
                .is_some_and(|children| children.iter().all(|c| self.tree.is_exhausted(*c)));
            if !done {
                break;
            }
            self.tree.entry(node).exhausted = true;
            current = self.ctx.arena[node].parent();
        }
    }

    fn advance(&mut self) -> Result<Advance<SolutionOf<G, E>>> {
        match self.ctx.begin_step()? {
            StepGate::Terminated => return Ok(Advance::Terminated),
            StepGate::Initialize => {
                return match self.ctx.initialize_root(false)? {
                    Some(root) => {
                        self.root = Some(root);
                        self.tree.entry(root);
                        Ok(Advance::Progress)
                    }
                    None => Ok(Advance::Exhausted),
                };
            }
            StepGate::Continue => {}
        }

        let Some(root) = self.root else {
            return Ok(Advance::Exhausted);
        };
        if self.max_playouts.is_some_and(|limit| self.playouts >= limit) {
            return Ok(Advance::Terminated);
        }
        if self.tree.is_exhausted(root) {
            return Ok(Advance::Exhausted);
        }

        self.policy.begin_playout(self.ctx.scope.rng());
        let (leaf, terminal) = self.descend(root)?;
        let path = if terminal {
            self.ctx.arena.path(leaf)
        } else {
            self.rollout(leaf)?
        };
        let depth = path.depth();

        let mut solution = None;
        let mut reward = None;
        if self.ctx.generator.is_goal_path(&path) {
            if let Evaluation::Scored(score) = self.ctx.evaluate(&path)? {
                reward = Some(self.reward_of(score));
                if terminal {
                    self.ctx.switch(leaf, NodeStatus::Solution);
                }
                let (candidate, improved) = self.ctx.report_solution(path, Some(score));
                if improved {
                    solution = Some(candidate);
                }
            }
        }
        let reward = match reward {
            Some(reward) => {
                self.tree.record_reward(reward);
                reward
            }
            None => self
                .failure_reward
                .or_else(|| self.tree.lowest_reward())
                .unwrap_or(0.0),
        };

        self.backpropagate(leaf, reward);
        self.policy.end_playout(self.tree.normalize(reward));
        if terminal {
            self.propagate_exhaustion(leaf);
        }

        self.playouts += 1;
        self.ctx.scope.statistics().record_playout();
        self.ctx.events.fire_playout_completed(self.playouts, reward);
        trace!(playout = self.playouts, leaf = %leaf, depth, reward, terminal);
        if self.playouts % PROGRESS_INTERVAL == 0 {
            debug!(
                event = "playouts",
                playouts = self.playouts,
                policy = self.policy.name(),
                nodes = self.ctx.arena.len(),
                best = ?self.ctx.best().and_then(|b| b.score)
            );
        }

        Ok(match solution {
            Some(solution) => Advance::Solution(solution),
            None => Advance::Progress,
        })
    }
}

impl<G, E> SearchAlgorithm for Mcts<G, E>
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

impl<G, E> std::fmt::Debug for Mcts<G, E>
where
    G: GraphGenerator + 'static,
    E: NodeEvaluator<G::State, G::Action>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mcts")
            .field("context", &self.ctx)
            .field("policy", &self.policy.name())
            .field("objective", &self.objective)
            .field("playouts", &self.playouts)
            .finish()
    }
}
