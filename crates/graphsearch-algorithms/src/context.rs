//! Machinery shared by every search strategy.

use std::sync::Arc;

use graphsearch_config::Objective;
use graphsearch_core::{
    DynGraphGenerator, EvaluatedPath, Expansion, GraphGenerator, InterruptRegistry, NodeArena,
    NodeId, NodeType, Path, Result, Score,
};
use graphsearch_eval::NodeEvaluator;
use tracing::{info, trace, warn};

use crate::algorithm::StepOutcome;
use crate::event::{NodeStatus, SearchEventSupport};
use crate::lifecycle::{AlgorithmState, FinishReason, Lifecycle, StepGate};
use crate::scope::SearchScope;

pub(crate) type StateOf<G> = <G as GraphGenerator>::State;
pub(crate) type ActionOf<G> = <G as GraphGenerator>::Action;
pub(crate) type ScoreOf<G, E> = <E as NodeEvaluator<StateOf<G>, ActionOf<G>>>::Score;
pub(crate) type SolutionOf<G, E> = EvaluatedPath<StateOf<G>, ActionOf<G>, ScoreOf<G, E>>;

/// Result of evaluating one prospective node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Evaluation<V> {
    Scored(V),
    Pruned,
    /// Local failure; the node is dropped.
    Failed,
}

/// What one step of a strategy produced, before lifecycle bookkeeping.
#[derive(Debug)]
pub(crate) enum Advance<S> {
    Progress,
    Solution(S),
    Exhausted,
    Terminated,
}

/// Generator, evaluator, arena, lifecycle, scope, events and incumbent.
pub(crate) struct SearchContext<G, E>
where
    G: GraphGenerator + 'static,
    E: NodeEvaluator<G::State, G::Action>,
{
    pub(crate) generator: Arc<G>,
    pub(crate) evaluator: E,
    pub(crate) arena: NodeArena<G::State, G::Action, E::Score>,
    pub(crate) lifecycle: Lifecycle,
    pub(crate) scope: SearchScope,
    pub(crate) events: SearchEventSupport<G::State, G::Action, E::Score>,
    objective: Objective,
    best: Option<SolutionOf<G, E>>,
}

impl<G, E> SearchContext<G, E>
where
    G: GraphGenerator + 'static,
    E: NodeEvaluator<G::State, G::Action>,
{
    pub(crate) fn new(
        name: &'static str,
        generator: Arc<G>,
        evaluator: E,
        registry: Arc<InterruptRegistry>,
    ) -> Self {
        Self {
            generator,
            evaluator,
            arena: NodeArena::new(),
            lifecycle: Lifecycle::new(name, registry),
            scope: SearchScope::new(0),
            events: SearchEventSupport::new(),
            objective: Objective::Minimize,
            best: None,
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        self.lifecycle.name()
    }

    /// Replaces the scope with one seeded by `seed`. Only before the first step.
    pub(crate) fn reseed(&mut self, seed: u64) {
        let statistics = Arc::clone(self.scope.statistics());
        self.scope = SearchScope::new(seed).with_statistics(statistics);
    }

    pub(crate) fn set_objective(&mut self, objective: Objective) {
        self.objective = objective;
    }

    pub(crate) fn best(&self) -> Option<&SolutionOf<G, E>> {
        self.best.as_ref()
    }

    /// Lifecycle gate plus one-time wiring on activation.
    pub(crate) fn begin_step(&mut self) -> Result<StepGate> {
        let gate = self.lifecycle.begin_step(&mut self.scope)?;
        if gate == StepGate::Initialize {
            self.events.fire_algorithm_started(self.name());
            let generator: DynGraphGenerator<G::State, G::Action> = self.generator.clone();
            self.evaluator.set_graph_generator(generator)?;
        }
        Ok(gate)
    }

    /// Cancellation and timeout check at a safe point.
    pub(crate) fn check(&self) -> Result<()> {
        self.lifecycle.check(&self.scope)
    }

    /// Evaluates a prospective path, keeping local failures local.
    pub(crate) fn evaluate(
        &self,
        path: &Path<G::State, G::Action>,
    ) -> Result<Evaluation<E::Score>> {
        let statistics = self.scope.statistics();
        statistics.record_evaluation();
        match self.evaluator.evaluate(path) {
            Ok(Some(score)) if !score.is_comparable() => {
                statistics.record_failed();
                warn!(
                    event = "node_dropped",
                    algorithm = self.name(),
                    depth = path.depth(),
                    score = ?score,
                    "Evaluator returned an incomparable score"
                );
                Ok(Evaluation::Failed)
            }
            Ok(Some(score)) => {
                trace!(depth = path.depth(), score = ?score, "Node evaluated");
                Ok(Evaluation::Scored(score))
            }
            Ok(None) => {
                statistics.record_pruned();
                trace!(depth = path.depth(), "Node pruned by evaluator");
                Ok(Evaluation::Pruned)
            }
            Err(e) if e.is_local() => {
                statistics.record_failed();
                warn!(
                    event = "node_dropped",
                    algorithm = self.name(),
                    depth = path.depth(),
                    error = %e
                );
                Ok(Evaluation::Failed)
            }
            Err(e) => Err(e),
        }
    }

    /// Creates the root node.
    ///
    /// With `label_root` the root is evaluated first; `Ok(None)` means the
    /// evaluator rejected it and there is nothing to search.
    pub(crate) fn initialize_root(&mut self, label_root: bool) -> Result<Option<NodeId>> {
        let state = Arc::new(self.generator.root()?);
        let label = if label_root {
            match self.evaluate(&Path::from_root(Arc::clone(&state)))? {
                Evaluation::Scored(score) => Some(score),
                Evaluation::Pruned | Evaluation::Failed => return Ok(None),
            }
        } else {
            None
        };
        let root = self.arena.insert_root(state, label);
        self.events.fire_graph_initialized(root, self.arena[root].state());
        Ok(Some(root))
    }

    /// Generates the successors of `node`.
    pub(crate) fn successors(&self, node: NodeId) -> Result<Vec<Expansion<G::State, G::Action>>> {
        self.scope.statistics().record_expansion();
        self.generator.successors(self.arena[node].state())
    }

    pub(crate) fn add_child(
        &mut self,
        parent: NodeId,
        state: Arc<G::State>,
        action: G::Action,
        kind: NodeType,
        label: Option<E::Score>,
        status: NodeStatus,
    ) -> NodeId {
        let child = self
            .arena
            .insert_child(parent, state, action, kind, label);
        self.events
            .fire_node_added(child, parent, status, self.arena[child].label());
        child
    }

    pub(crate) fn switch(&self, node: NodeId, status: NodeStatus) {
        self.events.fire_node_type_switched(node, status);
    }

    fn improves(&self, candidate: &SolutionOf<G, E>, incumbent: &SolutionOf<G, E>) -> bool {
        improves(self.objective, candidate, incumbent)
    }

    /// Publishes a solution candidate and updates the incumbent.
    ///
    /// Returns the candidate and whether it strictly improved the incumbent.
    pub(crate) fn report_solution(
        &mut self,
        path: Path<G::State, G::Action>,
        score: Option<E::Score>,
    ) -> (SolutionOf<G, E>, bool) {
        let solution = EvaluatedPath::new(path, score, self.scope.elapsed().unwrap_or_default());
        self.scope.increment_solution_count();

        let improved = match &self.best {
            Some(best) => self.improves(&solution, best),
            None => true,
        };
        if improved {
            if let Some(score) = score {
                self.scope.statistics().record_improvement(score.as_f64());
            }
            self.best = Some(solution.clone());
        }
        info!(
            event = "solution_found",
            algorithm = self.name(),
            depth = solution.path.depth(),
            score = ?score,
            improved
        );

        if self.evaluator.capabilities().solution_observing {
            self.evaluator.observe_solution(&solution);
        }
        self.events.fire_solution_candidate_found(&solution);
        (solution, improved)
    }

    /// Turns a strategy step into a public outcome, finishing the lifecycle
    /// when the step ended the run.
    pub(crate) fn settle(
        &mut self,
        advance: Result<Advance<SolutionOf<G, E>>>,
    ) -> Result<StepOutcome<G::State, G::Action, E::Score>> {
        match advance {
            Ok(Advance::Progress) => Ok(StepOutcome::Progress),
            Ok(Advance::Solution(solution)) => Ok(StepOutcome::Solution(solution)),
            Ok(Advance::Exhausted) => {
                self.finish(FinishReason::Exhausted);
                Ok(StepOutcome::Finished)
            }
            Ok(Advance::Terminated) => {
                self.finish(FinishReason::Terminated);
                Ok(StepOutcome::Finished)
            }
            Err(error) => {
                let error = self.lifecycle.classify(error, &self.scope);
                self.finish(FinishReason::from_error(&error));
                Err(error)
            }
        }
    }

    pub(crate) fn finish(&mut self, reason: FinishReason) {
        if self.lifecycle.state() == AlgorithmState::Inactive {
            return;
        }
        self.lifecycle.finish(reason);
        if matches!(reason, FinishReason::Canceled | FinishReason::TimedOut) {
            self.evaluator.cancel();
        }
        self.events.fire_algorithm_finished(self.name(), reason);
    }
}

impl<G, E> std::fmt::Debug for SearchContext<G, E>
where
    G: GraphGenerator + 'static,
    E: NodeEvaluator<G::State, G::Action>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchContext")
            .field("algorithm", &self.name())
            .field("state", &self.lifecycle.state())
            .field("nodes", &self.arena.len())
            .field("evaluator", &self.evaluator)
            .field("best", &self.best.as_ref().map(|b| b.score))
            .finish()
    }
}

/// Returns true if `candidate` beats `incumbent` under `objective`.
///
/// A scored path always beats an unscored one.
pub(crate) fn improves<S, A, V: Score>(
    objective: Objective,
    candidate: &EvaluatedPath<S, A, V>,
    incumbent: &EvaluatedPath<S, A, V>,
) -> bool {
    match objective {
        Objective::Minimize => candidate.is_better_than(incumbent),
        Objective::Maximize => match (&candidate.score, &incumbent.score) {
            (Some(a), Some(b)) => a.compare(b).is_gt(),
            (Some(_), None) => true,
            _ => false,
        },
    }
}
