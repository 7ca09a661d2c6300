//! Tests for Monte-Carlo tree search.

use std::sync::Arc;
use std::time::{Duration, Instant};

use super::*;
use crate::algorithm::SearchAlgorithm;
use crate::event::CountingEventListener;
use crate::lifecycle::AlgorithmState;
use graphsearch_config::{MctsConfig, Objective, PolicyConfig};
use graphsearch_core::{Expansion, GraphGenerator, InterruptRegistry, Path, Result};
use graphsearch_eval::{AdditiveEvaluator, ConstantEvaluator, FnEvaluator};
use graphsearch_test::{DeadEndGraph, WeightedDag};

fn registry() -> Arc<InterruptRegistry> {
    Arc::new(InterruptRegistry::new())
}

fn path_cost() -> AdditiveEvaluator<usize, u32, u32> {
    AdditiveEvaluator::dijkstra(WeightedDag::edge_cost)
}

fn policies() -> Vec<Box<dyn TreePolicy>> {
    vec![
        Box::new(Ucb1Policy::default()),
        Box::new(UniformRandomPolicy::new()),
        Box::new(EpsilonGreedyPolicy::new(0.2)),
        Box::new(EnsemblePolicy::standard(1.0, 0.2)),
    ]
}

#[derive(Debug)]
struct Endless;

impl GraphGenerator for Endless {
    type State = u64;
    type Action = u8;

    fn root(&self) -> Result<u64> {
        Ok(0)
    }

    fn successors(&self, state: &u64) -> Result<Vec<Expansion<u64, u8>>> {
        Ok(vec![Expansion::new(state + 1, 0), Expansion::new(state + 2, 1)])
    }

    fn is_goal(&self, _state: &u64) -> bool {
        false
    }
}

#[test]
fn test_exhaustive_run_finds_optimum_with_every_policy() {
    let dag = Arc::new(WeightedDag::random(6, 8, 1));
    for policy in policies() {
        let name = policy.name();
        let mut search = Mcts::new(Arc::clone(&dag), path_cost(), registry())
            .with_policy(policy)
            .with_seed(3);

        let best = search.run().unwrap().unwrap();

        assert_eq!(best.score, dag.optimal_cost(), "policy {name}");
        assert!(search.is_root_exhausted());
        assert_eq!(search.state(), AlgorithmState::Inactive);
    }
}

#[test]
fn test_maximize_objective() {
    let mut search = Mcts::new(Arc::new(WeightedDag::sample()), path_cost(), registry())
        .with_objective(Objective::Maximize);

    let best = search.run().unwrap().unwrap();

    assert_eq!(best.score, Some(11));
    assert_eq!(search.objective(), Objective::Maximize);
}

#[test]
fn test_solutions_are_improvements() {
    let mut search = Mcts::new(Arc::new(WeightedDag::random(9, 10, 2)), path_cost(), registry())
        .with_seed(5);

    let mut scores = Vec::new();
    while let Some(solution) = search.next_solution().unwrap() {
        scores.push(solution.score.unwrap());
    }

    assert!(!scores.is_empty());
    assert!(scores.windows(2).all(|w| w[0] > w[1]), "{scores:?}");
}

#[test]
fn test_max_playouts() {
    let mut search = Mcts::new(Arc::new(Endless), ConstantEvaluator::new(0u32), registry())
        .with_rollout_depth_limit(15)
        .with_max_playouts(50);

    assert!(search.run().unwrap().is_none());
    assert_eq!(search.playouts(), 50);
    assert_eq!(search.statistics().playouts, 50);
    assert_eq!(search.root_visits(), 50);
    assert_eq!(search.state(), AlgorithmState::Inactive);
}

#[test]
fn test_same_seed_same_playouts() {
    let dag = Arc::new(WeightedDag::random(12, 10, 2));
    let trace = |seed: u64| {
        let mut search = Mcts::new(Arc::clone(&dag), path_cost(), registry())
            .with_policy(Box::new(UniformRandomPolicy::new()))
            .with_max_playouts(40)
            .with_seed(seed);
        let mut found = Vec::new();
        while let Some(solution) = search.next_solution().unwrap() {
            found.push(solution.path.states().copied().collect::<Vec<_>>());
        }
        (found, search.node_count())
    };

    assert_eq!(trace(31), trace(31));
}

#[test]
fn test_playout_events() {
    let listener = Arc::new(CountingEventListener::new());
    let mut search = Mcts::new(Arc::new(WeightedDag::sample()), path_cost(), registry());
    search.add_listener(listener.clone());

    search.run().unwrap();

    assert_eq!(listener.playout_count() as u64, search.playouts());
    assert_eq!(listener.started_count(), 1);
    assert_eq!(listener.finished_count(), 1);
    assert!(listener.solution_candidate_count() >= 1);
}

#[test]
fn test_dead_ends_are_exhausted() {
    let mut search = Mcts::new(
        Arc::new(DeadEndGraph::new(3, 5)),
        ConstantEvaluator::new(1.0f64),
        registry(),
    )
    .with_failure_reward(-10.0)
    .with_seed(1);

    let best = search.run().unwrap().unwrap();

    assert_eq!(best.path.depth(), 5);
    assert!(search.is_root_exhausted());
    // Every node of the tree is expanded or scored once the root is exhausted.
    assert_eq!(search.node_count(), 1 + 3 * 5);
}

#[test]
fn test_rejected_goals_earn_failure_reward() {
    let evaluator = FnEvaluator::new("reject_all", |_: &Path<usize, u32>| -> Result<Option<u32>> {
        Ok(None)
    });
    let mut search = Mcts::new(Arc::new(WeightedDag::sample()), evaluator, registry());

    assert!(search.run().unwrap().is_none());
    assert!(search.is_root_exhausted());
    assert!(search.statistics().pruned > 0);
}

#[test]
fn test_timeout_interrupts_unbounded_rollout() {
    let mut search = Mcts::new(Arc::new(Endless), ConstantEvaluator::new(0u32), registry());
    search.set_timeout(Duration::from_millis(30)).unwrap();

    let start = Instant::now();
    assert!(search.run().unwrap().is_none());
    assert!(start.elapsed() < Duration::from_secs(2));
    assert_eq!(search.state(), AlgorithmState::Inactive);
}

#[test]
fn test_from_config() {
    let config = MctsConfig {
        policy: PolicyConfig::Ensemble,
        max_playouts: Some(7),
        rollout_depth_limit: Some(4),
        objective: Objective::Maximize,
        ..MctsConfig::default()
    };
    let mut search = Mcts::from_config(
        Arc::new(Endless),
        ConstantEvaluator::new(0u32),
        registry(),
        &config,
    );

    assert_eq!(search.policy_name(), "ensemble");
    assert_eq!(search.max_playouts(), Some(7));
    assert_eq!(search.rollout_depth_limit(), Some(4));

    assert!(search.run().unwrap().is_none());
    assert_eq!(search.playouts(), 7);
}
