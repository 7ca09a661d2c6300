//! Tests for Anytime Window A*.

use super::*;
use crate::event::CountingEventListener;
use graphsearch_core::{Expansion, SearchError};
use graphsearch_eval::{AdditiveEvaluator, ConstantEvaluator};
use graphsearch_test::{DeadEndGraph, WeightedDag};

type DagEvaluator = AdditiveEvaluator<usize, u32, u32>;

fn registry() -> Arc<InterruptRegistry> {
    Arc::new(InterruptRegistry::new())
}

fn dijkstra() -> DagEvaluator {
    AdditiveEvaluator::dijkstra(WeightedDag::edge_cost)
}

fn a_star(dag: &Arc<WeightedDag>) -> DagEvaluator {
    let h = Arc::clone(dag);
    AdditiveEvaluator::a_star(WeightedDag::edge_cost, move |s| h.heuristic(s))
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
fn test_exact_heuristic_finds_optimum_in_first_pass() {
    let dag = Arc::new(WeightedDag::sample());
    let mut search = AwaStar::new(Arc::clone(&dag), a_star(&dag), registry());

    let first = search.next_solution().unwrap().unwrap();
    assert_eq!(first.score, Some(7));
    assert_eq!(search.window(), 1);

    assert!(search.next_solution().unwrap().is_none());
    assert_eq!(search.state(), AlgorithmState::Inactive);
    assert_eq!(search.iteration_best(), &[Some(7), Some(7)]);
}

#[test]
fn test_solutions_strictly_improve() {
    let dag = Arc::new(WeightedDag::random(8, 12, 2));
    let mut search = AwaStar::new(Arc::clone(&dag), dijkstra(), registry());

    let mut costs = Vec::new();
    while let Some(solution) = search.next_solution().unwrap() {
        assert_eq!(solution.score, Some(WeightedDag::path_cost(&solution.path)));
        costs.push(WeightedDag::path_cost(&solution.path));
    }

    assert!(!costs.is_empty());
    assert!(costs.windows(2).all(|w| w[0] > w[1]), "{costs:?}");
    assert_eq!(costs.last().copied(), dag.optimal_cost());
}

#[test]
fn test_best_cost_non_increasing_across_windows() {
    let dag = Arc::new(WeightedDag::random(13, 12, 2));
    let mut search = AwaStar::new(Arc::clone(&dag), dijkstra(), registry());

    search.run().unwrap();

    let history: Vec<u32> = search.iteration_best().iter().flatten().copied().collect();
    assert!(!history.is_empty());
    assert!(history.windows(2).all(|w| w[0] >= w[1]), "{history:?}");
    assert_eq!(history.last().copied(), dag.optimal_cost());
}

#[test]
fn test_run_is_optimal_on_random_dags() {
    for seed in 0..8 {
        let dag = Arc::new(WeightedDag::random(seed, 10, 2));
        let mut search = AwaStar::new(Arc::clone(&dag), dijkstra(), registry());

        let best = search.run().unwrap().unwrap();

        assert_eq!(best.score, dag.optimal_cost(), "seed {seed}");
        assert_eq!(search.open_len(), 0);
        assert_eq!(search.suspended_len(), 0);
    }
}

#[test]
fn test_window_events() {
    let dag = Arc::new(WeightedDag::random(2, 10, 2));
    let listener = Arc::new(CountingEventListener::new());
    let mut search = AwaStar::new(Arc::clone(&dag), dijkstra(), registry());
    search.add_listener(listener.clone());

    search.run().unwrap();

    assert!(search.window() >= 1);
    assert_eq!(listener.window_increased_count(), search.window());
    assert_eq!(listener.finished_count(), 1);
}

#[test]
fn test_shallow_nodes_are_suspended_in_first_pass() {
    let dag = Arc::new(WeightedDag::sample());
    let mut search = AwaStar::new(Arc::clone(&dag), dijkstra(), registry());

    // Initialize, expand 0, 1 and 2 along 0 -> 1 -> 2, then meet the
    // shallower sibling 0 -> 2.
    for _ in 0..5 {
        search.step().unwrap();
    }

    assert_eq!(search.closed_len(), 3);
    assert_eq!(search.suspended_len(), 1);
    assert_eq!(search.window(), 0);
}

#[test]
fn test_dead_end_goal() {
    let mut search = AwaStar::new(
        Arc::new(DeadEndGraph::new(3, 4)),
        ConstantEvaluator::new(0i32),
        registry(),
    );

    let solution = search.run().unwrap().unwrap();

    assert_eq!(solution.path.depth(), 4);
    assert_eq!(search.state(), AlgorithmState::Inactive);
}

#[test]
fn test_max_expansions() {
    let mut search = AwaStar::new(Arc::new(Endless), ConstantEvaluator::new(0u32), registry())
        .with_max_expansions(4);

    assert!(search.run().unwrap().is_none());
    assert_eq!(search.statistics().expansions, 4);
}

#[test]
fn test_timeout_keeps_best_so_far() {
    let mut search = AwaStar::new(Arc::new(Endless), ConstantEvaluator::new(0u32), registry());
    search.set_timeout(Duration::from_millis(20)).unwrap();

    assert!(search.run().unwrap().is_none());
    assert_eq!(search.state(), AlgorithmState::Inactive);
}

#[test]
fn test_cancel_surfaces_from_step() {
    let dag = Arc::new(WeightedDag::sample());
    let mut search = AwaStar::new(Arc::clone(&dag), dijkstra(), registry());
    search.cancel_handle().cancel();

    assert!(matches!(search.step(), Err(SearchError::Canceled(_))));
    assert!(search.best_solution().is_none());
}
