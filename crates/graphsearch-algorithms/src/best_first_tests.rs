//! Tests for best-first search.

use super::*;
use crate::event::CountingEventListener;
use graphsearch_core::{BoundedComputer, Path, SearchError};
use graphsearch_eval::{AdditiveEvaluator, ConstantEvaluator, FnEvaluator, TimeAware};
use graphsearch_test::{Cell, GridGraph, Move, TernaryGraph, WeightedDag};
use std::thread;
use std::time::Instant;

type DagEvaluator = AdditiveEvaluator<usize, u32, u32>;

fn registry() -> Arc<InterruptRegistry> {
    Arc::new(InterruptRegistry::new())
}

fn a_star(dag: &Arc<WeightedDag>) -> DagEvaluator {
    let h = Arc::clone(dag);
    AdditiveEvaluator::a_star(WeightedDag::edge_cost, move |s| h.heuristic(s))
}

/// `g + h` on the sample DAG, with a hook deciding per head state.
fn scored_unless(
    dag: &Arc<WeightedDag>,
    reject: impl Fn(usize) -> Option<Result<Option<u32>>> + Send + Sync + 'static,
) -> impl NodeEvaluator<usize, u32, Score = u32> {
    let h = Arc::clone(dag);
    FnEvaluator::new("scored_unless", move |path: &Path<usize, u32>| {
        if let Some(outcome) = reject(*path.head()) {
            return outcome;
        }
        Ok(Some(WeightedDag::path_cost(path) + h.heuristic(path.head())))
    })
}

fn solution_states(path: &Path<usize, u32>) -> Vec<usize> {
    path.states().copied().collect()
}

#[test]
fn test_a_star_first_solution_is_optimal_on_sample() {
    let dag = Arc::new(WeightedDag::sample());
    let mut search = BestFirst::new(Arc::clone(&dag), a_star(&dag), registry());

    let solution = search.next_solution().unwrap().unwrap();

    assert_eq!(solution.score, Some(7));
    assert_eq!(solution_states(&solution.path), vec![0, 1, 2, 3, 4]);
    assert_eq!(search.state(), AlgorithmState::Active);
}

#[test]
fn test_a_star_first_solution_is_optimal_on_random_dags() {
    for seed in 0..10 {
        let dag = Arc::new(WeightedDag::random(seed, 12, 2));
        let mut search = BestFirst::new(Arc::clone(&dag), a_star(&dag), registry());

        let solution = search.next_solution().unwrap().unwrap();
        let cost = WeightedDag::path_cost(&solution.path);

        assert_eq!(Some(cost), dag.optimal_cost(), "seed {seed}");
        assert_eq!(solution.score, Some(cost));
        assert_eq!(*solution.path.head(), dag.goal());
    }
}

#[test]
fn test_dijkstra_is_optimal() {
    let dag = Arc::new(WeightedDag::random(3, 10, 2));
    let mut search = BestFirst::new(
        Arc::clone(&dag),
        AdditiveEvaluator::dijkstra(WeightedDag::edge_cost),
        registry(),
    );

    let solution = search.next_solution().unwrap().unwrap();
    assert_eq!(Some(WeightedDag::path_cost(&solution.path)), dag.optimal_cost());
}

#[test]
fn test_consistent_heuristic_gives_non_decreasing_costs() {
    let dag = Arc::new(WeightedDag::random(11, 8, 2));
    let mut search = BestFirst::new(Arc::clone(&dag), a_star(&dag), registry());

    let mut costs = Vec::new();
    while let Some(solution) = search.next_solution().unwrap() {
        assert_eq!(solution.score, Some(WeightedDag::path_cost(&solution.path)));
        costs.push(WeightedDag::path_cost(&solution.path));
    }

    assert!(costs.len() > 1);
    assert!(costs.windows(2).all(|w| w[0] <= w[1]), "{costs:?}");
    assert_eq!(search.state(), AlgorithmState::Inactive);
    assert_eq!(search.best_solution().unwrap().score, Some(costs[0]));
}

#[test]
fn test_ternary_goal_is_found() {
    let mut search = BestFirst::new(
        Arc::new(TernaryGraph::default()),
        ConstantEvaluator::new(0u32),
        registry(),
    );

    let solution = search.next_solution().unwrap().unwrap();

    assert_eq!(*solution.path.head(), 10_000);
    assert_eq!(solution.path.depth(), TernaryGraph::depth_of(10_000));
}

#[test]
fn test_a_star_on_grid_with_wall() {
    let grid = Arc::new(GridGraph::open(5, 5).with_wall(2, 4));
    let h = Arc::clone(&grid);
    let evaluator =
        AdditiveEvaluator::a_star(|_: &Cell, _: &Move, _: &Cell| 1u32, move |c| h.heuristic(c));
    let mut search = BestFirst::new(Arc::clone(&grid), evaluator, registry());

    let solution = search.next_solution().unwrap().unwrap();

    assert_eq!(*solution.path.head(), grid.goal());
    assert_eq!(solution.score, Some(8));
    assert_eq!(GridGraph::path_cost(&solution.path), 8);
}

#[test]
fn test_pruned_children_are_dropped() {
    let dag = Arc::new(WeightedDag::sample());
    let evaluator = scored_unless(&dag, |s| (s == 1).then_some(Ok(None)));
    let mut search = BestFirst::new(Arc::clone(&dag), evaluator, registry());

    let solution = search.next_solution().unwrap().unwrap();

    // Without node 1 the best route is 0 -> 2 -> 3 -> 4.
    assert_eq!(solution.score, Some(8));
    assert_eq!(solution_states(&solution.path), vec![0, 2, 3, 4]);
    assert_eq!(search.statistics().pruned, 1);
}

#[test]
fn test_local_failures_are_dropped() {
    let dag = Arc::new(WeightedDag::sample());
    let evaluator = scored_unless(&dag, |s| {
        (s == 1).then(|| Err(SearchError::NodeEvaluationFailed("boom".to_string())))
    });
    let mut search = BestFirst::new(Arc::clone(&dag), evaluator, registry());

    let solution = search.next_solution().unwrap().unwrap();

    assert_eq!(solution.score, Some(8));
    assert_eq!(search.statistics().failed, 1);
}

#[test]
fn test_nan_scores_are_dropped() {
    let dag = Arc::new(WeightedDag::sample());
    let h = Arc::clone(&dag);
    let evaluator = FnEvaluator::new("nan_at_one", move |path: &Path<usize, u32>| {
        if *path.head() == 1 {
            return Ok(Some(f64::NAN));
        }
        let f = WeightedDag::path_cost(path) + h.heuristic(path.head());
        Ok(Some(f64::from(f)))
    });
    let mut search = BestFirst::new(Arc::clone(&dag), evaluator, registry());

    let solution = search.next_solution().unwrap().unwrap();

    assert_eq!(solution.score, Some(8.0));
    assert_eq!(solution_states(&solution.path), vec![0, 2, 3, 4]);
    assert_eq!(search.statistics().failed, 1);
}

#[test]
fn test_fatal_errors_make_algorithm_inactive() {
    let dag = Arc::new(WeightedDag::sample());
    let evaluator = scored_unless(&dag, |s| {
        (s == 2).then(|| Err(SearchError::Computation("broken".to_string())))
    });
    let mut search = BestFirst::new(Arc::clone(&dag), evaluator, registry());

    assert!(matches!(search.next_solution(), Err(SearchError::Computation(_))));
    assert_eq!(search.state(), AlgorithmState::Inactive);
    assert!(matches!(search.step(), Err(SearchError::IllegalState(_))));
}

#[test]
fn test_unreachable_goal_exhausts() {
    let dag = Arc::new(WeightedDag::new(vec![vec![(1, 1)], vec![]], 5));
    let mut search = BestFirst::new(
        Arc::clone(&dag),
        AdditiveEvaluator::dijkstra(WeightedDag::edge_cost),
        registry(),
    );

    assert!(search.next_solution().unwrap().is_none());
    assert_eq!(search.state(), AlgorithmState::Inactive);
    assert_eq!(search.closed_len(), 2);
    assert_eq!(search.open_len(), 0);
}

#[test]
fn test_cancel_before_first_step() {
    let mut search = BestFirst::new(
        Arc::new(TernaryGraph::default()),
        ConstantEvaluator::new(0u32),
        registry(),
    );
    search.cancel_handle().cancel();

    assert!(matches!(search.step(), Err(SearchError::Canceled(_))));
    assert_eq!(search.state(), AlgorithmState::Inactive);
}

#[test]
fn test_timeout_surfaces_as_error() {
    let slow = FnEvaluator::new("slow", |_: &Path<u64, u8>| -> Result<Option<u32>> {
        thread::sleep(Duration::from_millis(2));
        Ok(Some(0))
    });
    let mut search = BestFirst::new(Arc::new(TernaryGraph::new(u64::MAX)), slow, registry());
    search.set_timeout(Duration::from_millis(30)).unwrap();

    match search.next_solution() {
        Err(SearchError::Timeout { budget, .. }) => assert_eq!(budget, Duration::from_millis(30)),
        other => panic!("expected timeout, got {other:?}"),
    }
    assert_eq!(search.state(), AlgorithmState::Inactive);
}

#[test]
fn test_max_expansions_budget() {
    let mut search = BestFirst::new(
        Arc::new(TernaryGraph::new(u64::MAX)),
        ConstantEvaluator::new(0u32),
        registry(),
    )
    .with_max_expansions(3);

    assert!(search.next_solution().unwrap().is_none());
    assert_eq!(search.statistics().expansions, 3);
    assert_eq!(search.node_count(), 10);
}

#[test]
fn test_random_tie_break_is_seeded() {
    let run = |seed: u64| {
        let dag = Arc::new(WeightedDag::random(5, 12, 2));
        let mut search = BestFirst::new(dag, ConstantEvaluator::new(0u32), registry())
            .with_tie_break(TieBreak::Random)
            .with_seed(seed);
        let solution = search.next_solution().unwrap().unwrap();
        (solution_states(&solution.path), search.statistics().expansions)
    };

    assert_eq!(run(9), run(9));
}

#[test]
fn test_events_are_published() {
    let dag = Arc::new(WeightedDag::sample());
    let listener = Arc::new(CountingEventListener::new());
    let mut search = BestFirst::new(Arc::clone(&dag), a_star(&dag), registry());
    search.add_listener(listener.clone());

    while search.next_solution().unwrap().is_some() {}

    assert_eq!(listener.started_count(), 1);
    assert_eq!(listener.graph_initialized_count(), 1);
    assert_eq!(listener.node_added_count(), search.node_count() - 1);
    assert!(listener.solution_candidate_count() >= 2);
    assert_eq!(listener.finished_count(), 1);
}

#[test]
fn test_slow_node_is_pruned_by_time_aware_evaluator() {
    let dag = Arc::new(WeightedDag::sample());
    let registry = registry();
    let inner = scored_unless(&dag, |s| {
        if s == 1 {
            thread::sleep(Duration::from_millis(300));
        }
        None
    });
    let evaluator = TimeAware::new(
        inner,
        BoundedComputer::new(&registry, "node-eval"),
        Duration::from_millis(20),
    );
    let mut search = BestFirst::new(Arc::clone(&dag), evaluator, Arc::clone(&registry));

    let solution = search.next_solution().unwrap().unwrap();

    assert_eq!(solution.score, Some(8));
    assert_eq!(search.statistics().pruned, 1);
}

fn stuck_search(
    registry: &Arc<InterruptRegistry>,
) -> impl SearchAlgorithm<State = usize, Action = u32, Score = u32> {
    let dag = Arc::new(WeightedDag::sample());
    let inner = scored_unless(&dag, |s| {
        if s == 1 {
            thread::sleep(Duration::from_secs(5));
        }
        None
    });
    let evaluator = TimeAware::new(
        inner,
        BoundedComputer::new(registry, "node-eval"),
        Duration::from_secs(10),
    );
    BestFirst::new(dag, evaluator, Arc::clone(registry))
}

#[test]
fn test_cancel_stops_in_flight_evaluation() {
    let registry = registry();
    let mut search = stuck_search(&registry);
    let handle = search.cancel_handle();

    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        handle.cancel();
    });
    let start = Instant::now();
    let outcome = search.next_solution();
    canceller.join().unwrap();

    match outcome {
        Err(SearchError::Canceled(reason)) => {
            assert_eq!(reason.description(), "algorithm canceled")
        }
        other => panic!("expected cancellation, got {other:?}"),
    }
    assert!(start.elapsed() < Duration::from_secs(2));
    assert_eq!(search.state(), AlgorithmState::Inactive);
    assert_eq!(registry.worker_count(), 0);
}

#[test]
fn test_algorithm_timeout_during_evaluation_is_timeout() {
    let registry = registry();
    let mut search = stuck_search(&registry);
    search.set_timeout(Duration::from_millis(50)).unwrap();

    let start = Instant::now();
    assert!(matches!(search.next_solution(), Err(SearchError::Timeout { .. })));
    assert!(start.elapsed() < Duration::from_secs(2));
    assert_eq!(registry.worker_count(), 0);
    assert_eq!(registry.scheduled_count(), 0);
}

#[test]
fn test_cancel_reaches_only_the_targeted_search() {
    let dag = Arc::new(WeightedDag::sample());
    let registry = registry();
    let mut first = BestFirst::new(Arc::clone(&dag), a_star(&dag), Arc::clone(&registry));
    let mut second = BestFirst::new(Arc::clone(&dag), a_star(&dag), Arc::clone(&registry));
    first.step().unwrap();
    second.step().unwrap();

    let handle = first.cancel_handle();
    thread::spawn(move || handle.cancel()).join().unwrap();

    let solution = second.next_solution().unwrap().unwrap();
    assert_eq!(solution.score, Some(7));
    assert_eq!(second.state(), AlgorithmState::Active);

    assert!(matches!(first.step(), Err(SearchError::Canceled(_))));
    assert_eq!(first.state(), AlgorithmState::Inactive);
}

#[test]
fn test_timeout_of_one_search_spares_another_on_same_thread() {
    let dag = Arc::new(WeightedDag::sample());
    let registry = registry();
    let mut timed = BestFirst::new(Arc::clone(&dag), a_star(&dag), Arc::clone(&registry));
    timed.set_timeout(Duration::from_millis(20)).unwrap();
    timed.step().unwrap();

    // The first deadline fires while this search is inside a slow evaluation.
    let slow = scored_unless(&dag, |s| {
        if s == 1 {
            thread::sleep(Duration::from_millis(200));
        }
        None
    });
    let evaluator = TimeAware::new(
        slow,
        BoundedComputer::new(&registry, "node-eval"),
        Duration::from_secs(10),
    );
    let mut other = BestFirst::new(Arc::clone(&dag), evaluator, Arc::clone(&registry));

    let solution = other.next_solution().unwrap().unwrap();
    assert_eq!(solution.score, Some(7));

    assert!(matches!(timed.step(), Err(SearchError::Timeout { .. })));
    assert_eq!(timed.state(), AlgorithmState::Inactive);
}
