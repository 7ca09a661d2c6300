//! Tests for the runner functions.

use std::sync::Arc;
use std::thread;

use super::*;
use crate::awa_star::AwaStar;
use crate::best_first::BestFirst;
use crate::depth_first::DepthFirst;
use graphsearch_core::{BoundedComputer, Expansion, GraphGenerator, InterruptRegistry, Path};
use graphsearch_eval::{AdditiveEvaluator, ConstantEvaluator, FnEvaluator, TimeAware};
use graphsearch_test::{TernaryGraph, WeightedDag};

fn registry() -> Arc<InterruptRegistry> {
    Arc::new(InterruptRegistry::new())
}

fn path_cost() -> AdditiveEvaluator<usize, u32, u32> {
    AdditiveEvaluator::dijkstra(WeightedDag::edge_cost)
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
fn test_run_completes_within_budget() {
    let dag = Arc::new(WeightedDag::random(4, 10, 2));
    let search = AwaStar::new(Arc::clone(&dag), path_cost(), registry());

    let report = run_with_timeout(search, Duration::from_secs(30)).unwrap();

    assert!(!report.timed_out);
    assert_eq!(report.solution.unwrap().score, dag.optimal_cost());
    assert!(report.statistics.expansions > 0);
}

#[test]
fn test_first_solution_of_best_first() {
    let search = BestFirst::new(Arc::new(WeightedDag::sample()), path_cost(), registry());

    let report = run_with_timeout(search, Duration::from_secs(30)).unwrap();

    assert!(!report.timed_out);
    assert_eq!(report.solution.unwrap().score, Some(7));
    assert_eq!(report.statistics.solutions, 1);
}

#[test]
fn test_anytime_algorithm_is_canceled_at_budget() {
    let search = DepthFirst::new(Arc::new(Endless), ConstantEvaluator::new(0u32), registry());

    let report = run_with_timeout(search, Duration::from_millis(50)).unwrap();

    assert!(report.timed_out);
    assert!(report.solution.is_none());
    assert!(report.elapsed >= Duration::from_millis(50));
    assert!(report.elapsed < Duration::from_secs(5));
    assert!(report.statistics.expansions > 0);
}

#[test]
fn test_repeated_runs_leave_registry_empty() {
    let registry = registry();
    let dag = Arc::new(WeightedDag::sample());

    for round in 0..50 {
        let evaluator = TimeAware::new(
            path_cost(),
            BoundedComputer::new(&registry, "node-eval"),
            Duration::from_secs(5),
        );
        let search = BestFirst::new(Arc::clone(&dag), evaluator, Arc::clone(&registry));
        let report = run_with_timeout(search, Duration::from_secs(30)).unwrap();
        assert_eq!(report.solution.unwrap().score, Some(7), "round {round}");

        let endless = DepthFirst::new(
            Arc::new(Endless),
            ConstantEvaluator::new(0u32),
            Arc::clone(&registry),
        );
        assert!(run_with_timeout(endless, Duration::from_millis(5)).unwrap().timed_out);
    }

    assert_eq!(registry.worker_count(), 0);
    assert_eq!(registry.scheduled_count(), 0);
}

#[test]
fn test_non_anytime_algorithm_times_out() {
    let search = BestFirst::new(
        Arc::new(TernaryGraph::new(u64::MAX)),
        ConstantEvaluator::new(0u32),
        registry(),
    );

    match run_with_timeout(search, Duration::from_millis(50)) {
        Err(SearchError::Timeout { budget, .. }) => {
            assert_eq!(budget, Duration::from_millis(50));
        }
        other => panic!("expected a timeout, got {other:?}"),
    }
}

#[test]
fn test_timeout_interrupts_running_evaluation() {
    let registry = registry();
    let dag = Arc::new(WeightedDag::sample());
    let slow = FnEvaluator::new("slow", |path: &Path<usize, u32>| -> Result<Option<u32>> {
        if *path.head() == 1 {
            thread::sleep(Duration::from_secs(5));
        }
        Ok(Some(WeightedDag::path_cost(path)))
    });
    let evaluator = TimeAware::new(
        slow,
        BoundedComputer::new(&registry, "node-eval"),
        Duration::from_secs(10),
    );
    let search = BestFirst::new(dag, evaluator, Arc::clone(&registry));

    let start = Instant::now();
    let result = run_with_timeout(search, Duration::from_millis(50));

    assert!(matches!(result, Err(SearchError::Timeout { .. })), "{result:?}");
    assert!(start.elapsed() < Duration::from_secs(3));
}

#[test]
fn test_channel_receives_every_solution() {
    let (sender, mut receiver) = mpsc::unbounded_channel();
    let mut search = DepthFirst::new(Arc::new(WeightedDag::sample()), path_cost(), registry());

    let best = solve_with_channel(&mut search, sender).unwrap().unwrap();

    let mut scores = Vec::new();
    while let Ok(solution) = receiver.try_recv() {
        scores.push(solution.score.unwrap());
    }
    assert_eq!(scores.len(), 5);
    assert_eq!(scores[0], 7);
    assert_eq!(scores.iter().min(), Some(&7));
    assert_eq!(best.score, Some(7));
}

#[test]
fn test_channel_without_receiver() {
    let (sender, receiver) = mpsc::unbounded_channel();
    drop(receiver);
    let mut search = BestFirst::new(Arc::new(WeightedDag::sample()), path_cost(), registry());

    let best = solve_with_channel(&mut search, sender).unwrap();

    assert_eq!(best.unwrap().score, Some(7));
    assert_eq!(search.statistics().solutions, 5);
}

#[test]
fn test_channel_stream_ends_at_timeout() {
    let (sender, mut receiver) = mpsc::unbounded_channel();
    let mut search = DepthFirst::new(Arc::new(Endless), ConstantEvaluator::new(0u32), registry());
    search.set_timeout(Duration::from_millis(20)).unwrap();

    assert!(solve_with_channel(&mut search, sender).unwrap().is_none());
    assert!(receiver.try_recv().is_err());
}
