//! Tests for the parallel portfolio.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::*;
use crate::awa_star::AwaStar;
use crate::best_first::BestFirst;
use crate::depth_first::DepthFirst;
use crate::mcts::Mcts;
use graphsearch_core::{Expansion, GraphGenerator, InterruptRegistry, Path};
use graphsearch_eval::{AdditiveEvaluator, ConstantEvaluator, FnEvaluator};
use graphsearch_test::WeightedDag;

type DagPortfolio = Portfolio<usize, u32, u32>;

fn registry() -> Arc<InterruptRegistry> {
    Arc::new(InterruptRegistry::new())
}

fn path_cost() -> AdditiveEvaluator<usize, u32, u32> {
    AdditiveEvaluator::dijkstra(WeightedDag::edge_cost)
}

fn failing() -> impl graphsearch_eval::NodeEvaluator<usize, u32, Score = u32> {
    FnEvaluator::new("failing", |_: &Path<usize, u32>| -> Result<Option<u32>> {
        Err(SearchError::Computation("evaluator offline".to_string()))
    })
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
fn test_every_strategy_agrees_on_optimum() {
    let dag = Arc::new(WeightedDag::random(11, 10, 2));
    let registry = registry();
    let mut portfolio = DagPortfolio::new()
        .with_thread_count(ThreadCount::Count(2))
        .with_member(BestFirst::new(Arc::clone(&dag), path_cost(), Arc::clone(&registry)))
        .with_member(DepthFirst::new(Arc::clone(&dag), path_cost(), Arc::clone(&registry)))
        .with_member(AwaStar::new(Arc::clone(&dag), path_cost(), Arc::clone(&registry)))
        .with_member(Mcts::new(Arc::clone(&dag), path_cost(), registry));

    let outcome = portfolio.run().unwrap();

    assert_eq!(outcome.best.unwrap().score, dag.optimal_cost());
    assert_eq!(outcome.members.len(), 4);
    assert!(outcome.members.iter().all(|m| m.error.is_none()));
    let names: Vec<_> = outcome.members.iter().map(|m| m.name).collect();
    assert_eq!(names, vec!["best_first", "depth_first", "awa_star", "mcts"]);
}

#[test]
fn test_equal_scores_go_to_first_member() {
    let dag = Arc::new(WeightedDag::sample());
    let registry = registry();
    let mut portfolio = DagPortfolio::new()
        .with_member(DepthFirst::new(Arc::clone(&dag), path_cost(), Arc::clone(&registry)))
        .with_member(BestFirst::new(dag, path_cost(), registry));

    let outcome = portfolio.run().unwrap();

    assert_eq!(outcome.winner, Some(0));
    assert_eq!(outcome.best.unwrap().score, Some(7));
}

#[test]
fn test_maximize_picks_highest_score() {
    let dag = Arc::new(WeightedDag::sample());
    let registry = registry();
    let mut portfolio = DagPortfolio::new()
        .with_objective(Objective::Maximize)
        .with_member(DepthFirst::new(Arc::clone(&dag), path_cost(), Arc::clone(&registry)))
        .with_member(Mcts::new(dag, path_cost(), registry).with_objective(Objective::Maximize));

    let outcome = portfolio.run().unwrap();

    assert_eq!(outcome.winner, Some(1));
    assert_eq!(outcome.best.unwrap().score, Some(11));
}

#[test]
fn test_failed_member_does_not_stop_others() {
    let dag = Arc::new(WeightedDag::sample());
    let registry = registry();
    let mut portfolio = DagPortfolio::new()
        .with_member(BestFirst::new(Arc::clone(&dag), failing(), Arc::clone(&registry)))
        .with_member(DepthFirst::new(dag, path_cost(), registry));

    let outcome = portfolio.run().unwrap();

    assert_eq!(outcome.winner, Some(1));
    assert!(matches!(
        outcome.members[0].error,
        Some(SearchError::Computation(_))
    ));
    assert!(outcome.members[1].error.is_none());
}

#[test]
fn test_all_members_failing_returns_error() {
    let dag = Arc::new(WeightedDag::sample());
    let mut portfolio = DagPortfolio::new().with_member(BestFirst::new(dag, failing(), registry()));

    assert!(matches!(portfolio.run(), Err(SearchError::Computation(_))));
}

#[test]
fn test_empty_portfolio_is_rejected() {
    let mut portfolio = DagPortfolio::default();

    assert!(portfolio.is_empty());
    assert!(matches!(portfolio.run(), Err(SearchError::Config(_))));
}

#[test]
fn test_cancel_handles_stop_every_member() {
    let registry = registry();
    let mut portfolio = Portfolio::new()
        .with_thread_count(ThreadCount::Count(2))
        .with_member(DepthFirst::new(
            Arc::new(Endless),
            ConstantEvaluator::new(0u32),
            Arc::clone(&registry),
        ))
        .with_member(Mcts::new(
            Arc::new(Endless),
            ConstantEvaluator::new(0u32),
            registry,
        ));
    let handles = portfolio.cancel_handles();
    assert_eq!(handles.len(), portfolio.len());

    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        for handle in handles {
            handle.cancel();
        }
    });
    let outcome = portfolio.run().unwrap();
    canceller.join().unwrap();

    assert!(outcome.best.is_none());
    assert!(outcome.members.iter().all(|m| m.error.is_none()));
    assert!(outcome.members.iter().all(|m| m.statistics.expansions > 0));
}
