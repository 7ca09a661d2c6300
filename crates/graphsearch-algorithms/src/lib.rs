//! Graphsearch Algorithms
//!
//! This crate provides the search strategies over implicit graphs:
//! - Best-first search (A*, Dijkstra, greedy best-first)
//! - Depth-first search, plain or randomized
//! - Anytime window A* (AWA*)
//! - Monte-Carlo tree search with pluggable tree policies
//! - Lifecycle, cancellation and algorithm timeouts
//! - Termination conditions and statistics
//! - Event system for monitoring
//! - Runners, portfolios and configuration wiring (builder module)

pub mod algorithm;
pub mod awa_star;
pub mod best_first;
pub mod builder;
mod context;
pub mod depth_first;
pub mod event;
pub mod frontier;
pub mod lifecycle;
pub mod mcts;
pub mod portfolio;
pub mod runner;
pub mod scope;
pub mod statistics;
pub mod termination;

pub use algorithm::{BoxedAlgorithm, SearchAlgorithm, StepOutcome};
pub use awa_star::AwaStar;
pub use best_first::BestFirst;
pub use builder::SearchFactory;
pub use depth_first::DepthFirst;
pub use event::{
    CountingEventListener, LoggingEventListener, NodeStatus, SearchEventListener,
    SearchEventSupport,
};
pub use frontier::{Membership, OpenList};
pub use lifecycle::{AlgorithmState, CancelHandle, FinishReason};
pub use mcts::{
    ArmStatistics, ChildStats, EnsemblePolicy, EpsilonGreedyPolicy, Mcts, TreePolicy, Ucb1Policy,
    UniformRandomPolicy,
};
pub use portfolio::{MemberReport, Portfolio, PortfolioOutcome};
pub use runner::{run_with_timeout, solve_with_channel, RunReport};
pub use scope::SearchScope;
pub use statistics::{ScoreImprovement, SearchStatistics, StatisticsCollector};
pub use termination::{
    AndTermination, ExpansionCountTermination, OrTermination, SolutionCountTermination,
    StepCountTermination, Termination, TimeTermination,
};
