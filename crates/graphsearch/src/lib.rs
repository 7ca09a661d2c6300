//! graphsearch - Implicit Graph Search in Rust
//!
//! Plug in a [`GraphGenerator`] and a [`NodeEvaluator`], pick an algorithm
//! in a [`SearchConfig`], and call [`solve_with_config`].
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use graphsearch::prelude::*;
//! use graphsearch_test::WeightedDag;
//!
//! let config = SearchConfig::new().with_algorithm(AlgorithmConfig::AwaStar);
//! let best = graphsearch::solve_with_config(
//!     config,
//!     Arc::new(WeightedDag::sample()),
//!     AdditiveEvaluator::dijkstra(WeightedDag::edge_cost),
//! )
//! .unwrap();
//!
//! assert_eq!(best.unwrap().score, Some(7));
//! ```

// Core model
pub use graphsearch_core::{
    BoundedComputer, EvaluatedPath, Expansion, GraphGenerator, InterruptRegistry, Interruption,
    NodeArena, NodeId, NodeType, Path, Result, Score, SearchAction, SearchError, SearchState,
};

// Configuration
pub use graphsearch_config::{
    AlgorithmConfig, BestFirstConfig, ConfigError, DepthFirstConfig, MctsConfig, Objective,
    PolicyConfig, SearchConfig, ThreadCount, TieBreak, TimeoutPolicyConfig,
};

// Evaluators
pub use graphsearch_eval::{
    AdditiveEvaluator, AlternativeEvaluator, BoxedEvaluator, Cancelable, Capabilities,
    ConstantEvaluator, FnEvaluator, NodeEvaluator, RandomCompletionEvaluator, SolutionListener,
    SolutionObserving, TimeAware, TimeoutPolicy,
};

// Algorithms
pub use graphsearch_algorithms::{
    run_with_timeout, solve_with_channel, AlgorithmState, AwaStar, BestFirst, BoxedAlgorithm,
    CancelHandle, DepthFirst, Mcts, Portfolio, PortfolioOutcome, RunReport, SearchAlgorithm,
    SearchEventListener, SearchFactory, SearchStatistics, StepOutcome,
};

/// Everything beyond the common surface.
pub use graphsearch_algorithms as algorithms;

mod logging;
mod solver;

pub use logging::init_logging;
pub use solver::{solve, solve_streaming, solve_with_config, StreamingSolve};

pub mod prelude {
    pub use super::{
        AdditiveEvaluator, AlgorithmConfig, ConstantEvaluator, EvaluatedPath, Expansion,
        FnEvaluator, GraphGenerator, NodeEvaluator, Objective, Path, SearchAlgorithm, SearchConfig,
        SearchError, SearchFactory,
    };
}
