//! Builds configured algorithms from a [`SearchConfig`].
//!
//! The factory applies everything the configuration specifies on top of the
//! caller's generator and evaluator: the per-node evaluation deadline, the
//! algorithm timeout, the expansion limit and the random seed.

use std::sync::Arc;

use graphsearch_config::{AlgorithmConfig, SearchConfig, TimeoutPolicyConfig};
use graphsearch_core::{BoundedComputer, GraphGenerator, InterruptRegistry, Result, SearchError};
use graphsearch_eval::{BoxedEvaluator, NodeEvaluator, TimeAware, TimeoutPolicy};
use tracing::info;

use crate::algorithm::{BoxedAlgorithm, SearchAlgorithm};
use crate::awa_star::AwaStar;
use crate::best_first::BestFirst;
use crate::depth_first::DepthFirst;
use crate::mcts::Mcts;
use crate::portfolio::Portfolio;
use crate::termination::{ExpansionCountTermination, Termination};

type Algorithm<G, V> =
    BoxedAlgorithm<<G as GraphGenerator>::State, <G as GraphGenerator>::Action, V>;

/// Creates algorithms that share one configuration and interrupt registry.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use graphsearch_algorithms::{SearchAlgorithm, SearchFactory};
/// use graphsearch_config::SearchConfig;
/// use graphsearch_eval::AdditiveEvaluator;
/// use graphsearch_test::WeightedDag;
///
/// let config = SearchConfig::from_toml_str(r#"
///     random_seed = 7
///     [algorithm]
///     type = "awa_star"
/// "#).unwrap();
/// let factory = SearchFactory::new(config).unwrap();
///
/// let mut search = factory
///     .build(Arc::new(WeightedDag::sample()), AdditiveEvaluator::dijkstra(WeightedDag::edge_cost))
///     .unwrap();
///
/// assert_eq!(search.name(), "awa_star");
/// assert_eq!(search.run().unwrap().unwrap().score, Some(7));
/// ```
#[derive(Debug, Clone)]
pub struct SearchFactory {
    config: SearchConfig,
    registry: Arc<InterruptRegistry>,
}

impl SearchFactory {
    /// Validates `config` and creates a factory with a fresh registry.
    pub fn new(config: SearchConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| SearchError::Config(e.to_string()))?;
        Ok(Self {
            config,
            registry: Arc::new(InterruptRegistry::new()),
        })
    }

    /// Shares `registry` with the algorithms built from now on.
    pub fn with_registry(mut self, registry: Arc<InterruptRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<InterruptRegistry> {
        &self.registry
    }

    /// Builds the configured algorithm over `generator`.
    pub fn build<G, E>(&self, generator: Arc<G>, evaluator: E) -> Result<Algorithm<G, E::Score>>
    where
        G: GraphGenerator + 'static,
        E: NodeEvaluator<G::State, G::Action> + 'static,
    {
        let evaluator = self.wrap_evaluator(evaluator);
        let registry = Arc::clone(&self.registry);
        let seed = self.config.seed();

        let mut algorithm: Algorithm<G, E::Score> = match &self.config.algorithm {
            AlgorithmConfig::BestFirst(config) => {
                let search = BestFirst::new(generator, evaluator, registry)
                    .with_tie_break(config.tie_break)
                    .with_seed(seed);
                Box::new(match self.expansion_limit() {
                    Some(limit) => search.with_termination(limit),
                    None => search,
                })
            }
            AlgorithmConfig::DepthFirst(config) => {
                let search =
                    DepthFirst::from_config(generator, evaluator, registry, config).with_seed(seed);
                Box::new(match self.expansion_limit() {
                    Some(limit) => search.with_termination(limit),
                    None => search,
                })
            }
            AlgorithmConfig::AwaStar => {
                let search = AwaStar::new(generator, evaluator, registry).with_seed(seed);
                Box::new(match self.expansion_limit() {
                    Some(limit) => search.with_termination(limit),
                    None => search,
                })
            }
            AlgorithmConfig::Mcts(config) => {
                let search =
                    Mcts::from_config(generator, evaluator, registry, config).with_seed(seed);
                Box::new(match self.expansion_limit() {
                    Some(limit) => search.with_termination(limit),
                    None => search,
                })
            }
        };

        if let Some(timeout) = self.config.timeout() {
            algorithm.set_timeout(timeout)?;
        }

        info!(
            event = "algorithm_built",
            algorithm = algorithm.name(),
            seed,
            timeout_ms = self.config.timeout_ms,
            node_timeout_ms = self.config.node_evaluation_timeout_ms,
            max_expansions = self.config.max_expansions,
        );

        Ok(algorithm)
    }

    /// An empty portfolio using the configured thread count.
    pub fn portfolio<S, A, V>(&self) -> Portfolio<S, A, V>
    where
        S: graphsearch_core::SearchState,
        A: graphsearch_core::SearchAction,
        V: graphsearch_core::Score,
    {
        Portfolio::new().with_thread_count(self.config.thread_count)
    }

    fn wrap_evaluator<S, A, E>(&self, evaluator: E) -> BoxedEvaluator<S, A, E::Score>
    where
        S: graphsearch_core::SearchState,
        A: graphsearch_core::SearchAction,
        E: NodeEvaluator<S, A> + 'static,
    {
        let Some(deadline) = self.config.node_evaluation_timeout() else {
            return Box::new(evaluator);
        };
        let policy = match self.config.timeout_policy {
            TimeoutPolicyConfig::Prune => TimeoutPolicy::Prune,
            TimeoutPolicyConfig::Fail => TimeoutPolicy::Fail,
            TimeoutPolicyConfig::Propagate => TimeoutPolicy::Propagate,
        };
        let computer = BoundedComputer::new(&self.registry, "node-evaluation");
        Box::new(TimeAware::new(evaluator, computer, deadline).with_policy(policy))
    }

    fn expansion_limit(&self) -> Option<Box<dyn Termination>> {
        self.config
            .max_expansions
            .map(|limit| Box::new(ExpansionCountTermination::new(limit)) as Box<dyn Termination>)
    }
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod tests;
