//! Configuration system for graphsearch.
//!
//! Load search configuration from TOML or YAML to pick an algorithm, its
//! tuning knobs, time budgets and the random seed without code changes.
//!
//! # Examples
//!
//! Load configuration from TOML string:
//!
//! ```
//! use graphsearch_config::{AlgorithmConfig, SearchConfig};
//! use std::time::Duration;
//!
//! let config = SearchConfig::from_toml_str(r#"
//!     random_seed = 7
//!     timeout_ms = 2000
//!     node_evaluation_timeout_ms = 50
//!
//!     [algorithm]
//!     type = "mcts"
//!     policy = "ensemble"
//!     max_playouts = 500
//! "#).unwrap();
//!
//! assert_eq!(config.timeout(), Some(Duration::from_secs(2)));
//! assert!(matches!(config.algorithm, AlgorithmConfig::Mcts(_)));
//! ```
//!
//! Use default config when file is missing:
//!
//! ```
//! use graphsearch_config::SearchConfig;
//!
//! let config = SearchConfig::load("search.toml").unwrap_or_default();
//! // Best-first search, seed 0, no time limit
//! assert_eq!(config.seed(), 0);
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main search configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SearchConfig {
    /// Random seed for reproducible results. Defaults to 0.
    #[serde(default)]
    pub random_seed: Option<u64>,

    /// Wall-clock budget for the whole search, in milliseconds.
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Wall-clock budget for a single node evaluation, in milliseconds.
    #[serde(default)]
    pub node_evaluation_timeout_ms: Option<u64>,

    /// What to do with a node whose evaluation ran out of time.
    #[serde(default)]
    pub timeout_policy: TimeoutPolicyConfig,

    /// Maximum number of node expansions.
    #[serde(default)]
    pub max_expansions: Option<u64>,

    /// Worker threads for sampling evaluators and portfolios.
    #[serde(default)]
    pub thread_count: ThreadCount,

    /// Algorithm selection and tuning.
    #[serde(default)]
    pub algorithm: AlgorithmConfig,
}

impl SearchConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file, picking the format by extension.
    ///
    /// `.yaml` and `.yml` files are parsed as YAML, everything else as TOML.
    ///
    /// # Errors
    ///
    /// Returns error if the file doesn't exist, fails to parse or fails
    /// [`SearchConfig::validate`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_file(path)?,
            _ => Self::from_toml_file(path)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(s)?)
    }

    /// Sets the random seed.
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Sets the search time limit.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Sets the per-node evaluation time limit.
    pub fn with_node_evaluation_timeout(mut self, timeout: Duration) -> Self {
        self.node_evaluation_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn with_timeout_policy(mut self, policy: TimeoutPolicyConfig) -> Self {
        self.timeout_policy = policy;
        self
    }

    pub fn with_max_expansions(mut self, limit: u64) -> Self {
        self.max_expansions = Some(limit);
        self
    }

    pub fn with_thread_count(mut self, thread_count: ThreadCount) -> Self {
        self.thread_count = thread_count;
        self
    }

    /// Sets the algorithm configuration.
    pub fn with_algorithm(mut self, algorithm: AlgorithmConfig) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Returns the configured seed, or 0.
    pub fn seed(&self) -> u64 {
        self.random_seed.unwrap_or(0)
    }

    /// Returns the search time limit, if configured.
    ///
    /// # Examples
    ///
    /// ```
    /// use graphsearch_config::SearchConfig;
    /// use std::time::Duration;
    ///
    /// let config = SearchConfig::from_toml_str("timeout_ms = 1500").unwrap();
    ///
    /// assert_eq!(config.timeout(), Some(Duration::from_millis(1500)));
    /// ```
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Returns the per-node evaluation time limit, if configured.
    pub fn node_evaluation_timeout(&self) -> Option<Duration> {
        self.node_evaluation_timeout_ms.map(Duration::from_millis)
    }

    /// Checks value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms == Some(0) {
            return Err(ConfigError::Invalid("timeout_ms must be positive".to_string()));
        }
        if self.node_evaluation_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid(
                "node_evaluation_timeout_ms must be positive".to_string(),
            ));
        }
        if self.thread_count == ThreadCount::Count(0) {
            return Err(ConfigError::Invalid(
                "thread_count must be at least 1".to_string(),
            ));
        }
        match &self.algorithm {
            AlgorithmConfig::DepthFirst(dfs) if dfs.depth_limit == Some(0) => Err(
                ConfigError::Invalid("depth_limit must be at least 1".to_string()),
            ),
            AlgorithmConfig::Mcts(mcts) => mcts.validate(),
            _ => Ok(()),
        }
    }
}

/// Thread count configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadCount {
    /// One thread per available CPU core.
    #[default]
    Auto,

    /// Specific number of threads.
    Count(usize),
}

impl ThreadCount {
    /// Resolves the thread count to an actual number, never more than `tasks`.
    pub fn resolve(&self, tasks: usize) -> usize {
        let threads = match self {
            ThreadCount::Auto => std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(1),
            ThreadCount::Count(n) => *n,
        };
        threads.min(tasks).max(1)
    }
}

/// Handling of node evaluations that exceed their deadline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutPolicyConfig {
    /// Drop the node.
    #[default]
    Prune,

    /// Treat the timeout as a failed evaluation.
    Fail,

    /// Abort the search with the timeout error.
    Propagate,
}

/// Algorithm configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AlgorithmConfig {
    /// Best-first search (A* with an additive evaluator).
    BestFirst(BestFirstConfig),

    /// Depth-first search, optionally randomized.
    DepthFirst(DepthFirstConfig),

    /// Anytime window A*.
    AwaStar,

    /// Monte-Carlo tree search.
    Mcts(MctsConfig),
}

impl Default for AlgorithmConfig {
    fn default() -> Self {
        AlgorithmConfig::BestFirst(BestFirstConfig::default())
    }
}

impl AlgorithmConfig {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            AlgorithmConfig::BestFirst(_) => "best_first",
            AlgorithmConfig::DepthFirst(_) => "depth_first",
            AlgorithmConfig::AwaStar => "awa_star",
            AlgorithmConfig::Mcts(_) => "mcts",
        }
    }
}

/// Best-first search configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct BestFirstConfig {
    /// Order among nodes with equal f-value.
    #[serde(default)]
    pub tie_break: TieBreak,
}

/// Tie-breaking among open nodes with equal f-value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Insertion order.
    #[default]
    Fifo,

    /// Seeded random order.
    Random,
}

/// Depth-first search configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct DepthFirstConfig {
    /// Shuffle successors with the seeded RNG.
    #[serde(default)]
    pub randomized: bool,

    /// Nodes at this depth are not expanded.
    #[serde(default)]
    pub depth_limit: Option<usize>,
}

/// Monte-Carlo tree search configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct MctsConfig {
    /// Tree policy.
    #[serde(default)]
    pub policy: PolicyConfig,

    /// UCB1 exploration constant.
    #[serde(default = "default_exploration_constant")]
    pub exploration_constant: f64,

    /// Exploration probability of the epsilon-greedy policy.
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,

    /// Maximum number of playouts.
    #[serde(default)]
    pub max_playouts: Option<u64>,

    /// Maximum number of rollout steps below the tree.
    #[serde(default)]
    pub rollout_depth_limit: Option<usize>,

    /// Whether scores are costs or gains.
    #[serde(default)]
    pub objective: Objective,
}

fn default_exploration_constant() -> f64 {
    std::f64::consts::SQRT_2
}

fn default_epsilon() -> f64 {
    0.1
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            policy: PolicyConfig::default(),
            exploration_constant: default_exploration_constant(),
            epsilon: default_epsilon(),
            max_playouts: None,
            rollout_depth_limit: None,
            objective: Objective::default(),
        }
    }
}

impl MctsConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.exploration_constant.is_finite() || self.exploration_constant < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "exploration_constant must be finite and non-negative, got {}",
                self.exploration_constant
            )));
        }
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(ConfigError::Invalid(format!(
                "epsilon must be within [0, 1], got {}",
                self.epsilon
            )));
        }
        if self.max_playouts == Some(0) {
            return Err(ConfigError::Invalid(
                "max_playouts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Monte-Carlo tree policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyConfig {
    /// Upper confidence bound (UCT).
    #[default]
    Ucb1,

    /// Uniformly random child.
    Random,

    /// Best mean reward, random with probability epsilon.
    EpsilonGreedy,

    /// Meta-bandit over the other policies.
    Ensemble,
}

/// Optimization direction of Monte-Carlo scores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    /// Lower scores are better.
    #[default]
    Minimize,

    Maximize,
}

#[cfg(test)]
mod tests;
