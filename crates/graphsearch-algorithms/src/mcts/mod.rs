//! Monte-Carlo tree search and its tree policies.

pub mod policy;
mod search;
mod tree;

pub use policy::{
    policy_from_config, ArmStatistics, ChildStats, EnsemblePolicy, EpsilonGreedyPolicy, TreePolicy,
    Ucb1Policy, UniformRandomPolicy,
};
pub use search::Mcts;

#[cfg(test)]
mod tests;
