//! Tree policies for Monte-Carlo tree search.
//!
//! A tree policy decides which child to descend into once every child of a
//! node has been visited. Rewards handed to policies are normalized to
//! `[0, 1]`, higher is better.

mod ensemble;
mod epsilon_greedy;
mod random;
mod ucb1;

use std::fmt::Debug;

use graphsearch_config::{MctsConfig, PolicyConfig};
use rand::RngCore;

pub use ensemble::{ArmStatistics, EnsemblePolicy};
pub use epsilon_greedy::EpsilonGreedyPolicy;
pub use random::UniformRandomPolicy;
pub use ucb1::Ucb1Policy;

/// Visit statistics of one child, as seen by a tree policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChildStats {
    pub visits: u64,
    /// Normalized mean reward, meaningless while `visits == 0`.
    pub mean_reward: f64,
}

impl ChildStats {
    pub fn new(visits: u64, mean_reward: f64) -> Self {
        Self { visits, mean_reward }
    }
}

/// Strategy for descending through the explored tree.
pub trait TreePolicy: Send + Debug {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Called before the descent of every playout.
    fn begin_playout(&mut self, _rng: &mut dyn RngCore) {}

    /// Picks one of `children`, returning its index.
    ///
    /// `children` is never empty.
    fn select(
        &mut self,
        parent_visits: u64,
        children: &[ChildStats],
        rng: &mut dyn RngCore,
    ) -> usize;

    /// Called after backpropagation with the playout's normalized reward.
    fn end_playout(&mut self, _reward: f64) {}
}

impl<T: TreePolicy + ?Sized> TreePolicy for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn begin_playout(&mut self, rng: &mut dyn RngCore) {
        (**self).begin_playout(rng)
    }

    fn select(
        &mut self,
        parent_visits: u64,
        children: &[ChildStats],
        rng: &mut dyn RngCore,
    ) -> usize {
        (**self).select(parent_visits, children, rng)
    }

    fn end_playout(&mut self, reward: f64) {
        (**self).end_playout(reward)
    }
}

/// Builds the tree policy named by the configuration.
pub fn policy_from_config(config: &MctsConfig) -> Box<dyn TreePolicy> {
    match config.policy {
        PolicyConfig::Ucb1 => Box::new(Ucb1Policy::new(config.exploration_constant)),
        PolicyConfig::Random => Box::new(UniformRandomPolicy::new()),
        PolicyConfig::EpsilonGreedy => Box::new(EpsilonGreedyPolicy::new(config.epsilon)),
        PolicyConfig::Ensemble => Box::new(EnsemblePolicy::standard(
            config.exploration_constant,
            config.epsilon,
        )),
    }
}

/// Index of the child with the highest mean reward; first wins ties.
pub(crate) fn greedy_index(children: &[ChildStats]) -> usize {
    let mut best = 0;
    for (index, child) in children.iter().enumerate().skip(1) {
        if child.mean_reward > children[best].mean_reward {
            best = index;
        }
    }
    best
}

#[cfg(test)]
mod tests;
