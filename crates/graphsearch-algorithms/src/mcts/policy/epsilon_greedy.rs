//! Epsilon-greedy tree policy.

use rand::{Rng, RngCore};

use super::{greedy_index, ChildStats, TreePolicy};

/// Picks the child with the best mean reward, or a random child with
/// probability `epsilon`.
#[derive(Debug, Clone)]
pub struct EpsilonGreedyPolicy {
    epsilon: f64,
}

impl EpsilonGreedyPolicy {
    pub fn new(epsilon: f64) -> Self {
        Self {
            epsilon: epsilon.clamp(0.0, 1.0),
        }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }
}

impl Default for EpsilonGreedyPolicy {
    fn default() -> Self {
        Self::new(0.1)
    }
}

impl TreePolicy for EpsilonGreedyPolicy {
    fn name(&self) -> &'static str {
        "epsilon_greedy"
    }

    fn select(
        &mut self,
        _parent_visits: u64,
        children: &[ChildStats],
        rng: &mut dyn RngCore,
    ) -> usize {
        if self.epsilon > 0.0 && rng.random::<f64>() < self.epsilon {
            return rng.random_range(0..children.len());
        }
        greedy_index(children)
    }
}
