//! UCB1 tree policy (UCT).

use rand::RngCore;

use super::{ChildStats, TreePolicy};

/// Upper confidence bound policy.
///
/// Picks the child maximizing `mean + c * sqrt(ln(parent_visits) / visits)`.
/// Unvisited children are picked first.
///
/// # Example
///
/// ```
/// use graphsearch_algorithms::mcts::{ChildStats, TreePolicy, Ucb1Policy};
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha8Rng;
///
/// let mut policy = Ucb1Policy::new(1.0);
/// let mut rng = ChaCha8Rng::seed_from_u64(0);
/// let children = [ChildStats::new(10, 0.2), ChildStats::new(10, 0.8)];
/// assert_eq!(policy.select(20, &children, &mut rng), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Ucb1Policy {
    exploration_constant: f64,
}

impl Ucb1Policy {
    pub fn new(exploration_constant: f64) -> Self {
        Self {
            exploration_constant,
        }
    }

    pub fn exploration_constant(&self) -> f64 {
        self.exploration_constant
    }

    /// Upper confidence bound of one child.
    pub fn bound(&self, parent_visits: u64, child: &ChildStats) -> f64 {
        if child.visits == 0 {
            return f64::INFINITY;
        }
        let parent = (parent_visits.max(1) as f64).ln();
        child.mean_reward + self.exploration_constant * (parent / child.visits as f64).sqrt()
    }
}

impl Default for Ucb1Policy {
    fn default() -> Self {
        Self::new(std::f64::consts::SQRT_2)
    }
}

impl TreePolicy for Ucb1Policy {
    fn name(&self) -> &'static str {
        "ucb1"
    }

    fn select(
        &mut self,
        parent_visits: u64,
        children: &[ChildStats],
        _rng: &mut dyn RngCore,
    ) -> usize {
        let mut best = 0;
        let mut best_bound = f64::NEG_INFINITY;
        for (index, child) in children.iter().enumerate() {
            let bound = self.bound(parent_visits, child);
            if bound > best_bound {
                best = index;
                best_bound = bound;
            }
        }
        best
    }
}
