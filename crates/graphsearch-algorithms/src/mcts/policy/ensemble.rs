//! Ensemble tree policy: a bandit over candidate policies.

use rand::RngCore;

use super::{ChildStats, EpsilonGreedyPolicy, TreePolicy, Ucb1Policy, UniformRandomPolicy};

/// Visit count and mean reward of one candidate policy.
#[derive(Debug, Clone, PartialEq)]
pub struct ArmStatistics {
    pub name: &'static str,
    pub visits: u64,
    pub mean_reward: f64,
}

#[derive(Debug)]
struct Arm {
    policy: Box<dyn TreePolicy>,
    visits: u64,
    reward_sum: f64,
}

impl Arm {
    fn mean(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.reward_sum / self.visits as f64
        }
    }
}

/// Chooses one candidate policy per playout and lets it make every
/// selection of that playout.
///
/// Candidates are chosen by UCB1 over the rewards of the playouts they
/// guided; each candidate is tried once before the bound applies.
#[derive(Debug)]
pub struct EnsemblePolicy {
    arms: Vec<Arm>,
    selector: Ucb1Policy,
    current: usize,
    playouts: u64,
}

impl EnsemblePolicy {
    /// Creates an ensemble over `candidates`, with `exploration_constant`
    /// controlling the choice between them.
    ///
    /// An empty candidate list falls back to a single UCB1 candidate.
    pub fn new(candidates: Vec<Box<dyn TreePolicy>>, exploration_constant: f64) -> Self {
        let mut candidates = candidates;
        if candidates.is_empty() {
            candidates.push(Box::new(Ucb1Policy::new(exploration_constant)));
        }
        Self {
            arms: candidates
                .into_iter()
                .map(|policy| Arm {
                    policy,
                    visits: 0,
                    reward_sum: 0.0,
                })
                .collect(),
            selector: Ucb1Policy::new(exploration_constant),
            current: 0,
            playouts: 0,
        }
    }

    /// UCB1, uniform random and epsilon-greedy.
    pub fn standard(exploration_constant: f64, epsilon: f64) -> Self {
        Self::new(
            vec![
                Box::new(Ucb1Policy::new(exploration_constant)),
                Box::new(UniformRandomPolicy::new()),
                Box::new(EpsilonGreedyPolicy::new(epsilon)),
            ],
            exploration_constant,
        )
    }

    /// Candidate guiding the current playout.
    pub fn current(&self) -> &'static str {
        self.arms[self.current].policy.name()
    }

    pub fn arm_statistics(&self) -> Vec<ArmStatistics> {
        self.arms
            .iter()
            .map(|arm| ArmStatistics {
                name: arm.policy.name(),
                visits: arm.visits,
                mean_reward: arm.mean(),
            })
            .collect()
    }
}

impl TreePolicy for EnsemblePolicy {
    fn name(&self) -> &'static str {
        "ensemble"
    }

    fn begin_playout(&mut self, rng: &mut dyn RngCore) {
        let stats: Vec<ChildStats> = self
            .arms
            .iter()
            .map(|arm| ChildStats::new(arm.visits, arm.mean()))
            .collect();
        self.current = self.selector.select(self.playouts, &stats, rng);
        self.arms[self.current].policy.begin_playout(rng);
    }

    fn select(
        &mut self,
        parent_visits: u64,
        children: &[ChildStats],
        rng: &mut dyn RngCore,
    ) -> usize {
        self.arms[self.current]
            .policy
            .select(parent_visits, children, rng)
    }

    fn end_playout(&mut self, reward: f64) {
        let arm = &mut self.arms[self.current];
        arm.visits += 1;
        arm.reward_sum += reward;
        arm.policy.end_playout(reward);
        self.playouts += 1;
    }
}
