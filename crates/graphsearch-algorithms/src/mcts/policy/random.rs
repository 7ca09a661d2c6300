//! Uniformly random tree policy.

use rand::{Rng, RngCore};

use super::{ChildStats, TreePolicy};

/// Descends into a uniformly random child.
#[derive(Debug, Clone, Default)]
pub struct UniformRandomPolicy;

impl UniformRandomPolicy {
    pub fn new() -> Self {
        Self
    }
}

impl TreePolicy for UniformRandomPolicy {
    fn name(&self) -> &'static str {
        "random"
    }

    fn select(
        &mut self,
        _parent_visits: u64,
        children: &[ChildStats],
        rng: &mut dyn RngCore,
    ) -> usize {
        rng.random_range(0..children.len())
    }
}
