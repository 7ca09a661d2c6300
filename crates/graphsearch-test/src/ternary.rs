//! Ternary counting tree.
//!
//! Every natural number `v` has the children `3v + 1`, `3v + 2` and `3v + 3`,
//! so the tree rooted at 0 enumerates each natural number exactly once.

use graphsearch_core::{Expansion, GraphGenerator, Result};

/// Ternary counting tree with a single goal value.
#[derive(Debug, Clone)]
pub struct TernaryGraph {
    pub goal: u64,
}

impl TernaryGraph {
    pub fn new(goal: u64) -> Self {
        Self { goal }
    }

    /// Depth of `value` below the root.
    pub fn depth_of(mut value: u64) -> usize {
        let mut depth = 0;
        while value > 0 {
            value = (value - 1) / 3;
            depth += 1;
        }
        depth
    }
}

impl Default for TernaryGraph {
    fn default() -> Self {
        Self::new(10_000)
    }
}

impl GraphGenerator for TernaryGraph {
    type State = u64;
    /// Index of the child, 0 to 2.
    type Action = u8;

    fn root(&self) -> Result<u64> {
        Ok(0)
    }

    fn successors(&self, state: &u64) -> Result<Vec<Expansion<u64, u8>>> {
        Ok((0..3u8)
            .map(|i| Expansion::new(3 * state + u64::from(i) + 1, i))
            .collect())
    }

    fn is_goal(&self, state: &u64) -> bool {
        *state == self.goal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_children() {
        let graph = TernaryGraph::default();
        let children: Vec<u64> = graph
            .successors(&2)
            .unwrap()
            .into_iter()
            .map(|e| e.state)
            .collect();
        assert_eq!(children, vec![7, 8, 9]);
    }

    #[test]
    fn test_depth_of() {
        assert_eq!(TernaryGraph::depth_of(0), 0);
        assert_eq!(TernaryGraph::depth_of(3), 1);
        assert_eq!(TernaryGraph::depth_of(4), 2);
        assert_eq!(TernaryGraph::depth_of(10_000), 9);
    }
}
