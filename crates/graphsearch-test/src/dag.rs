//! Weighted DAGs with a known optimum.
//!
//! Nodes are numbered so that every edge points to a higher index. The
//! action of an edge is its cost, and the goal is a single node. Exact
//! distances to the goal are precomputed, which gives a consistent (and
//! therefore admissible) heuristic.

use graphsearch_core::{Expansion, GraphGenerator, Path, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Weighted DAG rooted at node 0.
#[derive(Debug, Clone)]
pub struct WeightedDag {
    successors: Vec<Vec<(usize, u32)>>,
    goal: usize,
    distance: Vec<Option<u32>>,
}

impl WeightedDag {
    /// Creates a DAG from adjacency lists of `(target, cost)`.
    ///
    /// # Panics
    ///
    /// Panics if an edge does not point to a higher node index.
    pub fn new(successors: Vec<Vec<(usize, u32)>>, goal: usize) -> Self {
        let mut distance = vec![None; successors.len()];
        if goal < distance.len() {
            distance[goal] = Some(0);
        }
        for from in (0..successors.len()).rev() {
            for &(to, cost) in &successors[from] {
                assert!(to > from, "edge {} -> {} does not point forward", from, to);
                if let Some(rest) = distance[to] {
                    let via = rest + cost;
                    if distance[from].map_or(true, |d| via < d) {
                        distance[from] = Some(via);
                    }
                }
            }
        }
        Self {
            successors,
            goal,
            distance,
        }
    }

    /// Five nodes, optimal cost 7 along `0 -> 1 -> 2 -> 3 -> 4`.
    pub fn sample() -> Self {
        Self::new(
            vec![
                vec![(1, 1), (2, 4)],
                vec![(2, 2), (3, 6)],
                vec![(3, 3), (4, 7)],
                vec![(4, 1)],
                vec![],
            ],
            4,
        )
    }

    /// Random DAG in which every node can reach the goal `nodes - 1`.
    ///
    /// Each node has an edge to its successor index plus up to
    /// `extra_edges` shortcuts further ahead.
    pub fn random(seed: u64, nodes: usize, extra_edges: usize) -> Self {
        assert!(nodes >= 2, "a random DAG needs at least two nodes");
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut successors = vec![Vec::new(); nodes];
        for (from, edges) in successors.iter_mut().enumerate().take(nodes - 1) {
            edges.push((from + 1, rng.random_range(1..=20)));
            if from + 2 < nodes {
                for _ in 0..extra_edges {
                    let to = rng.random_range(from + 2..nodes);
                    let span = (to - from) as u32;
                    edges.push((to, rng.random_range(1..=15 * span)));
                }
            }
        }
        Self::new(successors, nodes - 1)
    }

    pub fn goal(&self) -> usize {
        self.goal
    }

    pub fn node_count(&self) -> usize {
        self.successors.len()
    }

    /// Cost of the cheapest root-to-goal path.
    pub fn optimal_cost(&self) -> Option<u32> {
        self.distance.first().copied().flatten()
    }

    /// Exact remaining cost to the goal, 0 for nodes that cannot reach it.
    pub fn heuristic(&self, state: &usize) -> u32 {
        self.distance.get(*state).copied().flatten().unwrap_or(0)
    }

    /// Cost of an edge; the action is the cost.
    pub fn edge_cost(_from: &usize, action: &u32, _to: &usize) -> u32 {
        *action
    }

    /// Sum of the edge costs along `path`.
    pub fn path_cost(path: &Path<usize, u32>) -> u32 {
        path.actions().iter().sum()
    }
}

impl GraphGenerator for WeightedDag {
    type State = usize;
    type Action = u32;

    fn root(&self) -> Result<usize> {
        Ok(0)
    }

    fn successors(&self, state: &usize) -> Result<Vec<Expansion<usize, u32>>> {
        Ok(self
            .successors
            .get(*state)
            .map(|edges| {
                edges
                    .iter()
                    .map(|&(to, cost)| Expansion::new(to, cost))
                    .collect()
            })
            .unwrap_or_default())
    }

    fn is_goal(&self, state: &usize) -> bool {
        *state == self.goal
    }
}
