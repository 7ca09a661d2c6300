//! Explored subgraph of a Monte-Carlo search.

use graphsearch_core::NodeId;

use super::policy::ChildStats;

/// Playout statistics of one explored node.
#[derive(Debug, Clone, Default)]
pub(crate) struct TreeStats {
    /// `None` until the node has been expanded.
    pub(crate) children: Option<Vec<NodeId>>,
    pub(crate) visits: u64,
    pub(crate) reward_sum: f64,
    /// Nothing new can be learned below this node.
    pub(crate) exhausted: bool,
}

impl TreeStats {
    pub(crate) fn mean_reward(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.reward_sum / self.visits as f64
        }
    }
}

/// Statistics for every arena node that entered the tree, indexed by id.
#[derive(Debug, Default)]
pub(crate) struct SearchTree {
    nodes: Vec<TreeStats>,
    /// Lowest and highest playout reward seen.
    bounds: Option<(f64, f64)>,
}

impl SearchTree {
    pub(crate) fn get(&self, node: NodeId) -> Option<&TreeStats> {
        self.nodes.get(node.index())
    }

    pub(crate) fn entry(&mut self, node: NodeId) -> &mut TreeStats {
        let index = node.index();
        if index >= self.nodes.len() {
            self.nodes.resize_with(index + 1, TreeStats::default);
        }
        &mut self.nodes[index]
    }

    pub(crate) fn visits(&self, node: NodeId) -> u64 {
        self.get(node).map_or(0, |s| s.visits)
    }

    pub(crate) fn is_exhausted(&self, node: NodeId) -> bool {
        self.get(node).is_some_and(|s| s.exhausted)
    }

    pub(crate) fn children(&self, node: NodeId) -> Option<&[NodeId]> {
        self.get(node).and_then(|s| s.children.as_deref())
    }

    pub(crate) fn lowest_reward(&self) -> Option<f64> {
        self.bounds.map(|(low, _)| low)
    }

    pub(crate) fn record_reward(&mut self, reward: f64) {
        self.bounds = Some(match self.bounds {
            Some((low, high)) => (low.min(reward), high.max(reward)),
            None => (reward, reward),
        });
    }

    /// Maps a raw reward into `[0, 1]` using the rewards seen so far.
    pub(crate) fn normalize(&self, reward: f64) -> f64 {
        match self.bounds {
            Some((low, high)) if high > low => ((reward - low) / (high - low)).clamp(0.0, 1.0),
            _ => 0.5,
        }
    }

    /// Policy view of the given children.
    pub(crate) fn child_stats(&self, children: &[NodeId]) -> Vec<ChildStats> {
        children
            .iter()
            .map(|&child| {
                let stats = self.get(child);
                let visits = stats.map_or(0, |s| s.visits);
                let mean = stats.map_or(0.0, |s| self.normalize(s.mean_reward()));
                ChildStats::new(visits, mean)
            })
            .collect()
    }
}
