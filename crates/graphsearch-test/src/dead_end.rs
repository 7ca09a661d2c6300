//! Narrow tree where every branch but the first dies immediately.

use graphsearch_core::{Expansion, GraphGenerator, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Corridor {
    pub depth: usize,
    pub alive: bool,
}

/// Tree of the given `width` whose only goal sits at `goal_depth`.
///
/// Child 0 of a live node is live; all other children have no successors.
#[derive(Debug, Clone)]
pub struct DeadEndGraph {
    pub width: usize,
    pub goal_depth: usize,
}

impl DeadEndGraph {
    pub fn new(width: usize, goal_depth: usize) -> Self {
        Self { width, goal_depth }
    }
}

impl GraphGenerator for DeadEndGraph {
    type State = Corridor;
    type Action = usize;

    fn root(&self) -> Result<Corridor> {
        Ok(Corridor {
            depth: 0,
            alive: true,
        })
    }

    fn successors(&self, state: &Corridor) -> Result<Vec<Expansion<Corridor, usize>>> {
        if !state.alive || state.depth >= self.goal_depth {
            return Ok(Vec::new());
        }
        Ok((0..self.width)
            .map(|branch| {
                let child = Corridor {
                    depth: state.depth + 1,
                    alive: branch == 0,
                };
                Expansion::new(child, branch)
            })
            .collect())
    }

    fn is_goal(&self, state: &Corridor) -> bool {
        state.alive && state.depth == self.goal_depth
    }
}
