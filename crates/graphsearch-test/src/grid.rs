//! Four-connected grid with obstacles.
//!
//! Unit-cost moves between free cells; the Manhattan distance to the goal is
//! a consistent heuristic. The grid contains cycles, so tree searches revisit
//! cells along different paths.

use std::collections::HashSet;

use graphsearch_core::{Expansion, GraphGenerator, Path, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn manhattan(&self, other: &Cell) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    Up,
    Down,
    Left,
    Right,
}

impl Move {
    const ALL: [Move; 4] = [Move::Up, Move::Down, Move::Left, Move::Right];

    fn apply(self, cell: Cell) -> Cell {
        match self {
            Move::Up => Cell::new(cell.x, cell.y - 1),
            Move::Down => Cell::new(cell.x, cell.y + 1),
            Move::Left => Cell::new(cell.x - 1, cell.y),
            Move::Right => Cell::new(cell.x + 1, cell.y),
        }
    }
}

/// Grid from the top-left corner to the bottom-right corner.
#[derive(Debug, Clone)]
pub struct GridGraph {
    width: i32,
    height: i32,
    blocked: HashSet<Cell>,
}

impl GridGraph {
    /// Creates an obstacle-free grid.
    pub fn open(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            blocked: HashSet::new(),
        }
    }

    /// Blocks a vertical wall at column `x`, leaving a gap at row `gap`.
    pub fn with_wall(mut self, x: i32, gap: i32) -> Self {
        for y in 0..self.height {
            if y != gap {
                self.blocked.insert(Cell::new(x, y));
            }
        }
        self
    }

    pub fn start(&self) -> Cell {
        Cell::new(0, 0)
    }

    pub fn goal(&self) -> Cell {
        Cell::new(self.width - 1, self.height - 1)
    }

    fn is_free(&self, cell: &Cell) -> bool {
        cell.x >= 0
            && cell.y >= 0
            && cell.x < self.width
            && cell.y < self.height
            && !self.blocked.contains(cell)
    }

    /// Manhattan distance to the goal.
    pub fn heuristic(&self, cell: &Cell) -> u32 {
        cell.manhattan(&self.goal())
    }

    /// Number of moves along `path`.
    pub fn path_cost(path: &Path<Cell, Move>) -> u32 {
        path.depth() as u32
    }
}

impl GraphGenerator for GridGraph {
    type State = Cell;
    type Action = Move;

    fn root(&self) -> Result<Cell> {
        Ok(self.start())
    }

    fn successors(&self, state: &Cell) -> Result<Vec<Expansion<Cell, Move>>> {
        Ok(Move::ALL
            .iter()
            .map(|&m| (m.apply(*state), m))
            .filter(|(cell, _)| self.is_free(cell))
            .map(|(cell, m)| Expansion::new(cell, m))
            .collect())
    }

    fn is_goal(&self, state: &Cell) -> bool {
        *state == self.goal()
    }
}
