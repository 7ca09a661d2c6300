//! Open list and set membership bookkeeping.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use graphsearch_config::TieBreak;
use graphsearch_core::{NodeId, Score};
use rand::RngCore;

use crate::event::NodeStatus;

struct OpenEntry<V> {
    f: V,
    tie: u64,
    node: NodeId,
}

impl<V: Score> PartialEq for OpenEntry<V> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<V: Score> Eq for OpenEntry<V> {}

impl<V: Score> PartialOrd for OpenEntry<V> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<V: Score> Ord for OpenEntry<V> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.f
            .compare(&other.f)
            .then(self.tie.cmp(&other.tie))
            .then(self.node.cmp(&other.node))
    }
}

/// Priority queue of node ids ordered by ascending f-value.
///
/// Ties are broken by insertion order, or by a random key drawn from the
/// caller's RNG when the tie-break policy is [`TieBreak::Random`].
pub struct OpenList<V> {
    heap: BinaryHeap<Reverse<OpenEntry<V>>>,
    tie_break: TieBreak,
    sequence: u64,
}

impl<V: Score> OpenList<V> {
    pub fn new(tie_break: TieBreak) -> Self {
        Self {
            heap: BinaryHeap::new(),
            tie_break,
            sequence: 0,
        }
    }

    pub fn push(&mut self, node: NodeId, f: V, rng: &mut dyn RngCore) {
        let tie = match self.tie_break {
            TieBreak::Fifo => {
                self.sequence += 1;
                self.sequence
            }
            TieBreak::Random => rng.next_u64(),
        };
        self.heap.push(Reverse(OpenEntry { f, tie, node }));
    }

    /// Removes the node with the lowest f-value.
    pub fn pop(&mut self) -> Option<(NodeId, V)> {
        self.heap.pop().map(|Reverse(e)| (e.node, e.f))
    }

    pub fn peek_f(&self) -> Option<V> {
        self.heap.peek().map(|Reverse(e)| e.f)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn tie_break(&self) -> TieBreak {
        self.tie_break
    }
}

impl<V> std::fmt::Debug for OpenList<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenList")
            .field("len", &self.heap.len())
            .field("tie_break", &self.tie_break)
            .finish()
    }
}

/// Status of every node in the arena, indexed by id.
///
/// Keeps open, closed and suspend disjoint: a node has exactly one status.
#[derive(Debug, Default)]
pub struct Membership {
    statuses: Vec<Option<NodeStatus>>,
}

impl Membership {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the status of `node`, returning the previous one.
    pub fn set(&mut self, node: NodeId, status: NodeStatus) -> Option<NodeStatus> {
        let index = node.index();
        if index >= self.statuses.len() {
            self.statuses.resize(index + 1, None);
        }
        self.statuses[index].replace(status)
    }

    pub fn get(&self, node: NodeId) -> Option<NodeStatus> {
        self.statuses.get(node.index()).copied().flatten()
    }

    pub fn count(&self, status: NodeStatus) -> usize {
        self.statuses.iter().filter(|s| **s == Some(status)).count()
    }
}
