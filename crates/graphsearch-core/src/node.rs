//! Search node arena and path reconstruction.
//!
//! Nodes live in a [`NodeArena`] and refer to their parent by [`NodeId`].
//! Open, closed and suspend collections only ever hold ids, so a node can
//! move between collections without being copied. A node's parent is always
//! an earlier arena slot, which keeps every parent chain finite and acyclic.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Index;
use std::sync::Arc;

/// Identifier of a node inside a [`NodeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Returns the arena slot of this node.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// AND/OR type of a node, as declared by the expansion that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeType {
    #[default]
    Or,
    And,
}

/// Free-form annotation value attached to a node.
#[derive(Debug, Clone, PartialEq)]
pub enum Annotation {
    Int(i64),
    Float(f64),
    Text(String),
    Flag(bool),
}

impl From<i64> for Annotation {
    fn from(value: i64) -> Self {
        Annotation::Int(value)
    }
}

impl From<f64> for Annotation {
    fn from(value: f64) -> Self {
        Annotation::Float(value)
    }
}

impl From<bool> for Annotation {
    fn from(value: bool) -> Self {
        Annotation::Flag(value)
    }
}

impl From<&str> for Annotation {
    fn from(value: &str) -> Self {
        Annotation::Text(value.to_string())
    }
}

impl From<String> for Annotation {
    fn from(value: String) -> Self {
        Annotation::Text(value)
    }
}

/// A vertex of the explored search tree.
///
/// State, parent, incoming action and label are fixed at construction.
/// Only the annotation map may change afterwards.
#[derive(Debug)]
pub struct Node<S, A, V> {
    state: Arc<S>,
    parent: Option<NodeId>,
    action: Option<A>,
    kind: NodeType,
    depth: usize,
    label: Option<V>,
    annotations: BTreeMap<String, Annotation>,
}

impl<S, A, V> Node<S, A, V> {
    #[inline]
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Returns the shared handle to the state.
    #[inline]
    pub fn shared_state(&self) -> &Arc<S> {
        &self.state
    }

    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Action on the edge from the parent (`None` for the root).
    #[inline]
    pub fn action(&self) -> Option<&A> {
        self.action.as_ref()
    }

    #[inline]
    pub fn kind(&self) -> NodeType {
        self.kind
    }

    /// Depth in the search tree (root = 0).
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The evaluator's score for this node, if it was evaluated.
    #[inline]
    pub fn label(&self) -> Option<&V> {
        self.label.as_ref()
    }

    pub fn annotation(&self, key: &str) -> Option<&Annotation> {
        self.annotations.get(key)
    }

    pub fn annotations(&self) -> &BTreeMap<String, Annotation> {
        &self.annotations
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Owning storage for all nodes of one algorithm instance.
#[derive(Debug)]
pub struct NodeArena<S, A, V> {
    nodes: Vec<Node<S, A, V>>,
}

impl<S, A, V> Default for NodeArena<S, A, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, A, V> NodeArena<S, A, V> {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Inserts a root node (no parent, depth 0).
    pub fn insert_root(&mut self, state: Arc<S>, label: Option<V>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            state,
            parent: None,
            action: None,
            kind: NodeType::Or,
            depth: 0,
            label,
            annotations: BTreeMap::new(),
        });
        id
    }

    /// Inserts a child of `parent`.
    ///
    /// # Panics
    /// Panics if `parent` was not issued by this arena.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        state: Arc<S>,
        action: A,
        kind: NodeType,
        label: Option<V>,
    ) -> NodeId {
        let depth = self.nodes[parent.0].depth + 1;
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            state,
            parent: Some(parent),
            action: Some(action),
            kind,
            depth,
            label,
            annotations: BTreeMap::new(),
        });
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&Node<S, A, V>> {
        self.nodes.get(id.0)
    }

    /// Attaches an annotation to a node. Returns false for unknown ids.
    pub fn annotate(
        &mut self,
        id: NodeId,
        key: impl Into<String>,
        value: impl Into<Annotation>,
    ) -> bool {
        match self.nodes.get_mut(id.0) {
            Some(node) => {
                node.annotations.insert(key.into(), value.into());
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates the ids from `id` up to and including the root.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_, S, A, V> {
        Ancestors {
            arena: self,
            next: Some(id),
        }
    }
}

impl<S, A: Clone, V> NodeArena<S, A, V> {
    /// Reconstructs the root path ending at `id` by following parent pointers.
    pub fn path(&self, id: NodeId) -> Path<S, A> {
        let mut states = Vec::with_capacity(self.nodes[id.0].depth + 1);
        let mut actions = Vec::with_capacity(self.nodes[id.0].depth);
        for ancestor in self.ancestors(id) {
            let node = &self.nodes[ancestor.0];
            states.push(Arc::clone(&node.state));
            if let Some(action) = &node.action {
                actions.push(action.clone());
            }
        }
        states.reverse();
        actions.reverse();
        Path { states, actions }
    }
}

impl<S, A, V> Index<NodeId> for NodeArena<S, A, V> {
    type Output = Node<S, A, V>;

    fn index(&self, id: NodeId) -> &Self::Output {
        &self.nodes[id.0]
    }
}

/// Iterator over a node and its ancestors.
pub struct Ancestors<'a, S, A, V> {
    arena: &'a NodeArena<S, A, V>,
    next: Option<NodeId>,
}

impl<S, A, V> Iterator for Ancestors<'_, S, A, V> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.arena.get(current).and_then(|n| n.parent);
        Some(current)
    }
}

/// A root path: states `s0..sn` joined by actions `a1..an`.
///
/// Paths are derived from the arena on demand and own shared handles to the
/// states, so they can be sent to evaluators running on other threads.
#[derive(Debug)]
pub struct Path<S, A> {
    states: Vec<Arc<S>>,
    actions: Vec<A>,
}

impl<S, A: Clone> Clone for Path<S, A> {
    fn clone(&self) -> Self {
        Self {
            states: self.states.clone(),
            actions: self.actions.clone(),
        }
    }
}

impl<S, A> Path<S, A> {
    /// Creates a path consisting of the root state only.
    pub fn from_root(root: Arc<S>) -> Self {
        Self {
            states: vec![root],
            actions: Vec::new(),
        }
    }

    /// Appends a step to this path.
    pub fn push(&mut self, state: Arc<S>, action: A) {
        self.states.push(state);
        self.actions.push(action);
    }

    /// Returns the first state.
    pub fn root(&self) -> &S {
        &self.states[0]
    }

    /// Returns the last state.
    pub fn head(&self) -> &S {
        &self.states[self.states.len() - 1]
    }

    pub fn shared_head(&self) -> &Arc<S> {
        &self.states[self.states.len() - 1]
    }

    pub fn states(&self) -> impl Iterator<Item = &S> + '_ {
        self.states.iter().map(|s| s.as_ref())
    }

    pub fn actions(&self) -> &[A] {
        &self.actions
    }

    /// Iterates `(from, action, to)` triples along the path.
    pub fn edges(&self) -> impl Iterator<Item = (&S, &A, &S)> + '_ {
        self.actions
            .iter()
            .enumerate()
            .map(move |(i, a)| (self.states[i].as_ref(), a, self.states[i + 1].as_ref()))
    }

    /// Number of states on the path.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Paths always contain at least the root.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Number of edges on the path.
    pub fn depth(&self) -> usize {
        self.actions.len()
    }
}

impl<S, A: Clone> Path<S, A> {
    /// Returns a copy of this path extended by one step.
    pub fn extended(&self, state: Arc<S>, action: A) -> Self {
        let mut path = self.clone();
        path.push(state, action);
        path
    }
}
