//! Event system for search monitoring.
//!
//! Algorithms publish what they do to registered listeners: the graph being
//! initialized, nodes being added or changing status, solution candidates,
//! window increases (AWA*) and completed playouts (MCTS). The algorithms
//! never depend on who listens.
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//! use graphsearch_algorithms::event::{SearchEventListener, SearchEventSupport};
//! use graphsearch_core::EvaluatedPath;
//!
//! #[derive(Debug)]
//! struct MyListener;
//!
//! impl SearchEventListener<u64, u8, u32> for MyListener {
//!     fn on_solution_candidate_found(&self, solution: &EvaluatedPath<u64, u8, u32>) {
//!         println!("Solution of depth {}", solution.path.depth());
//!     }
//! }
//!
//! let mut support = SearchEventSupport::<u64, u8, u32>::new();
//! support.add_listener(Arc::new(MyListener));
//! assert!(support.has_listeners());
//! ```

use std::fmt::{self, Debug};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use graphsearch_core::{EvaluatedPath, NodeId, Score, SearchAction, SearchState};
use tracing::{debug, info};

use crate::lifecycle::FinishReason;

/// Where a node currently sits in an algorithm's bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeStatus {
    Open,
    Closed,
    Suspended,
    /// A goal node reported as a solution candidate.
    Solution,
    /// Reached a dead end or was dropped by the evaluator.
    Dead,
}

/// Listener for search events.
///
/// Every method defaults to doing nothing. Listeners are called
/// synchronously on the searching thread and should return quickly.
pub trait SearchEventListener<S, A, V>: Send + Sync + Debug {
    fn on_algorithm_started(&self, _algorithm: &str) {}

    /// Called once the root node exists.
    fn on_graph_initialized(&self, _root: NodeId, _state: &S) {}

    fn on_node_added(
        &self,
        _node: NodeId,
        _parent: NodeId,
        _status: NodeStatus,
        _label: Option<&V>,
    ) {
    }

    fn on_node_type_switched(&self, _node: NodeId, _status: NodeStatus) {}

    /// Called for every goal path the algorithm scores, improving or not.
    fn on_solution_candidate_found(&self, _solution: &EvaluatedPath<S, A, V>) {}

    /// Called when AWA* widens its window.
    fn on_window_increased(&self, _window: usize) {}

    /// Called after every Monte-Carlo playout with its backpropagated reward.
    fn on_playout_completed(&self, _playout: u64, _reward: f64) {}

    fn on_algorithm_finished(&self, _algorithm: &str, _reason: FinishReason) {}
}

/// Central event broadcaster.
///
/// Listener methods are called in registration order.
pub struct SearchEventSupport<S, A, V> {
    listeners: Vec<Arc<dyn SearchEventListener<S, A, V>>>,
}

impl<S, A, V> SearchEventSupport<S, A, V>
where
    S: SearchState,
    A: SearchAction,
    V: Score,
{
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn add_listener(&mut self, listener: Arc<dyn SearchEventListener<S, A, V>>) {
        self.listeners.push(listener);
    }

    pub fn clear_listeners(&mut self) {
        self.listeners.clear();
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn has_listeners(&self) -> bool {
        !self.listeners.is_empty()
    }

    pub fn fire_algorithm_started(&self, algorithm: &str) {
        for listener in &self.listeners {
            listener.on_algorithm_started(algorithm);
        }
    }

    pub fn fire_graph_initialized(&self, root: NodeId, state: &S) {
        for listener in &self.listeners {
            listener.on_graph_initialized(root, state);
        }
    }

    pub fn fire_node_added(
        &self,
        node: NodeId,
        parent: NodeId,
        status: NodeStatus,
        label: Option<&V>,
    ) {
        for listener in &self.listeners {
            listener.on_node_added(node, parent, status, label);
        }
    }

    pub fn fire_node_type_switched(&self, node: NodeId, status: NodeStatus) {
        for listener in &self.listeners {
            listener.on_node_type_switched(node, status);
        }
    }

    pub fn fire_solution_candidate_found(&self, solution: &EvaluatedPath<S, A, V>) {
        for listener in &self.listeners {
            listener.on_solution_candidate_found(solution);
        }
    }

    pub fn fire_window_increased(&self, window: usize) {
        for listener in &self.listeners {
            listener.on_window_increased(window);
        }
    }

    pub fn fire_playout_completed(&self, playout: u64, reward: f64) {
        for listener in &self.listeners {
            listener.on_playout_completed(playout, reward);
        }
    }

    pub fn fire_algorithm_finished(&self, algorithm: &str, reason: FinishReason) {
        for listener in &self.listeners {
            listener.on_algorithm_finished(algorithm, reason);
        }
    }
}

impl<S, A, V> Default for SearchEventSupport<S, A, V>
where
    S: SearchState,
    A: SearchAction,
    V: Score,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S, A, V> Debug for SearchEventSupport<S, A, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchEventSupport")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// A listener that forwards events to `tracing`.
///
/// Lifecycle and solution events are logged at `info`, everything else at
/// `debug`.
#[derive(Debug, Clone, Default)]
pub struct LoggingEventListener {
    prefix: String,
}

impl LoggingEventListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl<S, A, V> SearchEventListener<S, A, V> for LoggingEventListener
where
    S: SearchState,
    A: SearchAction,
    V: Score,
{
    fn on_algorithm_started(&self, algorithm: &str) {
        info!(prefix = %self.prefix, event = "algorithm_started", algorithm);
    }

    fn on_graph_initialized(&self, root: NodeId, state: &S) {
        debug!(prefix = %self.prefix, event = "graph_initialized", root = %root, state = ?state);
    }

    fn on_node_added(&self, node: NodeId, parent: NodeId, status: NodeStatus, label: Option<&V>) {
        debug!(
            prefix = %self.prefix,
            event = "node_added",
            node = %node,
            parent = %parent,
            status = ?status,
            label = ?label
        );
    }

    fn on_node_type_switched(&self, node: NodeId, status: NodeStatus) {
        debug!(prefix = %self.prefix, event = "node_type_switched", node = %node, status = ?status);
    }

    fn on_solution_candidate_found(&self, solution: &EvaluatedPath<S, A, V>) {
        info!(
            prefix = %self.prefix,
            event = "solution_candidate",
            depth = solution.path.depth(),
            score = ?solution.score,
            found_after_ms = solution.found_after.as_millis() as u64
        );
    }

    fn on_window_increased(&self, window: usize) {
        debug!(prefix = %self.prefix, event = "window_increased", window);
    }

    fn on_playout_completed(&self, playout: u64, reward: f64) {
        debug!(prefix = %self.prefix, event = "playout_completed", playout, reward);
    }

    fn on_algorithm_finished(&self, algorithm: &str, reason: FinishReason) {
        info!(prefix = %self.prefix, event = "algorithm_finished", algorithm, reason = ?reason);
    }
}

/// A listener that counts event occurrences.
#[derive(Debug, Default)]
pub struct CountingEventListener {
    started_count: AtomicUsize,
    graph_initialized_count: AtomicUsize,
    node_added_count: AtomicUsize,
    node_type_switched_count: AtomicUsize,
    solution_candidate_count: AtomicUsize,
    window_increased_count: AtomicUsize,
    playout_count: AtomicUsize,
    finished_count: AtomicUsize,
}

impl CountingEventListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn started_count(&self) -> usize {
        self.started_count.load(Ordering::SeqCst)
    }

    pub fn graph_initialized_count(&self) -> usize {
        self.graph_initialized_count.load(Ordering::SeqCst)
    }

    pub fn node_added_count(&self) -> usize {
        self.node_added_count.load(Ordering::SeqCst)
    }

    pub fn node_type_switched_count(&self) -> usize {
        self.node_type_switched_count.load(Ordering::SeqCst)
    }

    pub fn solution_candidate_count(&self) -> usize {
        self.solution_candidate_count.load(Ordering::SeqCst)
    }

    pub fn window_increased_count(&self) -> usize {
        self.window_increased_count.load(Ordering::SeqCst)
    }

    pub fn playout_count(&self) -> usize {
        self.playout_count.load(Ordering::SeqCst)
    }

    pub fn finished_count(&self) -> usize {
        self.finished_count.load(Ordering::SeqCst)
    }

    /// Resets all counters to zero.
    pub fn reset(&self) {
        for counter in [
            &self.started_count,
            &self.graph_initialized_count,
            &self.node_added_count,
            &self.node_type_switched_count,
            &self.solution_candidate_count,
            &self.window_increased_count,
            &self.playout_count,
            &self.finished_count,
        ] {
            counter.store(0, Ordering::SeqCst);
        }
    }
}

impl<S, A, V> SearchEventListener<S, A, V> for CountingEventListener
where
    S: SearchState,
    A: SearchAction,
    V: Score,
{
    fn on_algorithm_started(&self, _algorithm: &str) {
        self.started_count.fetch_add(1, Ordering::SeqCst);
    }

    fn on_graph_initialized(&self, _root: NodeId, _state: &S) {
        self.graph_initialized_count.fetch_add(1, Ordering::SeqCst);
    }

    fn on_node_added(
        &self,
        _node: NodeId,
        _parent: NodeId,
        _status: NodeStatus,
        _label: Option<&V>,
    ) {
        self.node_added_count.fetch_add(1, Ordering::SeqCst);
    }

    fn on_node_type_switched(&self, _node: NodeId, _status: NodeStatus) {
        self.node_type_switched_count.fetch_add(1, Ordering::SeqCst);
    }

    fn on_solution_candidate_found(&self, _solution: &EvaluatedPath<S, A, V>) {
        self.solution_candidate_count.fetch_add(1, Ordering::SeqCst);
    }

    fn on_window_increased(&self, _window: usize) {
        self.window_increased_count.fetch_add(1, Ordering::SeqCst);
    }

    fn on_playout_completed(&self, _playout: u64, _reward: f64) {
        self.playout_count.fetch_add(1, Ordering::SeqCst);
    }

    fn on_algorithm_finished(&self, _algorithm: &str, _reason: FinishReason) {
        self.finished_count.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
