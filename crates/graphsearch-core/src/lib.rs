//! graphsearch Core - types shared by every search algorithm
//!
//! This crate provides the fundamental abstractions for graphsearch:
//! - Score trait for node labels (f-values, rewards)
//! - Node arena and lazily reconstructed paths
//! - The graph generator contract consumed by all algorithms
//! - The interrupt registry and bounded computation service
//! - The error taxonomy

pub mod error;
pub mod graph;
pub mod interrupt;
pub mod node;
pub mod score;
pub mod solution;

pub use error::{Result, SearchError};
pub use graph::{DynGraphGenerator, Expansion, GraphGenerator, SearchAction, SearchState};
pub use interrupt::{
    BoundedComputer, CancelToken, InterruptRegistry, Interruption, ReasonId, TimerEntry,
    TimerSubmitter, WorkError, Worker, WorkerBinding, WorkerId,
};
pub use node::{Annotation, Node, NodeArena, NodeId, NodeType, Path};
pub use score::Score;
pub use solution::EvaluatedPath;
