//! Error types for graphsearch

use std::time::Duration;

use thiserror::Error;

use crate::interrupt::Interruption;

/// Main error type for graphsearch operations.
///
/// Only [`SearchError::NodeEvaluationFailed`] is local: the affected node is
/// dropped and the search continues. Everything else propagates to the
/// embedding caller.
#[derive(Debug, Clone, Error)]
pub enum SearchError {
    /// A single node could not be scored.
    #[error("Node evaluation failed: {0}")]
    NodeEvaluationFailed(String),

    /// A bounded computation (whole algorithm or single evaluation) ran out of time.
    #[error("Timed out: budget of {budget:?} exceeded by {overrun:?}")]
    Timeout { budget: Duration, overrun: Duration },

    /// The computation was canceled from outside.
    #[error("Canceled: {0}")]
    Canceled(Interruption),

    /// A bounded computation failed for a reason other than cancellation.
    #[error("Computation failed: {0}")]
    Computation(String),

    /// Invalid operation for the current algorithm state.
    #[error("Invalid state: {0}")]
    IllegalState(String),

    /// Misconfigured engine or evaluator.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The graph generator could not produce a root or successors.
    #[error("Graph generator error: {0}")]
    Generator(String),
}

impl SearchError {
    /// Returns true for errors that only affect the node being evaluated.
    pub fn is_local(&self) -> bool {
        matches!(self, SearchError::NodeEvaluationFailed(_))
    }

    /// Returns true for timeout and cancellation errors.
    pub fn is_interruption(&self) -> bool {
        matches!(self, SearchError::Timeout { .. } | SearchError::Canceled(_))
    }
}

/// Result type alias for graphsearch operations
pub type Result<T> = std::result::Result<T, SearchError>;
