//! Capability decorators.
//!
//! Each decorator exclusively owns the evaluator it wraps, adds one
//! capability, and forwards every capability query and lifecycle call to
//! the wrapped evaluator exactly once.

mod cancelable;
mod observing;
mod time_aware;

pub use cancelable::Cancelable;
pub use observing::{SolutionListener, SolutionObserving};
pub use time_aware::{TimeAware, TimeoutPolicy};
