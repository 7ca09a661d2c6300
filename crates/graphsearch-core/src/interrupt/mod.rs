//! Interrupt registry and bounded computation.
//!
//! The [`InterruptRegistry`] is the one shared mutable resource of the engine.
//! It tracks, per [`Worker`], the cancellation reasons currently in flight and
//! owns a lazily started scheduler thread that delivers deadline interrupts.
//! All registry mutations and all scheduler deliveries happen under a single
//! lock, so "is my reason the only one that fired?" can be answered without
//! races.
//!
//! Cancellation is cooperative: a delivered interrupt raises the worker's
//! pending flag, which computations observe through a [`CancelToken`] and
//! answer with [`WorkError::Interrupted`]. [`BoundedComputer`] then decides
//! whether that interruption was its own deadline or somebody else's cancel.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use graphsearch_core::interrupt::{BoundedComputer, InterruptRegistry};
//!
//! let registry = Arc::new(InterruptRegistry::new());
//! let computer = BoundedComputer::new(&registry, "example");
//!
//! let value = computer
//!     .compute(Duration::from_secs(5), "quick sum", |_token| Ok(2 + 2))
//!     .unwrap();
//! assert_eq!(value, 4);
//! ```

mod bounded;
mod registry;
mod scheduler;

pub use bounded::{BoundedComputer, WorkError};
pub use registry::{
    CancelToken, InterruptRegistry, Interruption, ReasonId, TimerEntry, TimerSubmitter, Worker,
    WorkerBinding, WorkerId,
};

#[cfg(test)]
mod tests;
