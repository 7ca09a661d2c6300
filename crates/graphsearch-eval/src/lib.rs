//! graphsearch Evaluators
//!
//! This crate provides node evaluation for the search algorithms:
//! - The [`NodeEvaluator`] contract and its [`Capabilities`]
//! - Basic evaluators (closures, constants, `g + h`)
//! - Capability decorators (cancelable, time-aware, solution-observing)
//! - Primary/fallback composition and random-completion sampling
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use graphsearch_core::{BoundedComputer, InterruptRegistry, Path};
//! use graphsearch_eval::{AdditiveEvaluator, Cancelable, NodeEvaluator, TimeAware};
//!
//! let registry = Arc::new(InterruptRegistry::new());
//! let evaluator = Cancelable::new(TimeAware::new(
//!     AdditiveEvaluator::dijkstra(|_: &u32, cost: &u32, _: &u32| *cost),
//!     BoundedComputer::new(&registry, "evaluator"),
//!     Duration::from_millis(100),
//! ));
//!
//! let mut path: Path<u32, u32> = Path::from_root(Arc::new(0));
//! path.push(Arc::new(1), 4);
//! assert_eq!(evaluator.evaluate(&path).unwrap(), Some(4));
//! assert!(evaluator.capabilities().time_aware);
//! ```

pub mod alternative;
pub mod base;
pub mod decorator;
pub mod evaluator;
pub mod random_completion;

pub use alternative::AlternativeEvaluator;
pub use base::{AdditiveEvaluator, ConstantEvaluator, FnEvaluator};
pub use decorator::{Cancelable, SolutionListener, SolutionObserving, TimeAware, TimeoutPolicy};
pub use evaluator::{BoxedEvaluator, Capabilities, NodeEvaluator};
pub use random_completion::RandomCompletionEvaluator;
