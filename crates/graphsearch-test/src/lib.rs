//! Shared test fixtures for graphsearch crates.
//!
//! This crate provides small implicit graphs with known answers.
//! It does NOT depend on `graphsearch-eval` to avoid circular dependencies;
//! fixtures expose plain cost and heuristic functions instead of evaluators.
//!
//! - [`ternary`] - Unbounded ternary counting tree
//! - [`dag`] - Weighted DAGs with a known optimal cost
//! - [`grid`] - Four-connected grid with obstacles
//! - [`dead_end`] - Narrow tree where all but one branch dies
//!
//! # Usage
//!
//! Add as a dev-dependency in your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! graphsearch-test = { workspace = true }
//! ```

pub mod dag;
pub mod dead_end;
pub mod grid;
pub mod ternary;

pub use dag::WeightedDag;
pub use dead_end::{Corridor, DeadEndGraph};
pub use grid::{Cell, GridGraph, Move};
pub use ternary::TernaryGraph;
