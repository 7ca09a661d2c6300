//! Termination conditions for search runs.
//!
//! A termination is checked at the start of every step; once it reports
//! true the algorithm finishes as if its frontier were exhausted.

mod composite;
mod count;
mod time;

use std::fmt::Debug;

use crate::scope::SearchScope;

pub use composite::{AndTermination, OrTermination};
pub use count::{ExpansionCountTermination, SolutionCountTermination, StepCountTermination};
pub use time::TimeTermination;

/// Trait for determining when to stop searching.
pub trait Termination: Send + Debug {
    /// Returns true if the search should stop.
    fn is_terminated(&self, scope: &SearchScope) -> bool;
}

impl<T: Termination + ?Sized> Termination for Box<T> {
    fn is_terminated(&self, scope: &SearchScope) -> bool {
        (**self).is_terminated(scope)
    }
}
