//! Score trait for node labels.

use std::cmp::Ordering;
use std::fmt::Debug;
use std::ops::Add;

use num_traits::{ToPrimitive, Zero};

/// Value produced by a node evaluator.
///
/// Implemented for every primitive numeric type. Best-first style algorithms
/// treat lower scores as better; Monte-Carlo search converts scores to `f64`
/// rewards according to its objective.
///
/// Algorithms only ever order comparable scores: an evaluation returning a
/// score for which [`Score::is_comparable`] is false (NaN) drops the node as
/// a failed evaluation.
pub trait Score:
    Copy + Debug + PartialOrd + Add<Output = Self> + Zero + ToPrimitive + Send + Sync + 'static
{
    /// Total comparison over comparable scores.
    ///
    /// Incomparable values (NaN) compare equal, which is not an order; see
    /// [`Score::is_comparable`].
    fn compare(&self, other: &Self) -> Ordering {
        self.partial_cmp(other).unwrap_or(Ordering::Equal)
    }

    /// False for values without a place in the order, such as NaN.
    fn is_comparable(&self) -> bool {
        self.partial_cmp(self).is_some()
    }

    /// Returns the score as `f64`, or NaN when not representable.
    fn as_f64(&self) -> f64 {
        self.to_f64().unwrap_or(f64::NAN)
    }
}

impl<T> Score for T where
    T: Copy + Debug + PartialOrd + Add<Output = T> + Zero + ToPrimitive + Send + Sync + 'static
{
}
