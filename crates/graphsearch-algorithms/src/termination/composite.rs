//! Composite termination conditions (AND/OR).
//!
//! Uses macro-generated tuple implementations for zero type erasure.

use super::Termination;
use crate::scope::SearchScope;

/// Combines multiple terminations with OR logic (any must terminate).
///
/// # Examples
///
/// ```
/// use graphsearch_algorithms::termination::{
///     OrTermination, SolutionCountTermination, TimeTermination,
/// };
///
/// // Stop after 30 seconds or the third solution
/// let termination = OrTermination::new((
///     TimeTermination::seconds(30),
///     SolutionCountTermination::new(3),
/// ));
/// ```
#[derive(Debug)]
pub struct OrTermination<T>(pub T);

impl<T> OrTermination<T> {
    pub fn new(terminations: T) -> Self {
        Self(terminations)
    }
}

macro_rules! impl_or_termination {
    ($idx:tt: $T:ident) => {
        impl<$T> Termination for OrTermination<($T,)>
        where
            $T: Termination,
        {
            fn is_terminated(&self, scope: &SearchScope) -> bool {
                (self.0).$idx.is_terminated(scope)
            }
        }
    };

    ($($idx:tt: $T:ident),+) => {
        impl<$($T),+> Termination for OrTermination<($($T,)+)>
        where
            $($T: Termination,)+
        {
            fn is_terminated(&self, scope: &SearchScope) -> bool {
                $((self.0).$idx.is_terminated(scope))||+
            }
        }
    };
}

impl_or_termination!(0: T0);
impl_or_termination!(0: T0, 1: T1);
impl_or_termination!(0: T0, 1: T1, 2: T2);
impl_or_termination!(0: T0, 1: T1, 2: T2, 3: T3);
impl_or_termination!(0: T0, 1: T1, 2: T2, 3: T3, 4: T4);

/// Combines multiple terminations with AND logic (all must terminate).
#[derive(Debug)]
pub struct AndTermination<T>(pub T);

impl<T> AndTermination<T> {
    pub fn new(terminations: T) -> Self {
        Self(terminations)
    }
}

macro_rules! impl_and_termination {
    ($idx:tt: $T:ident) => {
        impl<$T> Termination for AndTermination<($T,)>
        where
            $T: Termination,
        {
            fn is_terminated(&self, scope: &SearchScope) -> bool {
                (self.0).$idx.is_terminated(scope)
            }
        }
    };

    ($($idx:tt: $T:ident),+) => {
        impl<$($T),+> Termination for AndTermination<($($T,)+)>
        where
            $($T: Termination,)+
        {
            fn is_terminated(&self, scope: &SearchScope) -> bool {
                $((self.0).$idx.is_terminated(scope))&&+
            }
        }
    };
}

impl_and_termination!(0: T0);
impl_and_termination!(0: T0, 1: T1);
impl_and_termination!(0: T0, 1: T1, 2: T2);
impl_and_termination!(0: T0, 1: T1, 2: T2, 3: T3);
impl_and_termination!(0: T0, 1: T1, 2: T2, 3: T3, 4: T4);
