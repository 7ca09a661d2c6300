//! The algorithm contract shared by every search strategy.

use std::sync::Arc;
use std::time::Duration;

use graphsearch_core::{EvaluatedPath, Result, Score, SearchAction, SearchState};

use crate::event::SearchEventListener;
use crate::lifecycle::{AlgorithmState, CancelHandle};
use crate::statistics::SearchStatistics;

/// Outcome of a single [`SearchAlgorithm::step`].
#[derive(Debug)]
pub enum StepOutcome<S, A, V> {
    /// Work was done; no solution this time.
    Progress,
    /// A solution was found during this step.
    Solution(EvaluatedPath<S, A, V>),
    /// The algorithm became inactive without an error.
    Finished,
}

/// A steppable graph search.
///
/// The algorithm is driven from one thread at a time: either step by step
/// through [`step`](SearchAlgorithm::step), solution by solution through
/// [`next_solution`](SearchAlgorithm::next_solution), or to completion
/// through [`run`](SearchAlgorithm::run). Any thread may cancel it through
/// a [`CancelHandle`].
pub trait SearchAlgorithm: Send {
    type State: SearchState;
    type Action: SearchAction;
    type Score: Score;

    fn name(&self) -> &'static str;

    fn state(&self) -> AlgorithmState;

    /// Performs one unit of work.
    ///
    /// Errors other than local evaluation failures make the algorithm
    /// inactive. Stepping an inactive algorithm fails with `IllegalState`.
    fn step(&mut self) -> Result<StepOutcome<Self::State, Self::Action, Self::Score>>;

    fn cancel_handle(&self) -> CancelHandle;

    /// Arms an algorithm-level deadline measured from activation.
    fn set_timeout(&mut self, timeout: Duration) -> Result<()>;

    /// Best solution reported so far.
    fn best_solution(&self) -> Option<&EvaluatedPath<Self::State, Self::Action, Self::Score>>;

    fn statistics(&self) -> SearchStatistics;

    fn add_listener(
        &mut self,
        listener: Arc<dyn SearchEventListener<Self::State, Self::Action, Self::Score>>,
    );

    /// Anytime algorithms keep improving and hand out their best solution
    /// when interrupted.
    fn is_anytime(&self) -> bool {
        false
    }

    /// Steps until the next solution, or `None` once the algorithm finished.
    fn next_solution(
        &mut self,
    ) -> Result<Option<EvaluatedPath<Self::State, Self::Action, Self::Score>>> {
        loop {
            match self.step()? {
                StepOutcome::Progress => {}
                StepOutcome::Solution(solution) => return Ok(Some(solution)),
                StepOutcome::Finished => return Ok(None),
            }
        }
    }

    /// Runs the algorithm.
    ///
    /// Non-anytime algorithms return their first solution and surface
    /// timeouts and cancellation as errors. Anytime algorithms run until they
    /// finish or are interrupted and return the best solution seen.
    fn run(&mut self) -> Result<Option<EvaluatedPath<Self::State, Self::Action, Self::Score>>> {
        if !self.is_anytime() {
            return self.next_solution();
        }
        loop {
            match self.step() {
                Ok(StepOutcome::Finished) => return Ok(self.best_solution().cloned()),
                Ok(_) => {}
                Err(e) if e.is_interruption() => return Ok(self.best_solution().cloned()),
                Err(e) => return Err(e),
            }
        }
    }
}

/// Type-erased algorithm, as built from configuration.
pub type BoxedAlgorithm<S, A, V> = Box<dyn SearchAlgorithm<State = S, Action = A, Score = V>>;

impl<T: SearchAlgorithm + ?Sized> SearchAlgorithm for Box<T> {
    type State = T::State;
    type Action = T::Action;
    type Score = T::Score;

    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn state(&self) -> AlgorithmState {
        (**self).state()
    }

    fn step(&mut self) -> Result<StepOutcome<Self::State, Self::Action, Self::Score>> {
        (**self).step()
    }

    fn cancel_handle(&self) -> CancelHandle {
        (**self).cancel_handle()
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<()> {
        (**self).set_timeout(timeout)
    }

    fn best_solution(&self) -> Option<&EvaluatedPath<Self::State, Self::Action, Self::Score>> {
        (**self).best_solution()
    }

    fn statistics(&self) -> SearchStatistics {
        (**self).statistics()
    }

    fn add_listener(
        &mut self,
        listener: Arc<dyn SearchEventListener<Self::State, Self::Action, Self::Score>>,
    ) {
        (**self).add_listener(listener)
    }

    fn is_anytime(&self) -> bool {
        (**self).is_anytime()
    }

    fn next_solution(
        &mut self,
    ) -> Result<Option<EvaluatedPath<Self::State, Self::Action, Self::Score>>> {
        (**self).next_solution()
    }

    fn run(&mut self) -> Result<Option<EvaluatedPath<Self::State, Self::Action, Self::Score>>> {
        (**self).run()
    }
}
