//! Driving an algorithm to completion from the outside.
//!
//! [`run_with_timeout`] runs an algorithm on its own thread and cancels it
//! when the caller's budget expires. [`solve_with_channel`] streams every
//! solution through a tokio channel while the algorithm runs.

use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel::{self, RecvTimeoutError};
use graphsearch_core::{EvaluatedPath, Result, SearchError};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::algorithm::{SearchAlgorithm, StepOutcome};
use crate::statistics::SearchStatistics;

/// Result of a [`run_with_timeout`] call.
#[derive(Debug, Clone)]
pub struct RunReport<S, A, V> {
    /// Best solution, or the first one for non-anytime algorithms.
    pub solution: Option<EvaluatedPath<S, A, V>>,
    pub statistics: SearchStatistics,
    /// The budget expired and the algorithm was canceled.
    pub timed_out: bool,
    pub elapsed: Duration,
}

type Solution<T> = EvaluatedPath<
    <T as SearchAlgorithm>::State,
    <T as SearchAlgorithm>::Action,
    <T as SearchAlgorithm>::Score,
>;

/// Runs `algorithm` on a dedicated thread and cancels it after `timeout`.
///
/// Anytime algorithms report their best solution when the budget expires.
/// A non-anytime algorithm that has not found its solution in time fails
/// with [`SearchError::Timeout`].
pub fn run_with_timeout<T>(
    algorithm: T,
    timeout: Duration,
) -> Result<RunReport<T::State, T::Action, T::Score>>
where
    T: SearchAlgorithm + 'static,
{
    let name = algorithm.name();
    let anytime = algorithm.is_anytime();
    let cancel = algorithm.cancel_handle();
    let (sender, receiver) = channel::bounded(1);
    let start = Instant::now();

    info!(event = "run_start", algorithm = name, timeout_ms = timeout.as_millis() as u64);

    let worker = thread::Builder::new()
        .name("graphsearch-runner".to_string())
        .spawn(move || {
            let mut algorithm = algorithm;
            let result = algorithm.run();
            let _ = sender.send((result, algorithm.statistics()));
        })
        .map_err(|e| SearchError::Computation(format!("failed to spawn runner thread: {e}")))?;

    let (received, timed_out) = match receiver.recv_timeout(timeout) {
        Ok(received) => (Some(received), false),
        Err(RecvTimeoutError::Timeout) => {
            info!(event = "run_timeout", algorithm = name);
            cancel.cancel();
            (receiver.recv().ok(), true)
        }
        Err(RecvTimeoutError::Disconnected) => (None, false),
    };

    if worker.join().is_err() {
        warn!(event = "runner_panicked", algorithm = name);
    }
    let Some((result, statistics)) = received else {
        return Err(SearchError::Computation(format!("{name} runner thread panicked")));
    };
    let elapsed = start.elapsed();

    let solution = match result {
        Ok(solution) => solution,
        Err(SearchError::Canceled(_)) if timed_out && !anytime => {
            return Err(SearchError::Timeout {
                budget: timeout,
                overrun: elapsed.saturating_sub(timeout),
            });
        }
        Err(e) => return Err(e),
    };

    info!(
        event = "run_complete",
        algorithm = name,
        solved = solution.is_some(),
        timed_out,
        expansions = statistics.expansions,
        duration_ms = elapsed.as_millis() as u64,
    );

    Ok(RunReport {
        solution,
        statistics,
        timed_out,
        elapsed,
    })
}

/// Steps `algorithm` until it finishes, sending every solution it yields.
///
/// Returns the best solution. A dropped receiver does not stop the search.
/// Interruptions of anytime algorithms end the stream normally.
pub fn solve_with_channel<T>(
    algorithm: &mut T,
    sender: mpsc::UnboundedSender<Solution<T>>,
) -> Result<Option<Solution<T>>>
where
    T: SearchAlgorithm + ?Sized,
{
    let mut sent = 0u64;
    loop {
        match algorithm.step() {
            Ok(StepOutcome::Progress) => {}
            Ok(StepOutcome::Solution(solution)) => {
                sent += 1;
                let _ = sender.send(solution);
            }
            Ok(StepOutcome::Finished) => break,
            Err(e) if e.is_interruption() && algorithm.is_anytime() => break,
            Err(e) => return Err(e),
        }
    }
    info!(event = "stream_complete", algorithm = algorithm.name(), solutions = sent);
    Ok(algorithm.best_solution().cloned())
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
