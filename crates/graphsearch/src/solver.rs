//! Solver entry points that hide the factory wiring.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use graphsearch_algorithms::{
    solve_with_channel, BoxedAlgorithm, CancelHandle, SearchAlgorithm, SearchFactory,
};
use graphsearch_config::SearchConfig;
use graphsearch_core::{
    EvaluatedPath, GraphGenerator, Result, Score, SearchAction, SearchError, SearchState,
};
use graphsearch_eval::NodeEvaluator;
use tokio::sync::mpsc;
use tracing::info;

type Solution<G, E> = EvaluatedPath<
    <G as GraphGenerator>::State,
    <G as GraphGenerator>::Action,
    <E as NodeEvaluator<<G as GraphGenerator>::State, <G as GraphGenerator>::Action>>::Score,
>;

/// Solves with the configuration in `graphsearch.toml`, or the defaults
/// when the file is missing or invalid.
pub fn solve<G, E>(generator: Arc<G>, evaluator: E) -> Result<Option<Solution<G, E>>>
where
    G: GraphGenerator + 'static,
    E: NodeEvaluator<G::State, G::Action> + 'static,
{
    let config = SearchConfig::load("graphsearch.toml").unwrap_or_default();
    solve_with_config(config, generator, evaluator)
}

/// Builds the configured algorithm and runs it.
///
/// Anytime algorithms return their best solution when they finish or hit
/// the configured timeout; the others return their first solution.
pub fn solve_with_config<G, E>(
    config: SearchConfig,
    generator: Arc<G>,
    evaluator: E,
) -> Result<Option<Solution<G, E>>>
where
    G: GraphGenerator + 'static,
    E: NodeEvaluator<G::State, G::Action> + 'static,
{
    let factory = SearchFactory::new(config)?;
    let mut algorithm = factory.build(generator, evaluator)?;

    info!(event = "solve_start", algorithm = algorithm.name());
    let result = algorithm.run();
    let statistics = algorithm.statistics();
    info!(
        event = "solve_end",
        algorithm = algorithm.name(),
        solved = matches!(result, Ok(Some(_))),
        expansions = statistics.expansions,
        evaluations = statistics.evaluations,
        duration_ms = statistics.total_duration.as_millis() as u64,
    );
    result
}

/// A search running on a background thread that streams its solutions.
#[derive(Debug)]
pub struct StreamingSolve<S, A, V> {
    receiver: mpsc::UnboundedReceiver<EvaluatedPath<S, A, V>>,
    cancel: CancelHandle,
    handle: JoinHandle<Result<Option<EvaluatedPath<S, A, V>>>>,
}

impl<S, A, V> StreamingSolve<S, A, V>
where
    S: SearchState,
    A: SearchAction,
    V: Score,
{
    /// Solutions in the order the algorithm yields them.
    pub fn receiver(&mut self) -> &mut mpsc::UnboundedReceiver<EvaluatedPath<S, A, V>> {
        &mut self.receiver
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Waits for the search to end and returns its best solution.
    pub fn join(self) -> Result<Option<EvaluatedPath<S, A, V>>> {
        self.handle
            .join()
            .map_err(|_| SearchError::Computation("solver thread panicked".to_string()))?
    }
}

/// Runs `algorithm` on a background thread, streaming every solution.
pub fn solve_streaming<S, A, V>(
    algorithm: BoxedAlgorithm<S, A, V>,
) -> Result<StreamingSolve<S, A, V>>
where
    S: SearchState,
    A: SearchAction,
    V: Score,
{
    let (sender, receiver) = mpsc::unbounded_channel();
    let cancel = algorithm.cancel_handle();
    let handle = thread::Builder::new()
        .name("graphsearch-solver".to_string())
        .spawn(move || {
            let mut algorithm = algorithm;
            solve_with_channel(&mut algorithm, sender)
        })
        .map_err(|e| SearchError::Computation(format!("failed to spawn solver thread: {e}")))?;

    Ok(StreamingSolve {
        receiver,
        cancel,
        handle,
    })
}
