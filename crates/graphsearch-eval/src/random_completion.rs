//! Random-completion evaluator.
//!
//! Scores a node by completing its path to a goal several times with random
//! successors and keeping the best completion according to a path scorer.
//! Each sample draws its own seed from the evaluator's seeded RNG, so the
//! result does not depend on how samples are spread over threads.

use std::fmt;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use graphsearch_core::{
    DynGraphGenerator, EvaluatedPath, Path, Result, Score, SearchAction, SearchError,
    SearchState,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use rayon::ThreadPool;
use tracing::{debug, trace};

use crate::evaluator::{Capabilities, NodeEvaluator};

/// Default number of completions per evaluation.
pub const DEFAULT_SAMPLES: usize = 3;

/// Default number of random steps a completion may take.
pub const DEFAULT_MAX_COMPLETION_DEPTH: usize = 1_000;

/// Best completion found so far.
struct Incumbent<S, A, V> {
    path: Path<S, A>,
    score: V,
}

/// Evaluates nodes by sampling random completions to a goal.
///
/// The evaluator is graph-dependent: [`NodeEvaluator::set_graph_generator`]
/// must be called before the first evaluation. Completions that hit a dead
/// end or exceed the depth cap are discarded; when no sample reaches a goal
/// the node is pruned.
pub struct RandomCompletionEvaluator<S, A, E>
where
    S: SearchState,
    A: SearchAction,
    E: NodeEvaluator<S, A>,
{
    scorer: E,
    samples: usize,
    max_depth: usize,
    generator: OnceLock<DynGraphGenerator<S, A>>,
    rng: Mutex<ChaCha8Rng>,
    pool: Option<Arc<ThreadPool>>,
    best: Mutex<Option<Incumbent<S, A, E::Score>>>,
}

impl<S, A, E> RandomCompletionEvaluator<S, A, E>
where
    S: SearchState,
    A: SearchAction,
    E: NodeEvaluator<S, A>,
{
    /// Creates an evaluator scoring complete paths with `scorer`.
    pub fn new(scorer: E, seed: u64) -> Self {
        Self {
            scorer,
            samples: DEFAULT_SAMPLES,
            max_depth: DEFAULT_MAX_COMPLETION_DEPTH,
            generator: OnceLock::new(),
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
            pool: None,
            best: Mutex::new(None),
        }
    }

    pub fn with_samples(mut self, samples: usize) -> Self {
        self.samples = samples.max(1);
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Draws samples in parallel on `pool`.
    pub fn with_pool(mut self, pool: Arc<ThreadPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Score of the best completion seen, including observed solutions.
    pub fn best_score(&self) -> Option<E::Score> {
        self.best
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|b| b.score)
    }

    /// The best completed root-to-goal path seen so far.
    pub fn best_completion(&self) -> Option<(Path<S, A>, E::Score)> {
        self.best
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|b| (b.path.clone(), b.score))
    }

    fn record(&self, path: &Path<S, A>, score: E::Score) {
        let mut best = self.best.lock().unwrap_or_else(PoisonError::into_inner);
        if best.as_ref().map_or(true, |b| score.compare(&b.score).is_lt()) {
            *best = Some(Incumbent {
                path: path.clone(),
                score,
            });
        }
    }

    /// Completes `path` once with the RNG seeded by `seed`.
    fn complete(
        &self,
        generator: &DynGraphGenerator<S, A>,
        path: &Path<S, A>,
        seed: u64,
    ) -> Result<Option<(Path<S, A>, E::Score)>> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut completion = path.clone();
        let mut steps = 0;
        while !generator.is_goal_path(&completion) {
            if steps >= self.max_depth {
                trace!(steps, "Completion exceeded depth cap");
                return Ok(None);
            }
            match generator.random_successor(completion.head(), &mut rng)? {
                Some(next) => completion.push(Arc::new(next.state), next.action),
                None => {
                    trace!(steps, "Completion hit a dead end");
                    return Ok(None);
                }
            }
            steps += 1;
        }
        match self.scorer.evaluate(&completion) {
            Ok(Some(score)) => Ok(Some((completion, score))),
            Ok(None) => Ok(None),
            Err(e) if e.is_local() => {
                trace!(error = %e, "Completion could not be scored");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

impl<S, A, E> fmt::Debug for RandomCompletionEvaluator<S, A, E>
where
    S: SearchState,
    A: SearchAction,
    E: NodeEvaluator<S, A>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomCompletionEvaluator")
            .field("scorer", &self.scorer)
            .field("samples", &self.samples)
            .field("max_depth", &self.max_depth)
            .field("bound", &self.generator.get().is_some())
            .field("parallel", &self.pool.is_some())
            .finish()
    }
}

impl<S, A, E> NodeEvaluator<S, A> for RandomCompletionEvaluator<S, A, E>
where
    S: SearchState,
    A: SearchAction,
    E: NodeEvaluator<S, A>,
{
    type Score = E::Score;

    fn evaluate(&self, path: &Path<S, A>) -> Result<Option<Self::Score>> {
        let generator = self.generator.get().ok_or_else(|| {
            SearchError::Config(
                "random completion evaluator used before a graph generator was set".to_string(),
            )
        })?;

        let seeds: Vec<u64> = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            (0..self.samples).map(|_| rng.random()).collect()
        };

        let results: Vec<Result<Option<(Path<S, A>, E::Score)>>> = match &self.pool {
            Some(pool) => pool.install(|| {
                seeds
                    .par_iter()
                    .map(|&seed| self.complete(generator, path, seed))
                    .collect()
            }),
            None => seeds
                .iter()
                .map(|&seed| self.complete(generator, path, seed))
                .collect(),
        };

        // Results are in sample order; on equal scores the earliest sample wins.
        let mut best: Option<(Path<S, A>, E::Score)> = None;
        for result in results {
            if let Some((completion, score)) = result? {
                if best.as_ref().map_or(true, |(_, b)| score.compare(b).is_lt()) {
                    best = Some((completion, score));
                }
            }
        }

        match best {
            Some((completion, score)) => {
                self.record(&completion, score);
                trace!(depth = path.depth(), ?score, "Random completion score");
                Ok(Some(score))
            }
            None => {
                trace!(depth = path.depth(), "No random completion reached a goal");
                Ok(None)
            }
        }
    }

    fn capabilities(&self) -> Capabilities {
        self.scorer.capabilities()
            | Capabilities::graph_dependent()
            | Capabilities::solution_observing()
    }

    fn set_graph_generator(&self, generator: DynGraphGenerator<S, A>) -> Result<()> {
        if self.generator.set(Arc::clone(&generator)).is_err() {
            debug!("Graph generator already bound; keeping the first one");
        }
        self.scorer.set_graph_generator(generator)
    }

    fn observe_solution(&self, solution: &EvaluatedPath<S, A, Self::Score>) {
        if let Some(score) = solution.score {
            self.record(&solution.path, score);
        }
        self.scorer.observe_solution(solution);
    }

    fn cancel(&self) {
        self.scorer.cancel()
    }
}

#[cfg(test)]
#[path = "random_completion_tests.rs"]
mod tests;
