//! Deadline-bounded computations.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel::{self, RecvTimeoutError};
use thiserror::Error;
use tracing::{debug, trace};

use super::registry::{
    CancelToken, Conclusion, InterruptRegistry, Interruption, TimerSubmitter, Worker,
};
use crate::error::{Result, SearchError};

/// How often a waiting caller polls its token while detached work runs.
const DETACHED_POLL: Duration = Duration::from_millis(2);

/// Failure reported by the work handed to a [`BoundedComputer`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkError {
    /// The work observed its worker's cancel token and stopped.
    #[error("interrupted")]
    Interrupted,

    /// The work failed for any other reason.
    #[error("{0}")]
    Failed(String),
}

impl From<SearchError> for WorkError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Canceled(_) | SearchError::Timeout { .. } => WorkError::Interrupted,
            other => WorkError::Failed(other.to_string()),
        }
    }
}

impl From<WorkError> for SearchError {
    fn from(err: WorkError) -> Self {
        match err {
            WorkError::Interrupted => {
                SearchError::Canceled(Interruption::unattributed("interrupted"))
            }
            WorkError::Failed(msg) => SearchError::Computation(msg),
        }
    }
}

/// Runs computations under a wall-clock deadline.
///
/// Each call registers a fresh reason for the calling thread's worker, arms
/// it on the shared scheduler, and disarms it on return. When the work comes
/// back interrupted, the registry decides whether that was this call's own
/// deadline ([`SearchError::Timeout`]) or somebody else's cancellation
/// ([`SearchError::Canceled`]); the foreign reason is left pending for its
/// owner to handle.
#[derive(Debug, Clone)]
pub struct BoundedComputer {
    registry: Arc<InterruptRegistry>,
    submitter: Arc<TimerSubmitter>,
}

impl BoundedComputer {
    pub fn new(registry: &Arc<InterruptRegistry>, owner: impl Into<String>) -> Self {
        Self {
            registry: Arc::clone(registry),
            submitter: Arc::new(registry.submitter(owner)),
        }
    }

    pub fn registry(&self) -> &Arc<InterruptRegistry> {
        &self.registry
    }

    pub fn owner(&self) -> &str {
        self.submitter.owner()
    }

    /// Closes the underlying submitter; later computations fail.
    pub fn close(&self) {
        self.submitter.close();
    }

    /// Runs `work` on the calling thread, interrupting it after `deadline`.
    ///
    /// `work` must poll the token it receives and return
    /// [`WorkError::Interrupted`] once it is canceled.
    pub fn compute<T, F>(&self, deadline: Duration, reason: &str, work: F) -> Result<T>
    where
        F: FnOnce(&CancelToken) -> std::result::Result<T, WorkError>,
    {
        self.run_bounded(deadline, reason, |worker| work(&worker.token()))
    }

    /// Runs `work` on a detached thread and waits for it under `deadline`.
    ///
    /// Use this for work that cannot poll a token. If the caller is
    /// interrupted first, the thread is abandoned: it runs to completion in
    /// the background and its result is dropped.
    pub fn compute_detached<T, F>(&self, deadline: Duration, reason: &str, work: F) -> Result<T>
    where
        F: FnOnce() -> std::result::Result<T, WorkError> + Send + 'static,
        T: Send + 'static,
    {
        let name = format!("{}-detached", self.owner());
        self.run_bounded(deadline, reason, move |worker| {
            let token = worker.token();
            let (tx, rx) = channel::bounded(1);
            thread::Builder::new()
                .name(name)
                .spawn(move || {
                    let _ = tx.send(work());
                })
                .map_err(|e| WorkError::Failed(format!("failed to spawn detached worker: {e}")))?;

            loop {
                if token.is_canceled() {
                    trace!(worker = ?worker.id(), "Abandoning detached computation");
                    return Err(WorkError::Interrupted);
                }
                match rx.recv_timeout(DETACHED_POLL) {
                    Ok(result) => return result,
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => {
                        return Err(WorkError::Failed(
                            "detached computation panicked".to_string(),
                        ))
                    }
                }
            }
        })
    }

    fn run_bounded<T>(
        &self,
        deadline: Duration,
        reason: &str,
        run: impl FnOnce(&Worker) -> std::result::Result<T, WorkError>,
    ) -> Result<T> {
        let worker = self.registry.current_worker();
        let own = self.registry.register_reason(&worker, reason);
        let timer = match self.submitter.schedule(&worker, deadline, &own) {
            Ok(timer) => timer,
            Err(e) => {
                self.registry.withdraw(&own);
                return Err(e);
            }
        };

        let start = Instant::now();
        let outcome = run(&worker);
        let elapsed = start.elapsed();
        let interrupted = matches!(outcome, Err(WorkError::Interrupted));

        match self.registry.conclude(&worker, &own, timer, interrupted) {
            Conclusion::OwnDeadline => {
                let overrun = elapsed.saturating_sub(deadline);
                debug!(
                    event = "deadline_exceeded",
                    owner = self.owner(),
                    reason,
                    budget_ms = deadline.as_millis() as u64,
                    overrun_ms = overrun.as_millis() as u64,
                );
                Err(SearchError::Timeout {
                    budget: deadline,
                    overrun,
                })
            }
            Conclusion::Foreign(interruption) => {
                trace!(owner = self.owner(), reason, cause = %interruption, "Computation canceled");
                Err(SearchError::Canceled(interruption))
            }
            Conclusion::Completed => outcome.map_err(SearchError::from),
        }
    }
}
