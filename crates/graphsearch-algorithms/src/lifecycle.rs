//! Algorithm lifecycle: state machine, cancellation and algorithm timeout.
//!
//! Every algorithm owns one [`Lifecycle`]. It moves `Created → Active` on
//! the first step and `Active → Inactive` when the frontier is exhausted, a
//! termination condition fires, the algorithm is canceled or its timeout
//! expires. Stepping an inactive algorithm is an error.
//!
//! Cancellation goes through the interrupt registry. Every lifecycle owns a
//! worker of its own, which [`Lifecycle::bind`] makes the stepping thread's
//! current worker for the duration of one step. [`CancelHandle::cancel`]
//! interrupts that worker, so bounded evaluations in flight return
//! `Canceled` instead of running to the end, while other algorithms stepped
//! on the same thread are unaffected.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use graphsearch_core::{
    InterruptRegistry, Interruption, Result, SearchError, TimerEntry, TimerSubmitter, Worker,
    WorkerBinding,
};
use tracing::{debug, info};

use crate::scope::SearchScope;
use crate::termination::{OrTermination, Termination};

/// Externally visible algorithm state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlgorithmState {
    /// Constructed, never stepped.
    Created,
    /// Stepping.
    Active,
    /// Finished; further steps fail.
    Inactive,
}

/// Why an algorithm became inactive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FinishReason {
    /// Nothing left to explore.
    Exhausted,
    /// A termination condition fired.
    Terminated,
    Canceled,
    TimedOut,
    /// A non-local error aborted the search.
    Failed,
}

impl FinishReason {
    pub fn from_error(error: &SearchError) -> Self {
        match error {
            SearchError::Timeout { .. } => FinishReason::TimedOut,
            SearchError::Canceled(_) => FinishReason::Canceled,
            _ => FinishReason::Failed,
        }
    }
}

/// What the algorithm should do with the step it is starting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepGate {
    /// First step: build the root.
    Initialize,
    Continue,
    /// A termination condition fired; the algorithm should finish.
    Terminated,
}

#[derive(Debug, Default)]
struct ControlState {
    reasons: Vec<Interruption>,
    finished: bool,
}

#[derive(Debug)]
struct Control {
    canceled: AtomicBool,
    registry: Arc<InterruptRegistry>,
    /// Unregistered once the lifecycle finishes.
    worker: Worker,
    inner: Mutex<ControlState>,
}

impl Control {
    fn lock(&self) -> MutexGuard<'_, ControlState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Thread-safe handle that cancels one algorithm.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    control: Arc<Control>,
}

impl CancelHandle {
    /// Requests cancellation. Idempotent and callable from any thread.
    ///
    /// Unless the algorithm already finished, its worker is interrupted so
    /// that an in-flight bounded evaluation stops at once.
    pub fn cancel(&self) {
        if self.control.canceled.swap(true, Ordering::SeqCst) {
            return;
        }
        let mut inner = self.control.lock();
        if inner.finished {
            return;
        }
        let interruption = self
            .control
            .registry
            .interrupt(&self.control.worker, "algorithm canceled");
        inner.reasons.push(interruption);
        info!(event = "cancel_requested", worker = ?self.control.worker.id());
    }

    pub fn is_canceled(&self) -> bool {
        self.control.canceled.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
struct Deadline {
    reason: Interruption,
    entry: TimerEntry,
}

/// State machine, cancel flag, timeout and termination of one algorithm.
#[derive(Debug)]
pub struct Lifecycle {
    name: &'static str,
    state: AlgorithmState,
    registry: Arc<InterruptRegistry>,
    control: Arc<Control>,
    submitter: TimerSubmitter,
    timeout: Option<Duration>,
    deadline: Option<Deadline>,
    termination: Option<Box<dyn Termination>>,
}

impl Lifecycle {
    pub fn new(name: &'static str, registry: Arc<InterruptRegistry>) -> Self {
        let submitter = registry.submitter(format!("{name}-lifecycle"));
        Self {
            name,
            state: AlgorithmState::Created,
            control: Arc::new(Control {
                canceled: AtomicBool::new(false),
                registry: Arc::clone(&registry),
                worker: registry.register_worker(),
                inner: Mutex::new(ControlState::default()),
            }),
            registry,
            submitter,
            timeout: None,
            deadline: None,
            termination: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn state(&self) -> AlgorithmState {
        self.state
    }

    pub fn registry(&self) -> &Arc<InterruptRegistry> {
        &self.registry
    }

    /// The worker cancellations and deadlines of this algorithm target.
    pub fn worker(&self) -> &Worker {
        &self.control.worker
    }

    /// Makes this algorithm's worker the calling thread's current worker
    /// until the guard is dropped. Held for the whole of every step.
    pub fn bind(&self) -> WorkerBinding {
        self.registry.bind(&self.control.worker)
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            control: Arc::clone(&self.control),
        }
    }

    pub fn is_canceled(&self) -> bool {
        self.control.canceled.load(Ordering::SeqCst)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Sets the algorithm-level time budget, measured from activation.
    ///
    /// On an active algorithm the deadline is re-armed right away.
    pub fn set_timeout(&mut self, timeout: Duration, scope: &SearchScope) -> Result<()> {
        self.timeout = Some(timeout);
        if self.state != AlgorithmState::Active {
            return Ok(());
        }
        self.arm_deadline(scope)
    }

    /// Adds a termination condition; several conditions combine with OR.
    pub fn add_termination(&mut self, termination: Box<dyn Termination>) {
        self.termination = Some(match self.termination.take() {
            Some(existing) => Box::new(OrTermination::new((existing, termination))),
            None => termination,
        });
    }

    /// Gatekeeper called at the start of every step.
    ///
    /// Activates a fresh algorithm, arms its deadline, and reports
    /// cancellation, timeout or termination.
    pub fn begin_step(&mut self, scope: &mut SearchScope) -> Result<StepGate> {
        let gate = match self.state {
            AlgorithmState::Inactive => {
                return Err(SearchError::IllegalState(format!(
                    "{} is inactive and cannot be stepped",
                    self.name
                )))
            }
            AlgorithmState::Created => {
                self.state = AlgorithmState::Active;
                scope.start();
                info!(event = "algorithm_started", algorithm = self.name, seed = scope.seed());
                StepGate::Initialize
            }
            AlgorithmState::Active => StepGate::Continue,
        };

        if gate == StepGate::Initialize && self.timeout.is_some() {
            self.arm_deadline(scope)?;
        }
        self.check(scope)?;
        if gate == StepGate::Continue
            && self
                .termination
                .as_ref()
                .is_some_and(|t| t.is_terminated(scope))
        {
            debug!(
                event = "termination_reached",
                algorithm = self.name,
                steps = scope.step_count()
            );
            return Ok(StepGate::Terminated);
        }
        scope.increment_step_count();
        Ok(gate)
    }

    /// Fails with `Canceled` or `Timeout` once the run must stop.
    ///
    /// Algorithms call this at their safe points between evaluations.
    pub fn check(&self, scope: &SearchScope) -> Result<()> {
        if self.is_canceled() {
            return Err(SearchError::Canceled(self.cancel_reason()));
        }
        if let (Some(timeout), Some(elapsed)) = (self.timeout, scope.elapsed()) {
            if elapsed >= timeout {
                return Err(self.timeout_error(timeout, elapsed));
            }
        }
        let worker = &self.control.worker;
        if worker.is_interrupted() {
            let delivered = self.registry.delivered_reasons(worker);
            if let Some(foreign) = delivered.into_iter().find(|i| !self.is_own_deadline(i)) {
                return Err(SearchError::Canceled(foreign));
            }
        }
        Ok(())
    }

    /// Attributes an error raised while stepping.
    ///
    /// A cancellation caused by this lifecycle's own deadline becomes
    /// `Timeout`; everything else passes through.
    pub fn classify(&self, error: SearchError, scope: &SearchScope) -> SearchError {
        match error {
            SearchError::Canceled(ref interruption) if self.is_own_deadline(interruption) => {
                match self.timeout {
                    Some(timeout) => {
                        self.timeout_error(timeout, scope.elapsed().unwrap_or(timeout))
                    }
                    None => error,
                }
            }
            other => other,
        }
    }

    /// Makes the algorithm inactive and releases everything it holds in the
    /// registry. Idempotent.
    pub fn finish(&mut self, reason: FinishReason) {
        if self.state == AlgorithmState::Inactive {
            return;
        }
        self.state = AlgorithmState::Inactive;
        self.release();
        info!(event = "algorithm_finished", algorithm = self.name, reason = ?reason);
    }

    fn release(&mut self) {
        self.disarm_deadline();
        self.submitter.close();
        let mut inner = self.control.lock();
        if inner.finished {
            return;
        }
        inner.finished = true;
        inner.reasons.clear();
        // Drops every reason still recorded against the worker.
        self.registry.unregister_worker(&self.control.worker);
    }

    fn arm_deadline(&mut self, scope: &SearchScope) -> Result<()> {
        self.disarm_deadline();
        let Some(timeout) = self.timeout else {
            return Ok(());
        };
        let remaining = timeout.saturating_sub(scope.elapsed().unwrap_or_default());
        let worker = &self.control.worker;
        let reason = self
            .registry
            .register_reason(worker, &format!("{} timeout", self.name));
        match self.submitter.schedule(worker, remaining, &reason) {
            Ok(entry) => {
                debug!(
                    event = "deadline_armed",
                    algorithm = self.name,
                    remaining_ms = remaining.as_millis() as u64
                );
                self.deadline = Some(Deadline { reason, entry });
                Ok(())
            }
            Err(e) => {
                self.registry.dismiss(&reason);
                Err(e)
            }
        }
    }

    fn disarm_deadline(&mut self) {
        if let Some(deadline) = self.deadline.take() {
            self.submitter.cancel(deadline.entry);
            self.registry.dismiss(&deadline.reason);
        }
    }

    fn is_own_deadline(&self, interruption: &Interruption) -> bool {
        self.deadline
            .as_ref()
            .is_some_and(|d| d.reason.id() == interruption.id())
    }

    fn cancel_reason(&self) -> Interruption {
        self.control
            .lock()
            .reasons
            .first()
            .cloned()
            .unwrap_or_else(|| Interruption::unattributed("algorithm canceled"))
    }

    fn timeout_error(&self, timeout: Duration, elapsed: Duration) -> SearchError {
        SearchError::Timeout {
            budget: timeout,
            overrun: elapsed.saturating_sub(timeout),
        }
    }
}

impl Drop for Lifecycle {
    fn drop(&mut self) {
        self.release();
    }
}
