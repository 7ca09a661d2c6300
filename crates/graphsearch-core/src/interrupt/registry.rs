//! Worker bookkeeping, interruption reasons and timer submitters.

use std::cell::RefCell;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, MutexGuard, Weak};
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use super::bounded::WorkError;
use super::scheduler::{self, QueuedTimer, Shared};
use crate::error::{Result, SearchError};

/// Identifier of a worker known to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkerId(u64);

/// Identifier of one cancellation reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReasonId(u64);

impl ReasonId {
    /// Id shared by interruptions that were never registered.
    pub const UNATTRIBUTED: ReasonId = ReasonId(0);
}

/// Handle to one armed deadline, used to disarm it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerEntry(u64);

/// An opaque cancellation reason registered against a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interruption {
    id: ReasonId,
    worker: Option<WorkerId>,
    description: Arc<str>,
}

impl Interruption {
    /// Creates an interruption that is not tracked by any registry.
    pub fn unattributed(description: impl Into<String>) -> Self {
        Self {
            id: ReasonId::UNATTRIBUTED,
            worker: None,
            description: Arc::from(description.into()),
        }
    }

    pub fn id(&self) -> ReasonId {
        self.id
    }

    pub fn worker(&self) -> Option<WorkerId> {
        self.worker
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Display for Interruption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.worker {
            Some(worker) => write!(
                f,
                "{} (reason {} on worker {})",
                self.description, self.id.0, worker.0
            ),
            None => write!(f, "{}", self.description),
        }
    }
}

/// A thread of control that can receive interrupts.
///
/// Cloning yields another handle to the same worker.
#[derive(Debug, Clone)]
pub struct Worker {
    id: WorkerId,
    flag: Arc<AtomicBool>,
}

impl Worker {
    pub fn id(&self) -> WorkerId {
        self.id
    }

    /// Returns true while at least one delivered interruption is unresolved.
    pub fn is_interrupted(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Returns a token that observes this worker's pending flag.
    pub fn token(&self) -> CancelToken {
        CancelToken {
            flag: Arc::clone(&self.flag),
        }
    }
}

/// Read-only view of a worker's pending-cancellation flag.
#[derive(Debug, Clone)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn is_canceled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Returns `Err(WorkError::Interrupted)` once the worker was interrupted.
    ///
    /// Long-running work calls this at its safe points.
    pub fn check(&self) -> std::result::Result<(), WorkError> {
        if self.is_canceled() {
            Err(WorkError::Interrupted)
        } else {
            Ok(())
        }
    }
}

thread_local! {
    /// Workers bound to this thread by [`InterruptRegistry::bind`], innermost last.
    static BINDINGS: RefCell<Vec<(*const Shared, Worker)>> = const { RefCell::new(Vec::new()) };

    /// Implicit per-thread workers, unregistered when the thread exits.
    static THREAD_WORKERS: RefCell<Vec<ThreadWorker>> = const { RefCell::new(Vec::new()) };
}

struct ThreadWorker {
    shared: Weak<Shared>,
    worker: Worker,
}

impl Drop for ThreadWorker {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.lock().forget(self.worker.id);
        }
    }
}

struct PendingReason {
    interruption: Interruption,
    fired: bool,
}

struct WorkerEntry {
    flag: Arc<AtomicBool>,
    pending: Vec<PendingReason>,
}

impl WorkerEntry {
    fn new(flag: Arc<AtomicBool>) -> Self {
        Self {
            flag,
            pending: Vec::new(),
        }
    }
}

struct SubmitterEntry {
    open: bool,
}

struct ScheduledInterrupt {
    submitter: u64,
    worker: WorkerId,
    reason: ReasonId,
}

/// Everything guarded by the registry lock.
pub(super) struct RegistryState {
    next_id: u64,
    workers: HashMap<WorkerId, WorkerEntry>,
    submitters: HashMap<u64, SubmitterEntry>,
    pub(super) queue: BinaryHeap<Reverse<QueuedTimer>>,
    timers: HashMap<TimerEntry, ScheduledInterrupt>,
    pub(super) scheduler_running: bool,
    pub(super) shutdown: bool,
}

/// Outcome of a bounded computation after disambiguation.
pub(super) enum Conclusion {
    /// The computation was stopped by its own deadline.
    OwnDeadline,
    /// The computation was stopped by someone else.
    Foreign(Interruption),
    /// The computation was not interrupted.
    Completed,
}

impl RegistryState {
    pub(super) fn new() -> Self {
        Self {
            next_id: 1,
            workers: HashMap::new(),
            submitters: HashMap::new(),
            queue: BinaryHeap::new(),
            timers: HashMap::new(),
            scheduler_running: false,
            shutdown: false,
        }
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn new_worker(&mut self) -> Worker {
        let worker = Worker {
            id: WorkerId(self.next_id()),
            flag: Arc::new(AtomicBool::new(false)),
        };
        self.workers
            .insert(worker.id, WorkerEntry::new(Arc::clone(&worker.flag)));
        worker
    }

    fn forget(&mut self, worker: WorkerId) {
        if let Some(entry) = self.workers.remove(&worker) {
            entry.flag.store(false, Ordering::SeqCst);
        }
        self.timers.retain(|_, t| t.worker != worker);
    }

    fn entry(&mut self, worker: &Worker) -> &mut WorkerEntry {
        self.workers
            .entry(worker.id)
            .or_insert_with(|| WorkerEntry::new(Arc::clone(&worker.flag)))
    }

    fn add_reason(&mut self, worker: &Worker, description: String, fired: bool) -> Interruption {
        let interruption = Interruption {
            id: ReasonId(self.next_id()),
            worker: Some(worker.id),
            description: Arc::from(description),
        };
        let entry = self.entry(worker);
        entry.pending.push(PendingReason {
            interruption: interruption.clone(),
            fired,
        });
        if fired {
            entry.flag.store(true, Ordering::SeqCst);
        }
        interruption
    }

    /// Fires a due timer, if it is still armed.
    pub(super) fn fire(&mut self, entry: TimerEntry) -> bool {
        match self.timers.remove(&entry) {
            Some(scheduled) => self.deliver(scheduled.worker, scheduled.reason),
            None => false,
        }
    }

    /// Raises the worker's flag for a still-pending reason.
    fn deliver(&mut self, worker: WorkerId, reason: ReasonId) -> bool {
        let Some(entry) = self.workers.get_mut(&worker) else {
            return false;
        };
        match entry
            .pending
            .iter_mut()
            .find(|p| p.interruption.id == reason)
        {
            Some(pending) => {
                pending.fired = true;
                entry.flag.store(true, Ordering::SeqCst);
                trace!(worker = worker.0, reason = reason.0, "Interrupt delivered");
                true
            }
            None => false,
        }
    }

    /// Removes a reason and recomputes the worker's flag.
    ///
    /// This is the only place a worker's pending flag is ever lowered.
    fn resolve(&mut self, worker: WorkerId, reason: ReasonId) -> bool {
        let Some(entry) = self.workers.get_mut(&worker) else {
            return false;
        };
        let before = entry.pending.len();
        entry.pending.retain(|p| p.interruption.id != reason);
        let still_fired = entry.pending.iter().any(|p| p.fired);
        entry.flag.store(still_fired, Ordering::SeqCst);
        entry.pending.len() != before
    }

    fn disarm(&mut self, timer: TimerEntry) -> bool {
        let removed = self.timers.remove(&timer).is_some();
        if self.queue.len() > 64 && self.queue.len() > 2 * self.timers.len() {
            let live = &self.timers;
            self.queue.retain(|Reverse(t)| live.contains_key(&t.entry));
        }
        removed
    }
}

/// Process-level interrupt bookkeeping with its own scheduler thread.
///
/// Constructed explicitly and shared by handle (`Arc<InterruptRegistry>`).
/// The scheduler thread starts on the first scheduled deadline and stops
/// on [`InterruptRegistry::shutdown`] or when the registry is dropped.
pub struct InterruptRegistry {
    shared: Arc<Shared>,
}

impl fmt::Debug for InterruptRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("InterruptRegistry")
            .field("workers", &state.workers.len())
            .field("scheduled", &state.timers.len())
            .field("shutdown", &state.shutdown)
            .finish()
    }
}

impl Default for InterruptRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InterruptRegistry {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared::new(RegistryState::new())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.shared.lock()
    }

    /// Returns the worker the calling thread acts for.
    ///
    /// That is the innermost worker bound with [`InterruptRegistry::bind`],
    /// or else an implicit per-thread worker registered on first use and
    /// forgotten when the thread exits.
    pub fn current_worker(&self) -> Worker {
        let key = Arc::as_ptr(&self.shared);
        let bound = BINDINGS.with(|bindings| {
            bindings
                .borrow()
                .iter()
                .rev()
                .find(|(registry, _)| *registry == key)
                .map(|(_, worker)| worker.clone())
        });
        if let Some(worker) = bound {
            return worker;
        }

        THREAD_WORKERS.with(|workers| {
            let mut workers = workers.borrow_mut();
            workers.retain(|w| w.shared.strong_count() > 0);
            if let Some(existing) = workers.iter().find(|w| w.shared.as_ptr() == key) {
                return existing.worker.clone();
            }
            let worker = self.lock().new_worker();
            workers.push(ThreadWorker {
                shared: Arc::downgrade(&self.shared),
                worker: worker.clone(),
            });
            worker
        })
    }

    /// Registers a worker that is not bound to any thread.
    ///
    /// The owner must call [`InterruptRegistry::unregister_worker`] once the
    /// worker is no longer used.
    pub fn register_worker(&self) -> Worker {
        self.lock().new_worker()
    }

    /// Forgets a worker, every reason recorded against it and its timers.
    pub fn unregister_worker(&self, worker: &Worker) {
        self.lock().forget(worker.id);
    }

    /// Makes `worker` the calling thread's current worker until the returned
    /// guard is dropped. Bindings nest.
    pub fn bind(&self, worker: &Worker) -> WorkerBinding {
        let key = Arc::as_ptr(&self.shared);
        BINDINGS.with(|bindings| bindings.borrow_mut().push((key, worker.clone())));
        WorkerBinding {
            shared: Arc::clone(&self.shared),
            worker: worker.id,
            _not_send: PhantomData,
        }
    }

    /// Number of workers the registry currently tracks.
    pub fn worker_count(&self) -> usize {
        self.lock().workers.len()
    }

    /// Delivers an external cancellation to `worker` right away.
    pub fn interrupt(&self, worker: &Worker, description: impl Into<String>) -> Interruption {
        let interruption = self.lock().add_reason(worker, description.into(), true);
        debug!(
            event = "interrupt",
            worker = worker.id.0,
            reason = interruption.id.0,
            description = interruption.description(),
        );
        interruption
    }

    /// Resolves an interruption without anyone having handled it.
    ///
    /// Returns false if it was already resolved.
    pub fn dismiss(&self, interruption: &Interruption) -> bool {
        let Some(worker) = interruption.worker else {
            return false;
        };
        self.lock().resolve(worker, interruption.id)
    }

    /// Reasons currently in flight against `worker`, armed or delivered.
    pub fn pending_reasons(&self, worker: &Worker) -> Vec<Interruption> {
        self.lock()
            .workers
            .get(&worker.id)
            .map(|e| e.pending.iter().map(|p| p.interruption.clone()).collect())
            .unwrap_or_default()
    }

    /// Returns true if any reason is in flight against `worker`.
    pub fn has_pending(&self, worker: &Worker) -> bool {
        self.lock()
            .workers
            .get(&worker.id)
            .is_some_and(|e| !e.pending.is_empty())
    }

    /// Delivered but unresolved reasons for `worker`.
    pub fn delivered_reasons(&self, worker: &Worker) -> Vec<Interruption> {
        self.lock()
            .workers
            .get(&worker.id)
            .map(|e| {
                e.pending
                    .iter()
                    .filter(|p| p.fired)
                    .map(|p| p.interruption.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Issues a timer submitter for one logical owner.
    pub fn submitter(&self, owner: impl Into<String>) -> TimerSubmitter {
        let owner = owner.into();
        let mut state = self.lock();
        let id = state.next_id();
        let open = !state.shutdown;
        state.submitters.insert(id, SubmitterEntry { open });
        TimerSubmitter {
            id,
            owner,
            shared: Arc::clone(&self.shared),
        }
    }

    /// Number of submitters that have not been closed yet.
    pub fn open_submitter_count(&self) -> usize {
        self.lock().submitters.values().filter(|s| s.open).count()
    }

    /// Number of armed, not yet fired deadlines.
    pub fn scheduled_count(&self) -> usize {
        self.lock().timers.len()
    }

    pub fn is_shut_down(&self) -> bool {
        self.lock().shutdown
    }

    /// Stops the scheduler thread and closes every submitter.
    pub fn shutdown(&self) {
        {
            let mut state = self.lock();
            if state.shutdown {
                return;
            }
            state.shutdown = true;
            state.timers.clear();
            state.queue.clear();
            for submitter in state.submitters.values_mut() {
                submitter.open = false;
            }
        }
        self.shared.wakeup.notify_all();
        scheduler::join(&self.shared);
        debug!(event = "registry_shutdown");
    }

    /// Registers a reason that is in flight but not delivered yet.
    ///
    /// Arm it with [`TimerSubmitter::schedule`]; resolve it with
    /// [`InterruptRegistry::dismiss`] once it is no longer needed.
    pub fn register_reason(&self, worker: &Worker, description: &str) -> Interruption {
        self.lock().add_reason(worker, description.to_string(), false)
    }

    /// Resolves an interruption that was never armed.
    pub(super) fn withdraw(&self, interruption: &Interruption) {
        if let Some(worker) = interruption.worker {
            self.lock().resolve(worker, interruption.id);
        }
    }

    /// Disarms `timer` and attributes the computation's outcome, atomically.
    pub(super) fn conclude(
        &self,
        worker: &Worker,
        own: &Interruption,
        timer: TimerEntry,
        interrupted: bool,
    ) -> Conclusion {
        let mut state = self.lock();
        state.disarm(timer);

        let (own_fired, delivered) = match state.workers.get(&worker.id) {
            Some(entry) => (
                entry
                    .pending
                    .iter()
                    .any(|p| p.fired && p.interruption.id == own.id),
                entry
                    .pending
                    .iter()
                    .filter(|p| p.fired)
                    .map(|p| p.interruption.clone())
                    .collect::<Vec<_>>(),
            ),
            None => (false, Vec::new()),
        };

        if interrupted {
            if own_fired && delivered.len() == 1 && worker.is_interrupted() {
                state.resolve(worker.id, own.id);
                return Conclusion::OwnDeadline;
            }
            let foreign = delivered
                .into_iter()
                .find(|i| i.id != own.id)
                .unwrap_or_else(|| {
                    Interruption::unattributed("interrupted without a pending reason")
                });
            state.resolve(worker.id, own.id);
            return Conclusion::Foreign(foreign);
        }

        // The timer is disarmed and the reason resolved under this lock, so a
        // deadline that fired too late can no longer reach the worker.
        if own_fired {
            debug!(
                event = "benign_timeout_race",
                worker = worker.id.0,
                reason = own.id.0,
                "Deadline fired but computation completed"
            );
        }
        state.resolve(worker.id, own.id);
        Conclusion::Completed
    }
}

impl Drop for InterruptRegistry {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Guard returned by [`InterruptRegistry::bind`].
///
/// Restores the thread's previous current worker when dropped. Must be
/// dropped on the thread that created it.
#[must_use = "the binding ends when the guard is dropped"]
pub struct WorkerBinding {
    shared: Arc<Shared>,
    worker: WorkerId,
    _not_send: PhantomData<*const ()>,
}

impl fmt::Debug for WorkerBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerBinding")
            .field("worker", &self.worker)
            .finish()
    }
}

impl Drop for WorkerBinding {
    fn drop(&mut self) {
        let key = Arc::as_ptr(&self.shared);
        let worker = self.worker;
        let _ = BINDINGS.try_with(|bindings| {
            let mut bindings = bindings.borrow_mut();
            if let Some(index) = bindings
                .iter()
                .rposition(|(registry, w)| *registry == key && w.id == worker)
            {
                bindings.remove(index);
            }
        });
    }
}

/// Schedules deadline interrupts on behalf of one owner.
///
/// Closing the submitter (explicitly or by dropping it) disarms all of its
/// outstanding timers; scheduling through a closed submitter fails.
pub struct TimerSubmitter {
    id: u64,
    owner: String,
    shared: Arc<Shared>,
}

impl fmt::Debug for TimerSubmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerSubmitter")
            .field("owner", &self.owner)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl TimerSubmitter {
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Arms `reason` to be delivered to `worker` after `delay`.
    pub fn schedule(
        &self,
        worker: &Worker,
        delay: Duration,
        reason: &Interruption,
    ) -> Result<TimerEntry> {
        let mut state = self.shared.lock();
        if state.shutdown {
            return Err(SearchError::IllegalState(
                "interrupt registry has been shut down".to_string(),
            ));
        }
        match state.submitters.get(&self.id) {
            Some(entry) if entry.open => {}
            _ => {
                return Err(SearchError::IllegalState(format!(
                    "timer submitter '{}' is closed",
                    self.owner
                )))
            }
        }

        let entry = TimerEntry(state.next_id());
        state.timers.insert(
            entry,
            ScheduledInterrupt {
                submitter: self.id,
                worker: worker.id,
                reason: reason.id,
            },
        );
        // Deadlines too far out to represent never fire.
        if let Some(due) = Instant::now().checked_add(delay) {
            state.queue.push(Reverse(QueuedTimer { due, entry }));
        }
        let start_scheduler = !state.scheduler_running;
        state.scheduler_running = true;
        drop(state);

        if start_scheduler {
            if let Err(e) = scheduler::spawn(&self.shared) {
                let mut state = self.shared.lock();
                state.scheduler_running = false;
                state.disarm(entry);
                return Err(SearchError::IllegalState(format!(
                    "failed to start interrupt scheduler: {e}"
                )));
            }
        }
        self.shared.wakeup.notify_all();
        Ok(entry)
    }

    /// Disarms a timer. Returns true if it had not fired yet.
    pub fn cancel(&self, entry: TimerEntry) -> bool {
        self.shared.lock().disarm(entry)
    }

    /// Closes this submitter and disarms its outstanding timers.
    pub fn close(&self) {
        let mut state = self.shared.lock();
        if let Some(entry) = state.submitters.get_mut(&self.id) {
            entry.open = false;
        }
        let id = self.id;
        state.timers.retain(|_, t| t.submitter != id);
    }

    pub fn is_closed(&self) -> bool {
        let state = self.shared.lock();
        !state.submitters.get(&self.id).is_some_and(|s| s.open)
    }
}

impl Drop for TimerSubmitter {
    fn drop(&mut self) {
        self.close();
        self.shared.lock().submitters.remove(&self.id);
    }
}
