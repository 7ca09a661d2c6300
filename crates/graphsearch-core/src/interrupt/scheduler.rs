//! Background thread delivering deadline interrupts.

use std::cmp::Ordering;
use std::io;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use tracing::debug;

use super::registry::{RegistryState, TimerEntry};

/// Lock, condition variable and thread handle shared with the scheduler.
pub(super) struct Shared {
    state: Mutex<RegistryState>,
    pub(super) wakeup: Condvar,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl Shared {
    pub(super) fn new(state: RegistryState) -> Self {
        Self {
            state: Mutex::new(state),
            wakeup: Condvar::new(),
            thread: Mutex::new(None),
        }
    }

    pub(super) fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Heap entry ordered by due time, then by arming order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct QueuedTimer {
    pub(super) due: Instant,
    pub(super) entry: TimerEntry,
}

impl Ord for QueuedTimer {
    fn cmp(&self, other: &Self) -> Ordering {
        self.due
            .cmp(&other.due)
            .then_with(|| self.entry.cmp(&other.entry))
    }
}

impl PartialOrd for QueuedTimer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

pub(super) fn spawn(shared: &Arc<Shared>) -> io::Result<()> {
    let worker_shared = Arc::clone(shared);
    let handle = thread::Builder::new()
        .name("graphsearch-interrupts".to_string())
        .spawn(move || run(&worker_shared))?;
    *shared.thread.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
    debug!(event = "scheduler_start");
    Ok(())
}

/// Waits for the scheduler thread after shutdown was requested.
pub(super) fn join(shared: &Shared) {
    let handle = shared
        .thread
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take();
    if let Some(handle) = handle {
        if handle.thread().id() != thread::current().id() {
            let _ = handle.join();
        }
    }
}

fn run(shared: &Shared) {
    let mut state = shared.lock();
    loop {
        if state.shutdown {
            break;
        }
        let now = Instant::now();
        let next_due = state.queue.peek().map(|t| t.0.due);
        match next_due {
            None => {
                state = shared
                    .wakeup
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
            }
            Some(due) if due <= now => {
                if let Some(timer) = state.queue.pop() {
                    state.fire(timer.0.entry);
                }
            }
            Some(due) => {
                state = shared
                    .wakeup
                    .wait_timeout(state, due - now)
                    .map(|(guard, _)| guard)
                    .unwrap_or_else(|e| e.into_inner().0);
            }
        }
    }
    state.scheduler_running = false;
    debug!(event = "scheduler_stop");
}
