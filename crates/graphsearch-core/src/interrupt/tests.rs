//! Tests for the interrupt registry and bounded computations.

use super::*;
use crate::error::SearchError;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Generous slack for scheduler latency on loaded CI machines.
const EPSILON: Duration = Duration::from_millis(500);

fn sleep_cooperatively(token: &CancelToken, total: Duration) -> Result<(), WorkError> {
    let start = Instant::now();
    while start.elapsed() < total {
        token.check()?;
        thread::sleep(Duration::from_millis(1));
    }
    Ok(())
}

fn setup() -> (Arc<InterruptRegistry>, BoundedComputer) {
    let registry = Arc::new(InterruptRegistry::new());
    let computer = BoundedComputer::new(&registry, "test");
    (registry, computer)
}

#[test]
fn test_compute_returns_value_before_deadline() {
    let (registry, computer) = setup();

    let value = computer
        .compute(Duration::from_millis(200), "fast", |_| Ok(7))
        .unwrap();

    assert_eq!(value, 7);
    assert_eq!(registry.scheduled_count(), 0);

    // The disarmed deadline must never be delivered later.
    thread::sleep(Duration::from_millis(300));
    let worker = registry.current_worker();
    assert!(!worker.is_interrupted());
    assert!(!registry.has_pending(&worker));
}

#[test]
fn test_compute_times_out_within_deadline() {
    let (registry, computer) = setup();
    let deadline = Duration::from_millis(50);

    let start = Instant::now();
    let result = computer.compute(deadline, "slow", |token| {
        sleep_cooperatively(token, Duration::from_secs(10))
    });
    let elapsed = start.elapsed();

    match result {
        Err(SearchError::Timeout { budget, .. }) => assert_eq!(budget, deadline),
        other => panic!("expected timeout, got {:?}", other),
    }
    assert!(elapsed >= deadline);
    assert!(elapsed < deadline + EPSILON, "took {:?}", elapsed);

    let worker = registry.current_worker();
    assert!(!worker.is_interrupted());
    assert!(!registry.has_pending(&worker));
}

#[test]
fn test_compute_detached_abandons_uncooperative_work() {
    let (registry, computer) = setup();
    let deadline = Duration::from_millis(50);

    let start = Instant::now();
    let result = computer.compute_detached(deadline, "sleepy", || {
        thread::sleep(Duration::from_secs(2));
        Ok(1)
    });

    assert!(matches!(result, Err(SearchError::Timeout { .. })));
    assert!(start.elapsed() < deadline + EPSILON);
    assert!(!registry.current_worker().is_interrupted());
}

#[test]
fn test_compute_detached_returns_value() {
    let (_registry, computer) = setup();

    let value = computer
        .compute_detached(Duration::from_secs(5), "quick", || Ok("done"))
        .unwrap();

    assert_eq!(value, "done");
}

#[test]
fn test_compute_detached_reports_panic_as_failure() {
    let (_registry, computer) = setup();

    let result: crate::Result<u32> =
        computer.compute_detached(Duration::from_secs(5), "panics", || {
            panic!("evaluator bug");
        });

    assert!(matches!(result, Err(SearchError::Computation(_))));
}

#[test]
fn test_foreign_interrupt_is_canceled_not_timeout() {
    let (registry, computer) = setup();
    let worker = registry.current_worker();

    let remote_registry = Arc::clone(&registry);
    let remote_worker = worker.clone();
    let interrupter = thread::spawn(move || {
        thread::sleep(Duration::from_millis(30));
        remote_registry.interrupt(&remote_worker, "user abort")
    });

    let result = computer.compute(Duration::from_secs(5), "long", |token| {
        sleep_cooperatively(token, Duration::from_secs(10))
    });
    let sent = interrupter.join().unwrap();

    let interruption = match result {
        Err(SearchError::Canceled(interruption)) => interruption,
        other => panic!("expected cancellation, got {:?}", other),
    };
    assert_eq!(interruption.description(), "user abort");
    assert_eq!(interruption.id(), sent.id());

    // The foreign reason stays pending until its owner handles it.
    assert!(worker.is_interrupted());
    assert!(registry.dismiss(&interruption));
    assert!(!worker.is_interrupted());
    assert!(!registry.dismiss(&interruption));
}

#[test]
fn test_failure_is_wrapped_as_computation_error() {
    let (_registry, computer) = setup();

    let result: crate::Result<()> = computer.compute(Duration::from_secs(1), "failing", |_| {
        Err(WorkError::Failed("boom".to_string()))
    });

    match result {
        Err(SearchError::Computation(msg)) => assert_eq!(msg, "boom"),
        other => panic!("expected computation error, got {:?}", other),
    }
}

#[test]
fn test_deadline_fired_during_completion_is_benign() {
    let (registry, computer) = setup();

    // The work ignores its token and outlives the deadline.
    let value = computer
        .compute(Duration::from_millis(10), "racy", |_| {
            thread::sleep(Duration::from_millis(60));
            Ok(3)
        })
        .unwrap();
    assert_eq!(value, 3);

    let worker = registry.current_worker();
    assert!(!worker.is_interrupted());
    assert!(!registry.has_pending(&worker));

    let next = computer
        .compute(Duration::from_secs(1), "after race", |token| {
            token.check()?;
            Ok(4)
        })
        .unwrap();
    assert_eq!(next, 4);
}

#[test]
fn test_nested_inner_timeout_does_not_affect_outer() {
    let (_registry, computer) = setup();
    let inner = computer.clone();

    let inner_timed_out = computer
        .compute(Duration::from_secs(5), "outer", move |_| {
            let result = inner.compute(Duration::from_millis(30), "inner", |token| {
                sleep_cooperatively(token, Duration::from_secs(10))
            });
            Ok(matches!(result, Err(SearchError::Timeout { .. })))
        })
        .unwrap();

    assert!(inner_timed_out);
}

#[test]
fn test_outer_deadline_surfaces_through_inner_computation() {
    let (registry, computer) = setup();
    let inner = computer.clone();

    let result: crate::Result<()> = computer.compute(Duration::from_millis(40), "outer", move |_| {
        inner.compute(Duration::from_secs(5), "inner", |token| {
            sleep_cooperatively(token, Duration::from_secs(10))
        })?;
        Ok(())
    });

    assert!(matches!(result, Err(SearchError::Timeout { .. })));
    assert!(!registry.current_worker().is_interrupted());
}

#[test]
fn test_closed_submitter_rejects_computations() {
    let (registry, computer) = setup();
    computer.close();

    let result = computer.compute(Duration::from_secs(1), "late", |_| Ok(()));

    assert!(matches!(result, Err(SearchError::IllegalState(_))));
    assert!(!registry.has_pending(&registry.current_worker()));
}

#[test]
fn test_submitter_close_disarms_outstanding_timers() {
    let registry = InterruptRegistry::new();
    let submitter = registry.submitter("owner");
    let worker = registry.register_worker();
    let reason = registry.register_reason(&worker, "deadline");

    submitter
        .schedule(&worker, Duration::from_secs(60), &reason)
        .unwrap();
    assert_eq!(registry.scheduled_count(), 1);
    assert_eq!(registry.open_submitter_count(), 1);

    submitter.close();
    assert!(submitter.is_closed());
    assert_eq!(registry.scheduled_count(), 0);
    assert_eq!(registry.open_submitter_count(), 0);
    assert!(matches!(
        submitter.schedule(&worker, Duration::from_secs(60), &reason),
        Err(SearchError::IllegalState(_))
    ));
}

#[test]
fn test_scheduled_interrupt_is_delivered() {
    let registry = InterruptRegistry::new();
    let submitter = registry.submitter("owner");
    let worker = registry.register_worker();
    let reason = registry.register_reason(&worker, "deadline");

    submitter
        .schedule(&worker, Duration::from_millis(10), &reason)
        .unwrap();

    let start = Instant::now();
    while !worker.is_interrupted() && start.elapsed() < EPSILON {
        thread::sleep(Duration::from_millis(1));
    }
    assert!(worker.is_interrupted());
    assert_eq!(registry.delivered_reasons(&worker), vec![reason.clone()]);

    assert!(registry.dismiss(&reason));
    assert!(!worker.is_interrupted());
}

#[test]
fn test_cancelled_timer_is_never_delivered() {
    let registry = InterruptRegistry::new();
    let submitter = registry.submitter("owner");
    let worker = registry.register_worker();
    let reason = registry.register_reason(&worker, "deadline");

    let entry = submitter
        .schedule(&worker, Duration::from_millis(20), &reason)
        .unwrap();
    assert!(submitter.cancel(entry));
    assert!(!submitter.cancel(entry));

    thread::sleep(Duration::from_millis(80));
    assert!(!worker.is_interrupted());
    assert_eq!(registry.pending_reasons(&worker), vec![reason]);
}

#[test]
fn test_flag_stays_raised_while_other_reasons_pending() {
    let registry = InterruptRegistry::new();
    let worker = registry.register_worker();

    let first = registry.interrupt(&worker, "first");
    let second = registry.interrupt(&worker, "second");
    assert!(worker.is_interrupted());

    registry.dismiss(&first);
    assert!(worker.is_interrupted());
    registry.dismiss(&second);
    assert!(!worker.is_interrupted());
}

#[test]
fn test_current_worker_is_per_thread() {
    let registry = Arc::new(InterruptRegistry::new());
    let here = registry.current_worker();
    assert_eq!(here.id(), registry.current_worker().id());

    let remote = Arc::clone(&registry);
    let there = thread::spawn(move || remote.current_worker().id())
        .join()
        .unwrap();
    assert_ne!(here.id(), there);
}

#[test]
fn test_many_computations_reuse_one_worker() {
    let (registry, computer) = setup();

    for i in 0..100 {
        let deadline = if i % 2 == 0 {
            Duration::from_secs(1)
        } else {
            Duration::from_millis(1)
        };
        let _ = computer.compute(deadline, "repeat", |token| {
            sleep_cooperatively(token, Duration::from_millis(3))
        });
    }

    assert_eq!(registry.worker_count(), 1);
    assert_eq!(registry.scheduled_count(), 0);
    let worker = registry.current_worker();
    assert!(!worker.is_interrupted());
    assert!(!registry.has_pending(&worker));
}

#[test]
fn test_exited_threads_release_their_workers() {
    let (registry, computer) = setup();

    for _ in 0..20 {
        let computer = computer.clone();
        thread::spawn(move || {
            let quick = computer.compute(Duration::from_secs(1), "quick", |_| Ok(1));
            assert_eq!(quick.unwrap(), 1);
            let slow = computer.compute_detached(Duration::from_millis(5), "slow", || {
                thread::sleep(Duration::from_millis(50));
                Ok(())
            });
            assert!(matches!(slow, Err(SearchError::Timeout { .. })));
        })
        .join()
        .unwrap();
    }

    assert_eq!(registry.worker_count(), 0);
    assert_eq!(registry.scheduled_count(), 0);
}

#[test]
fn test_bound_worker_replaces_thread_worker() {
    let (registry, computer) = setup();
    let thread_worker = registry.current_worker();
    let owned = registry.register_worker();

    let remote = Arc::clone(&registry);
    let target = owned.clone();
    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        remote.interrupt(&target, "owner canceled")
    });
    let result = {
        let _bound = registry.bind(&owned);
        assert_eq!(registry.current_worker().id(), owned.id());
        computer.compute(Duration::from_secs(5), "bound", |token| {
            sleep_cooperatively(token, Duration::from_secs(10))
        })
    };
    let interruption = canceller.join().unwrap();

    match result {
        Err(SearchError::Canceled(i)) => assert_eq!(i.id(), interruption.id()),
        other => panic!("expected cancellation, got {:?}", other),
    }
    assert_eq!(registry.current_worker().id(), thread_worker.id());
    assert!(!thread_worker.is_interrupted());

    registry.unregister_worker(&owned);
    assert!(!owned.is_interrupted());
    assert_eq!(registry.worker_count(), 1);
}

#[test]
fn test_shutdown_rejects_new_deadlines() {
    let (registry, computer) = setup();
    computer
        .compute(Duration::from_millis(100), "warm up", |_| Ok(()))
        .unwrap();

    registry.shutdown();

    assert!(registry.is_shut_down());
    assert_eq!(registry.open_submitter_count(), 0);
    let result = computer.compute(Duration::from_secs(1), "late", |_| Ok(()));
    assert!(matches!(result, Err(SearchError::IllegalState(_))));
}

#[test]
fn test_concurrent_computations_are_attributed_per_worker() {
    let (_registry, computer) = setup();

    let outcomes: Vec<bool> = thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let computer = computer.clone();
                s.spawn(move || {
                    let work = if i % 2 == 0 {
                        Duration::from_millis(1)
                    } else {
                        Duration::from_secs(10)
                    };
                    let result = computer.compute(Duration::from_millis(50), "mixed", |token| {
                        sleep_cooperatively(token, work)
                    });
                    match result {
                        Ok(()) => true,
                        Err(SearchError::Timeout { .. }) => false,
                        Err(other) => panic!("unexpected error: {:?}", other),
                    }
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for (i, completed) in outcomes.into_iter().enumerate() {
        assert_eq!(completed, i % 2 == 0, "thread {}", i);
    }
}

#[test]
fn test_work_error_conversions() {
    let canceled = SearchError::Canceled(Interruption::unattributed("stop"));
    assert_eq!(WorkError::from(canceled), WorkError::Interrupted);
    assert_eq!(
        WorkError::from(SearchError::Generator("bad".to_string())),
        WorkError::Failed("Graph generator error: bad".to_string())
    );
    assert!(matches!(
        SearchError::from(WorkError::Failed("x".to_string())),
        SearchError::Computation(_)
    ));
}

#[test]
fn test_unattributed_interruption_display() {
    let interruption = Interruption::unattributed("external stop");
    assert_eq!(interruption.id(), ReasonId::UNATTRIBUTED);
    assert_eq!(interruption.worker(), None);
    assert_eq!(interruption.to_string(), "external stop");
}
