//! Integration tests for the single-worker pool lifecycle and task handles

use parking_lot::Mutex;
use spindle_core::{PoolState, ShutdownOutcome, SingleWorkerPool, SpindleError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

const WAIT: Duration = Duration::from_secs(10);

#[test]
fn test_tasks_run_once_in_fifo_order() {
    let pool = SingleWorkerPool::new("fifo").unwrap();
    let order = Arc::new(Mutex::new(Vec::new()));
    let running = Arc::new(AtomicUsize::new(0));
    let max_running = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..50_usize)
        .map(|i| {
            let order = Arc::clone(&order);
            let running = Arc::clone(&running);
            let max_running = Arc::clone(&max_running);
            pool.submit(move |_| {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                max_running.fetch_max(now, Ordering::SeqCst);
                order.lock().push(i);
                thread::sleep(Duration::from_micros(200));
                running.fetch_sub(1, Ordering::SeqCst);
                Ok(i)
            })
            .unwrap()
        })
        .collect();

    for (i, handle) in handles.iter().enumerate() {
        assert_eq!(handle.get(), Ok(i));
    }

    assert_eq!(*order.lock(), (0..50).collect::<Vec<_>>());
    assert_eq!(max_running.load(Ordering::SeqCst), 1);

    pool.request_shutdown();
    assert!(pool.await_termination(WAIT));

    let stats = pool.stats();
    assert_eq!(stats.submitted, 50);
    assert_eq!(stats.completed, 50);
    assert_eq!(stats.failed, 0);
}

#[test]
fn test_second_task_starts_after_first_ends() {
    let pool = SingleWorkerPool::new("ab").unwrap();

    let a = pool
        .submit(|_| {
            let start = Instant::now();
            thread::sleep(Duration::from_millis(30));
            Ok(("x".to_string(), start, Instant::now()))
        })
        .unwrap();
    let b = pool
        .submit(|_| {
            let start = Instant::now();
            Ok(("y".to_string(), start, Instant::now()))
        })
        .unwrap();

    let (a_value, _, a_end) = a.get().unwrap();
    let (b_value, b_start, _) = b.get().unwrap();

    assert_eq!(a_value, "x");
    assert_eq!(b_value, "y");
    assert!(b_start >= a_end);

    pool.shutdown_with_timeout(WAIT);
}

#[test]
fn test_handle_reads_are_idempotent() {
    let pool = SingleWorkerPool::new("idem").unwrap();
    let runs = Arc::new(AtomicUsize::new(0));

    let counted = Arc::clone(&runs);
    let ok = pool
        .submit(move |_| {
            counted.fetch_add(1, Ordering::SeqCst);
            Ok(42_u64)
        })
        .unwrap();
    let failing = pool
        .submit(|_| -> Result<u64, SpindleError> { Err(SpindleError::Failed("no luck".into())) })
        .unwrap();

    for _ in 0..3 {
        assert_eq!(ok.get(), Ok(42));
        assert_eq!(ok.wait_timeout(WAIT), Ok(42));
        assert_eq!(failing.get(), Err(SpindleError::Failed("no luck".into())));
    }
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    pool.shutdown_with_timeout(WAIT);
}

#[test]
fn test_submit_after_shutdown_rejected() {
    let pool = SingleWorkerPool::new("closed").unwrap();
    pool.request_shutdown();

    let result = pool.submit(|_| Ok("c"));
    assert_eq!(
        result.unwrap_err(),
        SpindleError::Rejected {
            pool: "closed".to_string()
        }
    );
}

#[test]
fn test_queued_tasks_drain_after_shutdown() {
    let pool = SingleWorkerPool::new("drain").unwrap();
    let (release_tx, release_rx) = mpsc::channel::<()>();

    let gate = pool
        .submit(move |_| {
            release_rx.recv().ok();
            Ok(0)
        })
        .unwrap();
    let queued: Vec<_> = (1..=3).map(|i| pool.submit(move |_| Ok(i)).unwrap()).collect();

    pool.request_shutdown();
    assert_eq!(pool.state(), PoolState::ShuttingDown);
    assert!(pool.submit(|_| Ok(99)).is_err());

    release_tx.send(()).unwrap();
    assert!(pool.await_termination(WAIT));
    assert_eq!(pool.state(), PoolState::Terminated);

    assert_eq!(gate.get(), Ok(0));
    for (i, handle) in queued.iter().enumerate() {
        assert_eq!(handle.get(), Ok(i as i32 + 1));
    }
}

#[test]
fn test_force_terminate_from_any_state() {
    // Running
    let running = SingleWorkerPool::new("force-running").unwrap();
    running.force_terminate();
    assert!(running.is_terminated());

    // ShuttingDown with a task ignoring interruption
    let shutting = SingleWorkerPool::new("force-shutting").unwrap();
    let (started_tx, started_rx) = mpsc::channel();
    let stubborn = shutting
        .submit(move |_| {
            started_tx.send(()).unwrap();
            thread::sleep(Duration::from_millis(100));
            Ok("finished anyway")
        })
        .unwrap();
    started_rx.recv().unwrap();
    shutting.request_shutdown();

    let start = Instant::now();
    shutting.force_terminate();
    assert!(shutting.is_terminated());
    assert!(start.elapsed() < Duration::from_millis(100));

    // Best-effort interruption: the task still finishes and records its value
    assert_eq!(stubborn.get(), Ok("finished anyway"));

    // Terminated
    assert!(shutting.await_termination(Duration::ZERO));
    assert_eq!(shutting.force_terminate(), 0);
    assert!(shutting.is_terminated());
}

#[test]
fn test_forced_pool_never_accepts_again() {
    let pool = SingleWorkerPool::new("no-resurrection").unwrap();
    pool.force_terminate();

    assert!(matches!(
        pool.submit(|_| Ok(())),
        Err(SpindleError::Rejected { .. })
    ));
    pool.request_shutdown();
    assert!(pool.is_terminated());
    assert!(pool.submit(|_| Ok(())).is_err());
}

#[test]
fn test_failure_surfaces_at_retrieval() {
    let pool = SingleWorkerPool::new("failing").unwrap();

    let handle = pool
        .submit(|_| -> Result<String, SpindleError> {
            Err(SpindleError::Failed("lookup failed".to_string()))
        })
        .unwrap();

    assert_eq!(
        handle.get(),
        Err(SpindleError::Failed("lookup failed".to_string()))
    );

    pool.shutdown_with_timeout(WAIT);
    assert_eq!(pool.stats().failed, 1);
}

#[test]
fn test_panicking_task_does_not_kill_worker() {
    let pool = SingleWorkerPool::new("panics").unwrap();

    let bad = pool.submit(|_| -> Result<i32, SpindleError> { panic!("kaboom") }).unwrap();
    let good = pool.submit(|ctx| Ok(ctx.name().to_string())).unwrap();

    assert_eq!(bad.get(), Err(SpindleError::Panicked("kaboom".to_string())));
    assert_eq!(good.get(), Ok("panics-thread-1".to_string()));

    pool.shutdown_with_timeout(WAIT);
}

#[test]
fn test_wait_timeout_is_not_terminal() {
    let pool = SingleWorkerPool::new("slow").unwrap();

    let handle = pool
        .submit(|_| {
            thread::sleep(Duration::from_millis(100));
            Ok("late")
        })
        .unwrap();

    assert_eq!(
        handle.wait_timeout(Duration::from_millis(5)),
        Err(SpindleError::Timeout(Duration::from_millis(5)))
    );
    assert_eq!(handle.wait_timeout(WAIT), Ok("late"));

    pool.shutdown_with_timeout(WAIT);
}

#[test]
fn test_shutdown_with_timeout_forces_stuck_pool() {
    let pool = SingleWorkerPool::new("stuck").unwrap();
    let (started_tx, started_rx) = mpsc::channel();

    let sleeper = pool
        .submit(move |ctx| {
            started_tx.send(()).unwrap();
            ctx.sleep(Duration::from_secs(60))
        })
        .unwrap();
    let queued = pool.submit(|_| Ok(())).unwrap();
    started_rx.recv().unwrap();

    let outcome = pool.shutdown_with_timeout(Duration::from_millis(20));
    assert_eq!(outcome, ShutdownOutcome::Forced { discarded: 1 });
    assert!(pool.is_terminated());

    assert_eq!(sleeper.get(), Err(SpindleError::Interrupted));
    assert_eq!(queued.get(), Err(SpindleError::Cancelled));
}

#[test]
fn test_submit_from_many_threads() {
    let pool = SingleWorkerPool::new("shared").unwrap();

    let submitters: Vec<_> = (0..4)
        .map(|t| {
            let pool = pool.clone();
            thread::spawn(move || {
                (0..25)
                    .map(|i| pool.submit(move |_| Ok(t * 100 + i)).unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut values: Vec<i32> = submitters
        .into_iter()
        .flat_map(|s| s.join().unwrap())
        .map(|h| h.get().unwrap())
        .collect();
    values.sort_unstable();

    assert_eq!(values.len(), 100);
    values.dedup();
    assert_eq!(values.len(), 100);

    assert_eq!(pool.shutdown_with_timeout(WAIT), ShutdownOutcome::Drained);
}
