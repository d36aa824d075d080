//! Integration tests for the demonstration procedures

use spindle_core::demo::{self, thread_delayed};
use spindle_core::{DemoConfig, SpindleError, Spawner, Transcript};
use std::time::Duration;

#[test]
fn test_interrupted_delayed_worker_escalates() {
    let spawner = Spawner::default();
    let transcript = Transcript::capture();

    let thread = thread_delayed(&spawner, &transcript, Duration::from_secs(30)).unwrap();
    thread.interrupt();

    let exits = spawner.join_all();
    assert_eq!(exits.len(), 1);
    assert_eq!(exits[0].name, thread.name());
    assert_eq!(exits[0].outcome, Err(SpindleError::Interrupted));

    assert!(transcript.contains("End of Code"));
    assert!(!transcript.contains("after timeout"));
}

#[test]
fn test_run_all_sequence() {
    let spawner = Spawner::default();
    let transcript = Transcript::capture();
    let config = DemoConfig {
        delay: Duration::from_millis(20),
        termination_wait: Duration::from_secs(10),
    };

    demo::run_all(&config, &spawner, &transcript).unwrap();

    let exits = spawner.join_all();
    assert_eq!(exits.len(), 2);
    assert!(exits.iter().all(|exit| exit.outcome.is_ok()));

    let lines = transcript.lines();
    assert_eq!(lines.iter().filter(|l| *l == "End of Code").count(), 2);
    assert!(transcript.contains("This is a Thread-0 thread task"));
    assert!(transcript.contains("This is a Thread-1 thread task: before timeout"));
    assert!(transcript.contains("This is a Thread-1 thread task: after timeout"));
    assert!(transcript.contains("This is a pool-1-thread-1 thread task"));
    assert!(transcript.contains("Reused executor thread: pool-1-thread-1"));
    assert!(transcript.contains("Executor pool-1 terminated"));
    assert!(transcript.contains("Callable value executor thread: pool-2-thread-1"));

    // The pooled demos run on the caller after the thread demos return
    let pool_line = lines
        .iter()
        .position(|l| l == "Callable value executor thread: pool-2-thread-1")
        .unwrap();
    let first_end = lines.iter().position(|l| l == "End of Code").unwrap();
    assert!(pool_line > first_end);
}
