//! Tasks submitted to single-worker pools

use crate::context::TaskContext;
use crate::demo::Transcript;
use crate::pool::{ShutdownOutcome, SingleWorkerPool};
use crate::SpindleResult;
use std::time::Duration;

/// Submit two print tasks to one pool, then shut it down with a bounded wait
///
/// Both tasks run on the same worker thread. Whether the pool drains within
/// `termination_wait` or gets force-terminated depends on scheduling; the
/// outcome is recorded either way.
pub fn pooled_task_fire_and_forget(
    transcript: &Transcript,
    termination_wait: Duration,
) -> SpindleResult<ShutdownOutcome> {
    let pool = SingleWorkerPool::new("pool-1")?;

    let first = {
        let transcript = transcript.clone();
        pool.submit(move |ctx| {
            transcript.line(format!("This is a {} thread task", ctx.name()));
            Ok(())
        })?
    };

    {
        let transcript = transcript.clone();
        pool.submit(move |ctx| {
            transcript.line(format!("Reused executor thread: {}", ctx.name()));
            Ok(())
        })?;
    }

    // Snapshot; the task may or may not have run yet
    transcript.line(format!("Printing result future object: {:?}", first));

    let outcome = pool.shutdown_with_timeout(termination_wait);
    match outcome {
        ShutdownOutcome::Drained => {
            transcript.line(format!("Executor {} terminated", pool.name()));
        }
        ShutdownOutcome::Forced { discarded } => {
            transcript.line(format!(
                "Executor {} forced to terminate, {} queued task(s) discarded",
                pool.name(),
                discarded
            ));
        }
    }

    Ok(outcome)
}

/// Compute a value on the caller, then one through a pool
///
/// Returns `(caller_value, executor_value)`: the name of the context each
/// value was computed on.
pub fn pooled_task_with_result(transcript: &Transcript) -> SpindleResult<(String, String)> {
    let in_caller = |ctx: &TaskContext| -> SpindleResult<String> { Ok(ctx.name().to_string()) };

    let pool = SingleWorkerPool::new("pool-2")?;
    let in_executor = || -> SpindleResult<String> {
        let handle = pool.submit(|ctx| Ok(ctx.name().to_string()))?;
        pool.request_shutdown();
        handle.get()
    };

    let caller_value = in_caller(&TaskContext::for_current_thread())?;
    transcript.line(format!("Callable value main thread: {}", caller_value));

    let executor_value = in_executor()?;
    transcript.line(format!("Callable value executor thread: {}", executor_value));

    Ok((caller_value, executor_value))
}
