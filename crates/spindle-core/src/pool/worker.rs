//! Worker thread that executes pool tasks

use crate::pool::pool::Shared;
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Worker thread main loop
///
/// Takes jobs in FIFO order until the queue is disconnected and empty, then
/// marks the pool terminated.
pub(crate) fn run(shared: Arc<Shared>) {
    let ctx = &shared.context;
    tracing::debug!(pool = %shared.name, worker = ctx.name(), "worker started");

    while let Ok(job) = shared.receiver.recv() {
        // Forced termination: never start another task
        if shared.forced.load(Ordering::Acquire) {
            tracing::trace!(pool = %shared.name, task = %job.id(), "discarding task after forced termination");
            drop(job);
            shared.counters.discarded.fetch_add(1, Ordering::Relaxed);
            continue;
        }

        let id = job.id();
        tracing::trace!(pool = %shared.name, task = %id, "task started");

        match job.run(ctx) {
            Ok(()) => {
                shared.counters.completed.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(pool = %shared.name, task = %id, "task completed");
            }
            Err(e) => {
                shared.counters.failed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(pool = %shared.name, task = %id, error = %e, "task failed");
            }
        }
    }

    shared.mark_terminated();
    tracing::debug!(pool = %shared.name, worker = ctx.name(), "worker exited");
}
