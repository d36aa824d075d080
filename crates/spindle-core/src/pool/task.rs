//! Task identifiers, pending-result handles and queued jobs

use crate::context::TaskContext;
use crate::{panic_message, SpindleError, SpindleResult};
use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Identifier of a task submitted to a pool, unique within that pool
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    /// Create a TaskId from a u64 value
    pub fn from_u64(id: u64) -> Self {
        TaskId(id)
    }

    /// Get the numeric ID value
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// Storage for a task outcome, written once
struct Slot<T> {
    outcome: Mutex<Option<SpindleResult<T>>>,
    resolved: Condvar,
}

impl<T> Slot<T> {
    fn resolve(&self, outcome: SpindleResult<T>) {
        let mut stored = self.outcome.lock();
        if stored.is_none() {
            *stored = Some(outcome);
            self.resolved.notify_all();
        }
    }
}

/// Handle to the eventual outcome of a submitted task
///
/// Resolved exactly once by the worker. Every read returns the same stored
/// value or failure; the task is never re-run.
pub struct TaskHandle<T> {
    id: TaskId,
    slot: Arc<Slot<T>>,
}

impl<T> TaskHandle<T> {
    /// Get the task ID
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Check whether the task outcome is available
    pub fn is_done(&self) -> bool {
        self.slot.outcome.lock().is_some()
    }

    fn state_label(&self) -> &'static str {
        match &*self.slot.outcome.lock() {
            None => "pending",
            Some(Ok(_)) => "completed",
            Some(Err(SpindleError::Cancelled)) => "cancelled",
            Some(Err(_)) => "failed",
        }
    }
}

impl<T: Clone> TaskHandle<T> {
    /// Block until the task resolves and return its outcome
    pub fn get(&self) -> SpindleResult<T> {
        let mut stored = self.slot.outcome.lock();
        loop {
            if let Some(outcome) = stored.as_ref() {
                return outcome.clone();
            }
            self.slot.resolved.wait(&mut stored);
        }
    }

    /// Block up to `timeout` for the task to resolve
    ///
    /// An expired wait returns [`SpindleError::Timeout`] and leaves the
    /// handle untouched; it can be waited on again.
    pub fn wait_timeout(&self, timeout: Duration) -> SpindleResult<T> {
        let deadline = match Instant::now().checked_add(timeout) {
            Some(deadline) => deadline,
            None => return self.get(),
        };

        let mut stored = self.slot.outcome.lock();
        loop {
            if let Some(outcome) = stored.as_ref() {
                return outcome.clone();
            }
            if Instant::now() >= deadline {
                return Err(SpindleError::Timeout(timeout));
            }
            self.slot.resolved.wait_until(&mut stored, deadline);
        }
    }

    /// Return the outcome if already resolved, without blocking
    pub fn try_get(&self) -> Option<SpindleResult<T>> {
        self.slot.outcome.lock().clone()
    }
}

impl<T> Clone for TaskHandle<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> fmt::Debug for TaskHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.id.as_u64())
            .field("state", &self.state_label())
            .finish()
    }
}

/// Write side of a [`TaskHandle`]
///
/// Dropping it unresolved (a discarded job) resolves the handle to
/// [`SpindleError::Cancelled`].
struct Completer<T> {
    slot: Option<Arc<Slot<T>>>,
}

impl<T> Completer<T> {
    fn complete(mut self, outcome: SpindleResult<T>) {
        if let Some(slot) = self.slot.take() {
            slot.resolve(outcome);
        }
    }
}

impl<T> Drop for Completer<T> {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            slot.resolve(Err(SpindleError::Cancelled));
        }
    }
}

/// Create a connected handle / completer pair
fn pending<T>(id: TaskId) -> (TaskHandle<T>, Completer<T>) {
    let slot = Arc::new(Slot {
        outcome: Mutex::new(None),
        resolved: Condvar::new(),
    });
    let handle = TaskHandle {
        id,
        slot: Arc::clone(&slot),
    };
    (handle, Completer { slot: Some(slot) })
}

/// Type-erased unit of work sitting in a pool queue
pub(crate) struct Job {
    id: TaskId,
    run: Box<dyn FnOnce(&TaskContext) -> SpindleResult<()> + Send>,
}

impl Job {
    /// Wrap `task` into a job and the handle its outcome will be written to
    pub(crate) fn new<T, F>(id: TaskId, task: F) -> (Self, TaskHandle<T>)
    where
        T: Send + 'static,
        F: FnOnce(&TaskContext) -> SpindleResult<T> + Send + 'static,
    {
        let (handle, completer) = pending(id);

        let run = Box::new(move |ctx: &TaskContext| {
            let outcome = match panic::catch_unwind(AssertUnwindSafe(|| task(ctx))) {
                Ok(result) => result,
                Err(payload) => Err(SpindleError::Panicked(panic_message(payload.as_ref()))),
            };
            let report = match &outcome {
                Ok(_) => Ok(()),
                Err(e) => Err(e.clone()),
            };
            completer.complete(outcome);
            report
        });

        (Self { id, run }, handle)
    }

    /// Get the task ID
    pub(crate) fn id(&self) -> TaskId {
        self.id
    }

    /// Run the task on `ctx`, resolving its handle
    ///
    /// Returns the failure (if any) so the worker can log and count it.
    pub(crate) fn run(self, ctx: &TaskContext) -> SpindleResult<()> {
        (self.run)(ctx)
    }
}
