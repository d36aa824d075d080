//! Execution context passed into every task
//!
//! A context carries the explicit name of the thread running the task and
//! an interruption flag. Interruption is cooperative: it only takes effect
//! when the task sleeps through [`TaskContext::sleep`] or polls
//! [`TaskContext::check_interrupt`].

use crate::{SpindleError, SpindleResult};
use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Interruption flag plus the condvar sleepers park on
struct InterruptState {
    interrupted: Mutex<bool>,
    wake: Condvar,
}

/// Identity and interruption state of an execution context
#[derive(Clone)]
pub struct TaskContext {
    /// Context name, assigned by whoever created the context
    name: Arc<str>,

    /// Shared interruption state
    interrupt: Arc<InterruptState>,
}

impl TaskContext {
    /// Create a new context with the given name
    pub fn new(name: impl Into<String>) -> Self {
        let name: String = name.into();
        Self {
            name: Arc::from(name),
            interrupt: Arc::new(InterruptState {
                interrupted: Mutex::new(false),
                wake: Condvar::new(),
            }),
        }
    }

    /// Context for running a task directly on the calling thread
    pub fn for_current_thread() -> Self {
        let current = thread::current();
        Self::new(current.name().unwrap_or("unnamed"))
    }

    /// Get the context name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Request interruption, waking the context if it is sleeping
    pub fn interrupt(&self) {
        let mut interrupted = self.interrupt.interrupted.lock();
        *interrupted = true;
        self.interrupt.wake.notify_all();
    }

    /// Check whether an interruption is pending (does not clear it)
    pub fn is_interrupted(&self) -> bool {
        *self.interrupt.interrupted.lock()
    }

    /// Fail with [`SpindleError::Interrupted`] if an interruption is pending
    ///
    /// Observing the interruption clears it.
    pub fn check_interrupt(&self) -> SpindleResult<()> {
        let mut interrupted = self.interrupt.interrupted.lock();
        if *interrupted {
            *interrupted = false;
            return Err(SpindleError::Interrupted);
        }
        Ok(())
    }

    /// Suspend the context for `duration`
    ///
    /// Returns [`SpindleError::Interrupted`] as soon as the context is
    /// interrupted, including an interruption requested before the call.
    pub fn sleep(&self, duration: Duration) -> SpindleResult<()> {
        let deadline = Instant::now().checked_add(duration);
        let mut interrupted = self.interrupt.interrupted.lock();

        loop {
            if *interrupted {
                *interrupted = false;
                return Err(SpindleError::Interrupted);
            }

            match deadline {
                Some(deadline) => {
                    if Instant::now() >= deadline {
                        return Ok(());
                    }
                    self.interrupt.wake.wait_until(&mut interrupted, deadline);
                }
                // Too far in the future to represent: only an interrupt ends it
                None => self.interrupt.wake.wait(&mut interrupted),
            }
        }
    }
}

impl fmt::Debug for TaskContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskContext")
            .field("name", &self.name())
            .field("interrupted", &self.is_interrupted())
            .finish()
    }
}
