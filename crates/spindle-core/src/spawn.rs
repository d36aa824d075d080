//! Detached thread spawning
//!
//! Threads launched through a [`Spawner`] are unsupervised: the code that
//! spawns them gets no result channel, and a failure inside the thread is
//! only logged. The spawner still keeps every join handle so the program
//! can join all of its threads before exiting.

use crate::context::TaskContext;
use crate::{panic_message, SpindleError, SpindleResult};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};

/// Default name prefix for spawned threads
pub const DEFAULT_THREAD_PREFIX: &str = "Thread";

/// Recorded exit of a detached thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadExit {
    /// Name the thread was spawned with
    pub name: String,

    /// How the thread's task ended
    pub outcome: SpindleResult<()>,
}

/// Access to a running detached thread
///
/// Dropping this does not stop or join the thread.
#[derive(Debug, Clone)]
pub struct SpawnedThread {
    context: TaskContext,
}

impl SpawnedThread {
    /// Get the thread name
    pub fn name(&self) -> &str {
        self.context.name()
    }

    /// Interrupt the thread's task
    pub fn interrupt(&self) {
        self.context.interrupt();
    }

    /// Get the context the thread's task runs with
    pub fn context(&self) -> &TaskContext {
        &self.context
    }
}

/// Spawns named detached threads and joins them on request
pub struct Spawner {
    /// Name prefix; threads are named `<prefix>-<n>`
    prefix: String,

    /// Next thread number
    next_id: AtomicUsize,

    /// Threads not yet joined, in spawn order
    threads: Mutex<Vec<(String, JoinHandle<SpindleResult<()>>)>>,
}

impl Spawner {
    /// Create a spawner whose threads are named `<prefix>-0`, `<prefix>-1`, ...
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next_id: AtomicUsize::new(0),
            threads: Mutex::new(Vec::new()),
        }
    }

    /// Launch `task` on a new thread without waiting for it
    pub fn spawn<F>(&self, task: F) -> SpindleResult<SpawnedThread>
    where
        F: FnOnce(&TaskContext) -> SpindleResult<()> + Send + 'static,
    {
        let name = format!(
            "{}-{}",
            self.prefix,
            self.next_id.fetch_add(1, Ordering::Relaxed)
        );
        let context = TaskContext::new(name.clone());
        let thread_context = context.clone();

        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                let result = task(&thread_context);
                if let Err(e) = &result {
                    tracing::error!(thread = thread_context.name(), error = %e, "detached thread failed");
                }
                result
            })
            .map_err(|e| SpindleError::Spawn(e.to_string()))?;

        tracing::debug!(thread = %name, "spawned detached thread");
        self.threads.lock().push((name, handle));

        Ok(SpawnedThread { context })
    }

    /// Number of spawned threads not yet joined
    pub fn pending(&self) -> usize {
        self.threads.lock().len()
    }

    /// Join every thread spawned so far, in spawn order
    ///
    /// A panic inside a thread is reported as [`SpindleError::Panicked`].
    pub fn join_all(&self) -> Vec<ThreadExit> {
        let threads = std::mem::take(&mut *self.threads.lock());

        threads
            .into_iter()
            .map(|(name, handle)| {
                let outcome = match handle.join() {
                    Ok(result) => result,
                    Err(payload) => {
                        let message = panic_message(payload.as_ref());
                        tracing::error!(thread = %name, panic = %message, "detached thread panicked");
                        Err(SpindleError::Panicked(message))
                    }
                };
                ThreadExit { name, outcome }
            })
            .collect()
    }
}

impl Default for Spawner {
    fn default() -> Self {
        Self::new(DEFAULT_THREAD_PREFIX)
    }
}
