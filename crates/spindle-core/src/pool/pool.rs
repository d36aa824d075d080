//! Single-worker task pool with an admission / shutdown / termination lifecycle

use crate::context::TaskContext;
use crate::pool::task::{Job, TaskHandle, TaskId};
use crate::pool::worker;
use crate::{SpindleError, SpindleResult};
use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Default pool name when none is configured
pub const DEFAULT_POOL_NAME: &str = "pool";

/// Lifecycle state of a pool
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PoolState {
    /// Accepting and executing tasks
    Running,
    /// No new submissions; queued tasks still drain in order
    ShuttingDown,
    /// No queued tasks and no further work owned by the pool
    Terminated,
}

/// Pool statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Tasks accepted into the queue
    pub submitted: u64,

    /// Tasks that ran and returned a value
    pub completed: u64,

    /// Tasks that ran and failed (error or panic)
    pub failed: u64,

    /// Queued tasks dropped by forced termination
    pub discarded: u64,
}

/// How [`SingleWorkerPool::shutdown_with_timeout`] ended
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// The queue drained within the bounded wait
    Drained,
    /// The wait expired and the pool was force-terminated
    Forced {
        /// Queued tasks discarded by the forced termination
        discarded: usize,
    },
}

#[derive(Default)]
pub(crate) struct Counters {
    pub(crate) submitted: AtomicU64,
    pub(crate) completed: AtomicU64,
    pub(crate) failed: AtomicU64,
    pub(crate) discarded: AtomicU64,
}

/// State shared between pool handles and the worker thread
pub(crate) struct Shared {
    /// Pool name
    pub(crate) name: String,

    /// Lifecycle state
    state: Mutex<PoolState>,

    /// Signalled when the state becomes Terminated
    terminated: Condvar,

    /// Queue producer; taken on shutdown so the queue disconnects once drained
    sender: Mutex<Option<Sender<Job>>>,

    /// Queue consumer (used by the worker, and by forced termination to drain)
    pub(crate) receiver: Receiver<Job>,

    /// Set by forced termination; the worker must not start further tasks
    pub(crate) forced: AtomicBool,

    /// Context every task on this pool runs with
    pub(crate) context: TaskContext,

    /// Next task ID
    next_task_id: AtomicU64,

    /// Statistics
    pub(crate) counters: Counters,
}

impl Shared {
    fn request_shutdown(&self) {
        // Dropping the sender lets the worker exit after draining
        let had_sender = self.sender.lock().take().is_some();

        let mut state = self.state.lock();
        if *state == PoolState::Running {
            *state = PoolState::ShuttingDown;
        }
        drop(state);

        if had_sender {
            tracing::debug!(pool = %self.name, "shutdown requested");
        }
    }

    /// Called by the worker thread once it stops taking jobs
    pub(crate) fn mark_terminated(&self) {
        let mut state = self.state.lock();
        *state = PoolState::Terminated;
        self.terminated.notify_all();
    }
}

/// Builder for [`SingleWorkerPool`]
#[derive(Debug, Default)]
pub struct PoolBuilder {
    name: Option<String>,
    stack_size: Option<usize>,
}

impl PoolBuilder {
    /// Set the pool name; the worker thread is named `<name>-thread-1`
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the worker thread's stack size in bytes
    pub fn stack_size(mut self, size: usize) -> Self {
        self.stack_size = Some(size);
        self
    }

    /// Create the pool and start its worker thread
    pub fn build(self) -> SpindleResult<SingleWorkerPool> {
        let name = self.name.unwrap_or_else(|| DEFAULT_POOL_NAME.to_string());
        let thread_name = format!("{}-thread-1", name);
        let (sender, receiver) = channel::unbounded();

        let shared = Arc::new(Shared {
            name,
            state: Mutex::new(PoolState::Running),
            terminated: Condvar::new(),
            sender: Mutex::new(Some(sender)),
            receiver,
            forced: AtomicBool::new(false),
            context: TaskContext::new(thread_name.clone()),
            next_task_id: AtomicU64::new(1),
            counters: Counters::default(),
        });

        let mut builder = thread::Builder::new().name(thread_name);
        if let Some(size) = self.stack_size {
            builder = builder.stack_size(size);
        }

        let worker_shared = Arc::clone(&shared);
        // The worker is detached; pool state (not the join handle) tracks its exit
        builder
            .spawn(move || worker::run(worker_shared))
            .map_err(|e| SpindleError::Spawn(e.to_string()))?;

        tracing::debug!(pool = %shared.name, "pool created");

        Ok(SingleWorkerPool {
            inner: Arc::new(PoolInner { shared }),
        })
    }
}

/// Owned by pool handles only, so the last handle dropped shuts the pool down
struct PoolInner {
    shared: Arc<Shared>,
}

impl Drop for PoolInner {
    fn drop(&mut self) {
        self.shared.request_shutdown();
    }
}

/// Pool with one worker thread and an unbounded FIFO queue
///
/// Tasks run one at a time in submission order. Clones refer to the same
/// pool; dropping the last clone requests a graceful shutdown without
/// waiting for it.
#[derive(Clone)]
pub struct SingleWorkerPool {
    inner: Arc<PoolInner>,
}

impl SingleWorkerPool {
    /// Create a pool with the given name
    pub fn new(name: impl Into<String>) -> SpindleResult<Self> {
        Self::builder().name(name).build()
    }

    /// Get a builder for a customized pool
    pub fn builder() -> PoolBuilder {
        PoolBuilder::default()
    }

    fn shared(&self) -> &Shared {
        &self.inner.shared
    }

    /// Get the pool name
    pub fn name(&self) -> &str {
        &self.shared().name
    }

    /// Get the name of the worker thread (the context tasks run with)
    pub fn worker_name(&self) -> &str {
        self.shared().context.name()
    }

    /// Queue a task for execution
    ///
    /// Fails with [`SpindleError::Rejected`] once shutdown has been
    /// requested or the pool was force-terminated.
    pub fn submit<T, F>(&self, task: F) -> SpindleResult<TaskHandle<T>>
    where
        T: Send + 'static,
        F: FnOnce(&TaskContext) -> SpindleResult<T> + Send + 'static,
    {
        let shared = self.shared();
        let queue = shared.sender.lock();

        let sender = match queue.as_ref() {
            Some(sender) => sender,
            None => {
                return Err(SpindleError::Rejected {
                    pool: shared.name.clone(),
                })
            }
        };

        let id = TaskId::from_u64(shared.next_task_id.fetch_add(1, Ordering::Relaxed));
        let (job, handle) = Job::new(id, task);

        // The receiver lives in `Shared`, so the queue cannot be disconnected here
        sender.send(job).map_err(|_| SpindleError::Rejected {
            pool: shared.name.clone(),
        })?;

        shared.counters.submitted.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(pool = %shared.name, task = %id, "task submitted");

        Ok(handle)
    }

    /// Stop accepting tasks; queued tasks still run. Idempotent.
    pub fn request_shutdown(&self) {
        self.shared().request_shutdown();
    }

    /// Block up to `timeout` for the pool to terminate
    ///
    /// Returns whether it did. Calling this from a task on the same pool
    /// always waits out the full timeout.
    pub fn await_termination(&self, timeout: Duration) -> bool {
        let shared = self.shared();
        let deadline = Instant::now().checked_add(timeout);
        let mut state = shared.state.lock();

        loop {
            if *state == PoolState::Terminated {
                return true;
            }
            match deadline {
                Some(deadline) => {
                    if Instant::now() >= deadline {
                        return false;
                    }
                    shared.terminated.wait_until(&mut state, deadline);
                }
                None => shared.terminated.wait(&mut state),
            }
        }
    }

    /// Interrupt the active task, discard the backlog and terminate. Idempotent.
    ///
    /// Returns the number of queued tasks discarded by this call; their
    /// handles resolve to [`SpindleError::Cancelled`]. A running task that
    /// never checks for interruption keeps running on the worker thread.
    pub fn force_terminate(&self) -> usize {
        let shared = self.shared();

        shared.forced.store(true, Ordering::Release);
        shared.sender.lock().take();

        // Drain before interrupting so the worker cannot pick up the backlog
        let mut discarded = 0;
        while let Ok(job) = shared.receiver.try_recv() {
            drop(job);
            discarded += 1;
        }
        shared.context.interrupt();
        shared
            .counters
            .discarded
            .fetch_add(discarded as u64, Ordering::Relaxed);

        let mut state = shared.state.lock();
        if *state != PoolState::Terminated {
            tracing::debug!(pool = %shared.name, discarded, "pool force-terminated");
        }
        *state = PoolState::Terminated;
        shared.terminated.notify_all();

        discarded
    }

    /// Request shutdown, wait up to `wait`, then force-terminate if needed
    pub fn shutdown_with_timeout(&self, wait: Duration) -> ShutdownOutcome {
        self.request_shutdown();

        if self.await_termination(wait) {
            ShutdownOutcome::Drained
        } else {
            ShutdownOutcome::Forced {
                discarded: self.force_terminate(),
            }
        }
    }

    /// Get the lifecycle state
    pub fn state(&self) -> PoolState {
        *self.shared().state.lock()
    }

    /// Check whether shutdown has been requested (or the pool terminated)
    pub fn is_shutdown(&self) -> bool {
        self.state() != PoolState::Running
    }

    /// Check whether the pool reached Terminated
    pub fn is_terminated(&self) -> bool {
        self.state() == PoolState::Terminated
    }

    /// Get a snapshot of the pool statistics
    pub fn stats(&self) -> PoolStats {
        let counters = &self.shared().counters;
        PoolStats {
            submitted: counters.submitted.load(Ordering::Relaxed),
            completed: counters.completed.load(Ordering::Relaxed),
            failed: counters.failed.load(Ordering::Relaxed),
            discarded: counters.discarded.load(Ordering::Relaxed),
        }
    }
}

impl fmt::Debug for SingleWorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingleWorkerPool")
            .field("name", &self.name())
            .field("state", &self.state())
            .field("stats", &self.stats())
            .finish()
    }
}
