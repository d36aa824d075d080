//! Spindle Core
//!
//! This crate provides the concurrency primitives behind the Spindle demos:
//! - Task contexts with cooperative interruption
//! - Detached (unsupervised) thread spawning
//! - A single-worker task pool with graceful and forced shutdown
//! - Pending-result handles for value-returning tasks
//! - The demonstration procedures that exercise all of the above

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod context;
pub mod demo;
pub mod pool;
pub mod spawn;

pub use context::TaskContext;
pub use demo::{DemoConfig, Transcript};
pub use pool::{
    PoolBuilder, PoolState, PoolStats, ShutdownOutcome, SingleWorkerPool, TaskHandle, TaskId,
};
pub use spawn::{SpawnedThread, Spawner, ThreadExit};

use std::any::Any;
use std::time::Duration;

/// Errors raised by tasks, pools and spawned threads
///
/// Cloneable so that a stored task outcome can be read any number of times.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpindleError {
    /// The execution context was interrupted during a timed wait
    #[error("Interrupted while waiting")]
    Interrupted,

    /// Submission after the pool stopped accepting work
    #[error("Task rejected: pool {pool} is shut down")]
    Rejected {
        /// Name of the pool that rejected the task
        pool: String,
    },

    /// Failure raised by the task itself
    #[error("Task failed: {0}")]
    Failed(String),

    /// The task (or detached thread) panicked
    #[error("Task panicked: {0}")]
    Panicked(String),

    /// Queued task discarded by forced termination before it started
    #[error("Task cancelled before it started")]
    Cancelled,

    /// A bounded wait on a task handle expired
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// The OS refused to create a thread
    #[error("Failed to spawn thread: {0}")]
    Spawn(String),
}

/// Result type used throughout Spindle
pub type SpindleResult<T> = Result<T, SpindleError>;

/// Extract a readable message from a panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
