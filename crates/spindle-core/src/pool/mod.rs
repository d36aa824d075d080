//! Single-worker task pool
//!
//! One worker thread drains an unbounded FIFO queue. Submitters get a
//! [`TaskHandle`] per task; the pool moves Running -> ShuttingDown ->
//! Terminated on graceful shutdown, or straight to Terminated when forced.

#[allow(clippy::module_inception)]
mod pool;
mod task;
mod worker;

pub use pool::{
    PoolBuilder, PoolState, PoolStats, ShutdownOutcome, SingleWorkerPool, DEFAULT_POOL_NAME,
};
pub use task::{TaskHandle, TaskId};
