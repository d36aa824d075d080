//! Demonstration procedures
//!
//! Each procedure exercises one primitive and writes its observations to a
//! [`Transcript`]. [`run_all`] runs them in order.

mod pooled;
mod threads;

pub use pooled::{pooled_task_fire_and_forget, pooled_task_with_result};
pub use threads::{delayed_task, print_task, thread_basic, thread_delayed};

use crate::spawn::Spawner;
use crate::SpindleResult;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Default suspension of the delayed worker, and default bounded shutdown wait
pub const DEFAULT_DELAY: Duration = Duration::from_secs(3);

/// Tunables for the demonstrations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoConfig {
    /// How long the delayed worker sleeps between its two lines
    pub delay: Duration,

    /// Bounded wait for a pool to drain before forcing termination
    pub termination_wait: Duration,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            delay: DEFAULT_DELAY,
            termination_wait: DEFAULT_DELAY,
        }
    }
}

/// Ordered record of observation lines, shared across threads
#[derive(Debug, Clone)]
pub struct Transcript {
    lines: Arc<Mutex<Vec<String>>>,
    echo: bool,
}

impl Transcript {
    /// Transcript that prints every line to stdout as it is recorded
    pub fn stdout() -> Self {
        Self {
            lines: Arc::new(Mutex::new(Vec::new())),
            echo: true,
        }
    }

    /// Transcript that only records lines
    pub fn capture() -> Self {
        Self {
            lines: Arc::new(Mutex::new(Vec::new())),
            echo: false,
        }
    }

    /// Record one line
    pub fn line(&self, line: impl Into<String>) {
        let line = line.into();
        let mut lines = self.lines.lock();
        // Print under the lock so stdout order matches recorded order
        if self.echo {
            println!("{}", line);
        }
        lines.push(line);
    }

    /// Snapshot of the lines recorded so far
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Check whether any recorded line contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.lock().iter().any(|line| line.contains(needle))
    }
}

/// Run all four demonstrations in order
///
/// Detached threads are left running on `spawner`; the caller joins them.
pub fn run_all(
    config: &DemoConfig,
    spawner: &Spawner,
    transcript: &Transcript,
) -> SpindleResult<()> {
    thread_basic(spawner, transcript)?;
    thread_delayed(spawner, transcript, config.delay)?;
    pooled_task_fire_and_forget(transcript, config.termination_wait)?;
    pooled_task_with_result(transcript)?;
    Ok(())
}
