//! Bare and delayed detached threads

use crate::context::TaskContext;
use crate::demo::Transcript;
use crate::spawn::{SpawnedThread, Spawner};
use crate::SpindleResult;
use std::time::Duration;

/// Task that records which context ran it
///
/// Reusable: the same task can run on the caller and on a spawned thread.
pub fn print_task(
    transcript: Transcript,
) -> impl Fn(&TaskContext) -> SpindleResult<()> + Clone + Send + 'static {
    move |ctx: &TaskContext| {
        transcript.line(format!("This is a {} thread task", ctx.name()));
        Ok(())
    }
}

/// Task that records a line, sleeps for `delay`, then records another
///
/// An interruption during the sleep ends the task with
/// [`crate::SpindleError::Interrupted`] before the second line.
pub fn delayed_task(
    transcript: Transcript,
    delay: Duration,
) -> impl FnOnce(&TaskContext) -> SpindleResult<()> + Send + 'static {
    move |ctx: &TaskContext| {
        transcript.line(format!("This is a {} thread task: before timeout", ctx.name()));
        ctx.sleep(delay)?;
        transcript.line(format!("This is a {} thread task: after timeout", ctx.name()));
        Ok(())
    }
}

/// Run the print task on the caller, then on a new thread
///
/// The "End of Code" line and the spawned thread's line are unordered.
pub fn thread_basic(spawner: &Spawner, transcript: &Transcript) -> SpindleResult<SpawnedThread> {
    let task = print_task(transcript.clone());

    task(&TaskContext::for_current_thread())?;
    let thread = spawner.spawn(task)?;

    transcript.line("End of Code");
    Ok(thread)
}

/// Spawn the delayed task without waiting for it
pub fn thread_delayed(
    spawner: &Spawner,
    transcript: &Transcript,
    delay: Duration,
) -> SpindleResult<SpawnedThread> {
    let thread = spawner.spawn(delayed_task(transcript.clone(), delay))?;
    transcript.line("End of Code");
    Ok(thread)
}
