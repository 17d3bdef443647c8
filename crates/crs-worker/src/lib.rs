//! Background task execution.
//!
//! Long-running operations (merging, splitting, grading) run on a spawned
//! thread and report back over a one-way channel. Progress events carry a
//! percentage and may be dropped by the consumer without harm; exactly one
//! of `Completed` / `Failed` follows, and `Finished` is always the last
//! event on every path, panics included, so consumers can reliably tear
//! down transient state such as progress bars.

use std::panic::AssertUnwindSafe;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread;

use tracing::{debug, error};

/// Events delivered by a spawned task, in order: any number of `Progress`,
/// then exactly one of `Completed` / `Failed`, then `Finished`.
#[derive(Debug)]
pub enum TaskEvent<T> {
    /// Percentage of the task done, 0 to 100.
    Progress(u8),
    /// The task's result.
    Completed(T),
    /// The task returned an error or panicked.
    Failed(anyhow::Error),
    /// Always the final event.
    Finished,
}

/// Runs `job` on a new thread, handing it a progress sink, and returns the
/// receiving end of its event channel.
///
/// Send failures are ignored on purpose: a consumer that hung up simply
/// stops listening, the task still runs to completion.
pub fn spawn<T, F>(job: F) -> Receiver<TaskEvent<T>>
where
    T: Send + 'static,
    F: FnOnce(&mut dyn FnMut(u8)) -> anyhow::Result<T> + Send + 'static,
{
    let (sender, receiver) = channel();
    thread::spawn(move || run(job, &sender));
    receiver
}

fn run<T, F>(job: F, sender: &Sender<TaskEvent<T>>)
where
    F: FnOnce(&mut dyn FnMut(u8)) -> anyhow::Result<T>,
{
    let progress_sender = sender.clone();
    let mut sink = move |pct: u8| {
        let _ = progress_sender.send(TaskEvent::Progress(pct));
    };
    let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| job(&mut sink)));
    let event = match outcome {
        Ok(Ok(value)) => {
            debug!("task completed");
            TaskEvent::Completed(value)
        }
        Ok(Err(err)) => {
            error!(error = %err, "task failed");
            TaskEvent::Failed(err)
        }
        Err(panic) => {
            let message = panic_message(&panic);
            error!(panic = message, "task panicked");
            TaskEvent::Failed(anyhow::anyhow!("task panicked: {message}"))
        }
    };
    let _ = sender.send(event);
    let _ = sender.send(TaskEvent::Finished);
}

fn panic_message(panic: &Box<dyn std::any::Any + Send>) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "unknown panic payload"
    }
}
