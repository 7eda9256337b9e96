//! Minimal thread-spawning executor
//!
//! One named thread per dispatched task, delays driven by an owned
//! [`TimerThread`]. Not a pool; each task gets its own short-lived thread.

use crate::cancel::CancelHandle;
use crate::executor::{Continuation, Executor, TaskFn};
use crate::scope::Scope;
use crate::timer::TimerThread;
use crate::WeftResult;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn spawn_task(task: TaskFn) {
    // Spawn failure after construction has no caller to report to; log and
    // drop the task.
    if let Err(e) = thread::Builder::new()
        .name("weft-exec".to_string())
        .spawn(task)
    {
        log::error!("failed to spawn task thread: {}", e);
    }
}

/// Executor spawning one thread per task
pub struct SpawnExecutor {
    timer: Arc<TimerThread>,
}

impl SpawnExecutor {
    /// Create the executor and start its timer thread
    pub fn new() -> WeftResult<Arc<Self>> {
        let timer = TimerThread::new();
        timer.start()?;
        Ok(Arc::new(Self { timer }))
    }
}

impl Executor for SpawnExecutor {
    fn dispatch(&self, task: TaskFn) {
        spawn_task(task);
    }

    fn schedule_resume_after_delay(&self, delay: Duration, cont: Arc<Continuation>) {
        let deadline = Instant::now() + delay;
        // Resume off the timer thread so a slow continuation cannot delay
        // other deadlines.
        self.timer.register(deadline, move || {
            spawn_task(Box::new(move || cont.resume()));
        });
    }

    fn invoke_on_timeout(&self, delay: Duration, task: TaskFn) -> CancelHandle {
        let scope = Scope::root();
        let guard = scope.clone();
        let deadline = Instant::now() + delay;
        self.timer.register(deadline, move || {
            // complete() is the commit point: exactly one of run and dispose
            // wins.
            if guard.complete() {
                spawn_task(task);
            }
        });
        CancelHandle::new(scope)
    }
}
