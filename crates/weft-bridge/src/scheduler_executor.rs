//! Executor facade over a scheduler

use crate::convert::SchedulerRef;
use crate::scheduler::Scheduler;
use std::sync::Arc;
use std::time::Duration;
use weft_core::executor::{Continuation, Executor, TaskFn};
use weft_core::CancelHandle;

/// Models a scheduler as an executor supporting delayed resumption and
/// timeout registration
pub struct SchedulerAsExecutor {
    scheduler: SchedulerRef,
}

impl SchedulerAsExecutor {
    pub(crate) fn new(scheduler: SchedulerRef) -> Self {
        Self { scheduler }
    }

    /// The wrapped scheduler, for the unwrap side of the conversion layer
    pub(crate) fn scheduler(&self) -> &SchedulerRef {
        &self.scheduler
    }
}

impl Executor for SchedulerAsExecutor {
    fn dispatch(&self, task: TaskFn) {
        // Fire and forget: the scheduler-side handle is not surfaced, so the
        // caller has no cancellation or failure channel for this submission.
        let _ = self.scheduler.schedule_direct(task, Duration::ZERO);
    }

    fn schedule_resume_after_delay(&self, delay: Duration, cont: Arc<Continuation>) {
        let resume = cont.clone();
        let handle = self
            .scheduler
            .schedule_direct(Box::new(move || resume.resume()), delay);
        // Cancelling the continuation now also cancels the scheduled
        // callback.
        cont.attach(handle);
    }

    fn invoke_on_timeout(&self, delay: Duration, task: TaskFn) -> CancelHandle {
        self.scheduler.schedule_direct(task, delay)
    }
}
