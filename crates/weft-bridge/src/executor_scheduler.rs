//! Scheduler facade over an executor

use crate::convert::ExecutorRef;
use crate::scheduler::{Scheduler, TaskInterceptor, Worker};
use crate::worker::SequentialWorker;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use weft_core::scope::Scope;
use weft_core::sink::{FailureSink, TaskFailure};
use weft_core::{CancelHandle, Executor, TaskFn};

/// Models an executor as a scheduler with sequential workers
///
/// Owns the root cancellation scope: `shutdown` cancels it and with it every
/// worker and task created through this scheduler.
pub struct ExecutorAsScheduler {
    executor: ExecutorRef,
    root: Arc<Scope>,
    interceptor: Option<TaskInterceptor>,
    sink: Arc<dyn FailureSink>,
}

impl ExecutorAsScheduler {
    pub(crate) fn new(
        executor: ExecutorRef,
        interceptor: Option<TaskInterceptor>,
        sink: Arc<dyn FailureSink>,
    ) -> Self {
        Self {
            executor,
            root: Scope::root(),
            interceptor,
            sink,
        }
    }

    /// The wrapped executor, for the unwrap side of the conversion layer
    pub(crate) fn executor(&self) -> &ExecutorRef {
        &self.executor
    }

    /// Wrap `body` so the run is skipped once `scope` is inactive, a panic
    /// goes to the sink, and the scope completes afterwards
    fn guarded(scope: Arc<Scope>, body: TaskFn, sink: Arc<dyn FailureSink>) -> TaskFn {
        Box::new(move || {
            if !scope.is_active() {
                return;
            }
            if let Err(payload) = catch_unwind(AssertUnwindSafe(body)) {
                sink.on_task_failure(TaskFailure::from_panic(payload));
            }
            scope.complete();
        })
    }
}

impl Scheduler for ExecutorAsScheduler {
    fn schedule_direct(&self, task: TaskFn, delay: Duration) -> CancelHandle {
        if !self.root.is_active() {
            return CancelHandle::cancelled();
        }

        // Instrumentation runs exactly once, before the delay is armed.
        let task = match &self.interceptor {
            Some(hook) => hook(task),
            None => task,
        };

        let scope = self.root.child();
        let body = Self::guarded(scope.clone(), task, self.sink.clone());

        if delay.is_zero() {
            self.executor.dispatch(body);
        } else {
            let registration = self.executor.invoke_on_timeout(delay, body);
            scope.on_cancel(move || registration.dispose());
        }

        CancelHandle::new(scope)
    }

    fn create_worker(&self) -> Arc<dyn Worker> {
        SequentialWorker::new(
            self.root.child(),
            self.executor.clone(),
            self.interceptor.clone(),
            self.sink.clone(),
        )
    }

    fn shutdown(&self) {
        log::debug!("shutting down scheduler scope {}", self.root.id().as_u64());
        self.root.cancel();
    }
}

impl Drop for ExecutorAsScheduler {
    fn drop(&mut self) {
        self.root.cancel();
    }
}
