//! Conversions between schedulers and executors
//!
//! The two reference types are tagged unions, so converting a wrapped
//! instance of the opposite kind is a pattern match that hands back the
//! original object instead of nesting another adapter. This is what makes
//! the round trip an identity.

use crate::executor_scheduler::ExecutorAsScheduler;
use crate::scheduler::{Scheduler, TaskInterceptor, Worker};
use crate::scheduler_executor::SchedulerAsExecutor;
use std::sync::Arc;
use std::time::Duration;
use weft_core::executor::{Continuation, Executor, TaskFn};
use weft_core::sink::{FailureSink, LogSink};
use weft_core::CancelHandle;

/// A scheduler: either a native implementation or an executor in disguise
#[derive(Clone)]
pub enum SchedulerRef {
    /// Scheduler provided by the external ecosystem
    Native(Arc<dyn Scheduler>),
    /// Product of a prior executor-to-scheduler conversion
    Bridged(Arc<ExecutorAsScheduler>),
}

/// An executor: either a native implementation or a scheduler in disguise
#[derive(Clone)]
pub enum ExecutorRef {
    /// Executor provided by the internal ecosystem
    Native(Arc<dyn Executor>),
    /// Product of a prior scheduler-to-executor conversion
    Bridged(Arc<SchedulerAsExecutor>),
}

impl SchedulerRef {
    /// Reference identity
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Native(a), Self::Native(b)) => Arc::ptr_eq(a, b),
            (Self::Bridged(a), Self::Bridged(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl ExecutorRef {
    /// Reference identity
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Native(a), Self::Native(b)) => Arc::ptr_eq(a, b),
            (Self::Bridged(a), Self::Bridged(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Scheduler for SchedulerRef {
    fn schedule_direct(&self, task: TaskFn, delay: Duration) -> CancelHandle {
        match self {
            Self::Native(s) => s.schedule_direct(task, delay),
            Self::Bridged(s) => s.schedule_direct(task, delay),
        }
    }

    fn create_worker(&self) -> Arc<dyn Worker> {
        match self {
            Self::Native(s) => s.create_worker(),
            Self::Bridged(s) => s.create_worker(),
        }
    }

    fn shutdown(&self) {
        match self {
            Self::Native(s) => s.shutdown(),
            Self::Bridged(s) => s.shutdown(),
        }
    }
}

impl Executor for ExecutorRef {
    fn dispatch(&self, task: TaskFn) {
        match self {
            Self::Native(e) => e.dispatch(task),
            Self::Bridged(e) => e.dispatch(task),
        }
    }

    fn schedule_resume_after_delay(&self, delay: Duration, cont: Arc<Continuation>) {
        match self {
            Self::Native(e) => e.schedule_resume_after_delay(delay, cont),
            Self::Bridged(e) => e.schedule_resume_after_delay(delay, cont),
        }
    }

    fn invoke_on_timeout(&self, delay: Duration, task: TaskFn) -> CancelHandle {
        match self {
            Self::Native(e) => e.invoke_on_timeout(delay, task),
            Self::Bridged(e) => e.invoke_on_timeout(delay, task),
        }
    }
}

/// Model `executor` as a scheduler, with a default [`LogSink`] and no
/// instrumentation
///
/// An executor that is itself a converted scheduler short-circuits back to
/// the original scheduler instance.
pub fn to_scheduler(executor: ExecutorRef) -> SchedulerRef {
    to_scheduler_with(executor, None, Arc::new(LogSink))
}

/// As [`to_scheduler`], with an explicit failure sink and instrumentation
/// hook
///
/// The sink and interceptor are ignored on the short-circuit path: the
/// original scheduler keeps whatever policy it was built with.
pub fn to_scheduler_with(
    executor: ExecutorRef,
    interceptor: Option<TaskInterceptor>,
    sink: Arc<dyn FailureSink>,
) -> SchedulerRef {
    match executor {
        ExecutorRef::Bridged(bridged) => bridged.scheduler().clone(),
        native => SchedulerRef::Bridged(Arc::new(ExecutorAsScheduler::new(
            native,
            interceptor,
            sink,
        ))),
    }
}

/// Model `scheduler` as an executor
///
/// A scheduler that is itself a converted executor short-circuits back to
/// the original executor instance.
pub fn to_executor(scheduler: SchedulerRef) -> ExecutorRef {
    match scheduler {
        SchedulerRef::Bridged(bridged) => bridged.executor().clone(),
        native => ExecutorRef::Bridged(Arc::new(SchedulerAsExecutor::new(native))),
    }
}
