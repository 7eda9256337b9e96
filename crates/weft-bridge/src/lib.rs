//! Bidirectional adapter between pull-style schedulers and
//! structured-concurrency executors
//!
//! [`to_scheduler`] models an executor as a scheduler with sequential
//! workers; [`to_executor`] models a scheduler as an executor supporting
//! delayed resumption and timeout registration. Converting an
//! already-converted instance returns the original underlying object
//! instead of nesting another adapter.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

mod convert;
mod executor_scheduler;
mod scheduler;
mod scheduler_executor;
mod task;
mod worker;

pub use convert::{to_executor, to_scheduler, to_scheduler_with, ExecutorRef, SchedulerRef};
pub use executor_scheduler::ExecutorAsScheduler;
pub use scheduler::{Scheduler, TaskInterceptor, Worker};
pub use scheduler_executor::SchedulerAsExecutor;
pub use worker::SequentialWorker;
