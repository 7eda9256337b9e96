//! The external scheduler abstraction

use std::sync::Arc;
use std::time::Duration;
use weft_core::{CancelHandle, TaskFn};

/// Instrumentation hook applied to every submitted task body
///
/// Invoked exactly once per submission, before any delay is armed.
pub type TaskInterceptor = Arc<dyn Fn(TaskFn) -> TaskFn + Send + Sync>;

/// Pull-style scheduler: immediate/delayed scheduling plus sequential
/// workers, with explicit cancellation handles
pub trait Scheduler: Send + Sync {
    /// Schedule `task` to run after `delay` (zero for immediately)
    fn schedule_direct(&self, task: TaskFn, delay: Duration) -> CancelHandle;

    /// Create a sequential execution context
    fn create_worker(&self) -> Arc<dyn Worker>;

    /// Tear down the scheduler, cancelling all outstanding work
    fn shutdown(&self);
}

/// Sequential execution context owned by a scheduler
///
/// Tasks scheduled with zero delay run one at a time in submission order.
pub trait Worker: Send + Sync {
    /// Enqueue `task` to run after `delay`
    fn schedule(&self, task: TaskFn, delay: Duration) -> CancelHandle;

    /// Cancel this worker; queued tasks are discarded without running
    fn dispose(&self);

    /// True once the worker has been disposed
    fn is_disposed(&self) -> bool;
}
