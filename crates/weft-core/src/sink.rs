//! Task failure reporting
//!
//! A task body that panics must not tear down the consumer loop, the worker,
//! or any scope. The panic is caught at the run site and handed to the
//! [`FailureSink`] injected at adapter construction.

use std::any::Any;
use std::fmt;

/// A captured task-body failure
#[derive(Debug)]
pub struct TaskFailure {
    message: String,
}

impl TaskFailure {
    /// Build a failure from a panic payload
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "task panicked".to_string()
        };
        Self { message }
    }

    /// The panic message, or a placeholder for non-string payloads
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Sink for uncaught task-body failures
///
/// Supervisor semantics: the sink observes the failure, nothing else does.
pub trait FailureSink: Send + Sync {
    /// Called once per failed task body
    fn on_task_failure(&self, failure: TaskFailure);
}

/// Default sink reporting through the `log` facade
#[derive(Debug, Default)]
pub struct LogSink;

impl FailureSink for LogSink {
    fn on_task_failure(&self, failure: TaskFailure) {
        log::error!("task failed: {}", failure);
    }
}
