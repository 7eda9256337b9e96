//! Weft core runtime primitives
//!
//! This crate provides the executor-side building blocks the bridge is made
//! of:
//! - Cancellation scope tree with supervisor semantics
//! - Cancellation handles
//! - Timer thread for delayed callbacks
//! - Task failure sink
//! - The [`Executor`] abstraction and a minimal spawning implementation

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod cancel;
pub mod executor;
pub mod scope;
pub mod sink;
pub mod spawn;
pub mod timer;

pub use cancel::CancelHandle;
pub use executor::{Continuation, Executor, TaskFn};
pub use scope::{Scope, ScopeId, ScopeState};
pub use sink::{FailureSink, LogSink, TaskFailure};
pub use spawn::SpawnExecutor;
pub use timer::TimerThread;

/// Runtime construction errors
#[derive(Debug, thiserror::Error)]
pub enum WeftError {
    /// The OS refused to spawn a runtime thread
    #[error("failed to spawn {name} thread")]
    ThreadSpawn {
        /// Requested thread name
        name: &'static str,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },
}

/// Runtime construction result
pub type WeftResult<T> = Result<T, WeftError>;
