//! The executor abstraction
//!
//! A structured task executor runs submitted work on its own execution
//! context and supports two delay primitives: resuming a suspended caller
//! and running a task after a timeout.

use crate::cancel::CancelHandle;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// A unit of work submitted to an executor or scheduler
pub type TaskFn = Box<dyn FnOnce() + Send>;

/// Structured task executor
///
/// Implementations run `dispatch` and `invoke_on_timeout` bodies on the
/// executor's own execution context, never on the caller's thread.
pub trait Executor: Send + Sync {
    /// Run `task` soon, free-running
    fn dispatch(&self, task: TaskFn);

    /// Resume `cont` after `delay`
    fn schedule_resume_after_delay(&self, delay: Duration, cont: Arc<Continuation>);

    /// Run `task` after `delay`
    ///
    /// Disposing the returned handle prevents the run if it has not started.
    fn invoke_on_timeout(&self, delay: Duration, task: TaskFn) -> CancelHandle;
}

/// One-shot resumption of a suspended caller
///
/// The resume closure runs at most once. The registration backing the
/// resumption can be attached in either order relative to `cancel`;
/// cancelling the continuation disposes whatever is attached.
pub struct Continuation {
    /// Pending resume closure; taken on resume or cancel
    resume: Mutex<Option<TaskFn>>,

    /// Underlying registration, disposed on cancel
    attached: Mutex<Option<CancelHandle>>,

    /// Set once `cancel` has been called
    cancelled: AtomicBool,
}

impl Continuation {
    /// Create a continuation around a resume closure
    pub fn new(resume: impl FnOnce() + Send + 'static) -> Arc<Self> {
        Arc::new(Self {
            resume: Mutex::new(Some(Box::new(resume))),
            attached: Mutex::new(None),
            cancelled: AtomicBool::new(false),
        })
    }

    /// Run the resume closure if it is still pending
    pub fn resume(&self) {
        let resume = self.resume.lock().take();
        if let Some(resume) = resume {
            resume();
        }
    }

    /// Attach the registration backing this continuation
    ///
    /// If the continuation was already cancelled the registration is
    /// disposed immediately.
    pub fn attach(&self, handle: CancelHandle) {
        {
            let mut slot = self.attached.lock();
            if !self.cancelled.load(Ordering::Acquire) {
                *slot = Some(handle);
                return;
            }
        }
        handle.dispose();
    }

    /// Cancel the pending resumption and dispose the attached registration
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        self.resume.lock().take();
        let attached = self.attached.lock().take();
        if let Some(handle) = attached {
            handle.dispose();
        }
    }

    /// True once `cancel` has been called
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}
