//! Sequential worker: unbounded FIFO with a single consumer

use crate::convert::ExecutorRef;
use crate::scheduler::{TaskInterceptor, Worker};
use crate::task::DelayedTask;
use crossbeam::queue::SegQueue;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use weft_core::scope::Scope;
use weft_core::sink::FailureSink;
use weft_core::{CancelHandle, Executor, TaskFn};

/// Per-worker queue shared by producers, the drain pass, and the scope
/// cancel hook
struct WorkQueue {
    /// Submitted tasks in FIFO order, unbounded
    items: SegQueue<Arc<DelayedTask>>,

    /// Set once the worker scope is cancelled; no task runs afterwards
    closed: AtomicBool,

    /// At most one drain pass in flight
    pumping: AtomicBool,
}

impl WorkQueue {
    fn close(&self) {
        self.closed.store(true, Ordering::Release);
        // Discard everything still queued; the task scopes were already
        // cancelled by the worker-scope walk.
        while self.items.pop().is_some() {}
    }
}

/// The consumer pass: dequeue in FIFO order until the queue is empty or
/// closed, then re-arm if a producer raced the idle transition
fn drain(queue: Arc<WorkQueue>) {
    loop {
        if queue.closed.load(Ordering::Acquire) {
            while queue.items.pop().is_some() {}
            queue.pumping.store(false, Ordering::Release);
            return;
        }
        match queue.items.pop() {
            Some(task) => task.execute(),
            None => {
                queue.pumping.store(false, Ordering::Release);
                // A producer may have enqueued between the failed pop and
                // the flag store; reclaim the pass if nobody else did.
                if queue.items.is_empty()
                    || queue
                        .pumping
                        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                        .is_err()
                {
                    return;
                }
            }
        }
    }
}

/// Sequential execution context on top of an executor
///
/// Tasks go through an unbounded FIFO consumed by a single drain pass
/// running on the wrapped executor, so zero-delay tasks execute one at a
/// time in submission order. A task with a pending delay parks when
/// dequeued instead of blocking the pass.
pub struct SequentialWorker {
    scope: Arc<Scope>,
    queue: Arc<WorkQueue>,
    executor: ExecutorRef,
    interceptor: Option<TaskInterceptor>,
    sink: Arc<dyn FailureSink>,
}

impl SequentialWorker {
    pub(crate) fn new(
        scope: Arc<Scope>,
        executor: ExecutorRef,
        interceptor: Option<TaskInterceptor>,
        sink: Arc<dyn FailureSink>,
    ) -> Arc<Self> {
        let queue = Arc::new(WorkQueue {
            items: SegQueue::new(),
            closed: AtomicBool::new(false),
            pumping: AtomicBool::new(false),
        });

        let hook_queue = queue.clone();
        scope.on_cancel(move || hook_queue.close());

        Arc::new(Self {
            scope,
            queue,
            executor,
            interceptor,
            sink,
        })
    }

    /// Arm the drain pass unless one is already in flight
    fn pump(&self) {
        if self
            .queue
            .pumping
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            let queue = self.queue.clone();
            self.executor.dispatch(Box::new(move || drain(queue)));
        }
    }
}

impl Worker for SequentialWorker {
    fn schedule(&self, task: TaskFn, delay: Duration) -> CancelHandle {
        if !self.scope.is_active() {
            return CancelHandle::cancelled();
        }

        // Instrumentation runs exactly once, before the delay is armed.
        let task = match &self.interceptor {
            Some(hook) => hook(task),
            None => task,
        };

        let task_scope = self.scope.child();
        let entry = DelayedTask::new(
            task_scope.clone(),
            task,
            delay,
            &self.executor,
            self.sink.clone(),
        );

        // If the worker was disposed between the check above and this push,
        // the child scope is already cancelled and the drain pass discards
        // the entry.
        self.queue.items.push(entry);
        self.pump();

        CancelHandle::new(task_scope)
    }

    fn dispose(&self) {
        log::trace!("disposing worker scope {}", self.scope.id().as_u64());
        self.scope.cancel();
    }

    fn is_disposed(&self) -> bool {
        !self.scope.is_active()
    }
}
