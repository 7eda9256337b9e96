//! A unit of work enqueued on a sequential worker

use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use weft_core::scope::Scope;
use weft_core::sink::{FailureSink, TaskFailure};
use weft_core::{Executor, TaskFn};

// Phase machine. The queue decides *position*; the phase decides *when the
// body may start* relative to the pre-armed delay.
const PENDING: u8 = 0; // delay armed, not yet due, not yet dequeued
const READY: u8 = 1; // due (or zero delay), waiting for its queue turn
const PARKED: u8 = 2; // dequeued before the delay elapsed
const FINISHED: u8 = 3;

/// Task submitted to a [`SequentialWorker`](crate::SequentialWorker)
///
/// The delay timer is armed at submission time, independently of queue
/// position, so a pending delay never blocks the queue from advancing past
/// this task once it has been dequeued.
pub(crate) struct DelayedTask {
    scope: Arc<Scope>,
    body: Mutex<Option<TaskFn>>,
    phase: AtomicU8,
    sink: Arc<dyn FailureSink>,
}

impl DelayedTask {
    /// Create the task and, for a positive delay, arm its timer on
    /// `executor`
    ///
    /// The timer registration is disposed if the task scope is cancelled
    /// first.
    pub(crate) fn new(
        scope: Arc<Scope>,
        body: TaskFn,
        delay: Duration,
        executor: &dyn Executor,
        sink: Arc<dyn FailureSink>,
    ) -> Arc<Self> {
        let task = Arc::new(Self {
            scope: scope.clone(),
            body: Mutex::new(Some(body)),
            phase: AtomicU8::new(if delay.is_zero() { READY } else { PENDING }),
            sink,
        });

        if !delay.is_zero() {
            let armed = task.clone();
            let registration =
                executor.invoke_on_timeout(delay, Box::new(move || armed.timer_fired()));
            scope.on_cancel(move || registration.dispose());
        }

        task
    }

    /// Consumer-loop entry point, called when this task reaches the head of
    /// the queue
    ///
    /// A ready task runs synchronously, blocking the consumer until the body
    /// returns; this is what serializes undelayed work. A task whose delay
    /// is still pending parks and returns immediately so the queue keeps
    /// advancing.
    pub(crate) fn execute(&self) {
        match self
            .phase
            .compare_exchange(PENDING, PARKED, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => {} // handed off to the timer fire
            Err(READY) => self.run_body(),
            Err(_) => {}
        }
    }

    /// Timer callback; runs on the executor
    fn timer_fired(&self) {
        match self
            .phase
            .compare_exchange(PENDING, READY, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => {} // not yet dequeued, waits for its queue turn
            Err(PARKED) => {
                // The consumer already moved past this task; run here, off
                // the loop.
                self.run_body();
            }
            Err(_) => {}
        }
    }

    fn run_body(&self) {
        if !self.scope.is_active() {
            return;
        }
        let body = self.body.lock().take();
        let Some(body) = body else { return };

        if let Err(payload) = catch_unwind(AssertUnwindSafe(body)) {
            self.sink.on_task_failure(TaskFailure::from_panic(payload));
        }
        self.phase.store(FINISHED, Ordering::Release);
        self.scope.complete();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use weft_core::{CancelHandle, Continuation};

    /// Executor double: dispatch runs inline, timeouts are held until the
    /// test fires them.
    struct ManualExecutor {
        timeouts: Mutex<Vec<(TaskFn, Arc<Scope>)>>,
    }

    impl ManualExecutor {
        fn new() -> Self {
            Self {
                timeouts: Mutex::new(Vec::new()),
            }
        }

        fn fire_next(&self) {
            let entry = {
                let mut timeouts = self.timeouts.lock();
                if timeouts.is_empty() {
                    None
                } else {
                    Some(timeouts.remove(0))
                }
            };
            if let Some((task, scope)) = entry {
                if scope.complete() {
                    task();
                }
            }
        }

        fn armed(&self) -> usize {
            self.timeouts.lock().len()
        }

        fn registration_scope(&self, index: usize) -> Arc<Scope> {
            self.timeouts.lock()[index].1.clone()
        }
    }

    impl Executor for ManualExecutor {
        fn dispatch(&self, task: TaskFn) {
            task();
        }

        fn schedule_resume_after_delay(&self, _delay: Duration, cont: Arc<Continuation>) {
            cont.resume();
        }

        fn invoke_on_timeout(&self, _delay: Duration, task: TaskFn) -> CancelHandle {
            let scope = Scope::root();
            self.timeouts.lock().push((task, scope.clone()));
            CancelHandle::new(scope)
        }
    }

    struct CollectSink {
        failures: Mutex<Vec<String>>,
    }

    impl CollectSink {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                failures: Mutex::new(Vec::new()),
            })
        }
    }

    impl FailureSink for CollectSink {
        fn on_task_failure(&self, failure: TaskFailure) {
            self.failures.lock().push(failure.message().to_string());
        }
    }

    fn flag_body(flag: &Arc<AtomicBool>) -> TaskFn {
        let flag = flag.clone();
        Box::new(move || flag.store(true, Ordering::Release))
    }

    #[test]
    fn test_zero_delay_runs_on_execute() {
        let executor = ManualExecutor::new();
        let sink = CollectSink::new();
        let ran = Arc::new(AtomicBool::new(false));

        let task = DelayedTask::new(
            Scope::root(),
            flag_body(&ran),
            Duration::ZERO,
            &executor,
            sink,
        );
        assert_eq!(executor.armed(), 0);

        task.execute();
        assert!(ran.load(Ordering::Acquire));
        assert!(!task.scope.is_active());
    }

    #[test]
    fn test_cancelled_task_never_runs() {
        let executor = ManualExecutor::new();
        let sink = CollectSink::new();
        let ran = Arc::new(AtomicBool::new(false));

        let scope = Scope::root();
        let task = DelayedTask::new(scope.clone(), flag_body(&ran), Duration::ZERO, &executor, sink);

        scope.cancel();
        task.execute();
        assert!(!ran.load(Ordering::Acquire));
    }

    #[test]
    fn test_panic_goes_to_sink() {
        let executor = ManualExecutor::new();
        let sink = CollectSink::new();

        let task = DelayedTask::new(
            Scope::root(),
            Box::new(|| panic!("body blew up")),
            Duration::ZERO,
            &executor,
            sink.clone(),
        );
        task.execute();

        assert_eq!(*sink.failures.lock(), vec!["body blew up".to_string()]);
        // The failure completed the task rather than poisoning anything.
        assert!(!task.scope.is_active());
    }

    #[test]
    fn test_delayed_task_parks_then_runs_on_fire() {
        let executor = ManualExecutor::new();
        let sink = CollectSink::new();
        let ran = Arc::new(AtomicBool::new(false));

        let task = DelayedTask::new(
            Scope::root(),
            flag_body(&ran),
            Duration::from_millis(100),
            &executor,
            sink,
        );
        assert_eq!(executor.armed(), 1);

        // Dequeued before the delay elapsed: parks, body does not run.
        task.execute();
        assert!(!ran.load(Ordering::Acquire));

        executor.fire_next();
        assert!(ran.load(Ordering::Acquire));
    }

    #[test]
    fn test_delay_elapsed_before_dequeue_runs_on_execute() {
        let executor = ManualExecutor::new();
        let sink = CollectSink::new();
        let ran = Arc::new(AtomicBool::new(false));

        let task = DelayedTask::new(
            Scope::root(),
            flag_body(&ran),
            Duration::from_millis(1),
            &executor,
            sink,
        );

        executor.fire_next();
        assert!(!ran.load(Ordering::Acquire));

        task.execute();
        assert!(ran.load(Ordering::Acquire));
    }

    #[test]
    fn test_cancel_disposes_timer_registration() {
        let executor = ManualExecutor::new();
        let sink = CollectSink::new();
        let ran = Arc::new(AtomicBool::new(false));

        let scope = Scope::root();
        let task = DelayedTask::new(
            scope.clone(),
            flag_body(&ran),
            Duration::from_millis(100),
            &executor,
            sink,
        );

        let registration = executor.registration_scope(0);
        scope.cancel();
        assert!(!registration.is_active());

        executor.fire_next();
        task.execute();
        assert!(!ran.load(Ordering::Acquire));
    }
}
