//! Shared test doubles for the integration suites
#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};
use weft_bridge::{Scheduler, Worker};
use weft_core::scope::Scope;
use weft_core::{CancelHandle, TaskFn, TimerThread};

/// Native scheduler double backed by a timer thread
///
/// Every submission, immediate or delayed, fires from the timer thread.
/// Good enough to drive the scheduler-to-executor direction; it makes no
/// sequential-worker guarantees.
pub struct TestScheduler {
    timer: Arc<TimerThread>,
    root: Arc<Scope>,
}

impl TestScheduler {
    pub fn new() -> Arc<Self> {
        let timer = TimerThread::new();
        timer.start().expect("Failed to start timer thread");
        Arc::new(Self {
            timer,
            root: Scope::root(),
        })
    }

    fn schedule_in(&self, parent: &Arc<Scope>, task: TaskFn, delay: Duration) -> CancelHandle {
        if !parent.is_active() {
            return CancelHandle::cancelled();
        }
        let scope = parent.child();
        let guard = scope.clone();
        self.timer.register(Instant::now() + delay, move || {
            if guard.complete() {
                task();
            }
        });
        CancelHandle::new(scope)
    }
}

impl Scheduler for TestScheduler {
    fn schedule_direct(&self, task: TaskFn, delay: Duration) -> CancelHandle {
        self.schedule_in(&self.root, task, delay)
    }

    fn create_worker(&self) -> Arc<dyn Worker> {
        Arc::new(TestWorker {
            timer: self.timer.clone(),
            scope: self.root.child(),
        })
    }

    fn shutdown(&self) {
        self.root.cancel();
    }
}

struct TestWorker {
    timer: Arc<TimerThread>,
    scope: Arc<Scope>,
}

impl Worker for TestWorker {
    fn schedule(&self, task: TaskFn, delay: Duration) -> CancelHandle {
        if !self.scope.is_active() {
            return CancelHandle::cancelled();
        }
        let scope = self.scope.child();
        let guard = scope.clone();
        self.timer.register(Instant::now() + delay, move || {
            if guard.complete() {
                task();
            }
        });
        CancelHandle::new(scope)
    }

    fn dispose(&self) {
        self.scope.cancel();
    }

    fn is_disposed(&self) -> bool {
        !self.scope.is_active()
    }
}

/// Poll `cond` until it holds or `deadline_ms` elapses
pub fn wait_until(deadline_ms: u64, cond: impl Fn() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < Duration::from_millis(deadline_ms) {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    cond()
}
