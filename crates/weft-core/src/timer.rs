//! Timer thread for delayed callbacks
//!
//! Instead of polling for due entries, the timer thread waits for the next
//! deadline using condvar timeouts; registering an earlier deadline wakes it
//! so it can re-arm.

use crate::{WeftError, WeftResult};
use parking_lot::{Condvar, Mutex};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

type TimerFn = Box<dyn FnOnce() + Send>;

/// Entry in the timer heap
struct TimerEntry {
    /// When to fire
    deadline: Instant,
    /// Registration order, to break deadline ties
    seq: u64,
    /// Callback to invoke
    callback: TimerFn,
}

// Reverse ordering for min-heap (earliest deadline first). The seq tiebreak
// keeps the ordering total without inspecting callbacks.
impl Ord for TimerEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deadline
            .cmp(&self.deadline)
            .then(other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl Eq for TimerEntry {}

/// Timer thread state
struct TimerState {
    /// Entries waiting to fire, earliest deadline first
    pending: BinaryHeap<TimerEntry>,
}

/// Timer thread firing callbacks at their deadlines
pub struct TimerThread {
    /// Internal state protected by mutex
    state: Mutex<TimerState>,
    /// Condvar to wake the timer thread on registration or shutdown
    notify: Condvar,
    /// Shutdown signal
    shutdown: AtomicBool,
    /// Registration counter
    seq: AtomicU64,
    /// Thread handle
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl TimerThread {
    /// Create a new timer thread (not yet started)
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(TimerState {
                pending: BinaryHeap::new(),
            }),
            notify: Condvar::new(),
            shutdown: AtomicBool::new(false),
            seq: AtomicU64::new(0),
            handle: Mutex::new(None),
        })
    }

    /// Start the timer thread
    pub fn start(self: &Arc<Self>) -> WeftResult<()> {
        let timer = Arc::clone(self);

        let handle = thread::Builder::new()
            .name("weft-timer".to_string())
            .spawn(move || {
                timer.run_loop();
            })
            .map_err(|source| WeftError::ThreadSpawn {
                name: "weft-timer",
                source,
            })?;

        *self.handle.lock() = Some(handle);
        Ok(())
    }

    /// Stop the timer thread
    pub fn stop(&self) {
        self.shutdown.store(true, AtomicOrdering::Release);
        // Take the lock once so the notify cannot land between the loop's
        // shutdown re-check and its wait.
        drop(self.state.lock());
        self.notify.notify_one();

        if let Some(handle) = self.handle.lock().take() {
            let start = Instant::now();
            let timeout = Duration::from_secs(2);
            loop {
                if handle.is_finished() {
                    let _ = handle.join();
                    return;
                }
                if start.elapsed() > timeout {
                    drop(handle);
                    return;
                }
                thread::sleep(Duration::from_millis(5));
            }
        }
    }

    /// Register `callback` to fire at `deadline`
    pub fn register(&self, deadline: Instant, callback: impl FnOnce() + Send + 'static) {
        let seq = self.seq.fetch_add(1, AtomicOrdering::Relaxed);
        let mut state = self.state.lock();
        state.pending.push(TimerEntry {
            deadline,
            seq,
            callback: Box::new(callback),
        });
        // The new entry might need to fire earlier than the current wait.
        self.notify.notify_one();
    }

    /// Timer thread main loop
    fn run_loop(&self) {
        loop {
            if self.shutdown.load(AtomicOrdering::Acquire) {
                break;
            }

            let mut state = self.state.lock();

            // Re-check shutdown after acquiring the lock to close the race
            // with stop() setting the flag between our first check and here.
            if self.shutdown.load(AtomicOrdering::Acquire) {
                break;
            }

            // Collect everything that is due, then fire outside the lock so
            // a slow callback cannot block registrations.
            let now = Instant::now();
            let mut due: Vec<TimerFn> = Vec::new();
            while let Some(entry) = state.pending.peek() {
                if entry.deadline <= now {
                    due.push(state.pending.pop().unwrap().callback);
                } else {
                    break;
                }
            }

            if !due.is_empty() {
                drop(state);
                for callback in due {
                    callback();
                }
                continue;
            }

            if let Some(next) = state.pending.peek() {
                let now = Instant::now();
                if next.deadline > now {
                    let timeout = next.deadline - now;
                    // Wait with timeout - wakes early if an earlier entry
                    // is registered.
                    self.notify.wait_for(&mut state, timeout);
                }
            } else {
                // Nothing pending, wait for a registration.
                self.notify.wait(&mut state);
            }
        }

        log::trace!("timer thread shutting down");
    }

    /// Number of entries not yet fired (for tests and stats)
    pub fn pending_count(&self) -> usize {
        self.state.lock().pending.len()
    }
}

impl Drop for TimerThread {
    fn drop(&mut self) {
        self.stop();
    }
}
