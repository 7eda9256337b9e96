//! Cancellation scope tree
//!
//! Scopes form an explicit tree with supervisor semantics: cancelling a
//! scope cancels all of its descendants and never touches ancestors or
//! siblings, and a failing task body is reported through a
//! [`FailureSink`](crate::sink::FailureSink) rather than through the tree.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Weak};

/// Unique identifier for a scope
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ScopeId(u64);

static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

impl ScopeId {
    fn next() -> Self {
        ScopeId(NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the numeric ID value
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Lifecycle state of a scope
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ScopeState {
    /// Work bound to this scope may still start
    Active,
    /// Cancelled, together with every descendant
    Cancelled,
    /// Finished normally
    Completed,
}

const ACTIVE: u8 = 0;
const CANCELLED: u8 = 1;
const COMPLETED: u8 = 2;

type CancelHook = Box<dyn FnOnce() + Send>;

/// A cancellation domain in the scope tree
pub struct Scope {
    id: ScopeId,

    /// Lifecycle state (ACTIVE / CANCELLED / COMPLETED)
    state: AtomicU8,

    /// Parent node; empty for roots and never upgraded after detach
    parent: Weak<Scope>,

    /// Live children, pruned as they complete
    children: Mutex<Vec<Arc<Scope>>>,

    /// Hooks run once when this scope is cancelled
    cancel_hooks: Mutex<Vec<CancelHook>>,
}

impl Scope {
    fn node(parent: Weak<Scope>) -> Scope {
        Scope {
            id: ScopeId::next(),
            state: AtomicU8::new(ACTIVE),
            parent,
            children: Mutex::new(Vec::new()),
            cancel_hooks: Mutex::new(Vec::new()),
        }
    }

    /// Create a detached root scope
    pub fn root() -> Arc<Self> {
        Arc::new(Self::node(Weak::new()))
    }

    /// Create a child scope
    ///
    /// A child of a cancelled or completed parent is born cancelled, so work
    /// bound to it never starts.
    pub fn child(self: &Arc<Self>) -> Arc<Self> {
        let child = Arc::new(Self::node(Arc::downgrade(self)));
        {
            // The state check happens under the children lock so a child is
            // either registered before the cancel walk takes the list, or
            // observes the cancelled state here.
            let mut children = self.children.lock();
            if self.state.load(Ordering::Acquire) == ACTIVE {
                children.push(child.clone());
                return child;
            }
        }
        child.state.store(CANCELLED, Ordering::Release);
        child
    }

    /// Current lifecycle state
    pub fn state(&self) -> ScopeState {
        match self.state.load(Ordering::Acquire) {
            ACTIVE => ScopeState::Active,
            CANCELLED => ScopeState::Cancelled,
            _ => ScopeState::Completed,
        }
    }

    /// True while work bound to this scope may still start
    pub fn is_active(&self) -> bool {
        self.state.load(Ordering::Acquire) == ACTIVE
    }

    /// Scope identifier
    pub fn id(&self) -> ScopeId {
        self.id
    }

    /// Number of live children (for tests and stats)
    pub fn child_count(&self) -> usize {
        self.children.lock().len()
    }

    /// Cancel this scope and, depth-first, every descendant
    ///
    /// Idempotent; a no-op once the scope has completed. Cancel hooks run
    /// before the child walk.
    pub fn cancel(&self) {
        if self
            .state
            .compare_exchange(ACTIVE, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let hooks = std::mem::take(&mut *self.cancel_hooks.lock());
        for hook in hooks {
            hook();
        }

        let children = std::mem::take(&mut *self.children.lock());
        for child in children {
            child.cancel();
        }

        self.detach();
    }

    /// Mark this scope completed and detach it from its parent
    ///
    /// Returns true if this call performed the transition; run sites racing
    /// against cancellation use this as their commit point.
    pub fn complete(&self) -> bool {
        if self
            .state
            .compare_exchange(ACTIVE, COMPLETED, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        // Completed scopes drop their hooks without running them.
        self.cancel_hooks.lock().clear();
        self.detach();
        true
    }

    /// Run `hook` once this scope is cancelled; immediately if it already
    /// is. Hooks are dropped unrun if the scope completes instead.
    pub fn on_cancel(&self, hook: impl FnOnce() + Send + 'static) {
        {
            let mut hooks = self.cancel_hooks.lock();
            match self.state.load(Ordering::Acquire) {
                ACTIVE => {
                    hooks.push(Box::new(hook));
                    return;
                }
                COMPLETED => return,
                _ => {}
            }
        }
        hook();
    }

    fn detach(&self) {
        if let Some(parent) = self.parent.upgrade() {
            parent.children.lock().retain(|c| c.id != self.id);
        }
    }
}
