//! Cancellation handles

use crate::scope::Scope;
use once_cell::sync::Lazy;
use std::sync::Arc;

/// Handle to a unit of work: query whether it is done and cancel it
///
/// Clones share the underlying scope, so disposing any clone disposes the
/// work.
#[derive(Clone)]
pub struct CancelHandle {
    scope: Arc<Scope>,
}

impl CancelHandle {
    /// Bind a handle to a scope
    pub fn new(scope: Arc<Scope>) -> Self {
        Self { scope }
    }

    /// Shared inert handle that is already disposed
    ///
    /// Returned for submissions that arrive after shutdown; holding or
    /// disposing it has no effect on anything.
    pub fn cancelled() -> Self {
        static CANCELLED: Lazy<CancelHandle> = Lazy::new(|| {
            let scope = Scope::root();
            scope.cancel();
            CancelHandle { scope }
        });
        CANCELLED.clone()
    }

    /// Cancel the underlying work
    ///
    /// Idempotent; a no-op once the work has completed.
    pub fn dispose(&self) {
        self.scope.cancel();
    }

    /// True once the work has completed or been cancelled
    pub fn is_disposed(&self) -> bool {
        !self.scope.is_active()
    }

    /// The scope this handle is bound to
    pub fn scope(&self) -> &Arc<Scope> {
        &self.scope
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::ScopeState;

    #[test]
    fn test_handle_tracks_scope() {
        let scope = Scope::root();
        let handle = CancelHandle::new(scope.clone());
        assert!(!handle.is_disposed());

        handle.dispose();
        assert!(handle.is_disposed());
        assert_eq!(scope.state(), ScopeState::Cancelled);
    }

    #[test]
    fn test_completed_work_reports_disposed() {
        let scope = Scope::root();
        let handle = CancelHandle::new(scope.clone());

        assert!(scope.complete());
        assert!(handle.is_disposed());

        // Disposing after completion changes nothing.
        handle.dispose();
        assert_eq!(scope.state(), ScopeState::Completed);
    }

    #[test]
    fn test_cancelled_singleton_is_inert() {
        let a = CancelHandle::cancelled();
        let b = CancelHandle::cancelled();

        assert!(a.is_disposed());
        a.dispose();
        assert!(b.is_disposed());
        assert!(Arc::ptr_eq(a.scope(), b.scope()));
    }

    #[test]
    fn test_clones_share_disposal() {
        let handle = CancelHandle::new(Scope::root());
        let clone = handle.clone();

        clone.dispose();
        assert!(handle.is_disposed());
    }
}
