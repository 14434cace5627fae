#![forbid(unsafe_code)]

//! Single-threaded deferred completion.
//!
//! A [`Deferred`] is the producer half of a one-shot completion signal; a
//! [`Completion`] is the consumer half. Both are cheap `Rc` handles to the
//! same inner state, so a completion can be stored, cloned, and chained.
//!
//! # Invariants
//!
//! 1. A deferred resolves at most once; repeated [`Deferred::resolve`] calls
//!    are no-ops.
//! 2. Continuations run in registration order, outside any internal borrow,
//!    so a continuation may register further continuations or resolve other
//!    deferreds.
//! 3. [`Completion::then`] on an already-resolved completion runs the
//!    continuation immediately, on the caller's stack.
//!
//! # Failure Modes
//!
//! - Dropping an unresolved [`Deferred`] drops all pending continuations
//!   without running them. This is deliberate: it is how in-flight work
//!   belonging to a torn-down widget disappears silently.

use std::cell::RefCell;
use std::rc::Rc;

struct Inner {
    resolved: bool,
    continuations: Vec<Box<dyn FnOnce()>>,
}

/// Producer half of a one-shot completion.
pub struct Deferred {
    inner: Rc<RefCell<Inner>>,
}

impl Deferred {
    /// Create a new, unresolved deferred.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                resolved: false,
                continuations: Vec::new(),
            })),
        }
    }

    /// Get a consumer handle for this deferred.
    #[must_use]
    pub fn completion(&self) -> Completion {
        Completion {
            inner: Rc::clone(&self.inner),
        }
    }

    /// Resolve the deferred, running all registered continuations.
    ///
    /// Resolving twice is a no-op.
    pub fn resolve(&self) {
        let continuations = {
            let mut inner = self.inner.borrow_mut();
            if inner.resolved {
                return;
            }
            inner.resolved = true;
            std::mem::take(&mut inner.continuations)
        };
        for continuation in continuations {
            continuation();
        }
    }
}

impl Default for Deferred {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Deferred {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deferred")
            .field("resolved", &self.inner.borrow().resolved)
            .finish()
    }
}

/// Consumer half of a one-shot completion.
pub struct Completion {
    inner: Rc<RefCell<Inner>>,
}

impl Completion {
    /// An already-resolved completion.
    ///
    /// Useful for optional asynchronous steps that are configured away:
    /// continuations chained onto it run immediately.
    #[must_use]
    pub fn resolved() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                resolved: true,
                continuations: Vec::new(),
            })),
        }
    }

    /// Whether the completion has resolved.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.inner.borrow().resolved
    }

    /// Register a continuation.
    ///
    /// Runs immediately if the completion is already resolved, otherwise when
    /// the producing [`Deferred`] resolves.
    pub fn then(&self, continuation: impl FnOnce() + 'static) {
        {
            let mut inner = self.inner.borrow_mut();
            if !inner.resolved {
                inner.continuations.push(Box::new(continuation));
                return;
            }
        }
        continuation();
    }
}

impl Clone for Completion {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl std::fmt::Debug for Completion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Completion")
            .field("resolved", &self.inner.borrow().resolved)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn resolve_runs_continuations_in_order() {
        let deferred = Deferred::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let order = Rc::clone(&order);
            deferred.completion().then(move || order.borrow_mut().push(tag));
        }

        assert!(order.borrow().is_empty());
        deferred.resolve();
        assert_eq!(*order.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn then_after_resolve_runs_immediately() {
        let deferred = Deferred::new();
        deferred.resolve();

        let ran = Rc::new(Cell::new(false));
        let flag = Rc::clone(&ran);
        deferred.completion().then(move || flag.set(true));
        assert!(ran.get());
    }

    #[test]
    fn already_resolved_constructor() {
        let completion = Completion::resolved();
        assert!(completion.is_resolved());

        let ran = Rc::new(Cell::new(false));
        let flag = Rc::clone(&ran);
        completion.then(move || flag.set(true));
        assert!(ran.get());
    }

    #[test]
    fn resolve_is_idempotent() {
        let deferred = Deferred::new();
        let count = Rc::new(Cell::new(0));
        let counter = Rc::clone(&count);
        deferred.completion().then(move || counter.set(counter.get() + 1));

        deferred.resolve();
        deferred.resolve();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn drop_unresolved_drops_continuations() {
        let ran = Rc::new(Cell::new(false));
        {
            let deferred = Deferred::new();
            let flag = Rc::clone(&ran);
            deferred.completion().then(move || flag.set(true));
        }
        assert!(!ran.get(), "dropped deferred must not run continuations");
    }

    #[test]
    fn continuation_may_chain_further_continuations() {
        let deferred = Deferred::new();
        let completion = deferred.completion();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let outer_seen = Rc::clone(&seen);
        let inner_target = completion.clone();
        completion.then(move || {
            outer_seen.borrow_mut().push("outer");
            let inner_seen = Rc::clone(&outer_seen);
            // Registered mid-resolution against an already-resolved completion.
            inner_target.then(move || inner_seen.borrow_mut().push("inner"));
        });

        deferred.resolve();
        assert_eq!(*seen.borrow(), vec!["outer", "inner"]);
    }

    #[test]
    fn completion_reports_resolution() {
        let deferred = Deferred::new();
        let completion = deferred.completion();
        assert!(!completion.is_resolved());
        deferred.resolve();
        assert!(completion.is_resolved());
    }
}
