use crate::scheduler::TimerId;
use std::cell::{Cell, RefCell};

/// Per-document enforcement state. Single-threaded; interior mutability
/// only so reentrant callbacks can read it while a DOM write is in flight.
#[derive(Debug, Default)]
pub struct EnforcementState {
    current_favicon_url: RefCell<Option<String>>,
    last_applied_location: RefCell<String>,
    suppressed: Cell<bool>,
    pending_reapply: Cell<Option<TimerId>>,
    navigation_subscribed: Cell<bool>,
    observer_active: Cell<bool>,
}

/// Point-in-time copy of [`EnforcementState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnforcementSnapshot {
    pub current_favicon_url: Option<String>,
    pub last_applied_location: String,
    pub suppressed: bool,
    pub pending_reapply: Option<TimerId>,
    pub navigation_subscribed: bool,
    pub observer_active: bool,
}

impl EnforcementState {
    pub fn desired(&self) -> Option<String> {
        self.current_favicon_url.borrow().clone()
    }

    pub fn set_desired(&self, url: Option<String>) {
        *self.current_favicon_url.borrow_mut() = url;
    }

    pub fn last_applied_location(&self) -> String {
        self.last_applied_location.borrow().clone()
    }

    pub fn set_last_applied_location(&self, location: String) {
        *self.last_applied_location.borrow_mut() = location;
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed.get()
    }

    /// Raises the self-mutation guard until the returned value is dropped.
    pub fn suppress(&self) -> SuppressGuard<'_> {
        let previous = self.suppressed.replace(true);
        SuppressGuard {
            flag: &self.suppressed,
            previous,
        }
    }

    pub fn pending_reapply(&self) -> Option<TimerId> {
        self.pending_reapply.get()
    }

    pub fn set_pending_reapply(&self, timer: Option<TimerId>) {
        self.pending_reapply.set(timer);
    }

    pub fn navigation_subscribed(&self) -> bool {
        self.navigation_subscribed.get()
    }

    pub fn mark_navigation_subscribed(&self) {
        self.navigation_subscribed.set(true);
    }

    pub fn observer_active(&self) -> bool {
        self.observer_active.get()
    }

    pub fn mark_observer_active(&self) {
        self.observer_active.set(true);
    }

    pub fn snapshot(&self) -> EnforcementSnapshot {
        EnforcementSnapshot {
            current_favicon_url: self.desired(),
            last_applied_location: self.last_applied_location(),
            suppressed: self.is_suppressed(),
            pending_reapply: self.pending_reapply(),
            navigation_subscribed: self.navigation_subscribed(),
            observer_active: self.observer_active(),
        }
    }
}

/// Restores the guard on drop, so an early `?` return cannot leave it raised.
pub struct SuppressGuard<'a> {
    flag: &'a Cell<bool>,
    previous: bool,
}

impl Drop for SuppressGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(self.previous);
    }
}
