#![forbid(unsafe_code)]

//! Shared observable values with change notification.
//!
//! # Design
//!
//! [`Observable<T>`] stores its value, a version counter and the subscriber
//! list behind one `Rc<RefCell<..>>`. Subscribers are held as `Weak`
//! callbacks; the strong side lives in the [`Subscription`] returned by
//! [`Observable::subscribe`]. Dropping the guard is therefore enough to
//! unsubscribe, and dead entries are pruned on the next notification.
//!
//! Notification happens after the internal borrow is released, so callbacks
//! may read the observable, write it again, or subscribe new callbacks
//! without tripping a `RefCell` panic.
//!
//! # Failure Modes
//!
//! - **Re-entrant write during notification**: the nested `set` runs its own
//!   full notification pass first; remaining callbacks of the outer pass still
//!   see the outer value. Callers that need the latest value should read it
//!   through [`Observable::get`] instead of trusting the argument.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type Callback<T> = dyn Fn(&T);

struct ObservableInner<T> {
    value: T,
    /// Bumped once per value-changing mutation.
    version: u64,
    subscribers: Vec<Weak<Callback<T>>>,
}

/// A shared, version-tracked value that notifies subscribers on change.
///
/// Cloning an `Observable` creates a new handle to the **same** value.
pub struct Observable<T> {
    inner: Rc<RefCell<ObservableInner<T>>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Observable")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .field("subscribers", &inner.subscribers.len())
            .finish()
    }
}

impl<T: Default + Clone + PartialEq + 'static> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    /// Create a new observable holding `value` at version 0.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ObservableInner {
                value,
                version: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Clone out the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Access the current value by reference.
    ///
    /// # Panics
    ///
    /// Panics if the closure writes to the same observable.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Replace the value, notifying subscribers if it changed.
    ///
    /// Returns `true` when the value actually changed.
    pub fn set(&self, value: T) -> bool {
        let callbacks = {
            let mut inner = self.inner.borrow_mut();
            if inner.value == value {
                return false;
            }
            inner.value = value;
            inner.version += 1;
            inner.subscribers.retain(|weak| weak.strong_count() > 0);
            inner
                .subscribers
                .iter()
                .filter_map(Weak::upgrade)
                .collect::<Vec<_>>()
        };
        let snapshot = self.get();
        for callback in callbacks {
            callback(&snapshot);
        }
        true
    }

    /// Mutate the value in place through a copy, then [`set`](Self::set) it.
    pub fn update(&self, f: impl FnOnce(&mut T)) -> bool {
        let mut next = self.get();
        f(&mut next);
        self.set(next)
    }

    /// Register `callback` to run after every value change.
    ///
    /// The callback is not invoked for the current value. It stays active
    /// until the returned [`Subscription`] is dropped.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let strong: Rc<Callback<T>> = Rc::new(callback);
        self.inner
            .borrow_mut()
            .subscribers
            .push(Rc::downgrade(&strong));
        Subscription {
            _callback: Box::new(strong),
        }
    }

    /// Current version. Starts at 0, increments once per change.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .borrow()
            .subscribers
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    /// Whether two handles share the same underlying cell.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

/// RAII guard for an [`Observable`] subscription.
///
/// Holds the only strong reference to the callback; dropping it
/// unsubscribes.
pub struct Subscription {
    _callback: Box<dyn Any>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn set_bumps_version_and_notifies() {
        let cell = Observable::new(1);
        let seen = Rc::new(Cell::new(0));
        let seen_clone = Rc::clone(&seen);
        let _sub = cell.subscribe(move |v| seen_clone.set(*v));

        assert!(cell.set(5));
        assert_eq!(cell.get(), 5);
        assert_eq!(cell.version(), 1);
        assert_eq!(seen.get(), 5);
    }

    #[test]
    fn equal_set_is_noop() {
        let cell = Observable::new("a".to_string());
        let calls = Rc::new(Cell::new(0u32));
        let calls_clone = Rc::clone(&calls);
        let _sub = cell.subscribe(move |_| calls_clone.set(calls_clone.get() + 1));

        assert!(!cell.set("a".to_string()));
        assert_eq!(cell.version(), 0);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn subscribe_does_not_fire_immediately() {
        let cell = Observable::new(3);
        let calls = Rc::new(Cell::new(0u32));
        let calls_clone = Rc::clone(&calls);
        let _sub = cell.subscribe(move |_| calls_clone.set(calls_clone.get() + 1));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn notification_order_is_registration_order() {
        let cell = Observable::new(0);
        let log = Rc::new(RefCell::new(Vec::new()));
        let l1 = Rc::clone(&log);
        let l2 = Rc::clone(&log);
        let _a = cell.subscribe(move |_| l1.borrow_mut().push("first"));
        let _b = cell.subscribe(move |_| l2.borrow_mut().push("second"));

        cell.set(1);
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let cell = Observable::new(0);
        let calls = Rc::new(Cell::new(0u32));
        let calls_clone = Rc::clone(&calls);
        let sub = cell.subscribe(move |_| calls_clone.set(calls_clone.get() + 1));
        assert_eq!(cell.subscriber_count(), 1);

        drop(sub);
        assert_eq!(cell.subscriber_count(), 0);
        cell.set(9);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn callbacks_may_write_reentrantly() {
        let cell = Observable::new(0);
        let writer = cell.clone();
        let _sub = cell.subscribe(move |v| {
            if *v < 3 {
                writer.set(*v + 1);
            }
        });

        cell.set(1);
        assert_eq!(cell.get(), 3);
        assert_eq!(cell.version(), 3);
    }

    #[test]
    fn update_goes_through_set() {
        let cell = Observable::new(vec![1, 2]);
        assert!(cell.update(|v| v.push(3)));
        assert_eq!(cell.get(), vec![1, 2, 3]);
        assert!(!cell.update(|_| {}));
        assert_eq!(cell.version(), 1);
    }

    #[test]
    fn clones_share_state() {
        let a = Observable::new(10);
        let b = a.clone();
        b.set(20);
        assert_eq!(a.get(), 20);
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&Observable::new(20)));
    }

    #[test]
    fn debug_format() {
        let cell = Observable::new(42);
        let dbg = format!("{cell:?}");
        assert!(dbg.contains("Observable"));
        assert!(dbg.contains("42"));
    }

    // ── Property tests ──

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn version_and_notifications_track_changing_sets(
            values in proptest::collection::vec(0u8..4, 0..60),
        ) {
            let cell = Observable::new(0u8);
            let calls = Rc::new(Cell::new(0u64));
            let calls_clone = Rc::clone(&calls);
            let _sub = cell.subscribe(move |_| calls_clone.set(calls_clone.get() + 1));

            let mut current = 0u8;
            let mut changes = 0u64;
            for value in values {
                let changed = cell.set(value);
                prop_assert_eq!(changed, value != current);
                if changed {
                    changes += 1;
                    current = value;
                }
                prop_assert_eq!(cell.version(), changes);
                prop_assert_eq!(calls.get(), changes);
                prop_assert_eq!(cell.get(), current);
            }
        }

        #[test]
        fn every_subscriber_runs_in_registration_order(
            count in 1usize..8,
            writes in proptest::collection::vec(1u32..100, 1..10),
        ) {
            let cell = Observable::new(0u32);
            let log = Rc::new(RefCell::new(Vec::new()));
            let _subs: Vec<Subscription> = (0..count)
                .map(|index| {
                    let log = Rc::clone(&log);
                    cell.subscribe(move |_| log.borrow_mut().push(index))
                })
                .collect();

            let mut expected = Vec::new();
            for value in writes {
                if cell.set(value) {
                    expected.extend(0..count);
                }
            }
            prop_assert_eq!(log.borrow().clone(), expected);
        }
    }
}
