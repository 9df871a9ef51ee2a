//! Reactive state - an observable value.
//!
//! [`State`] owns a value and an ordered observer list. `set()` with an
//! equal value is a no-op; otherwise every observer runs synchronously,
//! in registration order, before `set()` returns.
//!
//! # Reentrancy
//!
//! An observer may call `set()` on the very state that is notifying it.
//! That nested write is **queued and drained**: it is recorded, the
//! current notification pass completes undisturbed, and the queued
//! value is then applied (with its own equality check and notification
//! pass) by the outer `set()` before it returns. No recursion, no lost
//! update.
//!
//! # Observer isolation
//!
//! A panicking observer must not take the notifying `set()` down with
//! it, nor starve the remaining observers. Each observer runs inside
//! `catch_unwind`; a panic is logged to the developer console and
//! notification continues.

use janus_blocks::{Observable, ObserverFn, ObserverId};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// An observable value.
///
/// Cloning shares the value: all clones see the same state and the
/// same observers.
///
/// # Example
///
/// ```
/// use janus_engine::State;
///
/// let counter = State::new(0);
/// let seen = counter.clone();
/// counter.observe_fn(move || println!("now {}", seen.get()));
/// counter.set(1); // notifies
/// counter.set(1); // no-op
/// ```
pub struct State<T> {
    inner: Arc<StateInner<T>>,
}

impl<T> Clone for State<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

struct StateInner<T> {
    value: Mutex<T>,
    observers: Mutex<Vec<(ObserverId, ObserverFn)>>,
    next_observer: AtomicU64,
    pending: Mutex<VecDeque<T>>,
    draining: AtomicBool,
}

impl<T> State<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    /// Creates a state with an initial value.
    #[must_use]
    pub fn new(initial: T) -> Self {
        Self {
            inner: Arc::new(StateInner {
                value: Mutex::new(initial),
                observers: Mutex::new(Vec::new()),
                next_observer: AtomicU64::new(0),
                pending: Mutex::new(VecDeque::new()),
                draining: AtomicBool::new(false),
            }),
        }
    }

    /// Returns a clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.value.lock().clone()
    }

    /// Writes a new value, notifying observers iff it differs from the
    /// current one.
    ///
    /// Observers run synchronously, in registration order, before this
    /// returns, unless the call is reentrant (or racing another
    /// `set()`), in which case the value is queued and applied by the
    /// pass already in progress.
    pub fn set(&self, value: T) {
        self.inner.pending.lock().push_back(value);
        if self.inner.draining.swap(true, Ordering::SeqCst) {
            // A pass is already running (possibly this thread, further
            // up the stack). It will drain our value.
            return;
        }

        loop {
            let next = self.inner.pending.lock().pop_front();
            match next {
                Some(value) => {
                    let changed = {
                        let mut current = self.inner.value.lock();
                        if *current == value {
                            false
                        } else {
                            *current = value;
                            true
                        }
                    };
                    if changed {
                        self.notify();
                    }
                }
                None => {
                    self.inner.draining.store(false, Ordering::SeqCst);
                    // A value enqueued after the empty pop but before
                    // the flag cleared would be lost without this
                    // re-check.
                    if self.inner.pending.lock().is_empty() {
                        break;
                    }
                    if self.inner.draining.swap(true, Ordering::SeqCst) {
                        break;
                    }
                }
            }
        }
    }

    /// Registers an observer closure; returns its removal handle.
    pub fn observe_fn(&self, callback: impl Fn() + Send + Sync + 'static) -> ObserverId {
        self.observe(Arc::new(callback))
    }

    /// Returns a type-erased handle for region bindings.
    #[must_use]
    pub fn observable(&self) -> Arc<dyn Observable> {
        Arc::new(self.clone())
    }

    fn notify(&self) {
        // Snapshot so observers may register/remove observers without
        // deadlocking the pass.
        let snapshot: Vec<(ObserverId, ObserverFn)> = self.inner.observers.lock().clone();
        for (id, callback) in snapshot {
            let outcome =
                std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| callback()));
            if outcome.is_err() {
                tracing::error!(
                    code = "ENGINE_OBSERVER_PANIC",
                    observer = id.raw(),
                    "state observer panicked; continuing with remaining observers"
                );
            }
        }
    }
}

impl<T> Observable for State<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    fn observe(&self, callback: ObserverFn) -> ObserverId {
        let id = ObserverId::new(self.inner.next_observer.fetch_add(1, Ordering::Relaxed));
        self.inner.observers.lock().push((id, callback));
        id
    }

    fn unobserve(&self, id: ObserverId) {
        self.inner
            .observers
            .lock()
            .retain(|(existing, _)| *existing != id);
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for State<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("State").field(&*self.inner.value.lock()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn equal_writes_do_not_notify() {
        let state = State::new(0);
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        state.observe_fn(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        state.set(1);
        state.set(1);
        state.set(2);
        assert_eq!(fired.load(Ordering::SeqCst), 2);
        assert_eq!(state.get(), 2);
    }

    #[test]
    fn observers_run_in_registration_order() {
        let state = State::new(0);
        let order = Arc::new(Mutex::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            let order = order.clone();
            state.observe_fn(move || order.lock().push(tag));
        }
        state.set(1);
        assert_eq!(*order.lock(), ["first", "second", "third"]);
    }

    #[test]
    fn removed_observers_stop_firing() {
        let state = State::new(0);
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        let id = state.observe_fn(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        state.set(1);
        state.unobserve(id);
        state.set(2);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reentrant_set_is_queued_and_drained() {
        let state = State::new(0);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let inner = state.clone();
        let log = seen.clone();
        state.observe_fn(move || {
            let value = inner.get();
            log.lock().push(value);
            if value == 1 {
                // Nested write while the pass for 1 is still running.
                inner.set(2);
            }
        });

        state.set(1);
        // Both values were applied, each with one notification, and the
        // nested write landed after the pass for 1 completed.
        assert_eq!(*seen.lock(), [1, 2]);
        assert_eq!(state.get(), 2);
    }

    #[test]
    fn a_panicking_observer_does_not_starve_the_rest() {
        let state = State::new(0);
        state.observe_fn(|| panic!("observer defect"));
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        state.observe_fn(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        state.set(1);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(state.get(), 1);
    }
}
