//! Observation contract for reactive dependencies.
//!
//! A dynamic region does not care what kind of state it depends on,
//! only that the state can call it back on change. [`Observable`] is
//! that seam: the engine's `State` implements it, and anything else
//! observable can too.

use std::sync::Arc;

/// Observer callback. Receives no arguments; an observer reads current
/// values from the states it already holds.
pub type ObserverFn = Arc<dyn Fn() + Send + Sync>;

/// Handle for removing a registered observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

impl ObserverId {
    /// Wraps a raw observer slot number.
    #[must_use]
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw slot number.
    #[must_use]
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// A value that notifies observers when it changes.
///
/// Notification order follows registration order, and observers run
/// synchronously with the mutation that triggered them.
pub trait Observable: Send + Sync {
    /// Registers an observer; returns a handle for removal.
    fn observe(&self, callback: ObserverFn) -> ObserverId;

    /// Removes a previously registered observer. Unknown ids are
    /// ignored.
    fn unobserve(&self, id: ObserverId);
}
