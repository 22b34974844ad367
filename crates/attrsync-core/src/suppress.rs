#![forbid(unsafe_code)]

//! Self-write suppression.
//!
//! Every attribute write the engine performs is observed again by its own
//! watcher, but only later, in a batched delivery. To keep those records
//! from being reported as external changes, a write opens a suppression
//! window and schedules its closing as deferred work, which the host runs
//! only after all pending deliveries.
//!
//! Windows are tracked with a generation counter rather than a bare flag:
//! [`WriteSuppression::begin`] bumps the generation and returns a
//! [`SuppressionToken`]; [`WriteSuppression::release`] only closes the window
//! if no newer write has happened since. A burst of writes therefore stays
//! suppressed until the deferred release of the *last* one runs.
//!
//! The window is shared by all bindings of one engine instance. State lives
//! in `Cell`s: single-threaded use only.

use std::cell::Cell;

/// Proof of one self-write, used to release its suppression window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuppressionToken(u64);

#[derive(Debug, Default)]
pub struct WriteSuppression {
    generation: Cell<u64>,
    active: Cell<bool>,
}

impl WriteSuppression {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open (or extend) the window for a write about to happen.
    pub fn begin(&self) -> SuppressionToken {
        let generation = self.generation.get().wrapping_add(1);
        self.generation.set(generation);
        self.active.set(true);
        SuppressionToken(generation)
    }

    /// Close the window if `token` belongs to the latest write.
    ///
    /// Returns `true` when the window was closed.
    pub fn release(&self, token: SuppressionToken) -> bool {
        if self.generation.get() == token.0 {
            self.active.set(false);
            true
        } else {
            false
        }
    }

    /// Whether records observed now should be treated as self-writes.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.get()
    }
}
