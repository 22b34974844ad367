#![forbid(unsafe_code)]

//! Scheduling and the combined host trait.

use std::rc::Rc;

use crate::element::Element;
use crate::error::{HostError, Result};
use crate::event_loop::Task;
use crate::watch::{AttributeWatcher, MutationCallback, WatchGuard};

/// Deferred execution provided by the host.
pub trait Scheduler {
    /// Run `task` with zero delay, but only after every watcher delivery
    /// already queued has been processed.
    fn defer(&self, task: Task);

    /// Run `task` once the next update flush has completed.
    fn after_flush(&self, task: Task);
}

/// Everything the sync engine needs from its environment.
pub trait Host: AttributeWatcher + Scheduler {
    /// Whether a live document is available. A non-interactive host makes
    /// the engine a silent no-op.
    fn is_interactive(&self) -> bool {
        true
    }
}

/// Host for rendering contexts without a document.
///
/// Never watches anything and drops every scheduled task.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessHost;

impl AttributeWatcher for HeadlessHost {
    fn watch(
        &self,
        _element: &Rc<dyn Element>,
        _attributes: &[String],
        _callback: MutationCallback,
    ) -> Result<WatchGuard> {
        Err(HostError::NotInteractive)
    }
}

impl Scheduler for HeadlessHost {
    fn defer(&self, _task: Task) {}

    fn after_flush(&self, _task: Task) {}
}

impl Host for HeadlessHost {
    fn is_interactive(&self) -> bool {
        false
    }
}
