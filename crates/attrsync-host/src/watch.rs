#![forbid(unsafe_code)]

//! Attribute mutation watching.
//!
//! A watcher is the host's asynchronous change feed for one element. It is
//! configured with a list of attribute names and always captures the value
//! each attribute held before the change. Records are queued as writes
//! happen and handed to the callback later, in batches, in write order.

use std::fmt;
use std::rc::Rc;

use crate::element::{Element, NodeId};
use crate::error::Result;

/// One observed attribute change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    /// Node whose attribute changed.
    pub target: NodeId,
    /// Name of the changed attribute.
    pub attribute: String,
    /// Content before the change (`None` if the attribute was absent).
    pub old_value: Option<String>,
}

impl MutationRecord {
    #[must_use]
    pub fn new(target: NodeId, attribute: impl Into<String>, old_value: Option<String>) -> Self {
        Self {
            target,
            attribute: attribute.into(),
            old_value,
        }
    }
}

/// Receives one batch of records per delivery.
pub type MutationCallback = Box<dyn FnMut(Vec<MutationRecord>)>;

/// RAII guard for an active watch. Dropping it disconnects the watcher.
pub struct WatchGuard {
    disconnect: Option<Box<dyn FnOnce()>>,
}

impl WatchGuard {
    /// Guard that runs `disconnect` exactly once, on drop.
    #[must_use]
    pub fn new(disconnect: impl FnOnce() + 'static) -> Self {
        Self {
            disconnect: Some(Box::new(disconnect)),
        }
    }
}

impl Drop for WatchGuard {
    fn drop(&mut self) {
        if let Some(disconnect) = self.disconnect.take() {
            disconnect();
        }
    }
}

impl fmt::Debug for WatchGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchGuard")
            .field("connected", &self.disconnect.is_some())
            .finish()
    }
}

/// Source of batched attribute mutation records.
pub trait AttributeWatcher {
    /// Start watching `attributes` on `element`.
    ///
    /// Only changes to the named attributes are reported. The callback never
    /// runs synchronously inside an attribute write.
    fn watch(
        &self,
        element: &Rc<dyn Element>,
        attributes: &[String],
        callback: MutationCallback,
    ) -> Result<WatchGuard>;
}
