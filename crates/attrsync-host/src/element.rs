#![forbid(unsafe_code)]

//! Element handle abstraction.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identity of a node.
///
/// Two handles refer to the same node exactly when their ids are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Allocate a process-unique id.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw id value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Attribute access on a live element.
///
/// Writes take `&self`: elements are shared handles into a host-owned tree.
pub trait Element {
    /// Identity of the underlying node.
    fn node_id(&self) -> NodeId;

    /// Current attribute content, or `None` when absent.
    fn get_attribute(&self, name: &str) -> Option<String>;

    /// Whether the attribute is present.
    fn has_attribute(&self, name: &str) -> bool {
        self.get_attribute(name).is_some()
    }

    /// Set the attribute's content, adding it if absent.
    fn set_attribute(&self, name: &str, value: &str);

    /// Remove the attribute. Removing an absent attribute does nothing.
    fn remove_attribute(&self, name: &str);
}
