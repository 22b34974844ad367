#![forbid(unsafe_code)]

//! Host collaborators for attribute synchronization.
//!
//! The sync engine never talks to a browser directly. It needs three things
//! from its host, each modelled as a trait here:
//!
//! - [`Element`]: read and write attributes on one node.
//! - [`AttributeWatcher`]: deliver batched [`MutationRecord`]s for a filtered
//!   set of attribute names, asynchronously, with the old value captured.
//! - [`Scheduler`]: run a task after pending watcher deliveries
//!   ([`Scheduler::defer`]) or after the next update flush
//!   ([`Scheduler::after_flush`]).
//!
//! [`MemoryHost`] implements all of them over a deterministic [`EventLoop`]
//! and is what native tests run against. [`HeadlessHost`] stands in for a
//! rendering context without a document.

pub mod element;
pub mod error;
pub mod event_loop;
pub mod host;
pub mod memory;
pub mod watch;

pub use element::{Element, NodeId};
pub use error::{HostError, Result};
pub use event_loop::{EventLoop, Task};
pub use host::{HeadlessHost, Host, Scheduler};
pub use memory::{MemoryElement, MemoryHost};
pub use watch::{AttributeWatcher, MutationCallback, MutationRecord, WatchGuard};
