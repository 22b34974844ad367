#![forbid(unsafe_code)]

//! In-memory DOM host.
//!
//! [`MemoryElement`] keeps an attribute map and the watchers registered on
//! it. Every effective write queues one [`MutationRecord`] per interested
//! watcher and schedules a single batched delivery per watcher as a
//! microtask on the shared [`EventLoop`], matching how a browser's mutation
//! observer coalesces records.
//!
//! # Invariants
//!
//! 1. Records are delivered in write order, never synchronously.
//! 2. Setting an attribute always produces a record, even when the content
//!    is unchanged; removing an absent attribute produces none.
//! 3. After a watch guard is dropped, its pending records are discarded and
//!    its callback never runs again.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::element::{Element, NodeId};
use crate::error::{HostError, Result};
use crate::event_loop::{EventLoop, Task};
use crate::host::{Host, Scheduler};
use crate::watch::{AttributeWatcher, MutationCallback, MutationRecord, WatchGuard};

// ─── Watcher slot ────────────────────────────────────────────────────────────

struct WatcherSlot {
    filter: Vec<String>,
    pending: RefCell<Vec<MutationRecord>>,
    /// A delivery microtask is queued and has not run yet.
    scheduled: Cell<bool>,
    connected: Cell<bool>,
    callback: RefCell<MutationCallback>,
}

impl WatcherSlot {
    fn wants(&self, attribute: &str) -> bool {
        self.connected.get() && self.filter.iter().any(|name| name == attribute)
    }

    fn deliver(&self) {
        self.scheduled.set(false);
        let batch = std::mem::take(&mut *self.pending.borrow_mut());
        if !self.connected.get() || batch.is_empty() {
            return;
        }
        tracing::trace!(records = batch.len(), "memory watcher delivery");
        let mut callback = self.callback.borrow_mut();
        (*callback)(batch);
    }
}

// ─── Element ─────────────────────────────────────────────────────────────────

#[derive(Default)]
struct ElementState {
    attributes: BTreeMap<String, String>,
    watchers: Vec<Rc<WatcherSlot>>,
    writes: u64,
}

/// An element living in a [`MemoryHost`].
pub struct MemoryElement {
    id: NodeId,
    event_loop: EventLoop,
    state: RefCell<ElementState>,
}

impl fmt::Debug for MemoryElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("MemoryElement")
            .field("id", &self.id)
            .field("attributes", &state.attributes)
            .field("watchers", &state.watchers.len())
            .finish()
    }
}

impl MemoryElement {
    fn new(event_loop: EventLoop) -> Self {
        Self {
            id: NodeId::next(),
            event_loop,
            state: RefCell::new(ElementState::default()),
        }
    }

    /// Snapshot of all attributes.
    #[must_use]
    pub fn attributes(&self) -> BTreeMap<String, String> {
        self.state.borrow().attributes.clone()
    }

    /// Number of effective attribute writes so far.
    #[must_use]
    pub fn write_count(&self) -> u64 {
        self.state.borrow().writes
    }

    /// Number of connected watchers.
    #[must_use]
    pub fn watcher_count(&self) -> usize {
        self.state
            .borrow()
            .watchers
            .iter()
            .filter(|slot| slot.connected.get())
            .count()
    }

    /// Queue `record` to every watcher interested in its attribute without
    /// touching the attribute map. Used to simulate misrouted records.
    pub fn inject_record(&self, record: MutationRecord) {
        for slot in self.interested(&record.attribute) {
            self.enqueue(&slot, record.clone());
        }
    }

    fn interested(&self, attribute: &str) -> Vec<Rc<WatcherSlot>> {
        self.state
            .borrow()
            .watchers
            .iter()
            .filter(|slot| slot.wants(attribute))
            .cloned()
            .collect()
    }

    fn notify(&self, attribute: &str, old_value: Option<String>) {
        for slot in self.interested(attribute) {
            self.enqueue(
                &slot,
                MutationRecord::new(self.id, attribute, old_value.clone()),
            );
        }
    }

    fn enqueue(&self, slot: &Rc<WatcherSlot>, record: MutationRecord) {
        slot.pending.borrow_mut().push(record);
        if slot.scheduled.replace(true) {
            return;
        }
        let weak = Rc::downgrade(slot);
        self.event_loop.queue_microtask(Box::new(move || {
            if let Some(slot) = weak.upgrade() {
                slot.deliver();
            }
        }));
    }

    fn add_watcher(&self, filter: &[String], callback: MutationCallback) -> Rc<WatcherSlot> {
        let slot = Rc::new(WatcherSlot {
            filter: filter.to_vec(),
            pending: RefCell::new(Vec::new()),
            scheduled: Cell::new(false),
            connected: Cell::new(true),
            callback: RefCell::new(callback),
        });
        self.state.borrow_mut().watchers.push(Rc::clone(&slot));
        slot
    }

    fn remove_watcher(&self, slot: &Rc<WatcherSlot>) {
        self.state
            .borrow_mut()
            .watchers
            .retain(|other| !Rc::ptr_eq(other, slot));
    }
}

impl Element for MemoryElement {
    fn node_id(&self) -> NodeId {
        self.id
    }

    fn get_attribute(&self, name: &str) -> Option<String> {
        self.state.borrow().attributes.get(name).cloned()
    }

    fn set_attribute(&self, name: &str, value: &str) {
        let old = {
            let mut state = self.state.borrow_mut();
            state.writes += 1;
            state.attributes.insert(name.to_string(), value.to_string())
        };
        self.notify(name, old);
    }

    fn remove_attribute(&self, name: &str) {
        let old = {
            let mut state = self.state.borrow_mut();
            let old = state.attributes.remove(name);
            if old.is_some() {
                state.writes += 1;
            }
            old
        };
        if old.is_some() {
            self.notify(name, old);
        }
    }
}

// ─── Host ────────────────────────────────────────────────────────────────────

/// Interactive host backed by an [`EventLoop`].
///
/// Only elements created through this host can be watched.
#[derive(Clone, Default)]
pub struct MemoryHost {
    event_loop: EventLoop,
    elements: Rc<RefCell<HashMap<NodeId, Weak<MemoryElement>>>>,
}

impl fmt::Debug for MemoryHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryHost")
            .field("event_loop", &self.event_loop)
            .field("elements", &self.elements.borrow().len())
            .finish()
    }
}

impl MemoryHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn event_loop(&self) -> &EventLoop {
        &self.event_loop
    }

    /// Create an element with no attributes.
    #[must_use]
    pub fn create_element(&self) -> Rc<MemoryElement> {
        let element = Rc::new(MemoryElement::new(self.event_loop.clone()));
        let mut elements = self.elements.borrow_mut();
        elements.retain(|_, weak| weak.strong_count() > 0);
        elements.insert(element.id, Rc::downgrade(&element));
        element
    }

    /// Create an element carrying pre-authored attributes.
    #[must_use]
    pub fn element_with(&self, attributes: &[(&str, &str)]) -> Rc<MemoryElement> {
        let element = self.create_element();
        for (name, value) in attributes {
            element.set_attribute(name, value);
        }
        element
    }

    /// Shorthand for `self.event_loop().run_until_idle()`.
    pub fn run_until_idle(&self) -> usize {
        self.event_loop.run_until_idle()
    }

    fn lookup(&self, node: NodeId) -> Option<Rc<MemoryElement>> {
        self.elements.borrow().get(&node).and_then(Weak::upgrade)
    }
}

impl AttributeWatcher for MemoryHost {
    fn watch(
        &self,
        element: &Rc<dyn Element>,
        attributes: &[String],
        callback: MutationCallback,
    ) -> Result<WatchGuard> {
        let node = element.node_id();
        let target = self
            .lookup(node)
            .ok_or(HostError::UnknownElement { node })?;
        let slot = target.add_watcher(attributes, callback);
        let weak_target = Rc::downgrade(&target);
        Ok(WatchGuard::new(move || {
            slot.connected.set(false);
            slot.pending.borrow_mut().clear();
            if let Some(target) = weak_target.upgrade() {
                target.remove_watcher(&slot);
            }
        }))
    }
}

impl Scheduler for MemoryHost {
    fn defer(&self, task: Task) {
        self.event_loop.queue_task(task);
    }

    fn after_flush(&self, task: Task) {
        self.event_loop.queue_after_flush(task);
    }
}

impl Host for MemoryHost {}
