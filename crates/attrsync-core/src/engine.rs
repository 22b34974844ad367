#![forbid(unsafe_code)]

//! The attribute sync engine.
//!
//! [`attach_observer`] wires a [`BindingTable`] to one element:
//!
//! - **Outbound** (cell → element): one subscription per bound cell. On every
//!   change the desired attribute state is compared with the element and
//!   written only if it differs. Always active, whatever `reflect` says.
//! - **Inbound** (element → cell): one shared watcher over all bound names.
//!   Each record is interpreted per binding kind; external changes are
//!   reported through the change callback, and reflecting bindings copy the
//!   interpreted value into their cell.
//! - **Initial reconciliation**: once per attach, in registration order,
//!   either inside attach ([`Tick::Before`]) or after the next update flush
//!   ([`Tick::After`]).
//!
//! # Invariants
//!
//! 1. Every attribute write the engine performs happens inside a
//!    suppression window, so its own records never reach the change
//!    callback.
//! 2. Cells are only assigned when the interpreted value differs from their
//!    current value; attributes are only written when their state differs
//!    from the desired state. This is what stops the two directions from
//!    ping-ponging.
//! 3. After detach nothing runs: subscriptions and watcher are released,
//!    and deferred tasks find the engine gone or marked detached.
//!
//! # Threading
//!
//! Single-threaded. All shared state is `Rc`/`Cell`/`RefCell`; the host must
//! deliver records and run deferred tasks on the thread that attached.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use attrsync_host::{Element, Host, MutationRecord, WatchGuard};
use attrsync_reactive::Subscription;

use crate::binding::{Binding, BindingTable};
use crate::config::{AttributeChange, ChangeCallback, ObserverOptions, Tick};
use crate::error::{AttachError, ConfigError};
use crate::suppress::{SuppressionToken, WriteSuppression};
use crate::value::AttrValue;

// ─── Diagnostics ─────────────────────────────────────────────────────────────

/// Counters for one attached observer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Attribute writes performed by the engine (reconciliation + outbound).
    pub outbound_writes: u64,
    /// Cell assignments made from element state.
    pub inbound_assignments: u64,
    /// External changes reported through the change callback.
    pub external_changes: u64,
    /// Records seen while a self-write window was open.
    pub suppressed_records: u64,
}

/// What happened at attach time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachReport {
    /// Declaration problems, in declaration order.
    pub issues: Vec<ConfigError>,
    /// Set when the engine did no setup at all.
    pub inert: Option<AttachError>,
    /// Number of bindings in the table.
    pub bindings: usize,
    /// When initial reconciliation was scheduled to run.
    pub tick: Tick,
}

impl AttachReport {
    /// Whether listeners and a watcher were installed.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.inert.is_none() && self.bindings > 0
    }
}

// ─── Shared engine state ─────────────────────────────────────────────────────

struct Engine {
    host: Rc<dyn Host>,
    element: RefCell<Option<Rc<dyn Element>>>,
    table: BindingTable,
    suppression: WriteSuppression,
    on_change: RefCell<Option<ChangeCallback>>,
    stats: Cell<SyncStats>,
    attached: Cell<bool>,
    reconciled: Cell<bool>,
}

impl Engine {
    fn element(&self) -> Option<Rc<dyn Element>> {
        if !self.attached.get() {
            return None;
        }
        self.element.borrow().clone()
    }

    fn bump(&self, f: impl FnOnce(&mut SyncStats)) {
        let mut stats = self.stats.get();
        f(&mut stats);
        self.stats.set(stats);
    }

    /// Bring the attribute in line with the binding's cell.
    ///
    /// Returns `true` if a write happened.
    fn push(self: &Rc<Self>, element: &dyn Element, binding: &Binding) -> bool {
        let name = binding.attribute();
        let desired = binding.desired();
        let actual = element.get_attribute(name);
        if binding
            .kind()
            .in_sync(actual.as_deref(), desired.as_deref())
        {
            return false;
        }

        let token = self.suppression.begin();
        match desired.as_deref() {
            Some(content) => element.set_attribute(name, content),
            None => element.remove_attribute(name),
        }
        self.schedule_release(token);
        self.bump(|s| s.outbound_writes += 1);
        tracing::debug!(
            attribute = name,
            kind = %binding.kind(),
            present = desired.is_some(),
            "attribute written from cell"
        );
        true
    }

    /// Copy `value` into the binding's cell if it differs.
    fn pull(&self, binding: &Binding, value: AttrValue) -> bool {
        if binding.cell().with(|current| *current == value) {
            return false;
        }
        self.bump(|s| s.inbound_assignments += 1);
        tracing::debug!(attribute = binding.attribute(), ?value, "cell updated from attribute");
        binding.cell().set(value)
    }

    fn schedule_release(self: &Rc<Self>, token: SuppressionToken) {
        let weak = Rc::downgrade(self);
        self.host.defer(Box::new(move || {
            if let Some(engine) = weak.upgrade() {
                engine.suppression.release(token);
            }
        }));
    }

    // ── Initial reconciliation ──

    fn reconcile(self: &Rc<Self>) {
        if self.reconciled.replace(true) {
            return;
        }
        let Some(element) = self.element() else {
            return;
        };
        for binding in self.table.iter() {
            let name = binding.attribute();
            // A reflecting binding adopts pre-authored element state instead
            // of overwriting it.
            let authored = binding.reflect() && element.has_attribute(name);
            if !authored {
                self.push(element.as_ref(), binding);
            }
            if binding.reflect() {
                let value = binding
                    .kind()
                    .interpret(element.get_attribute(name).as_deref());
                self.pull(binding, value);
            }
            tracing::debug!(
                attribute = name,
                kind = %binding.kind(),
                reflect = binding.reflect(),
                authored,
                "binding reconciled"
            );
            if !self.attached.get() {
                return;
            }
        }
    }

    // ── Outbound ──

    fn on_cell_change(self: &Rc<Self>, slot: usize) {
        let Some(element) = self.element() else {
            return;
        };
        let Some(binding) = self.table.iter().nth(slot) else {
            return;
        };
        self.push(element.as_ref(), binding);
    }

    // ── Inbound ──

    fn on_records(&self, records: Vec<MutationRecord>) {
        for record in records {
            let Some(element) = self.element() else {
                return;
            };
            if record.target != element.node_id() {
                tracing::trace!(node = %record.target, "record for foreign node ignored");
                continue;
            }
            let Some(binding) = self.table.get(&record.attribute) else {
                continue;
            };

            let new_raw = element.get_attribute(binding.attribute());
            let value = binding.kind().interpret(new_raw.as_deref());

            if self.suppression.is_active() {
                self.bump(|s| s.suppressed_records += 1);
                tracing::trace!(attribute = binding.attribute(), "self-write record suppressed");
            } else if record.old_value != new_raw {
                self.bump(|s| s.external_changes += 1);
                tracing::debug!(
                    attribute = binding.attribute(),
                    old = ?record.old_value,
                    new = ?new_raw,
                    "external attribute change"
                );
                let change = AttributeChange {
                    attribute: record.attribute.clone(),
                    old_raw: record.old_value.clone(),
                    new_raw: new_raw.clone(),
                    value: value.clone(),
                };
                if let Some(callback) = self.on_change.borrow_mut().as_mut() {
                    callback(&change);
                }
            }

            if binding.reflect() && self.attached.get() {
                self.pull(binding, value);
            }
        }
    }
}

// ─── Handle ──────────────────────────────────────────────────────────────────

/// Owner of an attached observer. Dropping it detaches.
#[must_use = "dropping the handle detaches the observer immediately"]
pub struct ObserverHandle {
    engine: Option<Rc<Engine>>,
    subscriptions: Vec<Subscription>,
    watch: Option<WatchGuard>,
    report: AttachReport,
    final_stats: SyncStats,
}

impl fmt::Debug for ObserverHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverHandle")
            .field("attached", &self.is_attached())
            .field("report", &self.report)
            .field("stats", &self.stats())
            .finish()
    }
}

impl ObserverHandle {
    fn inert(report: AttachReport) -> Self {
        Self {
            engine: None,
            subscriptions: Vec::new(),
            watch: None,
            report,
            final_stats: SyncStats::default(),
        }
    }

    /// Whether synchronization is live.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.engine.is_some()
    }

    #[must_use]
    pub fn report(&self) -> &AttachReport {
        &self.report
    }

    #[must_use]
    pub fn stats(&self) -> SyncStats {
        self.engine
            .as_ref()
            .map_or(self.final_stats, |engine| engine.stats.get())
    }

    /// Bound attribute names in registration order (empty once detached).
    #[must_use]
    pub fn attributes(&self) -> Vec<String> {
        self.engine
            .as_ref()
            .map(|engine| engine.table.names())
            .unwrap_or_default()
    }

    /// Stop synchronizing. Idempotent; dropping the handle does the same.
    pub fn detach(&mut self) {
        let Some(engine) = self.engine.take() else {
            return;
        };
        engine.attached.set(false);
        engine.element.borrow_mut().take();
        self.watch.take();
        self.subscriptions.clear();
        self.final_stats = engine.stats.get();
        tracing::debug!(bindings = engine.table.len(), "attribute observer detached");
    }
}

impl Drop for ObserverHandle {
    fn drop(&mut self) {
        self.detach();
    }
}

// ─── Attach ──────────────────────────────────────────────────────────────────

/// Start synchronizing the attributes declared in `options` on `element`.
///
/// Never fails: problems degrade to partial or no synchronization and are
/// logged and listed in [`ObserverHandle::report`].
pub fn attach_observer(
    host: Rc<dyn Host>,
    element: Option<Rc<dyn Element>>,
    options: ObserverOptions,
) -> ObserverHandle {
    let span = tracing::debug_span!("attrsync.attach", bindings = tracing::field::Empty);
    let _enter = span.enter();

    let ObserverOptions {
        attributes,
        on_change,
        tick,
    } = options;
    let mut report = AttachReport {
        tick,
        ..AttachReport::default()
    };

    if !host.is_interactive() {
        tracing::debug!("no document available; observer disabled");
        report.inert = Some(AttachError::NonInteractiveHost);
        return ObserverHandle::inert(report);
    }
    let Some(element) = element else {
        tracing::warn!("attribute observer attached without an element");
        report.inert = Some(AttachError::MissingElement);
        return ObserverHandle::inert(report);
    };

    let (table, issues) = BindingTable::normalize(attributes);
    report.issues = issues;
    report.bindings = table.len();
    span.record("bindings", table.len());
    if table.is_empty() {
        tracing::debug!("no valid attribute bindings; nothing to observe");
        return ObserverHandle::inert(report);
    }

    let names = table.names();
    let engine = Rc::new(Engine {
        host: Rc::clone(&host),
        element: RefCell::new(Some(Rc::clone(&element))),
        table,
        suppression: WriteSuppression::new(),
        on_change: RefCell::new(on_change),
        stats: Cell::new(SyncStats::default()),
        attached: Cell::new(true),
        reconciled: Cell::new(false),
    });

    let weak = Rc::downgrade(&engine);
    let watch = match host.watch(
        &element,
        &names,
        Box::new(move |records| {
            if let Some(engine) = weak.upgrade() {
                engine.on_records(records);
            }
        }),
    ) {
        Ok(guard) => guard,
        Err(err) => {
            tracing::warn!(error = %err, "attribute watcher unavailable; observer disabled");
            engine.attached.set(false);
            report.inert = Some(AttachError::Watch(err));
            return ObserverHandle::inert(report);
        }
    };

    let subscriptions = engine
        .table
        .iter()
        .enumerate()
        .map(|(slot, binding)| {
            let weak: Weak<Engine> = Rc::downgrade(&engine);
            binding.cell().subscribe(move |_| {
                if let Some(engine) = weak.upgrade() {
                    engine.on_cell_change(slot);
                }
            })
        })
        .collect();

    tracing::debug!(bindings = names.len(), ?tick, "attribute observer attached");

    match tick {
        Tick::Before => engine.reconcile(),
        Tick::After => {
            let weak = Rc::downgrade(&engine);
            host.after_flush(Box::new(move || {
                if let Some(engine) = weak.upgrade() {
                    engine.reconcile();
                }
            }));
        }
    }

    ObserverHandle {
        engine: Some(engine),
        subscriptions,
        watch: Some(watch),
        report,
        final_stats: SyncStats::default(),
    }
}
