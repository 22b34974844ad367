#![forbid(unsafe_code)]

//! `web-sys` implementation of the host traits.
//!
//! - Elements are plain `web_sys::Element`s wrapped with a [`NodeId`].
//! - Watching uses one `MutationObserver` per watch, limited to the bound
//!   attribute names, with old values enabled.
//! - `defer` is a zero-delay `setTimeout`, so it runs after every pending
//!   observer delivery; `after_flush` is a microtask.
//!
//! # Failure Modes
//!
//! - Outside a document (workers, SSR) [`WebHost::new`] fails and
//!   [`attach`] returns an inert handle without logging.
//! - DOM exceptions from `setAttribute`/`removeAttribute` are logged at
//!   `warn` and otherwise ignored.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use attrsync_core::{ObserverHandle, ObserverOptions, attach_observer};
use attrsync_host::{
    AttributeWatcher, Element, HeadlessHost, Host, HostError, MutationCallback, MutationRecord,
    NodeId, Result, Scheduler, Task, WatchGuard,
};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::error::WebError;

fn describe(err: &JsValue) -> String {
    err.as_string().unwrap_or_else(|| format!("{err:?}"))
}

// ─── Element ─────────────────────────────────────────────────────────────────

/// A DOM element registered with a [`WebHost`].
pub struct WebElement {
    id: NodeId,
    element: web_sys::Element,
}

impl WebElement {
    #[must_use]
    pub fn raw(&self) -> &web_sys::Element {
        &self.element
    }
}

impl fmt::Debug for WebElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebElement")
            .field("id", &self.id)
            .field("tag", &self.element.tag_name())
            .finish()
    }
}

impl Element for WebElement {
    fn node_id(&self) -> NodeId {
        self.id
    }

    fn get_attribute(&self, name: &str) -> Option<String> {
        self.element.get_attribute(name)
    }

    fn has_attribute(&self, name: &str) -> bool {
        self.element.has_attribute(name)
    }

    fn set_attribute(&self, name: &str, value: &str) {
        if let Err(err) = self.element.set_attribute(name, value) {
            tracing::warn!(attribute = name, error = %describe(&err), "setAttribute failed");
        }
    }

    fn remove_attribute(&self, name: &str) {
        if let Err(err) = self.element.remove_attribute(name) {
            tracing::warn!(attribute = name, error = %describe(&err), "removeAttribute failed");
        }
    }
}

// ─── Host ────────────────────────────────────────────────────────────────────

/// Host backed by the current browser window.
#[derive(Clone)]
pub struct WebHost {
    window: web_sys::Window,
    elements: Rc<RefCell<HashMap<NodeId, Weak<WebElement>>>>,
}

impl fmt::Debug for WebHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebHost")
            .field("elements", &self.elements.borrow().len())
            .finish()
    }
}

impl WebHost {
    /// Bind to the current window.
    ///
    /// # Errors
    ///
    /// [`WebError::NoWindow`] when there is no window or no document.
    pub fn new() -> std::result::Result<Self, WebError> {
        let window = web_sys::window().ok_or(WebError::NoWindow)?;
        if window.document().is_none() {
            return Err(WebError::NoWindow);
        }
        Ok(Self {
            window,
            elements: Rc::default(),
        })
    }

    /// Register `element` with this host. Wrapping the same node twice
    /// returns the same wrapper while it is alive.
    #[must_use]
    pub fn wrap(&self, element: web_sys::Element) -> Rc<WebElement> {
        let mut elements = self.elements.borrow_mut();
        elements.retain(|_, weak| weak.strong_count() > 0);
        let node: &web_sys::Node = &element;
        if let Some(existing) = elements
            .values()
            .filter_map(Weak::upgrade)
            .find(|known| known.element.is_same_node(Some(node)))
        {
            return existing;
        }
        let wrapped = Rc::new(WebElement {
            id: NodeId::next(),
            element,
        });
        elements.insert(wrapped.id, Rc::downgrade(&wrapped));
        wrapped
    }

    /// Attach an observer to `element` through this host.
    pub fn attach(&self, element: web_sys::Element, options: ObserverOptions) -> ObserverHandle {
        let element: Rc<dyn Element> = self.wrap(element);
        attach_observer(Rc::new(self.clone()), Some(element), options)
    }

    fn lookup(&self, node: NodeId) -> Option<Rc<WebElement>> {
        self.elements.borrow().get(&node).and_then(Weak::upgrade)
    }
}

impl AttributeWatcher for WebHost {
    fn watch(
        &self,
        element: &Rc<dyn Element>,
        attributes: &[String],
        mut callback: MutationCallback,
    ) -> Result<WatchGuard> {
        let id = element.node_id();
        let target = self
            .lookup(id)
            .ok_or(HostError::UnknownElement { node: id })?;
        let node: web_sys::Node = target.element.clone().into();

        let observed = node.clone();
        let closure = Closure::<dyn FnMut(js_sys::Array, web_sys::MutationObserver)>::new(
            move |entries: js_sys::Array, _observer: web_sys::MutationObserver| {
                let records: Vec<MutationRecord> = entries
                    .iter()
                    .filter_map(|entry| entry.dyn_into::<web_sys::MutationRecord>().ok())
                    .filter_map(|record| {
                        let name = record.attribute_name()?;
                        let ours = record
                            .target()
                            .is_some_and(|t| t.is_same_node(Some(&observed)));
                        if !ours {
                            tracing::trace!(attribute = %name, "record for another node dropped");
                            return None;
                        }
                        Some(MutationRecord::new(id, name, record.old_value()))
                    })
                    .collect();
                if !records.is_empty() {
                    callback(records);
                }
            },
        );

        let observer = web_sys::MutationObserver::new(closure.as_ref().unchecked_ref())
            .map_err(|err| WebError::js("new MutationObserver", describe(&err)))?;
        let filter: js_sys::Array = attributes
            .iter()
            .map(|name| JsValue::from_str(name))
            .collect();
        let init = web_sys::MutationObserverInit::new();
        init.set_attributes(true);
        init.set_attribute_old_value(true);
        init.set_attribute_filter(&filter);
        observer
            .observe_with_options(&node, &init)
            .map_err(|err| WebError::js("MutationObserver.observe", describe(&err)))?;

        tracing::debug!(node = %id, attributes = attributes.len(), "mutation observer connected");
        Ok(WatchGuard::new(move || {
            observer.disconnect();
            drop(closure);
        }))
    }
}

impl Scheduler for WebHost {
    fn defer(&self, task: Task) {
        let callback = Closure::once_into_js(move || task());
        if let Err(err) = self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), 0)
        {
            tracing::warn!(error = %describe(&err), "setTimeout failed; deferred task dropped");
        }
    }

    fn after_flush(&self, task: Task) {
        wasm_bindgen_futures::spawn_local(async move { task() });
    }
}

impl Host for WebHost {
    fn is_interactive(&self) -> bool {
        self.window.document().is_some()
    }
}

/// Attach an observer to a browser element.
///
/// Outside a document this returns an inert handle and does nothing else.
pub fn attach(element: Option<web_sys::Element>, options: ObserverOptions) -> ObserverHandle {
    match WebHost::new() {
        Ok(host) => {
            let element = element.map(|el| host.wrap(el) as Rc<dyn Element>);
            attach_observer(Rc::new(host), element, options)
        }
        Err(_) => attach_observer(Rc::new(HeadlessHost), None, options),
    }
}
