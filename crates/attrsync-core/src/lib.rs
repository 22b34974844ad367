#![forbid(unsafe_code)]

//! Bidirectional synchronization between reactive cells and element
//! attributes.
//!
//! Declare which attributes to bind, how to interpret them
//! ([`ValueKind`]) and whether element-side changes flow back into the cell
//! (`reflect`), then hand the declarations to [`attach_observer`]:
//!
//! ```
//! use std::rc::Rc;
//! use attrsync_core::{attach_observer, AttrValue, AttributeDecl, ObserverOptions, Tick, ValueKind};
//! use attrsync_host::{Element, Host, MemoryHost};
//! use attrsync_reactive::Observable;
//!
//! let dom = MemoryHost::new();
//! let element = dom.element_with(&[("text", "authored")]);
//! let text = Observable::new(AttrValue::from("default"));
//! let open = Observable::new(AttrValue::Bool(true));
//!
//! let host: Rc<dyn Host> = Rc::new(dom.clone());
//! let _handle = attach_observer(
//!     host,
//!     Some(element.clone()),
//!     ObserverOptions::new()
//!         .attribute(AttributeDecl::new("text", &text))
//!         .attribute(AttributeDecl::new("open", &open).kind(ValueKind::Boolean))
//!         .tick(Tick::Before),
//! );
//!
//! // Pre-authored element state wins for reflecting bindings.
//! assert_eq!(text.get(), AttrValue::from("authored"));
//! assert!(element.has_attribute("open"));
//!
//! open.set(AttrValue::Bool(false));
//! assert!(!element.has_attribute("open"));
//! ```

pub mod binding;
pub mod config;
pub mod engine;
pub mod error;
pub mod suppress;
pub mod value;

pub use binding::{Binding, BindingTable};
pub use config::{
    AttributeChange, AttributeDecl, AttributeSpec, ChangeCallback, ObserverOptions, ObserverSpec,
    Tick,
};
pub use engine::{AttachReport, ObserverHandle, SyncStats, attach_observer};
pub use error::{AttachError, ConfigError};
pub use suppress::{SuppressionToken, WriteSuppression};
pub use value::{AttrValue, ValueKind, format_number, parse_number};
