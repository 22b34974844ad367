#![forbid(unsafe_code)]

//! attrsync public facade crate.
//!
//! Re-exports the pieces component code needs to bind reactive cells to
//! element attributes. Enable the `web` feature for the browser host.
//!
//! ```
//! use std::rc::Rc;
//!
//! use attrsync::prelude::*;
//!
//! let dom = MemoryHost::new();
//! let element = dom.create_element();
//! let count = Observable::new(AttrValue::Number(3.0));
//! let host: Rc<dyn Host> = Rc::new(dom.clone());
//! let _handle = attach_observer(
//!     host,
//!     Some(element.clone()),
//!     ObserverOptions::new()
//!         .attribute(AttributeDecl::new("count", &count).kind(ValueKind::Number)),
//! );
//! dom.run_until_idle();
//! assert_eq!(element.get_attribute("count").as_deref(), Some("3"));
//! ```

pub use attrsync_core::{
    AttachReport, AttrValue, AttributeChange, AttributeDecl, ObserverHandle, ObserverOptions,
    ObserverSpec, SyncStats, Tick, ValueKind, attach_observer,
};
pub use attrsync_reactive::Observable;

pub mod prelude {
    pub use attrsync_core as core;
    pub use attrsync_host as host;
    pub use attrsync_reactive as reactive;
    #[cfg(feature = "web")]
    pub use attrsync_web as web;

    pub use attrsync_core::{
        AttrValue, AttributeChange, AttributeDecl, ObserverHandle, ObserverOptions, Tick,
        ValueKind, attach_observer,
    };
    pub use attrsync_host::{Element, Host, MemoryHost};
    pub use attrsync_reactive::Observable;
}
