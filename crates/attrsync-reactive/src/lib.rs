#![forbid(unsafe_code)]

//! The cell type attrsync binds attributes to.
//!
//! Component state lives in an [`Observable`]. The sync engine holds a clone
//! of each bound cell, reads it to decide what the attribute should look
//! like, writes it when the element changes from outside, and keeps one
//! [`Subscription`] per cell to hear about changes made by component code.
//!
//! Two properties matter to the engine:
//!
//! - `set` with a value equal to the current one does nothing and returns
//!   `false`. Attribute-to-cell copies rely on this to stop feedback loops.
//! - Callbacks run with no borrow held, so a callback may write an attribute
//!   whose watcher later writes the same cell.
//!
//! Everything is `Rc`-based and meant for the single UI thread.

pub mod observable;

pub use observable::{Observable, Subscription};
