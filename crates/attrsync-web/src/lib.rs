#![forbid(unsafe_code)]

//! Browser host for attrsync.
//!
//! On `wasm32` this crate provides [`WebHost`], which implements the
//! `attrsync-host` traits on top of `web-sys`: real DOM elements, a
//! `MutationObserver` per attached element, and browser timers for
//! deferred work. [`attach`] is the one-call entry point for component
//! code.
//!
//! On other targets only [`WebError`] is compiled, so the workspace builds
//! and tests natively.

mod error;

pub use error::WebError;

#[cfg(target_arch = "wasm32")]
mod dom;

#[cfg(target_arch = "wasm32")]
pub use dom::{WebElement, WebHost, attach};
