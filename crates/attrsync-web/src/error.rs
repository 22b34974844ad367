#![forbid(unsafe_code)]

use attrsync_host::HostError;
use thiserror::Error;

/// Errors raised by the browser host.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WebError {
    /// No `window`/`document`: running in a worker or outside a browser.
    #[error("no browser window available")]
    NoWindow,

    /// A DOM call threw.
    #[error("{operation} failed: {message}")]
    Js {
        operation: &'static str,
        message: String,
    },
}

impl WebError {
    #[must_use]
    pub fn js(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Js {
            operation,
            message: message.into(),
        }
    }
}

impl From<WebError> for HostError {
    fn from(err: WebError) -> Self {
        match err {
            WebError::NoWindow => Self::NotInteractive,
            WebError::Js { .. } => Self::rejected(err.to_string()),
        }
    }
}
