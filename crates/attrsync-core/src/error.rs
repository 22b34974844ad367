use attrsync_host::HostError;
use thiserror::Error;

/// A problem with one attribute declaration.
///
/// Never fatal: the declaration is skipped (or, for duplicates, replaced)
/// and the rest of the list is still processed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("declaration #{index} has no attribute name")]
    MissingName { index: usize },

    #[error("attribute `{attribute}` has no bound cell")]
    MissingCell { attribute: String },

    #[error("attribute `{attribute}` declared more than once; the last declaration wins")]
    DuplicateAttribute { attribute: String },
}

impl ConfigError {
    /// Whether the declaration was dropped entirely.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        !matches!(self, Self::DuplicateAttribute { .. })
    }
}

/// Why an attach left the engine inert.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AttachError {
    #[error("no target element to observe")]
    MissingElement,

    #[error("host has no document; synchronization disabled")]
    NonInteractiveHost,

    #[error("attribute watcher could not be installed: {0}")]
    Watch(#[from] HostError),
}
