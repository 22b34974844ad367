use thiserror::Error;

use crate::element::NodeId;

pub type Result<T> = std::result::Result<T, HostError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("host has no document")]
    NotInteractive,

    #[error("element {node} is not managed by this host")]
    UnknownElement { node: NodeId },

    #[error("host rejected the operation: {message}")]
    Rejected { message: String },
}

impl HostError {
    #[must_use]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }
}
