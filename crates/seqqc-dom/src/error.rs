//! Error types for the document layer

use crate::document::NodeId;

/// Document error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// Selector text could not be parsed
    #[error("invalid selector '{selector}': {reason}")]
    InvalidSelector {
        /// Offending selector text
        selector: String,
        /// What went wrong
        reason: String,
    },

    /// Element is no longer part of the document tree
    #[error("element {0} is detached from the document")]
    Detached(NodeId),

    /// No element carries the requested id
    #[error("no element with id '{0}'")]
    MissingElement(String),
}

impl DomError {
    /// Shorthand for a selector error
    pub(crate) fn selector(selector: &str, reason: impl Into<String>) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.into(),
        }
    }
}
