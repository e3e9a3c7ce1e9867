//! Error types for the QC domain model
//!
//! Two families live here:
//! - validation errors (`Argument`, `Format`) that a caller avoids by
//!   construction and which are never shown to a reviewer
//! - domain errors (`UnknownOutcome`, `InvalidState`, `MalformedData`,
//!   `Config`) that are caught at the boundary of a user action and
//!   reported as a single status line

/// Domain model error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Invalid or missing function input
    #[error("invalid arguments: {0}")]
    Argument(String),

    /// A string does not have the expected structure
    #[error("{0} does not match the expected format")]
    Format(String),

    /// No display mapping exists for the outcome
    #[error("Can't find corresponding style for QC outcome {0}.")]
    UnknownOutcome(String),

    /// Transition not defined for the current state
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Server payload is missing a required field
    #[error("Malformed QC outcomes data for {0}")]
    MalformedData(String),

    /// Configuration could not be loaded or is incomplete
    #[error("configuration error: {0}")]
    Config(String),
}

impl ModelError {
    /// Check if this is a caller-side validation error
    #[inline]
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Argument(_) | Self::Format(_))
    }

    /// Shorthand for an argument error
    #[inline]
    pub fn argument(message: impl Into<String>) -> Self {
        Self::Argument(message.into())
    }

    /// Shorthand for an invalid state error
    #[inline]
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }
}
