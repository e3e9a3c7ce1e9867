//! Error types for QC controls and the outcome service

use seqqc_dom::DomError;
use seqqc_model::ModelError;

/// Outcome service transport error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Request could not be sent or the connection failed
    #[error("{0}")]
    Network(String),

    /// Service answered with a non-success status
    #[error("{message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Message extracted from the response
        message: String,
    },

    /// Response body is not JSON
    #[error("invalid response from QC outcomes service: {0}")]
    Decode(String),
}

impl TransportError {
    /// Status error with an extracted message
    #[inline]
    #[must_use]
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }
}

/// QC error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QcError {
    /// Domain model error
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Document error
    #[error(transparent)]
    Dom(#[from] DomError),

    /// Outcome service error
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl QcError {
    /// Check if this is a caller-side validation error
    ///
    /// Validation errors are avoided by construction and never shown to the
    /// reviewer.
    #[inline]
    #[must_use]
    pub fn is_validation(&self) -> bool {
        match self {
            Self::Model(e) => e.is_validation(),
            Self::Dom(DomError::InvalidSelector { .. }) => true,
            Self::Dom(_) | Self::Transport(_) => false,
        }
    }

    /// Check if this came from the outcome service
    #[inline]
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Single line shown in the status region
    #[must_use]
    pub fn user_message(&self) -> String {
        let message = self.to_string();
        message.lines().next().unwrap_or_default().trim().to_string()
    }

    /// Shorthand for an invalid state error
    #[inline]
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::Model(ModelError::invalid_state(message))
    }
}
