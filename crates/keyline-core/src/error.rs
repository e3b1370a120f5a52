// ── Core error types ──
//
// The service-level taxonomy. Validation, not-found and disabled
// conditions are detected locally and carry a short message that is safe
// to show a caller. Everything the document store reports collapses into
// `Server`, whose detail is for logs only.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Missing or malformed input.
    #[error("{message}")]
    Validation { message: String },

    /// No matching license or user.
    #[error("{message}")]
    NotFound { message: String },

    /// The license exists but was explicitly deactivated.
    #[error("{message}")]
    Disabled { message: String },

    /// Transport or store failure. Never shown to callers verbatim.
    #[error("Document store failure: {0}")]
    Server(#[from] keyline_api::Error),
}

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn disabled(message: impl Into<String>) -> Self {
        Self::Disabled {
            message: message.into(),
        }
    }

    /// `true` for the conditions a caller caused and can fix (the 400 class).
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Server(_))
    }
}
