//! # Register Error Types
//!
//! Error types for the session and collaborator layer.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Register Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Session        │  │   Transport     │  │   Collaborator          │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  SlotOutOfRange │  │  Transport      │  │  Rejected (verbatim     │ │
//! │  │  InvalidConfig  │  │  Timeout        │  │   server message)       │ │
//! │  │                 │  │  BadResponse    │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  Core business-rule violations arrive wrapped: Core(CoreError)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! - `Rejected` carries the server-reported message VERBATIM; the draft
//!   bill or return selection is preserved so the user can adjust and
//!   resubmit
//! - `is_retryable()` classifies transient transport failures; a rejected
//!   create-sale is NOT retryable (a retry risks a duplicate sale)

use thiserror::Error;

use keel_core::{CoreError, ValidationError};

/// Result type alias for register operations.
pub type RegisterResult<T> = Result<T, RegisterError>;

/// Register error type covering session and collaborator failures.
#[derive(Debug, Error)]
pub enum RegisterError {
    // =========================================================================
    // Session Errors
    // =========================================================================
    /// Bill slot index outside 0..BILL_SLOT_COUNT.
    #[error("Bill slot {index} out of range (0..={max})")]
    SlotOutOfRange { index: usize, max: usize },

    /// Invalid register configuration.
    #[error("Invalid register configuration: {0}")]
    InvalidConfig(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// Collaborator unreachable or the connection failed mid-call.
    #[error("Collaborator unreachable: {0}")]
    Transport(String),

    /// Collaborator call exceeded its timeout window.
    #[error("Collaborator call timed out after {0} seconds")]
    Timeout(u64),

    /// Collaborator answered with a body this crate cannot decode.
    #[error("Collaborator response malformed: {0}")]
    BadResponse(String),

    // =========================================================================
    // Collaborator Rejections
    // =========================================================================
    /// The collaborator rejected the operation. The message is the
    /// server-reported text, surfaced verbatim.
    #[error("{0}")]
    Rejected(String),

    // =========================================================================
    // Domain Errors
    // =========================================================================
    /// Business rule violation raised locally, before any network call.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl From<ValidationError> for RegisterError {
    fn from(err: ValidationError) -> Self {
        RegisterError::Core(err.into())
    }
}

impl From<reqwest::Error> for RegisterError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            // reqwest does not expose the configured window here
            RegisterError::Transport(format!("timed out: {err}"))
        } else if err.is_decode() {
            RegisterError::BadResponse(err.to_string())
        } else {
            RegisterError::Transport(err.to_string())
        }
    }
}

// =============================================================================
// Error Categorization (for retry logic)
// =============================================================================

impl RegisterError {
    /// Returns true if this error is transient and the operation may be
    /// retried by the caller.
    ///
    /// ## Retryable Errors
    /// - Transport failures (network issues)
    /// - Timeouts
    ///
    /// ## Non-Retryable Errors
    /// - Collaborator rejections (retrying a create-sale risks duplicates)
    /// - Business-rule violations
    /// - Configuration problems
    pub fn is_retryable(&self) -> bool {
        matches!(self, RegisterError::Transport(_) | RegisterError::Timeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(RegisterError::Transport("connection refused".into()).is_retryable());
        assert!(RegisterError::Timeout(10).is_retryable());

        assert!(!RegisterError::Rejected("stock exhausted".into()).is_retryable());
        assert!(!RegisterError::Core(CoreError::EmptyBill).is_retryable());
        assert!(!RegisterError::InvalidConfig("bad url".into()).is_retryable());
    }

    #[test]
    fn test_rejected_message_is_verbatim() {
        let err = RegisterError::Rejected("Only 3 COKE-330 in stock".into());
        assert_eq!(err.to_string(), "Only 3 COKE-330 in stock");
    }

    #[test]
    fn test_core_error_wraps_transparently() {
        let err: RegisterError = CoreError::EmptyBill.into();
        assert_eq!(err.to_string(), "Bill has no items");
    }
}
