//! # Error Types
//!
//! Domain-specific error types for keel-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  keel-core errors (this file)                                          │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  keel-register errors (separate crate)                                 │
//! │  └── RegisterError    - Session + collaborator failures                │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → RegisterError → Frontend          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (item id, amounts, etc.)
//! 3. Errors are enum variants, never String
//! 4. Business-rule rejections happen locally, before any network call

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations. Every one of them is
/// raised locally and rejects an operation before a collaborator is
/// involved; the UI keeps the draft state so the user can adjust.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Checkout on a bill with no items.
    #[error("Bill has no items")]
    EmptyBill,

    /// Checkout without a selected payment method.
    #[error("No payment method selected")]
    NoPaymentMethod,

    /// Full payment with a tendered amount below the grand total.
    #[error("Insufficient tender: {tendered} tendered, {required} due")]
    InsufficientTender { required: Money, tendered: Money },

    /// Partial payment with nothing tendered.
    #[error("Partial payment requires a positive tendered amount")]
    NothingTendered,

    /// A line operation referenced a line that is not on the bill.
    #[error("Line not found: {0}")]
    LineNotFound(String),

    /// A return request referenced a sale item that is not on the sale.
    #[error("Sale item not found: {0}")]
    SaleItemNotFound(String),

    /// A return request asked for more units than remain returnable.
    ///
    /// ## When This Occurs
    /// - `quantity - returned_quantity` is the remaining ceiling
    /// - Rejected here, locally; the returns collaborator enforces the
    ///   same rule server-side as a backstop
    #[error(
        "Return of {requested} exceeds remaining quantity {remaining} for sale item {sale_item_id}"
    )]
    ReturnExceedsRemaining {
        sale_item_id: String,
        remaining: i64,
        requested: i64,
    },

    /// A return request with no line requesting any units.
    #[error("Return request has no positive quantities")]
    EmptyReturn,

    /// Bill has exceeded maximum allowed lines.
    #[error("Bill cannot have more than {max} lines")]
    BillTooLarge { max: usize },

    /// Line quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., unparsable tendered amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientTender {
            required: Money::from_cents(12000),
            tendered: Money::from_cents(11999),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient tender: $119.99 tendered, $120.00 due"
        );

        let err = CoreError::ReturnExceedsRemaining {
            sale_item_id: "si-9".to_string(),
            remaining: 1,
            requested: 3,
        };
        assert!(err.to_string().contains("si-9"));
        assert!(err.to_string().contains("remaining quantity 1"));
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "payment method".to_string(),
        };
        assert_eq!(err.to_string(), "payment method is required");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
