//! # Validation Module
//!
//! Input validation utilities for the pricing engine.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Frontend (TypeScript)                                        │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - engine-side input validation                   │
//! │  ├── Quantity/price bounds                                             │
//! │  └── Tendered-amount parsing                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Backoffice collaborators                                     │
//! │  └── Stock / business constraints enforced server-side                 │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Note the split with `pricing`: discount and percentage inputs are
//! CLAMPED there rather than validated here, so a half-typed discount
//! never freezes the cart. Validation proper applies to the inputs where
//! clamping would be wrong (quantities, prices, the tendered amount).

use crate::error::ValidationError;
use crate::money::Money;
use crate::MAX_ITEM_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0); removal is a separate operation, not qty 0
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a unit price.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (free items)
pub fn validate_unit_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Tendered Amount
// =============================================================================

/// Parses the tendered-amount field as the UI submits it: a decimal string
/// with at most two fraction digits.
///
/// ## Rules
/// - Must not be empty
/// - Must be a plain non-negative decimal ("120", "119.9", "119.99")
/// - No signs, separators, or currency symbols
///
/// ## Example
/// ```rust
/// use keel_core::validation::parse_tendered;
///
/// assert_eq!(parse_tendered("119.99").unwrap().cents(), 11999);
/// assert_eq!(parse_tendered("120").unwrap().cents(), 12000);
/// assert!(parse_tendered("-5").is_err());
/// assert!(parse_tendered("12.345").is_err());
/// ```
pub fn parse_tendered(input: &str) -> ValidationResult<Money> {
    let input = input.trim();

    if input.is_empty() {
        return Err(ValidationError::Required {
            field: "tendered amount".to_string(),
        });
    }

    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: "tendered amount".to_string(),
        reason: reason.to_string(),
    };

    if input.starts_with(['-', '+']) {
        return Err(invalid("must be a non-negative number"));
    }

    let (major, minor) = match input.split_once('.') {
        Some((major, minor)) => (major, minor),
        None => (input, ""),
    };

    if minor.len() > 2 {
        return Err(invalid("at most two decimal places"));
    }

    let major: i64 = if major.is_empty() {
        0
    } else {
        major
            .parse()
            .map_err(|_| invalid("must be a non-negative number"))?
    };

    let minor: i64 = if minor.is_empty() {
        0
    } else {
        // Right-pad so ".9" means 90 cents, not 9
        let padded = format!("{:0<2}", minor);
        padded
            .parse()
            .map_err(|_| invalid("must be a non-negative number"))?
    };

    Ok(Money::from_major_minor(major, minor))
}

// =============================================================================
// Unit Tests
// =============================================================================
