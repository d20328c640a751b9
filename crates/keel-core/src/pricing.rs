//! # Line Pricing
//!
//! Pure per-line pricing: one `CartLine` in, its priced amounts out.
//!
//! ## Pricing Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Per-Line Pricing                                  │
//! │                                                                         │
//! │  CartLine { unit_price, quantity, discount }                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  subtotal = unit_price × quantity                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  discount = Percentage(bps) → subtotal × clamp(bps, 0..=10000)/10000    │
//! │             Amount(v)       → clamp(v, 0..=subtotal)                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  net = subtotal − discount        (never negative, by the clamps)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Out-of-range inputs are CLAMPED, never rejected: the UI calls this on
//! every keystroke of a quantity/price/discount edit and must never freeze
//! mid-edit. The function is pure and re-entrant; calling it twice with the
//! same line yields identical output.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{CartLine, Discount, MAX_DISCOUNT_BPS};

/// The priced amounts of one cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PricedLine {
    /// Unit price × quantity, before any discount.
    pub subtotal: Money,

    /// The line discount actually applied, after clamping.
    pub discount: Money,

    /// Subtotal minus discount. Never negative.
    pub net: Money,
}

/// Prices one cart line.
///
/// Invoked on every quantity/price/discount edit. No side effects.
///
/// ## Example
/// ```rust
/// use keel_core::money::Money;
/// use keel_core::pricing::price_line;
/// use keel_core::types::{CartLine, Discount};
///
/// let mut line = CartLine::new("v-1", "Widget", Money::from_cents(1000), 2);
/// line.discount = Discount::percent(10.0);
///
/// let priced = price_line(&line);
/// assert_eq!(priced.subtotal.cents(), 2000);
/// assert_eq!(priced.discount.cents(), 200);
/// assert_eq!(priced.net.cents(), 1800);
/// ```
pub fn price_line(line: &CartLine) -> PricedLine {
    let subtotal = line.subtotal();
    let discount = line_discount_amount(line.discount, subtotal);

    PricedLine {
        subtotal,
        discount,
        net: subtotal - discount,
    }
}

/// Resolves a line discount config to the concrete amount it takes off
/// `subtotal`. One of the two exhaustive `Discount` call sites (the other
/// is the cart-level distributor).
fn line_discount_amount(discount: Discount, subtotal: Money) -> Money {
    match discount {
        Discount::Percentage(bps) => subtotal.percent_of(bps.min(MAX_DISCOUNT_BPS)),
        Discount::Amount(value) => value.max_zero().min(subtotal),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
