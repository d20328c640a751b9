//! # Domain Types
//!
//! Core domain types used throughout Keel POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    CartLine     │   │    Discount     │   │   TaxResult     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  line_id        │   │  Amount(Money)  │   │  total_tax      │       │
//! │  │  unit_price     │   │  Percentage(bps)│   │  grand_total    │       │
//! │  │  quantity       │   └─────────────────┘   │  per_item       │       │
//! │  │  discount       │                         └─────────────────┘       │
//! │  └─────────────────┘                                                   │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  PersistedSale  │   │  ReturnRequest  │   │  PaymentType    │       │
//! │  │  (read back for │   │  (sent to the   │   │  Full | Partial │       │
//! │  │   returns)      │   │   returns svc)  │   └─────────────────┘       │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Draft lines carry both:
//! - `line_id`: UUID v4 - identifies the cart line instance itself
//! - `variant_id`: the catalog product variant the line references

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::money::Money;

// =============================================================================
// Discount
// =============================================================================

/// Maximum discount percentage in basis points (100%).
pub const MAX_DISCOUNT_BPS: u32 = 10_000;

/// A discount configuration, either a fixed amount or a percentage.
///
/// This is the tagged variant behind both discount inputs in the engine:
/// the per-line discount and the cart-level (overall) discount. Both call
/// sites match it exhaustively; there is no third case.
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000, so fractional UI percentages like
/// 12.5% stay exact integers (1250 bps).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Discount {
    /// Fixed amount off. Clamped to the amount it applies to at the
    /// apply site, so it can never drive a net negative.
    Amount(Money),

    /// Percentage off, in basis points (1250 = 12.5%).
    Percentage(u32),
}

impl Discount {
    /// No discount.
    #[inline]
    pub const fn none() -> Self {
        Discount::Amount(Money::zero())
    }

    /// Fixed amount discount. Negative input clamps to zero.
    pub fn amount(value: Money) -> Self {
        Discount::Amount(value.max_zero())
    }

    /// Percentage discount from a UI percentage value (e.g. 12.5 for
    /// 12.5%). Clamped to [0, 100].
    pub fn percent(pct: f64) -> Self {
        let clamped = pct.clamp(0.0, 100.0);
        Discount::Percentage((clamped * 100.0).round() as u32)
    }

    /// Percentage discount from basis points, clamped to [0, 10000].
    pub fn from_bps(bps: u32) -> Self {
        Discount::Percentage(bps.min(MAX_DISCOUNT_BPS))
    }

    /// True when the discount is a no-op.
    pub fn is_none(&self) -> bool {
        match self {
            Discount::Amount(v) => v.is_zero() || v.is_negative(),
            Discount::Percentage(bps) => *bps == 0,
        }
    }
}

impl Default for Discount {
    fn default() -> Self {
        Discount::none()
    }
}

// =============================================================================
// Payment Type
// =============================================================================

/// How the customer settles a bill at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    /// The full grand total is due now; tendered must cover it.
    Full,
    /// A positive partial amount is paid now; the rest stays outstanding.
    Partial,
}

impl Default for PaymentType {
    fn default() -> Self {
        PaymentType::Full
    }
}

// =============================================================================
// Cart Line
// =============================================================================

/// A draft line in a bill, referencing one product variant.
///
/// Uses the snapshot pattern: `unit_price` and `name` are frozen at the
/// moment the catalog item is added, so later catalog edits do not move a
/// cart that is mid-transaction. `unit_price <= catalog max price` is the
/// caller's concern at mutation time, not this engine's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Cart line instance id (UUID v4).
    pub line_id: String,

    /// Catalog variant this line sells.
    pub variant_id: String,

    /// Display name at time of adding (frozen).
    pub name: String,

    /// Unit price at time of adding (frozen).
    pub unit_price: Money,

    /// Quantity, >= 1 while the line exists (0 removes it).
    pub quantity: i64,

    /// Line-level discount.
    pub discount: Discount,

    /// Tax category, forwarded opaquely to the tax collaborator.
    pub tax_category_id: Option<String>,

    /// Stock ceiling known at add time, if the catalog tracks one.
    pub max_stock: Option<i64>,

    /// When this line was added to the bill.
    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    /// Creates a new line for a catalog variant with no discount.
    pub fn new(
        variant_id: impl Into<String>,
        name: impl Into<String>,
        unit_price: Money,
        quantity: i64,
    ) -> Self {
        CartLine {
            line_id: Uuid::new_v4().to_string(),
            variant_id: variant_id.into(),
            name: name.into(),
            unit_price,
            quantity,
            discount: Discount::none(),
            tax_category_id: None,
            max_stock: None,
            added_at: Utc::now(),
        }
    }

    /// Line subtotal before any discount (unit price × quantity).
    #[inline]
    pub fn subtotal(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Tax Result
// =============================================================================

/// Per-rule tax amount inside a line's breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TaxRuleAmount {
    pub rule_name: String,
    pub amount: Money,
}

/// Tax computed for one line by the tax collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineTax {
    /// The cart line this entry belongs to.
    pub line_id: String,
    pub tax_amount: Money,
    pub rule_breakdown: Vec<TaxRuleAmount>,
}

/// Aggregate result of one tax collaborator call.
///
/// `grand_total` is the post-discount net amount plus tax: the cart-level
/// discount is applied by this engine BEFORE amounts are sent to the tax
/// service, never after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TaxResult {
    pub total_tax: Money,
    pub grand_total: Money,
    pub per_item: Vec<LineTax>,
}

// =============================================================================
// Persisted Sale (read back for returns)
// =============================================================================

/// A line of a historical sale as the sales collaborator returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSaleItem {
    pub id: String,
    pub price_per_unit: Money,
    pub quantity: i64,
    /// Line-level discount amount recorded at sale time.
    pub discount_amount: Money,
    /// Units already returned in earlier return transactions.
    pub returned_quantity: i64,
}

impl PersistedSaleItem {
    /// Historical line subtotal: price × quantity − line discount.
    #[inline]
    pub fn subtotal(&self) -> Money {
        self.price_per_unit.multiply_quantity(self.quantity) - self.discount_amount
    }

    /// Units still eligible for return.
    #[inline]
    pub fn remaining_quantity(&self) -> i64 {
        self.quantity - self.returned_quantity
    }
}

/// A historical sale as read back from the sales collaborator.
///
/// Immutable in this engine; only the collaborator updates
/// `returned_quantity` and `paid_amount` server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSale {
    pub id: String,
    pub items: Vec<PersistedSaleItem>,
    /// Cart-level discount amount already applied at sale time.
    pub discount: Money,
    pub total_amount: Money,
    pub paid_amount: Money,
}

// =============================================================================
// Return Request
// =============================================================================

/// One requested return line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReturnRequestLine {
    pub sale_item_id: String,
    pub quantity: i64,
}

/// A return request, validated locally before the collaborator sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReturnRequest {
    pub sale_id: String,
    pub lines: Vec<ReturnRequestLine>,
    pub reason: String,
}

// =============================================================================
// Unit Tests
// =============================================================================
