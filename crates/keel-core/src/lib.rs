//! # keel-core: Pure Pricing Logic for Keel POS
//!
//! This crate is the **heart** of the Keel POS sale pricing and returns
//! engine. It contains all business logic as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Keel POS Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Frontend (POS screens)                        │   │
//! │  │    Bill tabs ──► Cart UI ──► Tender UI ──► Returns UI           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    keel-register                                │   │
//! │  │    bill slots, tax debounce, checkout & returns handoff         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ keel-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌────────────┐  ┌───────────┐  │   │
//! │  │   │   money   │  │  pricing  │  │ distribute │  │  refund   │  │   │
//! │  │   │   Money   │  │ PricedLine│  │ remainder- │  │ historical│  │   │
//! │  │   │  ratio_of │  │  clamps   │  │  to-last   │  │ unit net  │  │   │
//! │  │   └───────────┘  └───────────┘  └────────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (CartLine, Discount, TaxResult, PersistedSale)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`pricing`] - Per-line pricing with clamped discounts
//! - [`distribute`] - Cart-level discount distribution (exact conservation)
//! - [`refund`] - Returns refund reconstruction from historical sales
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation (quantities, prices, tendered amount)
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Clamp, don't reject**: discount inputs are clamped so editing never freezes
//!
//! ## Example Usage
//!
//! ```rust
//! use keel_core::distribute::distribute_discount;
//! use keel_core::money::Money;
//! use keel_core::types::Discount;
//!
//! let nets = [1000, 1000, 1000].map(Money::from_cents);
//! let d = distribute_discount(Discount::amount(Money::from_cents(100)), &nets);
//!
//! // Shares conserve the discount exactly: 33 + 33 + 34
//! let sum: Money = d.shares.iter().copied().sum();
//! assert_eq!(sum, d.total);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod distribute;
pub mod error;
pub mod money;
pub mod pricing;
pub mod refund;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use keel_core::Money` instead of
// `use keel_core::money::Money`

pub use distribute::{distribute_discount, DistributedDiscount};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pricing::{price_line, PricedLine};
pub use refund::{calculate_refund, RefundCalculation, RefundLine};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Number of concurrent draft bills the register holds.
///
/// ## Why a constant?
/// The session store is a fixed array of slots, one tab per slot in the
/// POS frontend. Nine matches the frontend's tab strip; slots are
/// addressed 0..=8 everywhere.
pub const BILL_SLOT_COUNT: usize = 9;

/// Maximum lines allowed in a single bill
///
/// ## Business Reason
/// Prevents runaway carts and ensures reasonable transaction sizes.
/// Can be made configurable per-tenant in future versions.
pub const MAX_BILL_ITEMS: usize = 100;

/// Maximum quantity of a single line in a bill
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10)
/// Configurable per-tenant in future versions.
pub const MAX_ITEM_QUANTITY: i64 = 999;
