//! # Checkout Finalizer
//!
//! Validates a draft bill, assembles the create-sale payload, and hands
//! off to the sales collaborator.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Checkout Flow                                   │
//! │                                                                         │
//! │  snapshot active bill                                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate_bill()  ── rejects locally, NO network call ──► typed error   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  build_sale_request()   (line discounts + ONE cart-discount number)     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  sales.create_sale()                                                    │
//! │       │                                                                 │
//! │   ┌───┴──────────────┐                                                  │
//! │   ▼                  ▼                                                  │
//! │  OK: reset slot,    ERR: bill left INTACT, server message surfaced      │
//! │  return receipt          verbatim. NO automatic retry - retrying a      │
//! │                          create-sale risks a duplicate sale.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use keel_core::{CoreError, CoreResult, Money, PaymentType};

use crate::error::RegisterResult;
use crate::sales::{CreateSaleRequest, SaleLineItem, SalePayment, SalesService};
use crate::state::{Bill, SessionState};
use crate::wire::to_wire;

// =============================================================================
// Receipt
// =============================================================================

/// Summary returned to the UI after a successful checkout. Rendering a
/// printable receipt happens elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReceipt {
    /// Server-assigned sale identity.
    pub sale_id: String,

    /// Amount charged: the grand total for full payment, the tendered
    /// amount for partial.
    pub total_charged: Money,

    /// Change due back to the customer (full payments only).
    pub change_due: Money,
}

// =============================================================================
// Preconditions
// =============================================================================

/// Validates a bill for checkout. Pure; called before any network I/O.
///
/// ## Rules
/// - (a) the bill has at least one line
/// - (b) a payment method is selected
/// - (c) the tendered amount is non-negative (parsing from the UI string
///   happens in `keel_core::validation::parse_tendered` before it ever
///   reaches the bill)
/// - (d) full payment: tendered covers the payable total
/// - (e) partial payment: tendered is positive
pub fn validate_bill(bill: &Bill) -> CoreResult<()> {
    if bill.is_empty() {
        return Err(CoreError::EmptyBill);
    }

    if bill.payment_method_id.is_none() {
        return Err(CoreError::NoPaymentMethod);
    }

    if bill.amount_tendered.is_negative() {
        return Err(keel_core::ValidationError::MustBePositive {
            field: "tendered amount".to_string(),
        }
        .into());
    }

    match bill.payment_type {
        PaymentType::Full => {
            let required = bill.payable_total();
            if bill.amount_tendered < required {
                return Err(CoreError::InsufficientTender {
                    required,
                    tendered: bill.amount_tendered,
                });
            }
        }
        PaymentType::Partial => {
            if !bill.amount_tendered.is_positive() {
                return Err(CoreError::NothingTendered);
            }
        }
    }

    Ok(())
}

// =============================================================================
// Payload Construction
// =============================================================================

/// Builds the create-sale payload for a validated bill.
///
/// The cart-level `discount` is the distributor's total, carried as ONE
/// number; re-summing the per-line shares here would double-round.
pub fn build_sale_request(bill: &Bill) -> CreateSaleRequest {
    let priced = bill.priced_lines();

    let items = bill
        .items
        .iter()
        .zip(priced.iter())
        .map(|(line, priced)| SaleLineItem {
            variant_id: line.variant_id.clone(),
            quantity: line.quantity,
            price_per_unit: to_wire(line.unit_price),
            discount: to_wire(priced.discount),
        })
        .collect();

    let amount = match bill.payment_type {
        PaymentType::Full => bill.payable_total(),
        PaymentType::Partial => bill.amount_tendered,
    };

    CreateSaleRequest {
        items,
        customer_id: bill.customer_id.clone(),
        discount: to_wire(bill.discount_total()),
        payments: vec![SalePayment {
            payment_method_id: bill.payment_method_id.clone().unwrap_or_default(),
            amount: to_wire(amount),
        }],
    }
}

// =============================================================================
// Checkout
// =============================================================================

/// The checkout finalizer for a session.
pub struct Checkout {
    session: SessionState,
    sales: Arc<dyn SalesService>,
}

impl Checkout {
    /// Creates a finalizer over a session and the sales collaborator.
    pub fn new(session: SessionState, sales: Arc<dyn SalesService>) -> Self {
        Checkout { session, sales }
    }

    /// Submits the active bill.
    ///
    /// On success the slot the bill occupied is reset to empty and the
    /// server-assigned sale identity is returned. On failure the bill is
    /// left exactly as it was and the error is surfaced - server
    /// rejections verbatim. Never retries on its own.
    pub async fn submit(&self) -> RegisterResult<CheckoutReceipt> {
        let (slot, bill) = self
            .session
            .with_slots(|s| (s.active_index(), s.active().clone()));

        validate_bill(&bill)?;

        let request = build_sale_request(&bill);
        let total_charged = match bill.payment_type {
            PaymentType::Full => bill.payable_total(),
            PaymentType::Partial => bill.amount_tendered,
        };
        let change_due = match bill.payment_type {
            PaymentType::Full => bill.amount_tendered - total_charged,
            PaymentType::Partial => Money::zero(),
        };

        debug!(slot, items = bill.items.len(), total = %total_charged, "submitting sale");

        match self.sales.create_sale(request).await {
            Ok(created) => {
                self.session.with_slots_mut(|s| s.reset_slot(slot));
                info!(
                    sale_id = %created.id,
                    slot,
                    total = %total_charged,
                    change = %change_due,
                    "sale created"
                );
                Ok(CheckoutReceipt {
                    sale_id: created.id,
                    total_charged,
                    change_due,
                })
            }
            Err(e) => {
                warn!(slot, error = %e, "sale creation failed, bill preserved");
                Err(e)
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
