//! # Tax Engine Adapter
//!
//! Bridges the bill session to the external tax collaborator: builds the
//! request from distributed, discount-adjusted line amounts, and owns the
//! debounce + staleness guarding around repeated recomputation.
//!
//! ## Recompute Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  Debounced Tax Recomputation                            │
//! │                                                                         │
//! │  cart mutation ──► schedule()                                           │
//! │                      │  aborts the pending timer, starts a new one      │
//! │                      ▼                                                  │
//! │                 sleep(debounce)          ← more mutations restart this  │
//! │                      │                                                  │
//! │                      ▼                                                  │
//! │  capture: active slot index + input SIGNATURE + request                 │
//! │                      │                                                  │
//! │                      ▼                                                  │
//! │  tax service call (bounded by call timeout)                             │
//! │                      │                                                  │
//! │          ┌───────────┴───────────┐                                      │
//! │          ▼                       ▼                                      │
//! │   signature still matches   signature moved on                          │
//! │   → store TaxResult         → DROP response (debug log)                 │
//! │                                                                         │
//! │  FAILURE/TIMEOUT: tax becomes "unknown"; the UI falls back to           │
//! │  Bill::estimated_total() and the next mutation retries. Editing is      │
//! │  never blocked.                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use keel_core::{CartLine, LineTax, TaxResult, TaxRuleAmount};

use crate::config::RegisterConfig;
use crate::error::RegisterResult;
use crate::state::{Bill, SessionState};
use crate::wire::{from_wire, to_wire};

// =============================================================================
// Wire DTOs
// =============================================================================

/// One invoice line as the tax collaborator expects it: the effective
/// taxable unit price after the line discount AND this line's share of the
/// cart-level discount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxInvoiceItem {
    pub price: f64,
    pub quantity: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_category_id: Option<String>,
}

/// The invoice body of a tax quote request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxInvoice {
    pub items: Vec<TaxInvoiceItem>,
}

/// A tax quote request. The customer travels along because tax categories
/// may vary by customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxQuoteRequest {
    pub invoice: TaxInvoice,
    #[serde(rename = "customerId", skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
}

/// Per-item element of the tax quote response. The rule breakdown arrives
/// as a JSON-encoded array string, decoded by the adapter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxQuoteItem {
    #[serde(default)]
    pub tax_rule_snapshot: Option<String>,
}

/// A tax quote response. `grand_total` is the post-discount base amount
/// plus tax.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxQuoteResponse {
    pub total_tax: f64,
    pub grand_total: f64,
    #[serde(default)]
    pub items: Vec<TaxQuoteItem>,
}

/// One decoded entry of a `tax_rule_snapshot` array.
#[derive(Debug, Clone, Deserialize)]
struct WireTaxRule {
    rule_name: String,
    amount: f64,
}

// =============================================================================
// Tax Service Trait
// =============================================================================

/// The external tax computation collaborator.
///
/// Object-safe so the scheduler can hold `Arc<dyn TaxService>` and tests
/// can substitute a recording mock.
#[async_trait]
pub trait TaxService: Send + Sync {
    /// Quotes tax for one invoice.
    async fn quote(&self, request: TaxQuoteRequest) -> RegisterResult<TaxQuoteResponse>;
}

// =============================================================================
// Request / Response Adaptation
// =============================================================================

/// Builds the tax request for a bill.
///
/// Per line: effective taxable unit price =
/// `(line net − cart-discount share) / quantity` (0 for quantity 0),
/// converted to wire decimal.
pub fn build_tax_request(bill: &Bill) -> TaxQuoteRequest {
    let priced = bill.priced_lines();
    let distribution = bill.distribution();

    let items = bill
        .items
        .iter()
        .zip(priced.iter().zip(distribution.shares.iter()))
        .map(|(line, (priced, share))| {
            let taxable = (priced.net - *share).max_zero();
            let price = if line.quantity > 0 {
                to_wire(taxable) / line.quantity as f64
            } else {
                0.0
            };
            TaxInvoiceItem {
                price,
                quantity: line.quantity,
                tax_category_id: line.tax_category_id.clone(),
            }
        })
        .collect();

    TaxQuoteRequest {
        invoice: TaxInvoice { items },
        customer_id: bill.customer_id.clone(),
    }
}

/// Adapts a tax quote response onto the bill lines it was computed for
/// (zipped by position, the order the request was built in).
pub fn adapt_tax_response(lines: &[CartLine], response: &TaxQuoteResponse) -> TaxResult {
    let per_item = lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let rule_breakdown = response
                .items
                .get(i)
                .and_then(|item| item.tax_rule_snapshot.as_deref())
                .map(decode_rule_snapshot)
                .unwrap_or_default();

            let tax_amount = rule_breakdown.iter().map(|r| r.amount).sum();

            LineTax {
                line_id: line.line_id.clone(),
                tax_amount,
                rule_breakdown,
            }
        })
        .collect();

    TaxResult {
        total_tax: from_wire(response.total_tax),
        grand_total: from_wire(response.grand_total),
        per_item,
    }
}

/// Decodes one JSON-encoded rule snapshot. A malformed snapshot degrades
/// to an empty breakdown; the aggregate totals are still usable.
fn decode_rule_snapshot(raw: &str) -> Vec<TaxRuleAmount> {
    match serde_json::from_str::<Vec<WireTaxRule>>(raw) {
        Ok(rules) => rules
            .into_iter()
            .map(|r| TaxRuleAmount {
                rule_name: r.rule_name,
                amount: from_wire(r.amount),
            })
            .collect(),
        Err(e) => {
            warn!(error = %e, "undecodable tax_rule_snapshot, dropping breakdown");
            Vec::new()
        }
    }
}

// =============================================================================
// Tax Scheduler
// =============================================================================

/// Debounced, staleness-guarded tax recomputation for the active bill.
///
/// One scheduler serves the whole session. `schedule()` is cheap and
/// synchronous; call it after every cart mutation. Explicitly modelled as
/// the three pieces the behavior needs: a pending-timer handle, an input
/// signature captured when the timer fires, and a guard comparing that
/// signature to the live one when the response lands.
pub struct TaxScheduler {
    session: SessionState,
    service: Arc<dyn TaxService>,
    debounce: Duration,
    call_timeout: Duration,
    /// The pending debounce timer. Re-scheduling aborts it, which is what
    /// coalesces a burst of edits into one collaborator call.
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl TaxScheduler {
    /// Creates a scheduler over a session and a tax service.
    pub fn new(session: SessionState, service: Arc<dyn TaxService>, config: &RegisterConfig) -> Self {
        TaxScheduler {
            session,
            service,
            debounce: config.tax_debounce(),
            call_timeout: config.tax_call_timeout(),
            pending: Mutex::new(None),
        }
    }

    /// Schedules a recomputation after the quiet period. A newer call
    /// replaces (aborts) any pending one, so only the last mutation of a
    /// burst reaches the collaborator.
    pub fn schedule(&self) {
        let session = self.session.clone();
        let service = self.service.clone();
        let debounce = self.debounce;
        let call_timeout = self.call_timeout;

        let mut pending = self.pending.lock().expect("Tax scheduler mutex poisoned");
        if let Some(previous) = pending.take() {
            previous.abort();
        }
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            Self::recompute(session, service, call_timeout).await;
        }));
    }

    /// Awaits the currently pending recomputation, if any. Used by tests
    /// and by graceful shutdown; production callers never need it.
    pub async fn settle(&self) {
        let handle = self
            .pending
            .lock()
            .expect("Tax scheduler mutex poisoned")
            .take();
        if let Some(handle) = handle {
            // An aborted task yields a JoinError; either way it is done
            let _ = handle.await;
        }
    }

    /// One recomputation: capture the active slot at fire time, call the
    /// collaborator, and apply the result only if that slot's signature
    /// has not moved since.
    async fn recompute(session: SessionState, service: Arc<dyn TaxService>, call_timeout: Duration) {
        let (slot, signature, request) = session.with_slots(|s| {
            let bill = s.active();
            (s.active_index(), bill.signature(), build_tax_request(bill))
        });

        if request.invoice.items.is_empty() {
            // Nothing to tax; drop any result the emptied bill still holds
            session.with_slots_mut(|s| {
                if let Some(bill) = s.slot_mut(slot) {
                    if bill.signature() == signature {
                        bill.last_tax_result = None;
                        bill.tax_signature = None;
                    }
                }
            });
            return;
        }

        debug!(slot, signature, items = request.invoice.items.len(), "tax quote firing");

        let outcome = tokio::time::timeout(call_timeout, service.quote(request)).await;

        match outcome {
            Ok(Ok(response)) => session.with_slots_mut(|s| {
                let Some(bill) = s.slot_mut(slot) else { return };
                if bill.signature() == signature {
                    let result = adapt_tax_response(&bill.items, &response);
                    debug!(slot, signature, grand_total = %result.grand_total, "tax result applied");
                    bill.last_tax_result = Some(result);
                    bill.tax_signature = Some(signature);
                } else {
                    debug!(slot, signature, "tax response stale, dropped");
                }
            }),
            Ok(Err(e)) => {
                // Expected transient failure: degrade to the untaxed
                // estimate and let the next mutation retry
                warn!(slot, signature, error = %e, "tax quote failed, falling back to estimate");
                Self::clear_if_unchanged(&session, slot, signature);
            }
            Err(_) => {
                warn!(slot, signature, "tax quote timed out, falling back to estimate");
                Self::clear_if_unchanged(&session, slot, signature);
            }
        }
    }

    fn clear_if_unchanged(session: &SessionState, slot: usize, signature: u64) {
        session.with_slots_mut(|s| {
            if let Some(bill) = s.slot_mut(slot) {
                if bill.signature() == signature {
                    bill.last_tax_result = None;
                    bill.tax_signature = None;
                }
            }
        });
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
