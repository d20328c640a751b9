//! # Returns Desk
//!
//! Runs the refund calculator against a persisted sale, and hands the
//! validated return off to the returns collaborator.
//!
//! The calculator rejects over-returns, unknown items, and empty requests
//! LOCALLY; the collaborator is only reached with a request that already
//! passed those checks. A server-side rejection (the backstop for races
//! with concurrent returns) is surfaced verbatim, and the caller's
//! selection is preserved for adjustment and resubmission.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use keel_core::{calculate_refund, PersistedSale, RefundCalculation, ReturnRequestLine};

use crate::error::RegisterResult;

// =============================================================================
// Wire DTOs
// =============================================================================

/// One returned line on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnItem {
    pub sale_item_id: String,
    pub quantity: i64,
}

/// The create-return request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReturnRequest {
    pub sale_id: String,
    pub items: Vec<ReturnItem>,
    pub reason: String,
}

// =============================================================================
// Returns Service Trait
// =============================================================================

/// The external return-persistence collaborator. Success updates the
/// sale's returned quantities and status server-side.
#[async_trait]
pub trait ReturnsService: Send + Sync {
    async fn create_return(&self, request: CreateReturnRequest) -> RegisterResult<()>;
}

// =============================================================================
// Returns Desk
// =============================================================================

/// Validates and submits returns against persisted sales.
pub struct ReturnsDesk {
    returns: Arc<dyn ReturnsService>,
}

impl ReturnsDesk {
    /// Creates a desk over the returns collaborator.
    pub fn new(returns: Arc<dyn ReturnsService>) -> Self {
        ReturnsDesk { returns }
    }

    /// Computes the refund for the requested quantities and, if every
    /// line passes local validation, records the return with the
    /// collaborator. Returns the refund breakdown on success.
    ///
    /// The refund is reconstructed from the immutable sale record on
    /// every call; nothing is cached between attempts.
    pub async fn submit(
        &self,
        sale: &PersistedSale,
        requested: &[ReturnRequestLine],
        reason: &str,
    ) -> RegisterResult<RefundCalculation> {
        // Local validation + refund reconstruction. Any violation stops
        // here, before the collaborator is involved.
        let calculation = calculate_refund(sale, requested)?;

        let request = CreateReturnRequest {
            sale_id: sale.id.clone(),
            items: calculation
                .lines
                .iter()
                .map(|l| ReturnItem {
                    sale_item_id: l.sale_item_id.clone(),
                    quantity: l.quantity,
                })
                .collect(),
            reason: reason.to_string(),
        };

        debug!(sale_id = %sale.id, lines = request.items.len(), refund = %calculation.total, "submitting return");

        match self.returns.create_return(request).await {
            Ok(()) => {
                info!(sale_id = %sale.id, refund = %calculation.total, "return recorded");
                Ok(calculation)
            }
            Err(e) => {
                warn!(sale_id = %sale.id, error = %e, "return rejected, selection preserved");
                Err(e)
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use keel_core::{CoreError, Money, PersistedSaleItem};

    use crate::error::RegisterError;

    struct MockReturnsService {
        calls: Mutex<Vec<CreateReturnRequest>>,
        reject_with: Option<String>,
    }

    impl MockReturnsService {
        fn new() -> Self {
            MockReturnsService {
                calls: Mutex::new(Vec::new()),
                reject_with: None,
            }
        }

        fn rejecting(message: &str) -> Self {
            MockReturnsService {
                calls: Mutex::new(Vec::new()),
                reject_with: Some(message.to_string()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ReturnsService for MockReturnsService {
        async fn create_return(&self, request: CreateReturnRequest) -> RegisterResult<()> {
            self.calls.lock().unwrap().push(request);
            match &self.reject_with {
                Some(message) => Err(RegisterError::Rejected(message.clone())),
                None => Ok(()),
            }
        }
    }

    fn sale() -> PersistedSale {
        PersistedSale {
            id: "sale-1".into(),
            items: vec![
                PersistedSaleItem {
                    id: "si-a".into(),
                    price_per_unit: Money::from_cents(10000),
                    quantity: 2,
                    discount_amount: Money::zero(),
                    returned_quantity: 0,
                },
                PersistedSaleItem {
                    id: "si-b".into(),
                    price_per_unit: Money::from_cents(5000),
                    quantity: 1,
                    discount_amount: Money::zero(),
                    returned_quantity: 0,
                },
            ],
            discount: Money::from_cents(3000),
            total_amount: Money::from_cents(22000),
            paid_amount: Money::from_cents(22000),
        }
    }

    fn req(id: &str, qty: i64) -> ReturnRequestLine {
        ReturnRequestLine {
            sale_item_id: id.into(),
            quantity: qty,
        }
    }

    #[tokio::test]
    async fn test_submit_returns_refund_and_calls_collaborator() {
        let service = Arc::new(MockReturnsService::new());
        let desk = ReturnsDesk::new(service.clone());

        let calc = desk
            .submit(&sale(), &[req("si-a", 1), req("si-b", 0)], "damaged")
            .await
            .unwrap();

        // One unit of A refunds (20000 − 2400) / 2 = 8800
        assert_eq!(calc.total.cents(), 8800);
        assert_eq!(service.call_count(), 1);

        // Only the positive-quantity line went on the wire
        let request = service.calls.lock().unwrap()[0].clone();
        assert_eq!(request.sale_id, "sale-1");
        assert_eq!(request.items.len(), 1);
        assert_eq!(request.items[0].sale_item_id, "si-a");
        assert_eq!(request.reason, "damaged");
    }

    #[tokio::test]
    async fn test_over_return_rejected_before_any_call() {
        let service = Arc::new(MockReturnsService::new());
        let desk = ReturnsDesk::new(service.clone());

        let mut s = sale();
        s.items[0].returned_quantity = 1; // remaining = 1

        let err = desk.submit(&s, &[req("si-a", 3)], "damaged").await.unwrap_err();
        assert!(matches!(
            err,
            RegisterError::Core(CoreError::ReturnExceedsRemaining { .. })
        ));
        assert_eq!(service.call_count(), 0, "no network call on local rejection");
    }

    #[tokio::test]
    async fn test_empty_request_rejected_before_any_call() {
        let service = Arc::new(MockReturnsService::new());
        let desk = ReturnsDesk::new(service.clone());

        let err = desk.submit(&sale(), &[req("si-a", 0)], "").await.unwrap_err();
        assert!(matches!(err, RegisterError::Core(CoreError::EmptyReturn)));
        assert_eq!(service.call_count(), 0);
    }

    #[tokio::test]
    async fn test_server_rejection_surfaced_verbatim() {
        let service = Arc::new(MockReturnsService::rejecting(
            "Return exceeds remaining quantity for si-a",
        ));
        let desk = ReturnsDesk::new(service.clone());

        let err = desk.submit(&sale(), &[req("si-a", 1)], "damaged").await.unwrap_err();
        assert_eq!(err.to_string(), "Return exceeds remaining quantity for si-a");
        assert_eq!(service.call_count(), 1);
    }
}
