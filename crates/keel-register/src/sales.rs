//! # Sales Collaborator Contract
//!
//! Wire DTOs and the service trait for the external sales-persistence
//! collaborator: creating a sale at checkout, and reading a persisted
//! sale back for returns processing.
//!
//! All wire money is decimal (major units); see `wire` for the single
//! conversion point.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use keel_core::{PersistedSale, PersistedSaleItem};

use crate::error::RegisterResult;
use crate::wire::from_wire;

// =============================================================================
// Create-Sale Wire DTOs
// =============================================================================

/// One sale line in the create-sale payload. `discount` is the LINE
/// discount amount; the cart-level discount travels once, on the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleLineItem {
    pub variant_id: String,
    pub quantity: i64,
    pub price_per_unit: f64,
    pub discount: f64,
}

/// One payment applied at creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalePayment {
    pub payment_method_id: String,
    pub amount: f64,
}

/// The create-sale request.
///
/// `discount` is the distributor's total as a single number. It is NOT
/// re-derived from the per-line shares, which would double-round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSaleRequest {
    pub items: Vec<SaleLineItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    pub discount: f64,
    pub payments: Vec<SalePayment>,
}

/// The identity the collaborator assigns to a created sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedSale {
    pub id: String,
}

// =============================================================================
// Read-Back Wire DTOs
// =============================================================================

/// A persisted sale line as the collaborator serializes it. The read
/// endpoint answers camelCase, except that `returned_quantity` still
/// appears in its legacy snake form on older records; the alias accepts
/// both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleRecordItem {
    pub id: String,
    pub price_per_unit: f64,
    pub quantity: i64,
    #[serde(default)]
    pub discount_amount: f64,
    #[serde(default, alias = "returned_quantity")]
    pub returned_quantity: i64,
}

/// A persisted sale as the collaborator serializes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleRecord {
    pub id: String,
    pub items: Vec<SaleRecordItem>,
    #[serde(default)]
    pub discount: f64,
    pub total_amount: f64,
    #[serde(default)]
    pub paid_amount: f64,
}

impl From<SaleRecord> for PersistedSale {
    fn from(record: SaleRecord) -> Self {
        PersistedSale {
            id: record.id,
            items: record
                .items
                .into_iter()
                .map(|item| PersistedSaleItem {
                    id: item.id,
                    price_per_unit: from_wire(item.price_per_unit),
                    quantity: item.quantity,
                    discount_amount: from_wire(item.discount_amount),
                    returned_quantity: item.returned_quantity,
                })
                .collect(),
            discount: from_wire(record.discount),
            total_amount: from_wire(record.total_amount),
            paid_amount: from_wire(record.paid_amount),
        }
    }
}

// =============================================================================
// Sales Service Trait
// =============================================================================

/// The external sales-persistence collaborator.
#[async_trait]
pub trait SalesService: Send + Sync {
    /// Creates a sale. A rejection (stock conflict, validation) comes back
    /// as `RegisterError::Rejected` with the server message verbatim.
    async fn create_sale(&self, request: CreateSaleRequest) -> RegisterResult<CreatedSale>;

    /// Reads a persisted sale back, including returned quantities.
    async fn fetch_sale(&self, sale_id: &str) -> RegisterResult<PersistedSale>;
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use keel_core::Money;

    #[test]
    fn test_create_sale_request_shape() {
        let request = CreateSaleRequest {
            items: vec![SaleLineItem {
                variant_id: "v-1".into(),
                quantity: 2,
                price_per_unit: 100.0,
                discount: 0.0,
            }],
            customer_id: None,
            discount: 30.0,
            payments: vec![SalePayment {
                payment_method_id: "pm-cash".into(),
                amount: 170.0,
            }],
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["items"][0]["variantId"], "v-1");
        assert_eq!(json["items"][0]["pricePerUnit"], 100.0);
        assert_eq!(json["discount"], 30.0);
        assert_eq!(json["payments"][0]["paymentMethodId"], "pm-cash");
        // Absent customer is omitted, not null
        assert!(json.get("customerId").is_none());
    }

    #[test]
    fn test_sale_record_converts_to_cents() {
        let record: SaleRecord = serde_json::from_str(
            r#"{
                "id": "sale-9",
                "items": [
                    {"id": "si-1", "pricePerUnit": 100.0, "quantity": 2,
                     "discountAmount": 0.0, "returnedQuantity": 1}
                ],
                "discount": 30.0,
                "totalAmount": 220.0,
                "paidAmount": 220.0
            }"#,
        )
        .unwrap();

        let sale: PersistedSale = record.into();
        assert_eq!(sale.items[0].price_per_unit, Money::from_cents(10000));
        assert_eq!(sale.items[0].returned_quantity, 1);
        assert_eq!(sale.discount, Money::from_cents(3000));
        assert_eq!(sale.total_amount, Money::from_cents(22000));
    }

    #[test]
    fn test_sale_record_defaults_and_legacy_alias() {
        // Older records omit optional fields and spell returned_quantity
        // in snake form
        let record: SaleRecord = serde_json::from_str(
            r#"{
                "id": "sale-1",
                "items": [{"id": "si-1", "pricePerUnit": 5.0, "quantity": 3,
                           "returned_quantity": 2}],
                "totalAmount": 15.0
            }"#,
        )
        .unwrap();
        assert_eq!(record.items[0].returned_quantity, 2);
        assert_eq!(record.items[0].discount_amount, 0.0);
        assert_eq!(record.discount, 0.0);
        assert_eq!(record.paid_amount, 0.0);
    }
}
