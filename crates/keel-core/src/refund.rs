//! # Returns Refund Calculator
//!
//! The inverse of the pricing pipeline: given a persisted historical sale
//! and requested return quantities, compute what each returned unit is
//! worth and the total refund due.
//!
//! ## Reconstruction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  For every line i of the sale (returning or not):                       │
//! │    subtotal_i  = price_per_unit_i × quantity_i − discount_amount_i      │
//! │                                                                         │
//! │  bill_subtotal = Σ subtotal_i            (over ALL lines)               │
//! │                                                                         │
//! │  For each requested line:                                               │
//! │    share_i  = subtotal_i / bill_subtotal × sale.discount                │
//! │    refund_i = (subtotal_i − share_i) × return_qty_i / quantity_i        │
//! │                                                                         │
//! │  total_refund = Σ refund_i              (over requested lines)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The global-discount share is re-derived PROPORTIONALLY here, not with
//! the distributor's remainder-to-last rule: the per-line shares computed
//! at sale time are not persisted, so there is nothing to reuse. The
//! divergence from the original exact shares is bounded by one cent per
//! line; `test_full_return_divergence_bound` documents it.
//!
//! Everything here is recomputed from scratch on every call from the
//! immutable sale record. Pure and re-entrant.

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{PersistedSale, ReturnRequestLine};

/// Refund due for one requested return line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundLine {
    pub sale_item_id: String,
    /// Units being returned.
    pub quantity: i64,
    pub refund: Money,
}

/// The refund for a whole return request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundCalculation {
    pub lines: Vec<RefundLine>,
    pub total: Money,
}

/// Computes the refund for `requested` return quantities against `sale`.
///
/// Rejects, locally and before any collaborator is called:
/// - a negative requested quantity (`ValidationError::MustBePositive`)
/// - a line referencing an item not on the sale (`SaleItemNotFound`)
/// - a quantity above `quantity − returned_quantity`
///   (`ReturnExceedsRemaining`)
/// - a request in which no line asks for any units (`EmptyReturn`)
///
/// Lines with a requested quantity of zero are ignored; the UI submits
/// its whole selection table and most rows are zero.
pub fn calculate_refund(
    sale: &PersistedSale,
    requested: &[ReturnRequestLine],
) -> CoreResult<RefundCalculation> {
    let bill_subtotal: Money = sale.items.iter().map(|i| i.subtotal()).sum();

    let mut lines = Vec::new();
    let mut total = Money::zero();

    for req in requested {
        if req.quantity < 0 {
            return Err(ValidationError::MustBePositive {
                field: "return quantity".to_string(),
            }
            .into());
        }
        if req.quantity == 0 {
            continue;
        }

        let item = sale
            .items
            .iter()
            .find(|i| i.id == req.sale_item_id)
            .ok_or_else(|| CoreError::SaleItemNotFound(req.sale_item_id.clone()))?;

        let remaining = item.remaining_quantity();
        if req.quantity > remaining {
            return Err(CoreError::ReturnExceedsRemaining {
                sale_item_id: item.id.clone(),
                remaining,
                requested: req.quantity,
            });
        }

        let subtotal = item.subtotal();
        let share = if bill_subtotal.is_positive() {
            sale.discount.ratio_of(subtotal.cents(), bill_subtotal.cents())
        } else {
            Money::zero()
        };

        // Multiply-first in cents; the single rounding step happens here.
        let refund = (subtotal - share).ratio_of(req.quantity, item.quantity);

        total += refund;
        lines.push(RefundLine {
            sale_item_id: item.id.clone(),
            quantity: req.quantity,
            refund,
        });
    }

    if lines.is_empty() {
        return Err(CoreError::EmptyReturn);
    }

    Ok(RefundCalculation { lines, total })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PersistedSaleItem;

    fn item(id: &str, price: i64, qty: i64, line_discount: i64, returned: i64) -> PersistedSaleItem {
        PersistedSaleItem {
            id: id.to_string(),
            price_per_unit: Money::from_cents(price),
            quantity: qty,
            discount_amount: Money::from_cents(line_discount),
            returned_quantity: returned,
        }
    }

    fn sale(items: Vec<PersistedSaleItem>, discount: i64) -> PersistedSale {
        let total: Money = items.iter().map(|i| i.subtotal()).sum();
        PersistedSale {
            id: "sale-1".to_string(),
            items,
            discount: Money::from_cents(discount),
            total_amount: total - Money::from_cents(discount),
            paid_amount: total - Money::from_cents(discount),
        }
    }

    fn req(id: &str, qty: i64) -> ReturnRequestLine {
        ReturnRequestLine {
            sale_item_id: id.to_string(),
            quantity: qty,
        }
    }

    /// The worked example: A($100.00 × 2), B($50.00 × 1), cart discount
    /// $30.00. A's share is $24.00, so one unit of A refunds $88.00.
    #[test]
    fn test_worked_example() {
        let s = sale(
            vec![item("a", 10000, 2, 0, 0), item("b", 5000, 1, 0, 0)],
            3000,
        );

        let calc = calculate_refund(&s, &[req("a", 1)]).unwrap();
        assert_eq!(calc.lines.len(), 1);
        assert_eq!(calc.lines[0].refund.cents(), 8800);
        assert_eq!(calc.total.cents(), 8800);

        // And B's single unit carries the remaining $6.00 share: 50 − 6
        let calc_b = calculate_refund(&s, &[req("b", 1)]).unwrap();
        assert_eq!(calc_b.total.cents(), 4400);
    }

    #[test]
    fn test_line_discount_reduces_the_base() {
        // $20.00 × 2 with a $4.00 line discount at sale time, no cart
        // discount: each unit paid (4000 − 400) / 2 = $18.00
        let s = sale(vec![item("a", 2000, 2, 400, 0)], 0);
        let calc = calculate_refund(&s, &[req("a", 1)]).unwrap();
        assert_eq!(calc.total.cents(), 1800);
    }

    #[test]
    fn test_honors_previously_returned() {
        let s = sale(vec![item("a", 1000, 2, 0, 1)], 0);

        // 1 of 2 already returned: exactly 1 more is fine
        assert!(calculate_refund(&s, &[req("a", 1)]).is_ok());

        // 3 requested with remaining 1: rejected locally
        let err = calculate_refund(&s, &[req("a", 3)]).unwrap_err();
        match err {
            CoreError::ReturnExceedsRemaining {
                remaining,
                requested,
                ..
            } => {
                assert_eq!(remaining, 1);
                assert_eq!(requested, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_item_rejected() {
        let s = sale(vec![item("a", 1000, 1, 0, 0)], 0);
        let err = calculate_refund(&s, &[req("ghost", 1)]).unwrap_err();
        assert!(matches!(err, CoreError::SaleItemNotFound(id) if id == "ghost"));
    }

    #[test]
    fn test_all_zero_quantities_rejected() {
        let s = sale(vec![item("a", 1000, 1, 0, 0)], 0);
        assert!(matches!(
            calculate_refund(&s, &[req("a", 0)]),
            Err(CoreError::EmptyReturn)
        ));
        assert!(matches!(calculate_refund(&s, &[]), Err(CoreError::EmptyReturn)));
    }

    #[test]
    fn test_negative_quantity_rejected() {
        let s = sale(vec![item("a", 1000, 1, 0, 0)], 0);
        assert!(matches!(
            calculate_refund(&s, &[req("a", -1)]),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn test_fractional_unit_net_rounds_once() {
        // 3 × $0.60 with a $0.05 line discount nets $1.75, 58.33 cents a
        // unit. Returning 2 units refunds round(175 × 2/3) = 117, not
        // 2 × round(58.33) = 116: multiply first, round once.
        let s = sale(vec![item("a", 60, 3, 5, 0)], 0);
        let calc = calculate_refund(&s, &[req("a", 2)]).unwrap();
        assert_eq!(calc.total.cents(), 117);
    }

    /// Documents the accepted divergence of the proportional reconstruction
    /// from the distributor's exact remainder rule: refunding EVERYTHING
    /// can differ from the historically paid net by at most one cent per
    /// line.
    #[test]
    fn test_full_return_divergence_bound() {
        let s = sale(
            vec![
                item("a", 1000, 1, 0, 0),
                item("b", 1000, 1, 0, 0),
                item("c", 1000, 1, 0, 0),
            ],
            100,
        );
        let calc = calculate_refund(&s, &[req("a", 1), req("b", 1), req("c", 1)]).unwrap();

        // Historical net paid: 3000 − 100 = 2900. Proportional shares are
        // 33 + 33 + 33, so the reconstruction refunds 2901.
        let historical_net = 2900;
        let divergence = (calc.total.cents() - historical_net).abs();
        assert_eq!(calc.total.cents(), 2901);
        assert!(divergence <= s.items.len() as i64);
    }

    #[test]
    fn test_zero_subtotal_sale_refunds_zero() {
        // Fully discounted sale: shares guard the zero division, refund 0
        let s = sale(vec![item("a", 0, 1, 0, 0)], 0);
        let calc = calculate_refund(&s, &[req("a", 1)]).unwrap();
        assert_eq!(calc.total, Money::zero());
    }

    #[test]
    fn test_idempotent() {
        let s = sale(
            vec![item("a", 999, 3, 100, 0), item("b", 4999, 1, 0, 0)],
            250,
        );
        let reqs = [req("a", 2), req("b", 1)];
        assert_eq!(
            calculate_refund(&s, &reqs).unwrap(),
            calculate_refund(&s, &reqs).unwrap()
        );
    }
}
