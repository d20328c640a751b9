//! # Bill Session Store
//!
//! Holds the nine concurrent draft bills and the active-slot pointer.
//!
//! ## Thread Safety
//! The slots are wrapped in `Arc<Mutex<T>>` because:
//! 1. Multiple commands may access/modify bills
//! 2. Only one command should modify a bill at a time
//! 3. The tax recompute task reads from a spawned task
//!
//! ## Bill Slot Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Bill Session Operations                              │
//! │                                                                         │
//! │  Frontend Action          Session Call             State Change         │
//! │  ───────────────          ────────────             ────────────         │
//! │                                                                         │
//! │  Click Bill Tab 3 ───────► set_active_slot(3) ───► active = 3           │
//! │                                                    (slot 3 UNTOUCHED)   │
//! │                                                                         │
//! │  Add Product ────────────► with_active_mut ──────► items.push(line)     │
//! │                                                                         │
//! │  Pick Customer ──────────► update_active(patch) ─► customer_id = …      │
//! │                                                                         │
//! │  Checkout OK ────────────► reset_slot(i) ────────► slot i fresh         │
//! │                                                                         │
//! │  ISOLATION INVARIANT: mutating one slot is NEVER observable from        │
//! │  another. The active index is the only cross-slot shared state and      │
//! │  moves only on explicit slot switches.                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use keel_core::validation::{parse_tendered, validate_quantity, validate_unit_price};
use keel_core::{
    distribute_discount, price_line, CartLine, CoreError, CoreResult, Discount,
    DistributedDiscount, Money, PaymentType, PricedLine, TaxResult, BILL_SLOT_COUNT,
    MAX_BILL_ITEMS, MAX_ITEM_QUANTITY,
};

use crate::error::{RegisterError, RegisterResult};

// =============================================================================
// Bill
// =============================================================================

/// One draft bill: the items, the cart-level discount, the payment
/// configuration, and the most recent tax result.
///
/// ## Invariants
/// - Lines are unique by `variant_id` (adding the same variant increases
///   quantity)
/// - Quantity is > 0 while a line exists (setting 0 removes it)
/// - Maximum lines: 100, maximum quantity per line: 999 (keel-core caps)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    /// Lines in the bill.
    pub items: Vec<CartLine>,

    /// Selected customer, if any. Forwarded to the tax collaborator
    /// because tax categories may vary by customer.
    pub customer_id: Option<String>,

    /// Selected payment method, required at checkout.
    pub payment_method_id: Option<String>,

    /// Cart-level discount, distributed across lines at recompute time.
    pub overall_discount: Discount,

    /// Full or partial settlement.
    pub payment_type: PaymentType,

    /// Amount the customer tendered, parsed from the UI field.
    pub amount_tendered: Money,

    /// Most recent tax collaborator result for this bill.
    pub last_tax_result: Option<TaxResult>,

    /// Input signature `last_tax_result` was computed for. A result is
    /// only trusted while this matches `signature()`; after any pricing
    /// edit it silently goes stale.
    pub tax_signature: Option<u64>,

    /// When the bill was created/last reset.
    pub created_at: DateTime<Utc>,
}

impl Bill {
    /// Creates a new empty bill.
    pub fn new() -> Self {
        Bill {
            items: Vec::new(),
            customer_id: None,
            payment_method_id: None,
            overall_discount: Discount::none(),
            payment_type: PaymentType::Full,
            amount_tendered: Money::zero(),
            last_tax_result: None,
            tax_signature: None,
            created_at: Utc::now(),
        }
    }

    /// Checks if the bill has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    // =========================================================================
    // Line Operations
    // =========================================================================

    /// Adds a line to the bill or increases quantity if the variant is
    /// already present.
    pub fn add_line(&mut self, line: CartLine) -> CoreResult<()> {
        validate_quantity(line.quantity)?;
        validate_unit_price(line.unit_price)?;

        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|l| l.variant_id == line.variant_id)
        {
            let new_qty = existing.quantity + line.quantity;
            if new_qty > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_qty,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            existing.quantity = new_qty;
            return Ok(());
        }

        if self.items.len() >= MAX_BILL_ITEMS {
            return Err(CoreError::BillTooLarge {
                max: MAX_BILL_ITEMS,
            });
        }

        self.items.push(line);
        Ok(())
    }

    /// Updates the quantity of a line. Quantity 0 removes the line.
    pub fn update_quantity(&mut self, line_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity == 0 {
            return self.remove_line(line_id);
        }
        validate_quantity(quantity)?;

        let line = self.line_mut(line_id)?;
        line.quantity = quantity;
        Ok(())
    }

    /// Overrides a line's unit price (price edits at the register).
    pub fn set_unit_price(&mut self, line_id: &str, unit_price: Money) -> CoreResult<()> {
        validate_unit_price(unit_price)?;

        let line = self.line_mut(line_id)?;
        line.unit_price = unit_price;
        Ok(())
    }

    /// Sets a line's discount. Out-of-range values are clamped at pricing
    /// time, so any configuration is accepted here.
    pub fn set_line_discount(&mut self, line_id: &str, discount: Discount) -> CoreResult<()> {
        let line = self.line_mut(line_id)?;
        line.discount = discount;
        Ok(())
    }

    /// Removes a line from the bill.
    pub fn remove_line(&mut self, line_id: &str) -> CoreResult<()> {
        let initial_len = self.items.len();
        self.items.retain(|l| l.line_id != line_id);

        if self.items.len() == initial_len {
            Err(CoreError::LineNotFound(line_id.to_string()))
        } else {
            Ok(())
        }
    }

    fn line_mut(&mut self, line_id: &str) -> CoreResult<&mut CartLine> {
        self.items
            .iter_mut()
            .find(|l| l.line_id == line_id)
            .ok_or_else(|| CoreError::LineNotFound(line_id.to_string()))
    }

    /// Resets the bill to empty. Only called after a successful checkout
    /// of this slot.
    pub fn reset(&mut self) {
        *self = Bill::new();
    }

    // =========================================================================
    // Derived Amounts
    // =========================================================================

    /// Prices every line (subtotal, line discount, net), in order.
    pub fn priced_lines(&self) -> Vec<PricedLine> {
        self.items.iter().map(price_line).collect()
    }

    /// Sum of line nets, the base the cart-level discount applies to.
    pub fn gross_total(&self) -> Money {
        self.priced_lines().iter().map(|p| p.net).sum()
    }

    /// Distributes the cart-level discount over the current line nets.
    pub fn distribution(&self) -> DistributedDiscount {
        let nets: Vec<Money> = self.priced_lines().iter().map(|p| p.net).collect();
        distribute_discount(self.overall_discount, &nets)
    }

    /// The concrete cart-level discount amount.
    pub fn discount_total(&self) -> Money {
        self.distribution().total
    }

    /// Locally-approximated total: gross minus cart discount, no tax.
    /// This is what the UI shows while tax is unknown.
    pub fn estimated_total(&self) -> Money {
        self.gross_total() - self.discount_total()
    }

    /// The tax result, but only while it still matches the current input
    /// signature. Any pricing edit makes it stale without clearing it.
    pub fn fresh_tax_result(&self) -> Option<&TaxResult> {
        match (&self.last_tax_result, self.tax_signature) {
            (Some(result), Some(sig)) if sig == self.signature() => Some(result),
            _ => None,
        }
    }

    /// The amount due right now: the taxed grand total when a fresh tax
    /// result exists, the untaxed estimate otherwise.
    pub fn payable_total(&self) -> Money {
        self.fresh_tax_result()
            .map(|t| t.grand_total)
            .unwrap_or_else(|| self.estimated_total())
    }

    // =========================================================================
    // Input Signature
    // =========================================================================

    /// Hash of every input the tax computation depends on: the line list
    /// (id, price, quantity, discount, tax category), the cart-level
    /// discount, and the customer. Tendered amount and payment method are
    /// deliberately excluded; they do not affect tax.
    ///
    /// Outgoing tax requests are tagged with this value and responses
    /// whose tag no longer matches are dropped.
    pub fn signature(&self) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();

        self.items.len().hash(&mut hasher);
        for line in &self.items {
            line.line_id.hash(&mut hasher);
            line.unit_price.hash(&mut hasher);
            line.quantity.hash(&mut hasher);
            line.discount.hash(&mut hasher);
            line.tax_category_id.hash(&mut hasher);
        }
        self.overall_discount.hash(&mut hasher);
        self.customer_id.hash(&mut hasher);

        hasher.finish()
    }
}

impl Default for Bill {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Bill Update (structural merge)
// =============================================================================

/// A partial update merged into the active bill. `None` means "leave the
/// field as it is" (the same convention the frontend uses for item
/// changes); clearing an optional field is a dedicated operation, not a
/// patch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillUpdate {
    pub customer_id: Option<String>,
    pub payment_method_id: Option<String>,
    pub overall_discount: Option<Discount>,
    pub payment_type: Option<PaymentType>,
    pub amount_tendered: Option<Money>,
}

impl Bill {
    /// Merges a partial update into this bill.
    pub fn apply_update(&mut self, update: BillUpdate) {
        if let Some(customer_id) = update.customer_id {
            self.customer_id = Some(customer_id);
        }
        if let Some(payment_method_id) = update.payment_method_id {
            self.payment_method_id = Some(payment_method_id);
        }
        if let Some(discount) = update.overall_discount {
            self.overall_discount = discount;
        }
        if let Some(payment_type) = update.payment_type {
            self.payment_type = payment_type;
        }
        if let Some(tendered) = update.amount_tendered {
            self.amount_tendered = tendered;
        }
    }
}

// =============================================================================
// Bill Slots
// =============================================================================

/// The nine bill slots and the active pointer.
#[derive(Debug)]
pub struct BillSlots {
    bills: Vec<Bill>,
    active: usize,
}

impl BillSlots {
    /// Creates nine fresh slots with slot 0 active.
    pub fn new() -> Self {
        BillSlots {
            bills: (0..BILL_SLOT_COUNT).map(|_| Bill::new()).collect(),
            active: 0,
        }
    }

    /// Index of the active slot.
    pub fn active_index(&self) -> usize {
        self.active
    }

    /// The active bill.
    pub fn active(&self) -> &Bill {
        &self.bills[self.active]
    }

    /// The active bill, mutably.
    pub fn active_mut(&mut self) -> &mut Bill {
        &mut self.bills[self.active]
    }

    /// A slot by index.
    pub fn slot(&self, index: usize) -> Option<&Bill> {
        self.bills.get(index)
    }

    /// A slot by index, mutably.
    pub fn slot_mut(&mut self, index: usize) -> Option<&mut Bill> {
        self.bills.get_mut(index)
    }

    /// Switches the active slot. The destination slot keeps whatever
    /// state it already had; nothing is cleared on a switch.
    pub fn set_active(&mut self, index: usize) -> RegisterResult<()> {
        if index >= BILL_SLOT_COUNT {
            return Err(RegisterError::SlotOutOfRange {
                index,
                max: BILL_SLOT_COUNT - 1,
            });
        }
        debug!(previous = self.active, next = index, "switching bill slot");
        self.active = index;
        Ok(())
    }

    /// Resets one slot to empty (after its successful checkout).
    pub fn reset_slot(&mut self, index: usize) {
        if let Some(bill) = self.bills.get_mut(index) {
            bill.reset();
        }
    }
}

impl Default for BillSlots {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Session State
// =============================================================================

/// Shared session state handle.
///
/// ## Thread Safety
/// Uses `Arc<Mutex<BillSlots>>` because:
/// - `Arc`: shared between commands and the spawned tax recompute task
/// - `Mutex`: one mutator at a time; every critical section is a short
///   read-or-write with no await inside
#[derive(Debug, Clone)]
pub struct SessionState {
    slots: Arc<Mutex<BillSlots>>,
}

impl SessionState {
    /// Creates a fresh session: nine empty bills, slot 0 active.
    pub fn new() -> Self {
        SessionState {
            slots: Arc::new(Mutex::new(BillSlots::new())),
        }
    }

    /// Executes a function with read access to the slots.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let total = session.with_slots(|s| s.active().payable_total());
    /// ```
    pub fn with_slots<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&BillSlots) -> R,
    {
        let slots = self.slots.lock().expect("Bill slots mutex poisoned");
        f(&slots)
    }

    /// Executes a function with write access to the slots.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// session.with_slots_mut(|s| s.active_mut().add_line(line))?;
    /// ```
    pub fn with_slots_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut BillSlots) -> R,
    {
        let mut slots = self.slots.lock().expect("Bill slots mutex poisoned");
        f(&mut slots)
    }

    /// Switches the active slot.
    pub fn set_active_slot(&self, index: usize) -> RegisterResult<()> {
        self.with_slots_mut(|s| s.set_active(index))
    }

    /// Merges a partial update into the active bill only.
    pub fn update_active(&self, update: BillUpdate) {
        self.with_slots_mut(|s| s.active_mut().apply_update(update));
    }

    /// Parses the UI's tendered-amount field and applies it to the active
    /// bill. Rejecting here (unparsable, negative) leaves the bill
    /// untouched.
    pub fn set_tendered_input(&self, raw: &str) -> RegisterResult<()> {
        let tendered = parse_tendered(raw)?;
        self.with_slots_mut(|s| s.active_mut().amount_tendered = tendered);
        Ok(())
    }

    /// Resets the active bill to empty.
    pub fn reset_active(&self) {
        self.with_slots_mut(|s| {
            let index = s.active_index();
            s.reset_slot(index);
        });
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use keel_core::types::TaxResult;

    fn line(variant: &str, price_cents: i64, qty: i64) -> CartLine {
        CartLine::new(variant, format!("Product {variant}"), Money::from_cents(price_cents), qty)
    }

    #[test]
    fn test_add_line() {
        let mut bill = Bill::new();
        bill.add_line(line("v-1", 999, 2)).unwrap();

        assert_eq!(bill.items.len(), 1);
        assert_eq!(bill.gross_total().cents(), 1998);
    }

    #[test]
    fn test_add_same_variant_increases_quantity() {
        let mut bill = Bill::new();
        bill.add_line(line("v-1", 999, 2)).unwrap();
        bill.add_line(line("v-1", 999, 3)).unwrap();

        assert_eq!(bill.items.len(), 1); // Still one unique line
        assert_eq!(bill.items[0].quantity, 5);
    }

    #[test]
    fn test_quantity_zero_removes() {
        let mut bill = Bill::new();
        bill.add_line(line("v-1", 999, 2)).unwrap();
        let id = bill.items[0].line_id.clone();

        bill.update_quantity(&id, 0).unwrap();
        assert!(bill.is_empty());
    }

    #[test]
    fn test_unknown_line_rejected() {
        let mut bill = Bill::new();
        assert!(matches!(
            bill.update_quantity("ghost", 2),
            Err(CoreError::LineNotFound(_))
        ));
        assert!(matches!(
            bill.remove_line("ghost"),
            Err(CoreError::LineNotFound(_))
        ));
    }

    #[test]
    fn test_quantity_cap() {
        let mut bill = Bill::new();
        bill.add_line(line("v-1", 100, 999)).unwrap();
        assert!(matches!(
            bill.add_line(line("v-1", 100, 1)),
            Err(CoreError::QuantityTooLarge { .. })
        ));
    }

    #[test]
    fn test_totals_with_overall_discount() {
        let mut bill = Bill::new();
        bill.add_line(line("v-1", 10000, 2)).unwrap();
        bill.add_line(line("v-2", 5000, 1)).unwrap();
        bill.overall_discount = Discount::amount(Money::from_cents(3000));

        assert_eq!(bill.gross_total().cents(), 25000);
        assert_eq!(bill.discount_total().cents(), 3000);
        assert_eq!(bill.estimated_total().cents(), 22000);

        let d = bill.distribution();
        assert_eq!(d.shares, vec![Money::from_cents(2400), Money::from_cents(600)]);
    }

    #[test]
    fn test_payable_falls_back_to_estimate() {
        let mut bill = Bill::new();
        bill.add_line(line("v-1", 1000, 1)).unwrap();

        // No tax result yet: untaxed estimate
        assert_eq!(bill.payable_total().cents(), 1000);

        // Fresh tax result: grand total wins
        bill.last_tax_result = Some(TaxResult {
            total_tax: Money::from_cents(83),
            grand_total: Money::from_cents(1083),
            per_item: vec![],
        });
        bill.tax_signature = Some(bill.signature());
        assert_eq!(bill.payable_total().cents(), 1083);

        // Edit the cart: the stored result silently goes stale
        let id = bill.items[0].line_id.clone();
        bill.update_quantity(&id, 2).unwrap();
        assert!(bill.fresh_tax_result().is_none());
        assert_eq!(bill.payable_total().cents(), 2000);
    }

    #[test]
    fn test_signature_tracks_pricing_inputs_only() {
        let mut bill = Bill::new();
        bill.add_line(line("v-1", 1000, 1)).unwrap();
        let base = bill.signature();

        // Pricing inputs move the signature
        let id = bill.items[0].line_id.clone();
        bill.update_quantity(&id, 2).unwrap();
        assert_ne!(bill.signature(), base);
        let after_qty = bill.signature();

        bill.overall_discount = Discount::percent(5.0);
        assert_ne!(bill.signature(), after_qty);

        bill.customer_id = Some("cust-1".into());
        let with_customer = bill.signature();
        assert_ne!(with_customer, after_qty);

        // Payment fields do not
        bill.amount_tendered = Money::from_cents(5000);
        bill.payment_method_id = Some("pm-cash".into());
        bill.payment_type = PaymentType::Partial;
        assert_eq!(bill.signature(), with_customer);
    }

    #[test]
    fn test_signature_deterministic() {
        let mut bill = Bill::new();
        bill.add_line(line("v-1", 1234, 3)).unwrap();
        assert_eq!(bill.signature(), bill.clone().signature());
    }

    #[test]
    fn test_slot_isolation() {
        let session = SessionState::new();

        session.with_slots_mut(|s| s.active_mut().add_line(line("v-1", 999, 1))).unwrap();
        session.update_active(BillUpdate {
            customer_id: Some("cust-7".into()),
            ..Default::default()
        });

        // Switching reveals an untouched empty slot
        session.set_active_slot(1).unwrap();
        session.with_slots(|s| {
            assert!(s.active().is_empty());
            assert_eq!(s.active().customer_id, None);
        });

        // Mutating slot 1 leaves slot 0 intact
        session.with_slots_mut(|s| s.active_mut().add_line(line("v-9", 500, 4))).unwrap();
        session.set_active_slot(0).unwrap();
        session.with_slots(|s| {
            assert_eq!(s.active().items.len(), 1);
            assert_eq!(s.active().items[0].variant_id, "v-1");
            assert_eq!(s.active().customer_id.as_deref(), Some("cust-7"));
            // And slot 1 still has its own line
            assert_eq!(s.slot(1).unwrap().items[0].variant_id, "v-9");
        });
    }

    #[test]
    fn test_update_active_touches_active_only() {
        let session = SessionState::new();
        session.update_active(BillUpdate {
            payment_method_id: Some("pm-card".into()),
            amount_tendered: Some(Money::from_cents(12000)),
            ..Default::default()
        });

        session.with_slots(|s| {
            assert_eq!(s.active().payment_method_id.as_deref(), Some("pm-card"));
            for i in 1..BILL_SLOT_COUNT {
                assert_eq!(s.slot(i).unwrap().payment_method_id, None);
            }
        });
    }

    #[test]
    fn test_reset_active_clears_one_slot() {
        let session = SessionState::new();
        session.with_slots_mut(|s| s.active_mut().add_line(line("v-1", 999, 1))).unwrap();
        session.set_active_slot(2).unwrap();
        session.with_slots_mut(|s| s.active_mut().add_line(line("v-2", 500, 1))).unwrap();

        session.reset_active();
        session.with_slots(|s| {
            assert!(s.active().is_empty());
            assert_eq!(s.slot(0).unwrap().items.len(), 1);
        });
    }

    #[test]
    fn test_set_tendered_input() {
        let session = SessionState::new();

        session.set_tendered_input("119.99").unwrap();
        session.with_slots(|s| {
            assert_eq!(s.active().amount_tendered, Money::from_cents(11999));
        });

        // A bad field leaves the previous value in place
        assert!(session.set_tendered_input("12,50").is_err());
        session.with_slots(|s| {
            assert_eq!(s.active().amount_tendered, Money::from_cents(11999));
        });
    }

    #[test]
    fn test_set_active_out_of_range() {
        let session = SessionState::new();
        assert!(matches!(
            session.set_active_slot(BILL_SLOT_COUNT),
            Err(RegisterError::SlotOutOfRange { index, max })
                if index == BILL_SLOT_COUNT && max == BILL_SLOT_COUNT - 1
        ));
    }
}
