//! # Discount Distributor
//!
//! Distributes one cart-level discount across line net amounts so that the
//! shares sum to the distributed amount EXACTLY, not merely approximately.
//!
//! ## The Conservation Problem
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Cart discount $1.00, three equal lines:                                │
//! │                                                                         │
//! │  Naive proportional rounding:  33 + 33 + 33 = 99   ❌ lost a cent       │
//! │                                                                         │
//! │  Remainder-to-last:            33 + 33 + 34 = 100  ✅ exact             │
//! │                                                                         │
//! │  Every line except the LAST gets its rounded proportional share;        │
//! │  the last line gets whatever is left. The last share is NEVER           │
//! │  computed by its own proportional formula.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Order Sensitivity
//! The remainder lands on the last element of the list AS CURRENTLY
//! ORDERED, so the distributor is not invariant under line reordering.
//! That is an accepted design property, not a defect; the checkout payload
//! carries the distributed TOTAL as a single number precisely so that
//! downstream consumers never re-derive it from the shares.

use crate::money::Money;
use crate::types::{Discount, MAX_DISCOUNT_BPS};

/// Result of distributing a cart-level discount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributedDiscount {
    /// The concrete amount distributed, after resolving a percentage
    /// against the gross and clamping a fixed amount to it.
    pub total: Money,

    /// One share per input line, in input order. Sums to `total` exactly.
    pub shares: Vec<Money>,
}

impl DistributedDiscount {
    /// A distribution of nothing over `n` lines.
    fn zeroes(n: usize) -> Self {
        DistributedDiscount {
            total: Money::zero(),
            shares: vec![Money::zero(); n],
        }
    }
}

/// Distributes `discount` across `line_nets` (post line-discount amounts).
///
/// Invariants, for every input:
/// - `shares.iter().sum() == total`, to the cent
/// - no share is negative
/// - `shares.len() == line_nets.len()`
///
/// If the gross (sum of nets) is zero, every share is zero regardless of
/// the discount configuration; there is no division by zero.
///
/// Each non-last share is capped at the still-undistributed remainder:
/// with half-up rounding over many small lines the running sum could
/// otherwise overshoot `total` and force the last share negative. The cap
/// only engages in that degenerate case; everywhere else the shares are
/// the plain rounded proportions.
pub fn distribute_discount(discount: Discount, line_nets: &[Money]) -> DistributedDiscount {
    if line_nets.is_empty() {
        return DistributedDiscount {
            total: Money::zero(),
            shares: Vec::new(),
        };
    }

    let gross: Money = line_nets.iter().copied().sum();
    if !gross.is_positive() {
        return DistributedDiscount::zeroes(line_nets.len());
    }

    // The second of the two exhaustive `Discount` call sites.
    let total = match discount {
        Discount::Percentage(bps) => gross.percent_of(bps.min(MAX_DISCOUNT_BPS)),
        Discount::Amount(value) => value.max_zero().min(gross),
    };

    let mut shares = Vec::with_capacity(line_nets.len());
    let mut running = Money::zero();

    for net in &line_nets[..line_nets.len() - 1] {
        let proportional = total.ratio_of(net.cents(), gross.cents());
        let share = proportional.min(total - running);
        running += share;
        shares.push(share);
    }

    // The last line absorbs the remainder. Never its own proportion.
    shares.push(total - running);

    DistributedDiscount { total, shares }
}

// =============================================================================
// Unit Tests
// =============================================================================
