//! # Weighted-Average Costing
//!
//! Blends a receiving event's unit cost into an inventory record's running
//! average cost.
//!
//! ## The Invariant
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │               Weighted-Average Cost Blending                            │
//! │                                                                         │
//! │  Average cost is a quantity-weighted mean across ALL receiving events,  │
//! │  never a simple overwrite with the latest unit cost.                    │
//! │                                                                         │
//! │  On hand: 50 units @ $2.00 avg                                         │
//! │  Receive: 20 units @ $3.00                                             │
//! │                                                                         │
//! │  new_avg = (50 × 200¢ + 20 × 300¢) / (50 + 20)                         │
//! │          = 16000¢ / 70                                                  │
//! │          = 228.57¢  ($2.2857)      ← NOT $3.00, NOT $2.50              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Why f64 Here?
//! A quantity-weighted mean is inherently fractional (228.57¢ above). This is
//! the one place in the system that carries fractional cents; every ledger
//! total stays in integer cents.

/// Blends a received cost into a running average cost.
///
/// ## Arguments
/// * `current_qty` - On-hand quantity before the receipt
/// * `current_avg_cents` - Running average unit cost, in (fractional) cents
/// * `received_qty` - Quantity received (positive)
/// * `unit_cost_cents` - Acquisition cost per unit of this receipt, in cents
///
/// ## Returns
/// The new quantity-weighted average unit cost in fractional cents. When the
/// combined quantity is not positive (e.g. blending into a record that was
/// driven negative), the incoming unit cost is returned unchanged, since a
/// weighted mean over a non-positive base is meaningless.
pub fn blend_average_cost(
    current_qty: i64,
    current_avg_cents: f64,
    received_qty: i64,
    unit_cost_cents: f64,
) -> f64 {
    let new_qty = current_qty + received_qty;
    if new_qty <= 0 {
        return unit_cost_cents;
    }

    // Negative on-hand (backorder) contributes nothing to the blend;
    // weighting by a negative quantity would skew the mean off the rails.
    let base_qty = current_qty.max(0);
    let blended_qty = base_qty + received_qty;
    if blended_qty <= 0 {
        return unit_cost_cents;
    }

    (base_qty as f64 * current_avg_cents + received_qty as f64 * unit_cost_cents)
        / blended_qty as f64
}

// =============================================================================
// Unit Tests
// =============================================================================
