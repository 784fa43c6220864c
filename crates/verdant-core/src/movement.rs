//! # Stock Movement Classification
//!
//! Movement types and the rules for turning a requested quantity into a
//! signed inventory delta.
//!
//! ## Why Class-Derived Signs?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   Movement Sign Derivation                              │
//! │                                                                         │
//! │  ❌ WRONG: trust the caller's sign                                      │
//! │     record_movement("sale", -5)   → what does a negative sale mean?     │
//! │     record_movement("sale", +5)   → a typo'd sign now INFLATES stock    │
//! │                                                                         │
//! │  ✅ CORRECT: derive the sign from the movement class                    │
//! │     Inbound  {purchase, return, found, adjustment}      → +quantity     │
//! │     Outbound {sale, damage, loss, pos_sale, online_order} → -quantity   │
//! │                                                                         │
//! │  Callers always pass a positive magnitude; the class decides the        │
//! │  direction. A "sale" can never add stock.                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

// =============================================================================
// Movement Class
// =============================================================================

/// The direction a movement type pushes on-hand quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementClass {
    /// Increases on-hand quantity (receiving, returns, found stock).
    Inbound,
    /// Decreases on-hand quantity (sales, shrinkage, damage).
    Outbound,
}

// =============================================================================
// Movement Type
// =============================================================================

/// The business reason for an inventory quantity change.
///
/// Every type belongs to exactly one [`MovementClass`]; the class - not the
/// caller - determines whether the quantity is applied as an increase or a
/// decrease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    /// Stock received against a purchase order. Carries acquisition cost.
    Purchase,
    /// Customer return restocked to shelf.
    Return,
    /// Stock discovered during a count (positive correction).
    Found,
    /// Manual positive correction by a manager.
    Adjustment,
    /// Generic sale deduction (non-POS channel).
    Sale,
    /// Stock damaged and removed from sellable inventory.
    Damage,
    /// Stock lost to shrinkage.
    Loss,
    /// Sale completed at a point-of-sale register.
    PosSale,
    /// Sale fulfilled from an online order.
    OnlineOrder,
}

impl MovementType {
    /// Returns the class this movement type belongs to.
    pub const fn class(&self) -> MovementClass {
        match self {
            MovementType::Purchase
            | MovementType::Return
            | MovementType::Found
            | MovementType::Adjustment => MovementClass::Inbound,

            MovementType::Sale
            | MovementType::Damage
            | MovementType::Loss
            | MovementType::PosSale
            | MovementType::OnlineOrder => MovementClass::Outbound,
        }
    }

    /// Applies the class sign to a positive magnitude.
    ///
    /// ## Example
    /// ```rust
    /// use verdant_core::movement::MovementType;
    ///
    /// assert_eq!(MovementType::Purchase.signed_quantity(20), 20);
    /// assert_eq!(MovementType::PosSale.signed_quantity(5), -5);
    /// ```
    pub const fn signed_quantity(&self, magnitude: i64) -> i64 {
        match self.class() {
            MovementClass::Inbound => magnitude,
            MovementClass::Outbound => -magnitude,
        }
    }

    /// Whether this movement type deducts from on-hand quantity.
    pub const fn is_deduction(&self) -> bool {
        matches!(self.class(), MovementClass::Outbound)
    }

    /// The wire/database representation (snake_case).
    pub const fn as_str(&self) -> &'static str {
        match self {
            MovementType::Purchase => "purchase",
            MovementType::Return => "return",
            MovementType::Found => "found",
            MovementType::Adjustment => "adjustment",
            MovementType::Sale => "sale",
            MovementType::Damage => "damage",
            MovementType::Loss => "loss",
            MovementType::PosSale => "pos_sale",
            MovementType::OnlineOrder => "online_order",
        }
    }
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovementType {
    type Err = CoreError;

    /// Parses the wire representation. Unknown types are an invalid-state
    /// error, not a silent default - a typo'd movement type must never
    /// fall through to some arbitrary class.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "purchase" => Ok(MovementType::Purchase),
            "return" => Ok(MovementType::Return),
            "found" => Ok(MovementType::Found),
            "adjustment" => Ok(MovementType::Adjustment),
            "sale" => Ok(MovementType::Sale),
            "damage" => Ok(MovementType::Damage),
            "loss" => Ok(MovementType::Loss),
            "pos_sale" => Ok(MovementType::PosSale),
            "online_order" => Ok(MovementType::OnlineOrder),
            other => Err(CoreError::UnknownMovementType(other.to_string())),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
