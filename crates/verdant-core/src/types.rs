//! # Domain Types
//!
//! Core domain types for the session/inventory subsystem.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Register     │   │     Session     │   │ InventoryRecord │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  location_id    │◄──┤  register_id    │   │  product_id     │       │
//! │  │  status         │   │  session_number │   │  quantity       │       │
//! │  └─────────────────┘   │  counters...    │   │  avg_cost_cents │       │
//! │                        └────────┬────────┘   └────────┬────────┘       │
//! │                                 │                     │                 │
//! │                        ┌────────▼────────┐   ┌────────▼────────┐       │
//! │                        │      Sale       │──►│  StockMovement  │       │
//! │                        │  (line items)   │   │  (audit trail)  │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID where applicable (session_number, sale_number) -
//!   human-readable, time-derived, NOT the uniqueness anchor

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::movement::MovementType;

// =============================================================================
// Register
// =============================================================================

/// Lifecycle status of a register. Registers are never deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum RegisterStatus {
    /// Register can open sessions and take sales.
    Active,
    /// Register is retired; it keeps its history but opens no new sessions.
    Inactive,
}

/// A physical or logical POS terminal at a store location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Register {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Store location this terminal lives at.
    pub location_id: String,

    /// Vendor (tenant) that owns the location.
    pub vendor_id: String,

    /// Display name shown to operators ("Front Counter 1").
    pub name: String,

    /// Active/inactive lifecycle flag.
    pub status: RegisterStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Register {
    /// Whether the register may open a new session.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == RegisterStatus::Active
    }
}

// =============================================================================
// Session
// =============================================================================

/// Status of a cash-drawer session.
///
/// ## State Machine
/// `open -> closed` is the only transition. No reopening; `closed` is
/// terminal and the row becomes immutable history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Drawer is open; sales accumulate into the running counters.
    Open,
    /// Drawer has been reconciled and closed; counters are frozen.
    Closed,
}

/// One open cash-drawer period on a register.
///
/// ## The Core Invariant
/// At most one session with `status = open` exists per register at any time.
/// Enforced redundantly: the get-or-create path serializes on a write lock
/// before checking, AND a partial unique index on
/// `(register_id) WHERE status = 'open'` rejects anything that slips past.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Session {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Human-readable business identifier: `S-YYYYMMDD-HHMMSS`.
    /// Collision-tolerant - uniqueness comes from the register-scoped
    /// index, not from this value.
    pub session_number: String,

    pub register_id: String,
    pub location_id: String,
    pub vendor_id: String,

    /// Operator who opened the drawer.
    pub operator_id: String,

    pub status: SessionStatus,

    /// Cash float counted into the drawer at open.
    pub opening_cash_cents: i64,

    // -- Running counters (monotone while open, frozen at close) ------------
    /// Gross sales rolled into this session.
    pub total_sales_cents: i64,
    /// Number of completed sale transactions.
    pub total_transactions: i64,
    /// Cash-tendered portion of sales.
    pub total_cash_cents: i64,
    /// Card-tendered portion of sales.
    pub total_card_cents: i64,
    /// Walk-in sale count.
    pub walk_in_sales: i64,
    /// Pickup orders fulfilled at this register.
    pub pickup_orders_fulfilled: i64,

    pub opened_at: DateTime<Utc>,
    /// Stamped by every counter-rolling sale; None until the first one.
    pub last_transaction_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Whether sales may still be recorded against this session.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.status == SessionStatus::Open
    }
}

// =============================================================================
// Session Counters
// =============================================================================

/// The named running counters a sale can roll into.
///
/// ## Two Kinds of Counters
/// ```text
/// Money counters (cents)       Count counters (units)
/// ──────────────────────       ──────────────────────
/// total_sales                  walk_in_sales
/// total_cash                   pickup_orders_fulfilled
/// total_card
/// ```
/// Money counters indicate a completed sale: incrementing one also rolls the
/// amount into `total_sales` (for the tender-split counters), bumps
/// `total_transactions` and stamps `last_transaction_at` - all in the same
/// single UPDATE statement. Count counters only touch their own column and
/// the transaction timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionCounter {
    TotalSales,
    TotalCash,
    TotalCard,
    WalkInSales,
    PickupOrdersFulfilled,
}

impl SessionCounter {
    /// Whether an increment of this counter represents a completed sale
    /// (and therefore also rolls total_sales / total_transactions).
    pub const fn counts_as_sale(&self) -> bool {
        matches!(
            self,
            SessionCounter::TotalSales | SessionCounter::TotalCash | SessionCounter::TotalCard
        )
    }

    /// The wire/database column name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            SessionCounter::TotalSales => "total_sales",
            SessionCounter::TotalCash => "total_cash",
            SessionCounter::TotalCard => "total_card",
            SessionCounter::WalkInSales => "walk_in_sales",
            SessionCounter::PickupOrdersFulfilled => "pickup_orders_fulfilled",
        }
    }

    /// Parses the wire representation used by the increment endpoint.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "total_sales" => Some(SessionCounter::TotalSales),
            "total_cash" => Some(SessionCounter::TotalCash),
            "total_card" => Some(SessionCounter::TotalCard),
            "walk_in_sales" => Some(SessionCounter::WalkInSales),
            "pickup_orders_fulfilled" => Some(SessionCounter::PickupOrdersFulfilled),
            _ => None,
        }
    }
}

// =============================================================================
// Inventory
// =============================================================================

/// On-hand quantity of one product at one location, owned by a vendor.
///
/// This is the primary contended row in the system: every sale of the
/// product at the location funnels through it. Mutations happen ONLY via
/// single conditional UPDATE statements; zero quantity is a valid state and
/// records are never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InventoryRecord {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Product identity is opaque here; the catalog lives outside this
    /// subsystem.
    pub product_id: String,

    pub location_id: String,
    pub vendor_id: String,

    /// Units on hand. May go negative only when `allow_negative_stock`.
    pub quantity: i64,

    /// Quantity-weighted average acquisition cost, in fractional cents.
    pub avg_cost_cents: f64,

    /// Explicit backorder policy: when false (default), deductions below
    /// zero are rejected as insufficient stock.
    pub allow_negative_stock: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Stock Movement
// =============================================================================

/// Immutable audit row for a single inventory quantity change.
///
/// ## Audit Invariant
/// `quantity_after = quantity_before + quantity` where `quantity` is signed
/// by the movement class, and the inventory row's on-hand quantity after the
/// operation equals `quantity_after`. Created once per inventory-affecting
/// event; never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockMovement {
    /// Unique identifier (UUID v4).
    pub id: String,

    pub inventory_id: String,
    pub product_id: String,

    pub movement_type: MovementType,

    /// Signed quantity change (negative for outbound classes).
    pub quantity: i64,
    pub quantity_before: i64,
    pub quantity_after: i64,

    /// Location transition, where meaningful (transfers, receiving).
    pub from_location_id: Option<String>,
    pub to_location_id: Option<String>,

    /// Acquisition cost per unit for receiving movements.
    pub cost_per_unit_cents: Option<i64>,

    /// What caused this movement: "sale", "purchase_order", "adjustment"...
    pub reference_type: Option<String>,
    /// Id of the originating sale / purchase order / adjustment.
    pub reference_id: Option<String>,

    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Sale
// =============================================================================

/// Status of a completed POS sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Paid and finalized. Stock deducted, session counters rolled.
    Completed,
    /// Reversed after the fact via compensating stock movements.
    Voided,
}

/// How the customer arrived at the register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum SaleChannel {
    /// In-store walk-in customer.
    WalkIn,
    /// Online order picked up at the counter.
    Pickup,
}

/// How the sale was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum TenderType {
    Cash,
    Card,
}

/// A completed POS sale. Immutable once created, except for a post-hoc void
/// (which flips status and appends compensating movements - history is
/// never edited).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,

    /// Human-readable receipt identifier, time-derived.
    pub sale_number: String,

    /// Session the sale was rung through.
    pub session_id: String,
    pub register_id: String,
    pub location_id: String,
    pub vendor_id: String,
    pub operator_id: String,

    pub status: SaleStatus,
    pub channel: SaleChannel,
    pub tender: TenderType,

    pub subtotal_cents: i64,
    pub total_cents: i64,

    pub created_at: DateTime<Utc>,
    pub voided_at: Option<DateTime<Utc>>,
}

/// A line item in a sale.
///
/// Uses the snapshot pattern: the display name is copied at sale time so the
/// receipt survives later catalog edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,

    /// Product name at time of sale (frozen).
    pub name_snapshot: String,

    /// Quantity sold (positive).
    pub quantity: i64,
    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,
    /// unit_price × quantity.
    pub line_total_cents: i64,

    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_kinds() {
        assert!(SessionCounter::TotalSales.counts_as_sale());
        assert!(SessionCounter::TotalCash.counts_as_sale());
        assert!(SessionCounter::TotalCard.counts_as_sale());
        assert!(!SessionCounter::WalkInSales.counts_as_sale());
        assert!(!SessionCounter::PickupOrdersFulfilled.counts_as_sale());
    }

    #[test]
    fn test_counter_parse_roundtrip() {
        for c in [
            SessionCounter::TotalSales,
            SessionCounter::TotalCash,
            SessionCounter::TotalCard,
            SessionCounter::WalkInSales,
            SessionCounter::PickupOrdersFulfilled,
        ] {
            assert_eq!(SessionCounter::parse(c.as_str()), Some(c));
        }
        assert_eq!(SessionCounter::parse("refund_total"), None);
    }

    #[test]
    fn test_register_active_check() {
        let now = Utc::now();
        let reg = Register {
            id: "r1".into(),
            location_id: "l1".into(),
            vendor_id: "v1".into(),
            name: "Front Counter 1".into(),
            status: RegisterStatus::Active,
            created_at: now,
            updated_at: now,
        };
        assert!(reg.is_active());
    }
}
