//! # verdant-core: Pure Business Logic for Verdant POS
//!
//! This crate is the **heart** of the Verdant POS session/inventory subsystem.
//! It contains all business logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Verdant POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     pos-api (HTTP Layer)                        │   │
//! │  │    get-or-create session, record movement, checkout sale        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ verdant-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  movement │  │  costing  │  │ validation│  │   │
//! │  │   │  Session  │  │  classes  │  │ wtd. avg  │  │   rules   │  │   │
//! │  │   │  Register │  │  signing  │  │   cost    │  │   checks  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                   verdant-db (Database Layer)                   │   │
//! │  │            SQLite queries, migrations, repositories             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Register, Session, InventoryRecord, Sale, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`movement`] - Stock movement classification and quantity signing
//! - [`costing`] - Weighted-average cost blending
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use verdant_core::movement::MovementType;
//!
//! // The direction of a stock change comes from the movement class,
//! // never from the caller's raw sign.
//! let sale = MovementType::PosSale;
//! assert_eq!(sale.signed_quantity(5), -5);
//!
//! let receipt = MovementType::Purchase;
//! assert_eq!(receipt.signed_quantity(5), 5);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod costing;
pub mod error;
pub mod money;
pub mod movement;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use verdant_core::Money` instead of
// `use verdant_core::money::Money`

pub use costing::blend_average_cost;
pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use movement::{MovementClass, MovementType};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default opening cash float for a new register session, in cents ($200.00).
///
/// ## Why a constant?
/// Stores rarely change the drawer float; callers that do not supply an
/// opening amount get this default, matching the till-preparation SOP.
pub const DEFAULT_OPENING_CASH_CENTS: i64 = 20_000;

/// Maximum line items allowed in a single sale.
///
/// ## Business Reason
/// Prevents runaway carts and ensures reasonable transaction sizes.
/// Can be made configurable per-vendor in future versions.
pub const MAX_SALE_ITEMS: usize = 100;

/// Maximum quantity of a single line item.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;
