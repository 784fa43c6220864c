//! # Repository Layer
//!
//! Data access for the POS subsystem, one repository per aggregate.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Repository Pattern                                 │
//! │                                                                         │
//! │  HTTP Handlers (pos-api)                                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database (pool.rs) ── hands out repositories                          │
//! │       │                                                                 │
//! │       ├──► RegisterRepository   terminal registry (read-mostly)        │
//! │       ├──► SessionRepository    drawer lifecycle + atomic counters     │
//! │       ├──► InventoryRepository  stock ledger + movement audit trail    │
//! │       └──► SaleRepository       checkout orchestration (spans all 3)   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Repositories own a pool clone and run each operation on their own
//! connection. Operations that must be atomic across aggregates (checkout,
//! voids) use the pub(crate) connection-level helpers the other modules
//! expose, inside one BEGIN IMMEDIATE transaction.

pub mod inventory;
pub mod register;
pub mod sale;
pub mod session;

pub use inventory::{InventoryRepository, MovementFilter, RecordMovementRequest};
pub use register::{NewRegister, RegisterRepository};
pub use sale::{CheckoutRequest, NewSaleItem, SaleRepository};
pub use session::{OpenSessionRequest, SessionRepository};
