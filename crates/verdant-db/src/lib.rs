//! # Verdant DB
//!
//! SQLite persistence for the Verdant POS session and inventory subsystem.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         verdant-db                                      │
//! │                                                                         │
//! │  pool.rs        Database handle: pool config, WAL setup, migrations    │
//! │  migrations.rs  Embedded SQL migrations (sqlx::migrate!)               │
//! │  error.rs       DbError: constraint-aware mapping of sqlx errors       │
//! │  repository/    One repository per aggregate                           │
//! │                                                                         │
//! │  Concurrency strategy (SQLite, single writer):                         │
//! │    * WAL journal - readers never block on writers                      │
//! │    * BEGIN IMMEDIATE for check-then-write sequences                    │
//! │    * Single conditional UPDATEs for contended counters and stock       │
//! │    * Partial unique index as the storage-level backstop                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::{
    CheckoutRequest, InventoryRepository, MovementFilter, NewRegister, NewSaleItem,
    OpenSessionRequest, RecordMovementRequest, RegisterRepository, SaleRepository,
    SessionRepository,
};
