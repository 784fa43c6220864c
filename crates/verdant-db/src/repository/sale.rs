//! # Sale Repository
//!
//! Checkout orchestration: the one place where sessions, inventory and the
//! sales record move together.
//!
//! ## Checkout Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Checkout (single transaction)                        │
//! │                                                                         │
//! │  BEGIN IMMEDIATE                                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  1. Load session ── must exist and be open                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  2. Insert sale + line items (prices snapshotted)                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  3. Per line: conditional stock deduction + audit movement              │
//! │       │          └── insufficient stock? → ROLLBACK everything          │
//! │       ▼                                                                 │
//! │  4. Roll session counters (total, tender split, channel, txn count)     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  COMMIT ── sale, movements and counters land together or not at all    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Voids
//! A void never edits history: the sale's status flips to `voided` and a
//! compensating inbound `return` movement is appended per line item. Session
//! counters are deliberately left alone; the drawer report shows what was
//! rung, voids are reconciled from the sales record.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::inventory::{apply_movement, RecordMovementRequest};
use crate::repository::session::{apply_sale_counters, fetch_session};
use verdant_core::{
    Money, MovementType, Sale, SaleChannel, SaleItem, SaleStatus, TenderType, MAX_SALE_ITEMS,
};

/// Column list shared by every sale SELECT.
const SALE_COLUMNS: &str = "id, sale_number, session_id, register_id, location_id, vendor_id, \
     operator_id, status, channel, tender, subtotal_cents, total_cents, \
     created_at, voided_at";

/// Column list shared by every sale_items SELECT.
const SALE_ITEM_COLUMNS: &str =
    "id, sale_id, product_id, name_snapshot, quantity, unit_price_cents, \
     line_total_cents, created_at";

/// One line of a checkout request.
#[derive(Debug, Clone)]
pub struct NewSaleItem {
    pub product_id: String,
    /// Display name captured at sale time.
    pub name: String,
    /// Units sold (positive).
    pub quantity: i64,
    pub unit_price_cents: i64,
}

/// A request to complete a sale against an open session.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub session_id: String,
    pub operator_id: String,
    pub channel: SaleChannel,
    pub tender: TenderType,
    pub items: Vec<NewSaleItem>,
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Gets a sale and its line items.
    pub async fn get_with_items(&self, id: &str) -> DbResult<Option<(Sale, Vec<SaleItem>)>> {
        let Some(sale) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, SaleItem>(&format!(
            "SELECT {SALE_ITEM_COLUMNS} FROM sale_items WHERE sale_id = ?1 ORDER BY created_at"
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some((sale, items)))
    }

    /// Lists sales recorded against a session, newest first.
    pub async fn list_for_session(&self, session_id: &str) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales \
             WHERE session_id = ?1 ORDER BY created_at DESC"
        ))
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Completes a sale: persists it, deducts stock per line and rolls the
    /// session counters, all in one transaction.
    ///
    /// ## Errors
    /// - `NotFound` - session does not exist, or a line's product has no
    ///   inventory record at the session's location
    /// - `InvalidState` - session is closed
    /// - `InsufficientStock` - any line would over-deduct; the entire sale
    ///   rolls back, including lines already deducted
    pub async fn checkout(&self, req: CheckoutRequest) -> DbResult<Sale> {
        if req.items.is_empty() || req.items.len() > MAX_SALE_ITEMS {
            // Line counts are validated at the API boundary; this guard
            // keeps a malformed internal caller from writing an empty sale.
            return Err(DbError::Internal(format!(
                "checkout requires 1..={MAX_SALE_ITEMS} items, got {}",
                req.items.len()
            )));
        }

        let mut conn = self.pool.acquire().await?;

        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;

        match checkout_locked(&mut conn, &req).await {
            Ok(sale) => {
                sqlx::query("COMMIT").execute(&mut *conn).await?;
                info!(
                    sale_id = %sale.id,
                    sale_number = %sale.sale_number,
                    total_cents = %sale.total_cents,
                    "Sale completed"
                );
                Ok(sale)
            }
            Err(err) => {
                let _ = sqlx::query("ROLLBACK").execute(&mut *conn).await;
                Err(err)
            }
        }
    }

    /// Voids a completed sale.
    ///
    /// Appends a compensating `return` movement per line item and flips the
    /// sale's status. Session counters stay as rung.
    pub async fn void_sale(&self, sale_id: &str) -> DbResult<Sale> {
        let mut conn = self.pool.acquire().await?;

        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;

        match void_locked(&mut conn, sale_id).await {
            Ok(sale) => {
                sqlx::query("COMMIT").execute(&mut *conn).await?;
                info!(sale_id = %sale.id, "Sale voided");
                Ok(sale)
            }
            Err(err) => {
                let _ = sqlx::query("ROLLBACK").execute(&mut *conn).await;
                Err(err)
            }
        }
    }
}

// =============================================================================
// Transaction Bodies
// =============================================================================

/// The movement type a sale channel deducts stock under.
const fn deduction_type(channel: SaleChannel) -> MovementType {
    match channel {
        SaleChannel::WalkIn => MovementType::PosSale,
        SaleChannel::Pickup => MovementType::OnlineOrder,
    }
}

async fn checkout_locked(conn: &mut SqliteConnection, req: &CheckoutRequest) -> DbResult<Sale> {
    let session = fetch_session(conn, &req.session_id)
        .await?
        .ok_or_else(|| DbError::not_found("Session", &req.session_id))?;

    if !session.is_open() {
        return Err(DbError::invalid_state("Session", &session.id, "closed"));
    }

    // Quantities are bounded upstream but unit prices come off the wire
    // unbounded, so line totals go through checked Money arithmetic.
    let mut line_totals = Vec::with_capacity(req.items.len());
    let mut subtotal = Money::zero();
    for item in &req.items {
        let line_total = Money::from_cents(item.unit_price_cents)
            .checked_mul(item.quantity)
            .ok_or_else(|| line_overflow(&item.product_id))?;
        subtotal = subtotal
            .checked_add(line_total)
            .ok_or_else(|| line_overflow(&item.product_id))?;
        line_totals.push(line_total);
    }
    let subtotal_cents = subtotal.cents();

    let now = Utc::now();
    let sale = Sale {
        id: Uuid::new_v4().to_string(),
        sale_number: generate_sale_number(),
        session_id: session.id.clone(),
        register_id: session.register_id.clone(),
        location_id: session.location_id.clone(),
        vendor_id: session.vendor_id.clone(),
        operator_id: req.operator_id.clone(),
        status: SaleStatus::Completed,
        channel: req.channel,
        tender: req.tender,
        subtotal_cents,
        total_cents: subtotal_cents,
        created_at: now,
        voided_at: None,
    };

    debug!(sale_id = %sale.id, items = req.items.len(), "Writing sale");

    sqlx::query(
        "INSERT INTO sales (\
             id, sale_number, session_id, register_id, location_id, vendor_id, \
             operator_id, status, channel, tender, subtotal_cents, total_cents, \
             created_at, voided_at\
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
    )
    .bind(&sale.id)
    .bind(&sale.sale_number)
    .bind(&sale.session_id)
    .bind(&sale.register_id)
    .bind(&sale.location_id)
    .bind(&sale.vendor_id)
    .bind(&sale.operator_id)
    .bind(sale.status)
    .bind(sale.channel)
    .bind(sale.tender)
    .bind(sale.subtotal_cents)
    .bind(sale.total_cents)
    .bind(sale.created_at)
    .bind(sale.voided_at)
    .execute(&mut *conn)
    .await?;

    for (item, line_total) in req.items.iter().zip(&line_totals) {
        sqlx::query(
            "INSERT INTO sale_items (\
                 id, sale_id, product_id, name_snapshot, quantity, \
                 unit_price_cents, line_total_cents, created_at\
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&sale.id)
        .bind(&item.product_id)
        .bind(&item.name)
        .bind(item.quantity)
        .bind(item.unit_price_cents)
        .bind(line_total.cents())
        .bind(now)
        .execute(&mut *conn)
        .await?;

        // Deduct stock for this line. An InsufficientStock here unwinds the
        // whole transaction, lines already deducted included.
        apply_movement(
            conn,
            &RecordMovementRequest {
                product_id: item.product_id.clone(),
                location_id: sale.location_id.clone(),
                vendor_id: sale.vendor_id.clone(),
                movement_type: deduction_type(sale.channel),
                quantity: item.quantity,
                cost_per_unit_cents: None,
                from_location_id: Some(sale.location_id.clone()),
                to_location_id: None,
                reference_type: Some("sale".to_string()),
                reference_id: Some(sale.id.clone()),
            },
        )
        .await?;
    }

    let (cash_cents, card_cents) = match sale.tender {
        TenderType::Cash => (sale.total_cents, 0),
        TenderType::Card => (0, sale.total_cents),
    };
    let (walk_in, pickup) = match sale.channel {
        SaleChannel::WalkIn => (1, 0),
        SaleChannel::Pickup => (0, 1),
    };

    apply_sale_counters(
        conn,
        &sale.session_id,
        sale.total_cents,
        cash_cents,
        card_cents,
        walk_in,
        pickup,
    )
    .await?;

    Ok(sale)
}

async fn void_locked(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<Sale> {
    let sale = sqlx::query_as::<_, Sale>(&format!(
        "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"
    ))
    .bind(sale_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| DbError::not_found("Sale", sale_id))?;

    if sale.status == SaleStatus::Voided {
        return Err(DbError::invalid_state("Sale", sale_id, "voided"));
    }

    let now = Utc::now();
    // The status guard makes the flip race-safe even though we checked above.
    let result = sqlx::query(
        "UPDATE sales SET status = 'voided', voided_at = ?2 \
         WHERE id = ?1 AND status = 'completed'",
    )
    .bind(sale_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::invalid_state("Sale", sale_id, "voided"));
    }

    let items = sqlx::query_as::<_, SaleItem>(&format!(
        "SELECT {SALE_ITEM_COLUMNS} FROM sale_items WHERE sale_id = ?1"
    ))
    .bind(sale_id)
    .fetch_all(&mut *conn)
    .await?;

    for item in &items {
        apply_movement(
            conn,
            &RecordMovementRequest {
                product_id: item.product_id.clone(),
                location_id: sale.location_id.clone(),
                vendor_id: sale.vendor_id.clone(),
                movement_type: MovementType::Return,
                quantity: item.quantity,
                cost_per_unit_cents: None,
                from_location_id: None,
                to_location_id: Some(sale.location_id.clone()),
                reference_type: Some("void".to_string()),
                reference_id: Some(sale.id.clone()),
            },
        )
        .await?;
    }

    Ok(Sale {
        status: SaleStatus::Voided,
        voided_at: Some(now),
        ..sale
    })
}

/// Generates a receipt number in format: `R-YYYYMMDD-HHMMSS`
fn generate_sale_number() -> String {
    format!("R-{}", Utc::now().format("%Y%m%d-%H%M%S"))
}

fn line_overflow(product_id: &str) -> DbError {
    DbError::Internal(format!("sale total overflows i64 for product {product_id}"))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::inventory::{MovementFilter, RecordMovementRequest};
    use crate::repository::register::NewRegister;
    use crate::repository::session::OpenSessionRequest;
    use verdant_core::Session;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    /// Register + open session + stocked product, the fixtures every
    /// checkout test needs.
    async fn seeded_session(db: &Database) -> Session {
        let reg = db
            .registers()
            .insert(NewRegister {
                location_id: "loc-1".to_string(),
                vendor_id: "vendor-1".to_string(),
                name: "Front Counter 1".to_string(),
            })
            .await
            .unwrap();

        db.sessions()
            .get_or_create(OpenSessionRequest {
                register_id: reg.id,
                location_id: "loc-1".to_string(),
                vendor_id: "vendor-1".to_string(),
                operator_id: "op-1".to_string(),
                opening_cash_cents: None,
            })
            .await
            .unwrap()
    }

    async fn stock(db: &Database, product_id: &str, qty: i64) {
        db.inventory()
            .record_movement(RecordMovementRequest {
                product_id: product_id.to_string(),
                location_id: "loc-1".to_string(),
                vendor_id: "vendor-1".to_string(),
                movement_type: MovementType::Purchase,
                quantity: qty,
                cost_per_unit_cents: Some(200),
                from_location_id: None,
                to_location_id: Some("loc-1".to_string()),
                reference_type: Some("purchase_order".to_string()),
                reference_id: Some("po-1".to_string()),
            })
            .await
            .unwrap();
    }

    fn line(product_id: &str, qty: i64, price_cents: i64) -> NewSaleItem {
        NewSaleItem {
            product_id: product_id.to_string(),
            name: format!("Product {product_id}"),
            quantity: qty,
            unit_price_cents: price_cents,
        }
    }

    fn checkout_req(session_id: &str, items: Vec<NewSaleItem>) -> CheckoutRequest {
        CheckoutRequest {
            session_id: session_id.to_string(),
            operator_id: "op-1".to_string(),
            channel: SaleChannel::WalkIn,
            tender: TenderType::Cash,
            items,
        }
    }

    #[tokio::test]
    async fn test_checkout_cash_walk_in() {
        let db = test_db().await;
        let session = seeded_session(&db).await;
        stock(&db, "prod-1", 10).await;

        let sale = db
            .sales()
            .checkout(checkout_req(&session.id, vec![line("prod-1", 2, 1099)]))
            .await
            .unwrap();

        assert_eq!(sale.status, SaleStatus::Completed);
        assert_eq!(sale.total_cents, 2198);
        assert!(sale.sale_number.starts_with("R-"));

        // Stock deducted under the walk-in movement type.
        let record = db.inventory().get_for_product("prod-1", "loc-1").await.unwrap().unwrap();
        assert_eq!(record.quantity, 8);
        let movements = db
            .inventory()
            .list_movements(MovementFilter {
                product_id: Some("prod-1".to_string()),
                movement_type: Some(MovementType::PosSale),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].reference_id.as_deref(), Some(sale.id.as_str()));

        // Counters rolled: total, cash split, channel count, txn count.
        let updated = db.sessions().get_by_id(&session.id).await.unwrap().unwrap();
        assert_eq!(updated.total_sales_cents, 2198);
        assert_eq!(updated.total_cash_cents, 2198);
        assert_eq!(updated.total_card_cents, 0);
        assert_eq!(updated.walk_in_sales, 1);
        assert_eq!(updated.total_transactions, 1);
        assert!(updated.last_transaction_at.is_some());
    }

    #[tokio::test]
    async fn test_checkout_card_pickup() {
        let db = test_db().await;
        let session = seeded_session(&db).await;
        stock(&db, "prod-1", 10).await;

        let sale = db
            .sales()
            .checkout(CheckoutRequest {
                channel: SaleChannel::Pickup,
                tender: TenderType::Card,
                ..checkout_req(&session.id, vec![line("prod-1", 1, 3500)])
            })
            .await
            .unwrap();
        assert_eq!(sale.channel, SaleChannel::Pickup);

        let movements = db
            .inventory()
            .list_movements(MovementFilter {
                product_id: Some("prod-1".to_string()),
                movement_type: Some(MovementType::OnlineOrder),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(movements.len(), 1, "pickup deducts as online_order");

        let updated = db.sessions().get_by_id(&session.id).await.unwrap().unwrap();
        assert_eq!(updated.total_card_cents, 3500);
        assert_eq!(updated.total_sales_cents, 3500);
        assert_eq!(updated.total_cash_cents, 0);
        assert_eq!(updated.pickup_orders_fulfilled, 1);
        assert_eq!(updated.walk_in_sales, 0);
    }

    /// A multi-line sale where a later line over-deducts must leave no trace:
    /// no sale row, no items, earlier deductions undone, counters untouched.
    #[tokio::test]
    async fn test_checkout_rolls_back_completely() {
        let db = test_db().await;
        let session = seeded_session(&db).await;
        stock(&db, "prod-1", 10).await;
        stock(&db, "prod-2", 1).await;

        let err = db
            .sales()
            .checkout(checkout_req(
                &session.id,
                vec![line("prod-1", 2, 1000), line("prod-2", 5, 2000)],
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::InsufficientStock { .. }));

        let p1 = db.inventory().get_for_product("prod-1", "loc-1").await.unwrap().unwrap();
        assert_eq!(p1.quantity, 10, "first line's deduction must be undone");
        let p2 = db.inventory().get_for_product("prod-2", "loc-1").await.unwrap().unwrap();
        assert_eq!(p2.quantity, 1);

        let updated = db.sessions().get_by_id(&session.id).await.unwrap().unwrap();
        assert_eq!(updated.total_sales_cents, 0);
        assert_eq!(updated.total_transactions, 0);

        assert!(db.sales().list_for_session(&session.id).await.unwrap().is_empty());

        let sale_movements = db
            .inventory()
            .list_movements(MovementFilter {
                product_id: Some("prod-1".to_string()),
                movement_type: Some(MovementType::PosSale),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(sale_movements.is_empty(), "rolled-back deduction left a movement");
    }

    #[tokio::test]
    async fn test_checkout_on_closed_session() {
        let db = test_db().await;
        let session = seeded_session(&db).await;
        stock(&db, "prod-1", 10).await;
        db.sessions().end(&session.id).await.unwrap();

        let err = db
            .sales()
            .checkout(checkout_req(&session.id, vec![line("prod-1", 1, 1000)]))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidState { .. }));

        let record = db.inventory().get_for_product("prod-1", "loc-1").await.unwrap().unwrap();
        assert_eq!(record.quantity, 10);
    }

    #[tokio::test]
    async fn test_checkout_on_missing_session() {
        let db = test_db().await;
        let err = db
            .sales()
            .checkout(checkout_req("nope", vec![line("prod-1", 1, 1000)]))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    /// An i64-overflowing line total is rejected before anything is written.
    #[tokio::test]
    async fn test_checkout_rejects_overflowing_line_total() {
        let db = test_db().await;
        let session = seeded_session(&db).await;
        stock(&db, "prod-1", 10).await;

        let err = db
            .sales()
            .checkout(checkout_req(&session.id, vec![line("prod-1", 2, i64::MAX)]))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Internal(_)));

        let record = db.inventory().get_for_product("prod-1", "loc-1").await.unwrap().unwrap();
        assert_eq!(record.quantity, 10);
        assert!(db.sales().list_for_session(&session.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_checkout_requires_items() {
        let db = test_db().await;
        let session = seeded_session(&db).await;

        let err = db
            .sales()
            .checkout(checkout_req(&session.id, vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Internal(_)));
    }

    /// Three sales accumulate: $45 + $30 + $60 = $135, three transactions.
    #[tokio::test]
    async fn test_session_accumulates_over_sales() {
        let db = test_db().await;
        let session = seeded_session(&db).await;
        stock(&db, "prod-1", 100).await;

        for cents in [4500, 3000, 6000] {
            db.sales()
                .checkout(checkout_req(&session.id, vec![line("prod-1", 1, cents)]))
                .await
                .unwrap();
        }

        let updated = db.sessions().get_by_id(&session.id).await.unwrap().unwrap();
        assert_eq!(updated.total_sales_cents, 13_500);
        assert_eq!(updated.total_transactions, 3);
        assert_eq!(updated.walk_in_sales, 3);
    }

    #[tokio::test]
    async fn test_get_with_items() {
        let db = test_db().await;
        let session = seeded_session(&db).await;
        stock(&db, "prod-1", 10).await;
        stock(&db, "prod-2", 10).await;

        let sale = db
            .sales()
            .checkout(checkout_req(
                &session.id,
                vec![line("prod-1", 2, 1000), line("prod-2", 1, 500)],
            ))
            .await
            .unwrap();

        let (fetched, items) = db.sales().get_with_items(&sale.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, sale.id);
        assert_eq!(items.len(), 2);
        assert_eq!(items.iter().map(|i| i.line_total_cents).sum::<i64>(), 2500);
        assert!(items.iter().all(|i| i.sale_id == sale.id));
    }

    /// Voiding restocks via compensating returns and leaves counters as rung.
    #[tokio::test]
    async fn test_void_restocks_and_freezes_counters() {
        let db = test_db().await;
        let session = seeded_session(&db).await;
        stock(&db, "prod-1", 10).await;

        let sale = db
            .sales()
            .checkout(checkout_req(&session.id, vec![line("prod-1", 3, 1000)]))
            .await
            .unwrap();

        let voided = db.sales().void_sale(&sale.id).await.unwrap();
        assert_eq!(voided.status, SaleStatus::Voided);
        assert!(voided.voided_at.is_some());

        // Stock restored by an appended return, not by editing the original
        // deduction.
        let record = db.inventory().get_for_product("prod-1", "loc-1").await.unwrap().unwrap();
        assert_eq!(record.quantity, 10);
        let returns = db
            .inventory()
            .list_movements(MovementFilter {
                product_id: Some("prod-1".to_string()),
                movement_type: Some(MovementType::Return),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(returns.len(), 1);
        assert_eq!(returns[0].quantity, 3);
        assert_eq!(returns[0].reference_type.as_deref(), Some("void"));

        // Counters stay as rung.
        let updated = db.sessions().get_by_id(&session.id).await.unwrap().unwrap();
        assert_eq!(updated.total_sales_cents, 3000);
        assert_eq!(updated.total_transactions, 1);
    }

    #[tokio::test]
    async fn test_void_twice_is_invalid_state() {
        let db = test_db().await;
        let session = seeded_session(&db).await;
        stock(&db, "prod-1", 10).await;

        let sale = db
            .sales()
            .checkout(checkout_req(&session.id, vec![line("prod-1", 1, 1000)]))
            .await
            .unwrap();
        db.sales().void_sale(&sale.id).await.unwrap();

        let err = db.sales().void_sale(&sale.id).await.unwrap_err();
        assert!(matches!(err, DbError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn test_void_missing_sale() {
        let db = test_db().await;
        let err = db.sales().void_sale("nope").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
