//! # Inventory Repository
//!
//! The stock ledger: on-hand quantities plus the append-only movement trail.
//!
//! ## The Deduction Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              Atomic Conditional Deduction                               │
//! │                                                                         │
//! │  ❌ WRONG (read-modify-write):                                          │
//! │     qty = SELECT quantity ...          ← another sale reads same qty    │
//! │     if qty >= amount:                                                   │
//! │         UPDATE ... SET quantity = qty - amount   ← lost update,         │
//! │                                                    stock goes negative  │
//! │                                                                         │
//! │  ✅ CORRECT (single statement):                                         │
//! │     UPDATE inventory                                                    │
//! │        SET quantity = quantity - :amt                                   │
//! │      WHERE id = :id                                                     │
//! │        AND (quantity >= :amt OR allow_negative_stock = 1)               │
//! │     RETURNING quantity                                                  │
//! │                                                                         │
//! │     Zero rows back means the database itself refused the deduction;    │
//! │     there is no window between check and decrement.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Cost Blending
//! Inbound movements that carry an acquisition cost re-blend the weighted
//! average inside the same UPDATE, using the formula in
//! [`verdant_core::costing::blend_average_cost`]: negative on-hand balances
//! are excluded from the weighting via `MAX(quantity, 0)`.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use verdant_core::{InventoryRecord, MovementType, StockMovement};

/// Column list shared by every inventory SELECT.
const INVENTORY_COLUMNS: &str = "id, product_id, location_id, vendor_id, quantity, \
     avg_cost_cents, allow_negative_stock, created_at, updated_at";

/// Column list shared by every stock_movements SELECT.
const MOVEMENT_COLUMNS: &str = "id, inventory_id, product_id, movement_type, quantity, \
     quantity_before, quantity_after, from_location_id, to_location_id, \
     cost_per_unit_cents, reference_type, reference_id, created_at";

/// A request to record one inventory movement.
///
/// `quantity` is always a positive magnitude; the movement type's class
/// decides the direction. Callers never pass signed deltas.
#[derive(Debug, Clone)]
pub struct RecordMovementRequest {
    pub product_id: String,
    pub location_id: String,
    pub vendor_id: String,
    pub movement_type: MovementType,
    /// Positive magnitude; sign is derived from the movement class.
    pub quantity: i64,
    /// Acquisition cost per unit, for inbound receiving. Triggers the
    /// weighted-average re-blend when present.
    pub cost_per_unit_cents: Option<i64>,
    pub from_location_id: Option<String>,
    pub to_location_id: Option<String>,
    pub reference_type: Option<String>,
    pub reference_id: Option<String>,
}

/// Filters for listing stock movements.
#[derive(Debug, Clone, Default)]
pub struct MovementFilter {
    pub product_id: Option<String>,
    pub inventory_id: Option<String>,
    pub movement_type: Option<MovementType>,
    /// Maximum rows to return. Default: 100.
    pub limit: Option<i64>,
}

/// Repository for inventory database operations.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    /// Creates a new InventoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// Gets an inventory record by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<InventoryRecord>> {
        let record = sqlx::query_as::<_, InventoryRecord>(&format!(
            "SELECT {INVENTORY_COLUMNS} FROM inventory WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Gets the inventory record for a product at a location.
    pub async fn get_for_product(
        &self,
        product_id: &str,
        location_id: &str,
    ) -> DbResult<Option<InventoryRecord>> {
        let mut conn = self.pool.acquire().await?;
        fetch_for_product(&mut conn, product_id, location_id).await
    }

    /// Records a single inventory movement in its own transaction.
    ///
    /// ## Behavior
    /// - Outbound types deduct; the deduction is a single conditional UPDATE
    ///   and fails with [`DbError::InsufficientStock`] when it would take the
    ///   balance below zero on a record that disallows negative stock. The
    ///   balance is untouched and no movement row is written on rejection.
    /// - Inbound types add; a missing record is auto-created at zero so that
    ///   first receiving "just works".
    /// - Every applied movement appends an immutable audit row.
    pub async fn record_movement(&self, req: RecordMovementRequest) -> DbResult<StockMovement> {
        let mut conn = self.pool.acquire().await?;

        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;

        match apply_movement(&mut conn, &req).await {
            Ok(movement) => {
                sqlx::query("COMMIT").execute(&mut *conn).await?;
                Ok(movement)
            }
            Err(err) => {
                let _ = sqlx::query("ROLLBACK").execute(&mut *conn).await;
                Err(err)
            }
        }
    }

    /// Sets the per-record backorder policy.
    ///
    /// Allowing negative stock is an explicit decision made per inventory
    /// record, never a global default.
    pub async fn set_negative_stock_policy(&self, id: &str, allow: bool) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE inventory SET allow_negative_stock = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(allow)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Inventory", id));
        }

        Ok(())
    }

    /// Lists stock movements, newest first.
    pub async fn list_movements(&self, filter: MovementFilter) -> DbResult<Vec<StockMovement>> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {MOVEMENT_COLUMNS} FROM stock_movements WHERE 1 = 1"
        ));

        if let Some(product_id) = &filter.product_id {
            builder.push(" AND product_id = ").push_bind(product_id);
        }
        if let Some(inventory_id) = &filter.inventory_id {
            builder.push(" AND inventory_id = ").push_bind(inventory_id);
        }
        if let Some(movement_type) = filter.movement_type {
            builder
                .push(" AND movement_type = ")
                .push_bind(movement_type.as_str());
        }

        builder
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(filter.limit.unwrap_or(100));

        let movements = builder
            .build_query_as::<StockMovement>()
            .fetch_all(&self.pool)
            .await?;

        Ok(movements)
    }
}

// =============================================================================
// Connection-Level Helpers
// =============================================================================
// Exposed pub(crate) so sale checkout can join stock deductions with its
// counter updates in one transaction.

/// Fetches the inventory record for a product+location on a connection.
pub(crate) async fn fetch_for_product(
    conn: &mut SqliteConnection,
    product_id: &str,
    location_id: &str,
) -> DbResult<Option<InventoryRecord>> {
    let record = sqlx::query_as::<_, InventoryRecord>(&format!(
        "SELECT {INVENTORY_COLUMNS} FROM inventory \
         WHERE product_id = ?1 AND location_id = ?2"
    ))
    .bind(product_id)
    .bind(location_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(record)
}

/// Applies one movement on a connection already inside a transaction.
///
/// The quantity change and the stock guard live in a single UPDATE, so
/// concurrent deductions can never both pass a stale balance check.
pub(crate) async fn apply_movement(
    conn: &mut SqliteConnection,
    req: &RecordMovementRequest,
) -> DbResult<StockMovement> {
    if req.quantity <= 0 {
        // Magnitudes are validated at the API boundary; a non-positive value
        // reaching here would corrupt the sign derivation.
        return Err(DbError::Internal(format!(
            "movement magnitude must be positive, got {}",
            req.quantity
        )));
    }

    let record = match fetch_for_product(conn, &req.product_id, &req.location_id).await? {
        Some(record) => record,
        None if req.movement_type.is_deduction() => {
            return Err(DbError::not_found(
                "Inventory",
                format!("{}@{}", req.product_id, req.location_id),
            ));
        }
        None => create_zero_record(conn, req).await?,
    };

    let signed = req.movement_type.signed_quantity(req.quantity);
    let now = Utc::now();

    debug!(
        inventory_id = %record.id,
        movement_type = %req.movement_type,
        quantity = %signed,
        "Applying stock movement"
    );

    // One statement, three shapes. The RETURNING clause hands back the
    // post-update balance so the audit row can be derived without a re-read.
    let new_quantity: Option<i64> = if req.movement_type.is_deduction() {
        sqlx::query_scalar(
            "UPDATE inventory \
                SET quantity = quantity + ?1, updated_at = ?2 \
              WHERE id = ?3 \
                AND (quantity >= ?4 OR allow_negative_stock = 1) \
              RETURNING quantity",
        )
        .bind(signed)
        .bind(now)
        .bind(&record.id)
        .bind(req.quantity)
        .fetch_optional(&mut *conn)
        .await?
    } else if let Some(cost) = req.cost_per_unit_cents {
        // Weighted-average re-blend: negative balances contribute nothing
        // to the weighting (MAX(quantity, 0)). The magnitude is positive,
        // so the denominator is never zero.
        sqlx::query_scalar(
            "UPDATE inventory \
                SET avg_cost_cents = (MAX(quantity, 0) * avg_cost_cents + ?1 * ?2) \
                                     / (MAX(quantity, 0) + ?1), \
                    quantity = quantity + ?1, \
                    updated_at = ?3 \
              WHERE id = ?4 \
              RETURNING quantity",
        )
        .bind(req.quantity)
        .bind(cost as f64)
        .bind(now)
        .bind(&record.id)
        .fetch_optional(&mut *conn)
        .await?
    } else {
        sqlx::query_scalar(
            "UPDATE inventory \
                SET quantity = quantity + ?1, updated_at = ?2 \
              WHERE id = ?3 \
              RETURNING quantity",
        )
        .bind(signed)
        .bind(now)
        .bind(&record.id)
        .fetch_optional(&mut *conn)
        .await?
    };

    let quantity_after = match new_quantity {
        Some(q) => q,
        None => {
            // The guard predicate matched no row: re-read the live balance
            // purely to report it. The rejection itself already happened
            // atomically inside the UPDATE.
            let available = sqlx::query_scalar::<_, i64>(
                "SELECT quantity FROM inventory WHERE id = ?1",
            )
            .bind(&record.id)
            .fetch_one(&mut *conn)
            .await?;

            return Err(DbError::InsufficientStock {
                inventory_id: record.id,
                available,
                requested: req.quantity,
            });
        }
    };

    let movement = StockMovement {
        id: Uuid::new_v4().to_string(),
        inventory_id: record.id,
        product_id: req.product_id.clone(),
        movement_type: req.movement_type,
        quantity: signed,
        quantity_before: quantity_after - signed,
        quantity_after,
        from_location_id: req.from_location_id.clone(),
        to_location_id: req.to_location_id.clone(),
        cost_per_unit_cents: req.cost_per_unit_cents,
        reference_type: req.reference_type.clone(),
        reference_id: req.reference_id.clone(),
        created_at: now,
    };

    sqlx::query(
        "INSERT INTO stock_movements (\
             id, inventory_id, product_id, movement_type, quantity, \
             quantity_before, quantity_after, from_location_id, to_location_id, \
             cost_per_unit_cents, reference_type, reference_id, created_at\
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
    )
    .bind(&movement.id)
    .bind(&movement.inventory_id)
    .bind(&movement.product_id)
    .bind(movement.movement_type)
    .bind(movement.quantity)
    .bind(movement.quantity_before)
    .bind(movement.quantity_after)
    .bind(&movement.from_location_id)
    .bind(&movement.to_location_id)
    .bind(movement.cost_per_unit_cents)
    .bind(&movement.reference_type)
    .bind(&movement.reference_id)
    .bind(movement.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(movement)
}

/// Creates a zero-quantity inventory record so first receiving works without
/// a separate provisioning call.
async fn create_zero_record(
    conn: &mut SqliteConnection,
    req: &RecordMovementRequest,
) -> DbResult<InventoryRecord> {
    let now = Utc::now();
    let record = InventoryRecord {
        id: Uuid::new_v4().to_string(),
        product_id: req.product_id.clone(),
        location_id: req.location_id.clone(),
        vendor_id: req.vendor_id.clone(),
        quantity: 0,
        avg_cost_cents: 0.0,
        allow_negative_stock: false,
        created_at: now,
        updated_at: now,
    };

    debug!(
        inventory_id = %record.id,
        product_id = %record.product_id,
        "Auto-creating inventory record for first receiving"
    );

    sqlx::query(
        "INSERT INTO inventory (\
             id, product_id, location_id, vendor_id, quantity, avg_cost_cents, \
             allow_negative_stock, created_at, updated_at\
         ) VALUES (?1, ?2, ?3, ?4, 0, 0, 0, ?5, ?6)",
    )
    .bind(&record.id)
    .bind(&record.product_id)
    .bind(&record.location_id)
    .bind(&record.vendor_id)
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(record)
}

// =============================================================================
// Unit Tests
// =============================================================================
