//! # Session Repository
//!
//! Database operations for cash-drawer sessions.
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Session Lifecycle                                  │
//! │                                                                         │
//! │  1. OPEN (find-or-create)                                              │
//! │     └── get_or_create() → Session { status: Open, counters: 0 }        │
//! │         Idempotent: a second call returns the SAME session             │
//! │                                                                         │
//! │  2. ACCUMULATE                                                         │
//! │     └── increment_counter() per sale → single UPDATE, no              │
//! │         read-modify-write, safe under concurrent sales                 │
//! │                                                                         │
//! │  3. CLOSE                                                              │
//! │     └── end() → Session { status: Closed } (terminal, frozen)          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## The Uniqueness Guarantee
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │          At Most One Open Session Per Register                          │
//! │                                                                         │
//! │  Belt:       BEGIN IMMEDIATE takes SQLite's write lock BEFORE the      │
//! │              existence check, so two concurrent opens on the same      │
//! │              register serialize - the second sees the first's insert.  │
//! │                                                                         │
//! │  Suspenders: UNIQUE INDEX ON sessions(register_id) WHERE status='open' │
//! │              rejects anything that slips past at the storage layer.    │
//! │              On that rejection we re-fetch the winner rather than      │
//! │              retrying the insert blindly.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use verdant_core::{
    Register, Session, SessionCounter, SessionStatus, DEFAULT_OPENING_CASH_CENTS,
};

/// Column list shared by every session SELECT.
const SESSION_COLUMNS: &str = "id, session_number, register_id, location_id, vendor_id, \
     operator_id, status, opening_cash_cents, total_sales_cents, total_transactions, \
     total_cash_cents, total_card_cents, walk_in_sales, pickup_orders_fulfilled, \
     opened_at, last_transaction_at, closed_at";

/// A request to open (or rejoin) a session on a register.
///
/// Identity is threaded explicitly - vendor and operator come from the
/// authenticated request, never from ambient headers.
#[derive(Debug, Clone)]
pub struct OpenSessionRequest {
    pub register_id: String,
    pub location_id: String,
    pub vendor_id: String,
    pub operator_id: String,
    /// Drawer float counted in at open; defaults to $200.00.
    pub opening_cash_cents: Option<i64>,
}

/// Repository for session database operations.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    /// Creates a new SessionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SessionRepository { pool }
    }

    /// Gets a session by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    /// Finds the open session for a register, if any.
    pub async fn find_open_for_register(&self, register_id: &str) -> DbResult<Option<Session>> {
        let mut conn = self.pool.acquire().await?;
        fetch_open_for_register(&mut conn, register_id).await
    }

    /// Finds or creates the open session for a register.
    ///
    /// ## Behavior
    /// - An existing open session on the register is returned unchanged,
    ///   making the call retry-safe for clients.
    /// - Otherwise a new session is inserted with zeroed counters and a
    ///   time-derived session number.
    ///
    /// ## Concurrency
    /// The write lock is taken (BEGIN IMMEDIATE) before the existence
    /// check, so concurrent calls for the same register serialize and the
    /// loser returns the winner's session. If a duplicate insert slips
    /// past anyway, the partial unique index rejects it and the existing
    /// session is re-fetched - duplicate open sessions are structurally
    /// impossible.
    pub async fn get_or_create(&self, req: OpenSessionRequest) -> DbResult<Session> {
        let mut conn = self.pool.acquire().await?;

        // IMMEDIATE acquires the write lock up front; a plain deferred
        // transaction would only lock at the INSERT, after the check.
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;

        match open_locked(&mut conn, &req).await {
            Ok(session) => {
                sqlx::query("COMMIT").execute(&mut *conn).await?;
                Ok(session)
            }
            Err(err) => {
                let _ = sqlx::query("ROLLBACK").execute(&mut *conn).await;

                if err.is_unique_violation() {
                    // The storage layer caught a race: re-fetch the winner
                    // instead of retrying the insert blindly. Reuse the
                    // connection we already hold; grabbing a second one here
                    // would exhaust a single-connection pool.
                    debug!(register_id = %req.register_id, "Open-session insert lost race, re-fetching");
                    if let Some(existing) =
                        fetch_open_for_register(&mut conn, &req.register_id).await?
                    {
                        return Ok(existing);
                    }
                }

                Err(err)
            }
        }
    }

    /// Atomically adds `amount` to the named counter on an open session.
    ///
    /// ## Atomicity
    /// One UPDATE statement per call - the addition happens inside the
    /// database, so N concurrent sales against the same session never lose
    /// an update. Money counters (total_sales/total_cash/total_card) also
    /// roll the sale into total_sales and total_transactions and stamp
    /// last_transaction_at, all in the same statement.
    ///
    /// Amounts are validated non-negative at the API boundary; counters are
    /// monotone for the life of an open session.
    ///
    /// ## Errors
    /// - `InvalidState` - session exists but is closed
    /// - `NotFound` - session does not exist
    pub async fn increment_counter(
        &self,
        session_id: &str,
        counter: SessionCounter,
        amount: i64,
    ) -> DbResult<Session> {
        debug!(session_id = %session_id, counter = counter.as_str(), amount = %amount, "Incrementing session counter");

        let sql = match counter {
            SessionCounter::TotalSales => {
                "UPDATE sessions SET \
                     total_sales_cents = total_sales_cents + ?1, \
                     total_transactions = total_transactions + 1, \
                     last_transaction_at = ?2 \
                 WHERE id = ?3 AND status = 'open'"
            }
            SessionCounter::TotalCash => {
                "UPDATE sessions SET \
                     total_cash_cents = total_cash_cents + ?1, \
                     total_sales_cents = total_sales_cents + ?1, \
                     total_transactions = total_transactions + 1, \
                     last_transaction_at = ?2 \
                 WHERE id = ?3 AND status = 'open'"
            }
            SessionCounter::TotalCard => {
                "UPDATE sessions SET \
                     total_card_cents = total_card_cents + ?1, \
                     total_sales_cents = total_sales_cents + ?1, \
                     total_transactions = total_transactions + 1, \
                     last_transaction_at = ?2 \
                 WHERE id = ?3 AND status = 'open'"
            }
            SessionCounter::WalkInSales => {
                "UPDATE sessions SET \
                     walk_in_sales = walk_in_sales + ?1, \
                     last_transaction_at = ?2 \
                 WHERE id = ?3 AND status = 'open'"
            }
            SessionCounter::PickupOrdersFulfilled => {
                "UPDATE sessions SET \
                     pickup_orders_fulfilled = pickup_orders_fulfilled + ?1, \
                     last_transaction_at = ?2 \
                 WHERE id = ?3 AND status = 'open'"
            }
        };

        let result = sqlx::query(sql)
            .bind(amount)
            .bind(Utc::now())
            .bind(session_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return match self.get_by_id(session_id).await? {
                Some(_) => Err(DbError::invalid_state("Session", session_id, "closed")),
                None => Err(DbError::not_found("Session", session_id)),
            };
        }

        self.get_by_id(session_id)
            .await?
            .ok_or_else(|| DbError::not_found("Session", session_id))
    }

    /// Closes a session: open → closed, stamps closed_at, freezes counters.
    ///
    /// The only transition in the state machine; `closed` is terminal.
    /// Subsequent mutations fail with InvalidState, forcing callers to open
    /// a fresh session via [`Self::get_or_create`].
    pub async fn end(&self, session_id: &str) -> DbResult<Session> {
        debug!(session_id = %session_id, "Ending session");

        let result = sqlx::query(
            "UPDATE sessions SET status = 'closed', closed_at = ?2 \
             WHERE id = ?1 AND status = 'open'",
        )
        .bind(session_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return match self.get_by_id(session_id).await? {
                Some(_) => Err(DbError::invalid_state("Session", session_id, "closed")),
                None => Err(DbError::not_found("Session", session_id)),
            };
        }

        self.get_by_id(session_id)
            .await?
            .ok_or_else(|| DbError::not_found("Session", session_id))
    }
}

// =============================================================================
// Connection-Level Helpers
// =============================================================================
// These take &mut SqliteConnection so they compose into a caller's
// transaction (sale checkout joins counter updates with stock movements).

/// Fetches the open session for a register on a specific connection.
pub(crate) async fn fetch_open_for_register(
    conn: &mut SqliteConnection,
    register_id: &str,
) -> DbResult<Option<Session>> {
    let session = sqlx::query_as::<_, Session>(&format!(
        "SELECT {SESSION_COLUMNS} FROM sessions \
         WHERE register_id = ?1 AND status = 'open'"
    ))
    .bind(register_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(session)
}

/// Fetches a session by id on a specific connection.
pub(crate) async fn fetch_session(
    conn: &mut SqliteConnection,
    session_id: &str,
) -> DbResult<Option<Session>> {
    let session = sqlx::query_as::<_, Session>(&format!(
        "SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1"
    ))
    .bind(session_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(session)
}

/// Rolls a completed sale into the session counters in one statement.
///
/// Used by sale checkout inside its transaction: total, tender split,
/// channel count and transaction count move together or not at all.
pub(crate) async fn apply_sale_counters(
    conn: &mut SqliteConnection,
    session_id: &str,
    total_cents: i64,
    cash_cents: i64,
    card_cents: i64,
    walk_in: i64,
    pickup: i64,
) -> DbResult<()> {
    let result = sqlx::query(
        "UPDATE sessions SET \
             total_sales_cents = total_sales_cents + ?1, \
             total_cash_cents = total_cash_cents + ?2, \
             total_card_cents = total_card_cents + ?3, \
             walk_in_sales = walk_in_sales + ?4, \
             pickup_orders_fulfilled = pickup_orders_fulfilled + ?5, \
             total_transactions = total_transactions + 1, \
             last_transaction_at = ?6 \
         WHERE id = ?7 AND status = 'open'",
    )
    .bind(total_cents)
    .bind(cash_cents)
    .bind(card_cents)
    .bind(walk_in)
    .bind(pickup)
    .bind(Utc::now())
    .bind(session_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        // Session was closed between the checkout's status check and here;
        // surfacing InvalidState rolls the whole sale back.
        return Err(DbError::invalid_state("Session", session_id, "closed"));
    }

    Ok(())
}

/// The locked find-or-create body. Runs inside BEGIN IMMEDIATE.
async fn open_locked(
    conn: &mut SqliteConnection,
    req: &OpenSessionRequest,
) -> DbResult<Session> {
    // The register must exist and still be active.
    let register = sqlx::query_as::<_, Register>(
        "SELECT id, location_id, vendor_id, name, status, created_at, updated_at \
         FROM registers WHERE id = ?1",
    )
    .bind(&req.register_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| DbError::not_found("Register", &req.register_id))?;

    if !register.is_active() {
        return Err(DbError::invalid_state(
            "Register",
            &req.register_id,
            "inactive",
        ));
    }

    // Idempotent path: an open session already exists, return it unchanged.
    if let Some(existing) = fetch_open_for_register(conn, &req.register_id).await? {
        debug!(session_id = %existing.id, register_id = %req.register_id, "Returning existing open session");
        return Ok(existing);
    }

    let now = Utc::now();
    let session = Session {
        id: Uuid::new_v4().to_string(),
        session_number: generate_session_number(),
        register_id: req.register_id.clone(),
        location_id: req.location_id.clone(),
        vendor_id: req.vendor_id.clone(),
        operator_id: req.operator_id.clone(),
        status: SessionStatus::Open,
        opening_cash_cents: req.opening_cash_cents.unwrap_or(DEFAULT_OPENING_CASH_CENTS),
        total_sales_cents: 0,
        total_transactions: 0,
        total_cash_cents: 0,
        total_card_cents: 0,
        walk_in_sales: 0,
        pickup_orders_fulfilled: 0,
        opened_at: now,
        last_transaction_at: None,
        closed_at: None,
    };

    debug!(session_id = %session.id, session_number = %session.session_number, "Opening session");

    sqlx::query(
        "INSERT INTO sessions (\
             id, session_number, register_id, location_id, vendor_id, operator_id, \
             status, opening_cash_cents, total_sales_cents, total_transactions, \
             total_cash_cents, total_card_cents, walk_in_sales, pickup_orders_fulfilled, \
             opened_at, last_transaction_at, closed_at\
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
    )
    .bind(&session.id)
    .bind(&session.session_number)
    .bind(&session.register_id)
    .bind(&session.location_id)
    .bind(&session.vendor_id)
    .bind(&session.operator_id)
    .bind(session.status)
    .bind(session.opening_cash_cents)
    .bind(session.total_sales_cents)
    .bind(session.total_transactions)
    .bind(session.total_cash_cents)
    .bind(session.total_card_cents)
    .bind(session.walk_in_sales)
    .bind(session.pickup_orders_fulfilled)
    .bind(session.opened_at)
    .bind(session.last_transaction_at)
    .bind(session.closed_at)
    .execute(&mut *conn)
    .await?;

    Ok(session)
}

/// Generates a session number in format: `S-YYYYMMDD-HHMMSS`
///
/// Human-readable and time-derived. Collision-tolerant: uniqueness of open
/// sessions comes from the register-scoped partial index, never from this
/// value.
fn generate_session_number() -> String {
    format!("S-{}", Utc::now().format("%Y%m%d-%H%M%S"))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::register::NewRegister;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seeded_register(db: &Database) -> Register {
        db.registers()
            .insert(NewRegister {
                location_id: "loc-1".to_string(),
                vendor_id: "vendor-1".to_string(),
                name: "Front Counter 1".to_string(),
            })
            .await
            .unwrap()
    }

    fn open_request(register_id: &str) -> OpenSessionRequest {
        OpenSessionRequest {
            register_id: register_id.to_string(),
            location_id: "loc-1".to_string(),
            vendor_id: "vendor-1".to_string(),
            operator_id: "op-1".to_string(),
            opening_cash_cents: None,
        }
    }

    #[tokio::test]
    async fn test_open_session_defaults() {
        let db = test_db().await;
        let reg = seeded_register(&db).await;

        let session = db.sessions().get_or_create(open_request(&reg.id)).await.unwrap();

        assert_eq!(session.status, SessionStatus::Open);
        assert_eq!(session.opening_cash_cents, DEFAULT_OPENING_CASH_CENTS);
        assert_eq!(session.total_sales_cents, 0);
        assert_eq!(session.total_transactions, 0);
        assert!(session.session_number.starts_with("S-"));
        assert!(session.last_transaction_at.is_none());
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let db = test_db().await;
        let reg = seeded_register(&db).await;
        let repo = db.sessions();

        let first = repo.get_or_create(open_request(&reg.id)).await.unwrap();
        let second = repo.get_or_create(open_request(&reg.id)).await.unwrap();
        let third = repo.get_or_create(open_request(&reg.id)).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.id, third.id);
    }

    /// Two clients race to open the same register. Both must
    /// receive the same session id, and exactly one open row exists after.
    #[tokio::test]
    async fn test_concurrent_get_or_create_yields_one_session() {
        let db = test_db().await;
        let reg = seeded_register(&db).await;

        let repo_a = db.sessions();
        let repo_b = db.sessions();
        let req_a = open_request(&reg.id);
        let req_b = open_request(&reg.id);

        let (a, b) = tokio::join!(repo_a.get_or_create(req_a), repo_b.get_or_create(req_b));
        let a = a.unwrap();
        let b = b.unwrap();

        assert_eq!(a.id, b.id, "both callers must receive the same session");

        let open_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sessions WHERE register_id = ?1 AND status = 'open'",
        )
        .bind(&reg.id)
        .fetch_one(db.pool())
        .await
        .unwrap();
        assert_eq!(open_count, 1);
    }

    #[tokio::test]
    async fn test_duplicate_open_row_rejected_by_index() {
        let db = test_db().await;
        let reg = seeded_register(&db).await;
        let session = db.sessions().get_or_create(open_request(&reg.id)).await.unwrap();

        // Bypass the repository and try to force a second open row.
        let err = sqlx::query(
            "INSERT INTO sessions (\
                 id, session_number, register_id, location_id, vendor_id, operator_id, \
                 status, opening_cash_cents, total_sales_cents, total_transactions, \
                 total_cash_cents, total_card_cents, walk_in_sales, pickup_orders_fulfilled, \
                 opened_at\
             ) VALUES (?1, ?2, ?3, 'loc-1', 'vendor-1', 'op-2', 'open', 0, 0, 0, 0, 0, 0, 0, ?4)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind("S-20260830-120000")
        .bind(&reg.id)
        .bind(Utc::now())
        .execute(db.pool())
        .await
        .map_err(DbError::from)
        .unwrap_err();

        assert!(err.is_unique_violation(), "got {err:?}");
        // The original session is untouched.
        let fetched = db.sessions().get_by_id(&session.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, SessionStatus::Open);
    }

    #[tokio::test]
    async fn test_new_session_after_close() {
        let db = test_db().await;
        let reg = seeded_register(&db).await;
        let repo = db.sessions();

        let first = repo.get_or_create(open_request(&reg.id)).await.unwrap();
        repo.end(&first.id).await.unwrap();

        let second = repo.get_or_create(open_request(&reg.id)).await.unwrap();
        assert_ne!(first.id, second.id, "a closed register gets a fresh session");
    }

    #[tokio::test]
    async fn test_open_on_missing_register() {
        let db = test_db().await;
        let err = db.sessions().get_or_create(open_request("nope")).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_open_on_inactive_register() {
        let db = test_db().await;
        let reg = seeded_register(&db).await;
        db.registers().deactivate(&reg.id).await.unwrap();

        let err = db.sessions().get_or_create(open_request(&reg.id)).await.unwrap_err();
        assert!(matches!(err, DbError::InvalidState { .. }));
    }

    /// Concurrent increments must sum exactly - no lost updates.
    #[tokio::test]
    async fn test_counter_increments_sum_exactly() {
        let db = test_db().await;
        let reg = seeded_register(&db).await;
        let session = db.sessions().get_or_create(open_request(&reg.id)).await.unwrap();

        let amounts = [1000i64, 2000, 500];
        let repo = db.sessions();
        let (r1, r2, r3) = tokio::join!(
            repo.increment_counter(&session.id, SessionCounter::TotalSales, amounts[0]),
            repo.increment_counter(&session.id, SessionCounter::TotalSales, amounts[1]),
            repo.increment_counter(&session.id, SessionCounter::TotalSales, amounts[2]),
        );
        r1.unwrap();
        r2.unwrap();
        r3.unwrap();

        let updated = db.sessions().get_by_id(&session.id).await.unwrap().unwrap();
        assert_eq!(updated.total_sales_cents, amounts.iter().sum::<i64>());
        assert_eq!(updated.total_transactions, 3);
        assert!(updated.last_transaction_at.is_some());
    }

    #[tokio::test]
    async fn test_tender_counter_rolls_total_sales() {
        let db = test_db().await;
        let reg = seeded_register(&db).await;
        let session = db.sessions().get_or_create(open_request(&reg.id)).await.unwrap();

        let updated = db
            .sessions()
            .increment_counter(&session.id, SessionCounter::TotalCash, 2500)
            .await
            .unwrap();

        assert_eq!(updated.total_cash_cents, 2500);
        assert_eq!(updated.total_sales_cents, 2500);
        assert_eq!(updated.total_transactions, 1);
    }

    #[tokio::test]
    async fn test_count_counter_does_not_touch_totals() {
        let db = test_db().await;
        let reg = seeded_register(&db).await;
        let session = db.sessions().get_or_create(open_request(&reg.id)).await.unwrap();

        let updated = db
            .sessions()
            .increment_counter(&session.id, SessionCounter::WalkInSales, 1)
            .await
            .unwrap();

        assert_eq!(updated.walk_in_sales, 1);
        assert_eq!(updated.total_sales_cents, 0);
        assert_eq!(updated.total_transactions, 0);
        assert!(updated.last_transaction_at.is_some());
    }

    /// Once ended, a session is immutable: further increments fail with
    /// InvalidState and counters stay frozen.
    #[tokio::test]
    async fn test_closed_session_rejects_increments() {
        let db = test_db().await;
        let reg = seeded_register(&db).await;
        let repo = db.sessions();

        let session = repo.get_or_create(open_request(&reg.id)).await.unwrap();
        repo.increment_counter(&session.id, SessionCounter::TotalSales, 10_000)
            .await
            .unwrap();

        let closed = repo.end(&session.id).await.unwrap();
        assert_eq!(closed.status, SessionStatus::Closed);
        assert!(closed.closed_at.is_some());

        let err = repo
            .increment_counter(&session.id, SessionCounter::TotalSales, 500)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidState { .. }));

        let frozen = repo.get_by_id(&session.id).await.unwrap().unwrap();
        assert_eq!(frozen.total_sales_cents, 10_000);
    }

    #[tokio::test]
    async fn test_end_twice_is_invalid_state() {
        let db = test_db().await;
        let reg = seeded_register(&db).await;
        let repo = db.sessions();

        let session = repo.get_or_create(open_request(&reg.id)).await.unwrap();
        repo.end(&session.id).await.unwrap();

        let err = repo.end(&session.id).await.unwrap_err();
        assert!(matches!(err, DbError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn test_end_missing_session_is_not_found() {
        let db = test_db().await;
        let err = db.sessions().end("nope").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
