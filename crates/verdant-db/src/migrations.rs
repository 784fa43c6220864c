//! # Schema Migrations
//!
//! The SQL files under `migrations/sqlite/` are embedded into the binary by
//! `sqlx::migrate!`, so a deployed store server carries its own schema and
//! needs no files on disk next to it.
//!
//! At startup `Database::new` compares the embedded set against the
//! `_sqlx_migrations` bookkeeping table and applies whatever is pending, in
//! filename order, each inside its own transaction. Schema evolution is a
//! deploy-time concern; nothing in the API surface ever issues DDL.
//!
//! To change the schema, add `migrations/sqlite/NNN_description.sql` with
//! the next sequence number. Applied migrations are checksummed, so editing
//! an existing file makes every deployed database refuse to start; always
//! add, never rewrite.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

/// Migrations embedded at compile time from `migrations/sqlite/`.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies every migration not yet recorded in `_sqlx_migrations`.
///
/// Safe to call repeatedly; already-applied migrations are skipped.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!("Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}

/// Counts of (embedded, applied) migrations.
///
/// Surfaced by the health endpoint so an operator can spot a database that
/// connected but never finished migrating.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    // Before the first run the bookkeeping table does not exist yet.
    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    Ok((total, applied as usize))
}
