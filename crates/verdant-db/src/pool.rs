//! # Database Handle
//!
//! Pool construction and the `Database` facade the API server works through.
//!
//! ## Startup Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        pos-api → Database                               │
//! │                                                                         │
//! │  ApiConfig (env) ──► DbConfig::new(path).max_connections(n)            │
//! │                            │                                            │
//! │                            ▼                                            │
//! │                   Database::new(config).await                           │
//! │                     1. open/create the SQLite file                      │
//! │                     2. WAL journal, NORMAL sync, foreign keys ON        │
//! │                     3. build the SqlitePool                             │
//! │                     4. apply pending migrations                         │
//! │                            │                                            │
//! │                            ▼                                            │
//! │   db.registers() / db.sessions() / db.inventory() / db.sales()         │
//! │   (per-request repositories, each holding a clone of the pool)          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Why WAL
//! A terminal ringing a sale must never wait on another terminal reading the
//! movement trail. WAL keeps readers and the single writer out of each
//! other's way; on top of that the contended writes (counter increments,
//! stock deductions) are single UPDATE statements, and the check-then-insert
//! path in session creation takes the write lock up front with
//! BEGIN IMMEDIATE.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::inventory::InventoryRepository;
use crate::repository::register::RegisterRepository;
use crate::repository::sale::SaleRepository;
use crate::repository::session::SessionRepository;

// =============================================================================
// Configuration
// =============================================================================

/// Pool and connection settings.
///
/// Built with chained setters; only the path is required:
///
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/verdant/verdant.db").max_connections(8);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// SQLite database file. Created on first connect if absent.
    pub database_path: PathBuf,

    /// Pool size ceiling. A store-local service talking to one SQLite file
    /// needs few; default 5.
    pub max_connections: u32,

    /// Connections kept warm. Default 1.
    pub min_connections: u32,

    /// How long an acquire may wait before failing. Default 30 seconds.
    pub connect_timeout: Duration,

    /// Idle connections are recycled after this. Default 10 minutes.
    pub idle_timeout: Duration,

    /// Apply pending migrations during `Database::new`. Default true.
    pub run_migrations: bool,
}

impl DbConfig {
    /// Settings for a database at `path`, with defaults for everything else.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            run_migrations: true,
        }
    }

    /// Sets the pool size ceiling.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the number of connections kept warm.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets the acquire timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets whether `Database::new` applies pending migrations.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// An isolated in-memory database, for tests.
    ///
    /// Pinned to one connection: each SQLite `:memory:` connection is its
    /// own database, so a second connection would see empty tables.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            run_migrations: true,
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Owner of the connection pool; hands out repositories.
///
/// Cloning is cheap (the pool is internally shared), so handlers hold a
/// clone inside the app state and call `db.sessions().get_or_create(...)`
/// per request.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens (creating if needed) the database and prepares it for use.
    ///
    /// Connection pragmas are fixed here rather than left to callers: WAL
    /// journal, NORMAL synchronous, foreign keys enforced. Pending
    /// migrations run last unless the config opted out.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Initializing database connection"
        );

        // mode=rwc: read-write, create the file when missing.
        let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());

        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            // SQLite ships with foreign keys off; the ledger tables rely on
            // them (movements reference inventory, sales reference sessions).
            .foreign_keys(true)
            .create_if_missing(true);

        debug!("Connection options configured");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "Database pool created"
        );

        let db = Database { pool };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Applies pending migrations.
    ///
    /// `new()` calls this unless disabled in config; callers that disabled
    /// it (a migration CLI, a test fixture with its own schema) invoke it
    /// explicitly.
    pub async fn run_migrations(&self) -> DbResult<()> {
        info!("Running database migrations");
        migrations::run_migrations(&self.pool).await?;
        info!("Migrations complete");
        Ok(())
    }

    /// The raw pool, for queries the repositories do not cover.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Register repository: the terminal registry.
    pub fn registers(&self) -> RegisterRepository {
        RegisterRepository::new(self.pool.clone())
    }

    /// Session repository: drawer lifecycle and counters.
    pub fn sessions(&self) -> SessionRepository {
        SessionRepository::new(self.pool.clone())
    }

    /// Inventory repository: stock ledger and movement trail.
    pub fn inventory(&self) -> InventoryRepository {
        InventoryRepository::new(self.pool.clone())
    }

    /// Sale repository: checkout orchestration and voids.
    pub fn sales(&self) -> SaleRepository {
        SaleRepository::new(self.pool.clone())
    }

    /// Closes the pool. Call on shutdown; operations fail afterwards.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// Whether the database still answers queries.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
