//! # Register Repository
//!
//! Database operations for POS registers.
//!
//! Registers are read-mostly reference data: created by store setup, listed
//! by the terminal picker, never deleted - only deactivated. No concurrency
//! concerns live here; the interesting invariants are one table over, in
//! [`crate::repository::session`].

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use verdant_core::{Register, RegisterStatus};

/// Column list shared by every register SELECT.
const REGISTER_COLUMNS: &str =
    "id, location_id, vendor_id, name, status, created_at, updated_at";

/// A request to provision a register at a location.
#[derive(Debug, Clone)]
pub struct NewRegister {
    pub location_id: String,
    pub vendor_id: String,
    pub name: String,
}

/// Repository for register database operations.
#[derive(Debug, Clone)]
pub struct RegisterRepository {
    pool: SqlitePool,
}

impl RegisterRepository {
    /// Creates a new RegisterRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RegisterRepository { pool }
    }

    /// Lists registers at a location, active first, then by name.
    pub async fn list(&self, location_id: &str) -> DbResult<Vec<Register>> {
        debug!(location_id = %location_id, "Listing registers");

        let registers = sqlx::query_as::<_, Register>(&format!(
            "SELECT {REGISTER_COLUMNS} FROM registers \
             WHERE location_id = ?1 \
             ORDER BY status, name"
        ))
        .bind(location_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(registers)
    }

    /// Gets a register by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Register))` - Register found
    /// * `Ok(None)` - Register not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Register>> {
        let register = sqlx::query_as::<_, Register>(&format!(
            "SELECT {REGISTER_COLUMNS} FROM registers WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(register)
    }

    /// Provisions a new register (store setup).
    pub async fn insert(&self, req: NewRegister) -> DbResult<Register> {
        let now = Utc::now();
        let register = Register {
            id: Uuid::new_v4().to_string(),
            location_id: req.location_id,
            vendor_id: req.vendor_id,
            name: req.name,
            status: RegisterStatus::Active,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %register.id, name = %register.name, "Inserting register");

        sqlx::query(
            "INSERT INTO registers (id, location_id, vendor_id, name, status, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&register.id)
        .bind(&register.location_id)
        .bind(&register.vendor_id)
        .bind(&register.name)
        .bind(register.status)
        .bind(register.created_at)
        .bind(register.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(register)
    }

    /// Deactivates a register. History is kept; no new sessions may open.
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deactivating register");

        let result = sqlx::query(
            "UPDATE registers SET status = 'inactive', updated_at = ?2 WHERE id = ?1",
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Register", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn new_register(location: &str, name: &str) -> NewRegister {
        NewRegister {
            location_id: location.to_string(),
            vendor_id: "vendor-1".to_string(),
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_db().await;
        let repo = db.registers();

        let created = repo.insert(new_register("loc-1", "Front Counter 1")).await.unwrap();
        let fetched = repo.get_by_id(&created.id).await.unwrap().unwrap();

        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.name, "Front Counter 1");
        assert_eq!(fetched.status, RegisterStatus::Active);
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let db = test_db().await;
        let found = db.registers().get_by_id("nope").await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_list_scoped_to_location() {
        let db = test_db().await;
        let repo = db.registers();

        repo.insert(new_register("loc-1", "Front Counter 1")).await.unwrap();
        repo.insert(new_register("loc-1", "Front Counter 2")).await.unwrap();
        repo.insert(new_register("loc-2", "Drive Thru")).await.unwrap();

        let loc1 = repo.list("loc-1").await.unwrap();
        assert_eq!(loc1.len(), 2);

        let loc2 = repo.list("loc-2").await.unwrap();
        assert_eq!(loc2.len(), 1);
        assert_eq!(loc2[0].name, "Drive Thru");
    }

    #[tokio::test]
    async fn test_deactivate() {
        let db = test_db().await;
        let repo = db.registers();

        let reg = repo.insert(new_register("loc-1", "Front Counter 1")).await.unwrap();
        repo.deactivate(&reg.id).await.unwrap();

        let fetched = repo.get_by_id(&reg.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, RegisterStatus::Inactive);
        assert!(!fetched.is_active());
    }

    #[tokio::test]
    async fn test_deactivate_missing_is_not_found() {
        let db = test_db().await;
        let err = db.registers().deactivate("nope").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
