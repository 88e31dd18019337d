//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DurableSlot` port from the `core` crate backed by PostgreSQL through `sqlx`.

use async_trait::async_trait;
use aura_core::ports::{DurableSlot, PortError, PortResult};
use sqlx::{FromRow, PgPool};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DurableSlot` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct SlotRecord {
    value: String,
}
impl SlotRecord {
    fn to_domain(self) -> String {
        self.value
    }
}

//=========================================================================================
// `DurableSlot` Trait Implementation
//=========================================================================================

#[async_trait]
impl DurableSlot for DbAdapter {
    async fn read(&self, key: &str) -> PortResult<Option<String>> {
        let record = sqlx::query_as::<_, SlotRecord>(
            "SELECT value FROM durable_slots WHERE key = $1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(record.map(|r| r.to_domain()))
    }

    async fn write(&self, key: &str, value: &str) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO durable_slots (key, value, updated_at) VALUES ($1, $2, NOW()) \
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM durable_slots WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }
}
