//! Record table bootstrap.
//!
//! The store keeps one table per record type. [`SchemaManager::sync`] creates
//! it when missing and leaves an existing table untouched; there is no
//! migration history.

use sqlx_core::query::query;
use sqlx_core::query_scalar::query_scalar;
use sqlx_postgres::PgPool;
use tracing::{debug, info, instrument};

use crate::error::{PostgresError, Result};

/// Manages the record table.
#[derive(Debug, Clone)]
pub struct SchemaManager {
    pool: PgPool,
    table: String,
}

impl SchemaManager {
    /// Creates a new `SchemaManager` for `table`.
    ///
    /// The name must already have passed `PostgresConfig::validate`.
    #[must_use]
    pub fn new(pool: PgPool, table: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
        }
    }

    /// Returns the managed table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// `CREATE TABLE` statement for the record table.
    #[must_use]
    pub fn create_table_sql(table: &str) -> String {
        format!(
            r#"CREATE TABLE IF NOT EXISTS "{table}" (
                id BIGSERIAL PRIMARY KEY,
                name TEXT NOT NULL,
                age INTEGER CHECK (age >= 0),
                address TEXT,
                phone TEXT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )"#
        )
    }

    /// Returns true if the record table exists in the current schema.
    pub async fn table_exists(&self) -> Result<bool> {
        let exists: bool = query_scalar(
            "SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = current_schema() AND table_name = $1
            )",
        )
        .bind(&self.table)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Creates the record table if it does not exist yet.
    ///
    /// Idempotent; safe to call on every startup.
    #[instrument(skip(self), fields(table = %self.table))]
    pub async fn sync(&self) -> Result<()> {
        if self.table_exists().await? {
            debug!("Record table already exists");
            return Ok(());
        }

        info!("Creating record table");
        query(&Self::create_table_sql(&self.table))
            .execute(&self.pool)
            .await
            .map_err(|e| PostgresError::Schema(format!("failed to create {}: {e}", self.table)))?;

        Ok(())
    }
}
