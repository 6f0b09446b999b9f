//! PostgreSQL implementation of the RecordStore trait.

use async_trait::async_trait;
use carebase_core::{NewRecord, RecordId, ResourceRecord};
use carebase_storage::{RecordStore, StorageError};
use sqlx_core::query_as::query_as;
use sqlx_postgres::PgPool;
use tracing::{debug, instrument};

use crate::config::PostgresConfig;
use crate::error::PostgresError;
use crate::pool;
use crate::schema::SchemaManager;

/// Row shape shared by `INSERT ... RETURNING` and `SELECT`.
type RecordRow = (
    RecordId,
    String,
    Option<i32>,
    Option<String>,
    Option<String>,
);

fn row_to_record((id, name, age, address, phone): RecordRow) -> ResourceRecord {
    ResourceRecord {
        id,
        name,
        age,
        address,
        phone,
    }
}

/// PostgreSQL record store.
///
/// Ids come from the table's `BIGSERIAL` sequence, so concurrent creates
/// never collide and ids are never reused.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
    schema: SchemaManager,
    insert_sql: String,
    select_sql: String,
}

impl PostgresStore {
    /// Creates a new `PostgresStore` with the given configuration.
    ///
    /// This will:
    /// 1. Validate the configuration
    /// 2. Create a connection pool and check connectivity
    /// 3. Create the record table (if `sync_schema` is set)
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Unavailable` if the database cannot be reached.
    pub async fn new(config: PostgresConfig) -> Result<Self, StorageError> {
        config.validate()?;

        let pool = pool::connect(&config).await?;

        let store = Self::from_pool(pool, &config.table);
        if config.sync_schema {
            store.schema.sync().await?;
        }

        Ok(store)
    }

    /// Creates a new `PostgresStore` from an existing connection pool.
    ///
    /// The table is not created automatically when using this constructor.
    #[must_use]
    pub fn from_pool(pool: PgPool, table: &str) -> Self {
        let schema = SchemaManager::new(pool.clone(), table);
        Self {
            pool,
            schema,
            insert_sql: format!(
                r#"INSERT INTO "{table}" (name, age, address, phone)
                   VALUES ($1, $2, $3, $4)
                   RETURNING id, name, age, address, phone"#
            ),
            select_sql: format!(
                r#"SELECT id, name, age, address, phone FROM "{table}" ORDER BY id"#
            ),
        }
    }

    /// Returns a reference to the connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Returns the schema manager for the record table.
    #[must_use]
    pub fn schema(&self) -> &SchemaManager {
        &self.schema
    }

    /// Closes the pool. Called once at process shutdown.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl RecordStore for PostgresStore {
    #[instrument(skip_all, fields(table = %self.schema.table()))]
    async fn create(&self, fields: &NewRecord) -> Result<ResourceRecord, StorageError> {
        fields.validate()?;

        let row: RecordRow = query_as(&self.insert_sql)
            .bind(&fields.name)
            .bind(fields.age)
            .bind(fields.address.as_deref())
            .bind(fields.phone.as_deref())
            .fetch_one(&self.pool)
            .await
            .map_err(PostgresError::from)?;

        let record = row_to_record(row);
        debug!(record.id = record.id, "Inserted record");
        Ok(record)
    }

    #[instrument(skip_all, fields(table = %self.schema.table()))]
    async fn list_all(&self) -> Result<Vec<ResourceRecord>, StorageError> {
        let rows: Vec<RecordRow> = query_as(&self.select_sql)
            .fetch_all(&self.pool)
            .await
            .map_err(PostgresError::from)?;

        Ok(rows.into_iter().map(row_to_record).collect())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_to_record() {
        let record = row_to_record((7, "Ada".into(), Some(30), None, Some("555-0100".into())));
        assert_eq!(record.id, 7);
        assert_eq!(record.name, "Ada");
        assert_eq!(record.age, Some(30));
        assert_eq!(record.address, None);
        assert_eq!(record.phone.as_deref(), Some("555-0100"));
    }
}
