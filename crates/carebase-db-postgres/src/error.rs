//! Error types for the PostgreSQL store.

use carebase_storage::StorageError;
use sqlx_core::error::Error as SqlxError;

/// PostgreSQL error code for a CHECK constraint violation (23514).
pub const PG_CHECK_VIOLATION: &str = "23514";

/// PostgreSQL error code for a NOT NULL violation (23502).
pub const PG_NOT_NULL_VIOLATION: &str = "23502";

/// Checks if a sqlx error has a specific PostgreSQL error code.
pub fn has_pg_error_code(err: &SqlxError, code: &str) -> bool {
    if let SqlxError::Database(db_err) = err {
        db_err.code().as_deref() == Some(code)
    } else {
        false
    }
}

/// Errors specific to the PostgreSQL store.
#[derive(Debug, thiserror::Error)]
pub enum PostgresError {
    /// Error reported by sqlx (connection, protocol or query).
    #[error("Database error: {0}")]
    Sqlx(#[from] SqlxError),

    /// The database was unreachable or refused the session at startup.
    #[error("Could not connect to {target}: {source}")]
    Connect {
        /// Connection URL with the password redacted.
        target: String,
        source: SqlxError,
    },

    /// Schema bootstrap error.
    #[error("Schema error: {0}")]
    Schema(String),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl PostgresError {
    /// Creates a new configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a startup connection error for an already redacted target.
    #[must_use]
    pub fn connect(target: impl Into<String>, source: SqlxError) -> Self {
        Self::Connect {
            target: target.into(),
            source,
        }
    }

    /// Returns `true` if the database could not be reached at all.
    #[must_use]
    pub fn is_connectivity(&self) -> bool {
        match self {
            Self::Connect { .. } => true,
            Self::Sqlx(err) => matches!(
                err,
                SqlxError::Io(_)
                    | SqlxError::Tls(_)
                    | SqlxError::PoolTimedOut
                    | SqlxError::PoolClosed
                    | SqlxError::WorkerCrashed
            ),
            _ => false,
        }
    }
}

impl From<PostgresError> for StorageError {
    fn from(err: PostgresError) -> Self {
        if err.is_connectivity() {
            return StorageError::unavailable(err.to_string());
        }
        match err {
            PostgresError::Sqlx(e)
                if has_pg_error_code(&e, PG_CHECK_VIOLATION)
                    || has_pg_error_code(&e, PG_NOT_NULL_VIOLATION) =>
            {
                StorageError::validation(e.to_string())
            }
            PostgresError::Sqlx(e) => StorageError::internal(format!("Database error: {e}")),
            PostgresError::Connect { target, source } => {
                StorageError::unavailable(format!("Could not connect to {target}: {source}"))
            }
            PostgresError::Schema(e) => StorageError::internal(format!("Schema error: {e}")),
            PostgresError::Config { message } => {
                StorageError::internal(format!("Configuration error: {message}"))
            }
        }
    }
}

/// Result type alias for PostgreSQL operations.
pub type Result<T> = std::result::Result<T, PostgresError>;
