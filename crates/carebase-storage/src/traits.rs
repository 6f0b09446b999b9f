//! The store contract.

use async_trait::async_trait;
use carebase_core::{NewRecord, ResourceRecord};

use crate::error::StorageError;

/// Durable keyed collection of records.
///
/// Implementations must be thread-safe (`Send + Sync`) and must hand out
/// unique ids even under concurrent `create` calls. A record is either fully
/// visible to `list_all` or not visible at all.
///
/// # Example
///
/// ```ignore
/// use carebase_storage::{RecordStore, StorageError};
///
/// async fn count(store: &dyn RecordStore) -> Result<usize, StorageError> {
///     Ok(store.list_all().await?.len())
/// }
/// ```
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persists a new record and returns it with its generated id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Validation` if the fields violate the record
    /// invariants. Returns `StorageError::Unavailable` if the backend cannot
    /// be reached.
    async fn create(&self, fields: &NewRecord) -> Result<ResourceRecord, StorageError>;

    /// Returns every stored record in insertion order.
    ///
    /// An empty store yields an empty vector, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues.
    async fn list_all(&self) -> Result<Vec<ResourceRecord>, StorageError>;

    /// Returns the name of this backend for logging.
    fn backend_name(&self) -> &'static str;
}

#[async_trait]
impl<T: RecordStore + ?Sized> RecordStore for std::sync::Arc<T> {
    async fn create(&self, fields: &NewRecord) -> Result<ResourceRecord, StorageError> {
        (**self).create(fields).await
    }

    async fn list_all(&self) -> Result<Vec<ResourceRecord>, StorageError> {
        (**self).list_all().await
    }

    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }
}
