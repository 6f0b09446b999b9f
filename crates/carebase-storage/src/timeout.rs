//! TimeoutStore - a store wrapper that bounds every call with a deadline.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use carebase_storage::TimeoutStore;
//!
//! let store = TimeoutStore::new(postgres_store, Duration::from_secs(5));
//! // A call that takes longer than 5s now fails with StorageError::Unavailable.
//! store.list_all().await?;
//! ```

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use carebase_core::{NewRecord, ResourceRecord};
use tracing::warn;

use crate::error::StorageError;
use crate::traits::RecordStore;

/// Deadline applied when none is configured.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Delegates to an inner store and maps elapsed deadlines to
/// `StorageError::Unavailable`. Errors from the inner store pass through
/// unchanged.
pub struct TimeoutStore<S: RecordStore> {
    inner: S,
    timeout: Duration,
}

impl<S: RecordStore> TimeoutStore<S> {
    pub fn new(inner: S, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn bounded<T: Send>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = Result<T, StorageError>> + Send,
    ) -> Result<T, StorageError> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    backend = self.inner.backend_name(),
                    operation,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Store call timed out"
                );
                Err(StorageError::unavailable(format!(
                    "{operation} timed out after {}ms",
                    self.timeout.as_millis()
                )))
            }
        }
    }
}

#[async_trait]
impl<S: RecordStore> RecordStore for TimeoutStore<S> {
    async fn create(&self, fields: &NewRecord) -> Result<ResourceRecord, StorageError> {
        self.bounded("create", self.inner.create(fields)).await
    }

    async fn list_all(&self) -> Result<Vec<ResourceRecord>, StorageError> {
        self.bounded("list_all", self.inner.list_all()).await
    }

    fn backend_name(&self) -> &'static str {
        self.inner.backend_name()
    }
}

impl<S: RecordStore> std::fmt::Debug for TimeoutStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeoutStore")
            .field("backend", &self.inner.backend_name())
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Store that never answers.
    struct StalledStore;

    #[async_trait]
    impl RecordStore for StalledStore {
        async fn create(&self, _fields: &NewRecord) -> Result<ResourceRecord, StorageError> {
            std::future::pending().await
        }

        async fn list_all(&self) -> Result<Vec<ResourceRecord>, StorageError> {
            std::future::pending().await
        }

        fn backend_name(&self) -> &'static str {
            "stalled"
        }
    }

    /// Store that answers immediately.
    struct EchoStore;

    #[async_trait]
    impl RecordStore for EchoStore {
        async fn create(&self, fields: &NewRecord) -> Result<ResourceRecord, StorageError> {
            fields.validate()?;
            Ok(fields.clone().into_record(1))
        }

        async fn list_all(&self) -> Result<Vec<ResourceRecord>, StorageError> {
            Ok(Vec::new())
        }

        fn backend_name(&self) -> &'static str {
            "echo"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_deadline_is_unavailable() {
        let store = TimeoutStore::new(StalledStore, Duration::from_millis(50));

        let err = store.list_all().await.unwrap_err();
        assert!(err.is_unavailable());

        let err = store.create(&NewRecord::new("Ada")).await.unwrap_err();
        assert!(err.is_unavailable());
        assert!(err.to_string().contains("create timed out"));
    }

    #[tokio::test]
    async fn test_inner_results_pass_through() {
        let store = TimeoutStore::new(EchoStore, DEFAULT_STORE_TIMEOUT);

        let record = store.create(&NewRecord::new("Ada")).await.unwrap();
        assert_eq!(record.id, 1);
        assert!(store.list_all().await.unwrap().is_empty());

        let err = store.create(&NewRecord::new("")).await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(store.backend_name(), "echo");
    }
}
