//! # carebase-storage
//!
//! Storage abstraction layer for the Carebase server.
//!
//! This crate defines the [`RecordStore`] trait that every backend implements
//! and the [`StorageError`] taxonomy shared by all of them. Backends live in
//! separate crates (`carebase-db-memory`, `carebase-db-postgres`).
//!
//! ## Example
//!
//! ```ignore
//! use carebase_core::NewRecord;
//! use carebase_storage::{RecordStore, StorageError, TimeoutStore};
//!
//! async fn admit(store: &dyn RecordStore) -> Result<(), StorageError> {
//!     let record = store.create(&NewRecord::new("Ada").with_age(30)).await?;
//!     assert!(store.list_all().await?.contains(&record));
//!     Ok(())
//! }
//! ```

mod error;
mod timeout;
mod traits;

pub use error::{ErrorCategory, StorageError};
pub use timeout::{DEFAULT_STORE_TIMEOUT, TimeoutStore};
pub use traits::RecordStore;

/// Type alias for a shared store trait object.
pub type DynRecordStore = std::sync::Arc<dyn RecordStore>;
