//! In-memory record store for the Carebase server.
//!
//! This crate provides an in-process implementation of the `RecordStore`
//! trait from `carebase-storage`. It backs the `memory` storage mode and the
//! test suites.
//!
//! # Example
//!
//! ```ignore
//! use carebase_core::NewRecord;
//! use carebase_db_memory::InMemoryStore;
//! use carebase_storage::RecordStore;
//!
//! let store = InMemoryStore::new();
//! let created = store.create(&NewRecord::new("Ada")).await?;
//! assert_eq!(created.id, 1);
//! ```

mod storage;

pub use carebase_storage::{RecordStore, StorageError};
pub use storage::InMemoryStore;

