use async_trait::async_trait;
use carebase_core::{NewRecord, RecordId, ResourceRecord};
use carebase_storage::{RecordStore, StorageError};
use tokio::sync::RwLock;
use tracing::debug;

/// Records plus the next id to hand out. Both live under one lock so that id
/// assignment and insertion happen as a single step.
#[derive(Debug)]
struct Table {
    rows: Vec<ResourceRecord>,
    next_id: RecordId,
}

/// In-memory record store.
///
/// - Insertion-ordered listing
/// - Ids start at 1 and are never reused
/// - Concurrent creates are serialized by a write lock
#[derive(Debug)]
pub struct InMemoryStore {
    table: RwLock<Table>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            table: RwLock::new(Table {
                rows: Vec::new(),
                next_id: 1,
            }),
        }
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.table.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn create(&self, fields: &NewRecord) -> Result<ResourceRecord, StorageError> {
        fields.validate()?;

        let mut table = self.table.write().await;
        let id = table.next_id;
        table.next_id += 1;

        let record = fields.clone().into_record(id);
        table.rows.push(record.clone());
        debug!(record.id = id, "Stored record in memory");

        Ok(record)
    }

    async fn list_all(&self) -> Result<Vec<ResourceRecord>, StorageError> {
        Ok(self.table.read().await.rows.clone())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_empty_store_lists_nothing() {
        let store = InMemoryStore::new();
        assert!(store.list_all().await.unwrap().is_empty());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let store = InMemoryStore::new();

        let ada = store
            .create(&NewRecord::new("Ada").with_age(30))
            .await
            .unwrap();
        let grace = store.create(&NewRecord::new("Grace")).await.unwrap();

        assert_eq!(ada.id, 1);
        assert_eq!(ada.age, Some(30));
        assert_eq!(grace.id, 2);
        assert_eq!(store.list_all().await.unwrap(), vec![ada, grace]);
    }

    #[tokio::test]
    async fn test_invalid_fields_are_not_stored() {
        let store = InMemoryStore::new();

        let err = store
            .create(&NewRecord::new("Ada").with_age(-3))
            .await
            .unwrap_err();
        assert!(err.is_validation());

        let err = store.create(&NewRecord::new(" ")).await.unwrap_err();
        assert!(err.is_validation());

        assert!(store.is_empty().await);

        // A rejected create must not burn an id.
        let record = store.create(&NewRecord::new("Ada")).await.unwrap();
        assert_eq!(record.id, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_get_distinct_ids() {
        let store = Arc::new(InMemoryStore::new());

        let mut handles = Vec::new();
        for i in 0..64 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .create(&NewRecord::new(format!("patient-{i}")))
                    .await
                    .unwrap()
            }));
        }

        let mut ids = HashSet::new();
        for handle in handles {
            ids.insert(handle.await.unwrap().id);
        }

        assert_eq!(ids.len(), 64);
        assert_eq!(store.list_all().await.unwrap().len(), 64);
    }
}
