//! Resource service: validates create payloads, persists them and announces
//! the result to realtime subscribers.

use std::sync::Arc;

use carebase_core::{NewRecord, ResourceRecord};
use carebase_notifications::{ChangeEvent, ChangeNotifier};
use carebase_storage::{DynRecordStore, RecordStore, StorageError};
use serde_json::Value;

#[derive(Clone)]
pub struct ResourceService {
    store: DynRecordStore,
    notifier: Option<Arc<ChangeNotifier>>,
}

impl ResourceService {
    /// A service without a realtime channel.
    pub fn new(store: DynRecordStore) -> Self {
        Self {
            store,
            notifier: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<ChangeNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn store(&self) -> &DynRecordStore {
        &self.store
    }

    pub fn notifier(&self) -> Option<&Arc<ChangeNotifier>> {
        self.notifier.as_ref()
    }

    /// Decode, persist and announce a new record.
    ///
    /// Invalid payloads never reach the store and publish nothing. Delivery
    /// problems on the realtime side are logged by the notifier and never
    /// fail the create.
    #[tracing::instrument(skip_all)]
    pub async fn create_resource(&self, payload: Value) -> Result<ResourceRecord, StorageError> {
        let new_record = NewRecord::from_json(payload)?;
        let record = self
            .store
            .create(&new_record)
            .await
            .inspect_err(|err| log_store_failure("create", err))?;

        tracing::info!(
            record.id = record.id,
            backend = self.store.backend_name(),
            "Resource created"
        );

        if let Some(notifier) = &self.notifier {
            notifier.publish(&ChangeEvent::created(record.clone()));
        }

        Ok(record)
    }

    pub async fn list_resources(&self) -> Result<Vec<ResourceRecord>, StorageError> {
        self.store
            .list_all()
            .await
            .inspect_err(|err| log_store_failure("list", err))
    }
}

fn log_store_failure(operation: &'static str, err: &StorageError) {
    if err.is_validation() {
        tracing::debug!(operation, category = %err.category(), error = %err, "Store rejected record");
    } else {
        tracing::warn!(operation, category = %err.category(), error = %err, "Store call failed");
    }
}

impl std::fmt::Debug for ResourceService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceService")
            .field("backend", &self.store.backend_name())
            .field("realtime", &self.notifier.is_some())
            .finish()
    }
}
