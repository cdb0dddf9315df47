//! In-memory storage implementation.

use super::{BoxFuture, Collection, Storage, StorageError, StorageResult, StoredRecord};
use crate::shapes::ProjectId;
use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// In-memory storage for testing and ephemeral use.
#[derive(Default)]
pub struct MemoryStorage {
    records: RwLock<HashMap<(Collection, Uuid), StoredRecord>>,
    revision: AtomicU64,
}

impl MemoryStorage {
    /// Create a new empty memory storage.
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Other(format!("Lock error: {}", e))
}

impl Storage for MemoryStorage {
    fn put(&self, collection: Collection, record: StoredRecord) -> BoxFuture<'_, StorageResult<()>> {
        Box::pin(async move {
            let mut records = self.records.write().map_err(lock_error)?;
            records.insert((collection, record.id), record);
            self.revision.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    fn get(&self, collection: Collection, id: Uuid) -> BoxFuture<'_, StorageResult<StoredRecord>> {
        Box::pin(async move {
            let records = self.records.read().map_err(lock_error)?;
            records
                .get(&(collection, id))
                .cloned()
                .ok_or_else(|| StorageError::NotFound(format!("{}/{}", collection.name(), id)))
        })
    }

    fn delete(&self, collection: Collection, id: Uuid) -> BoxFuture<'_, StorageResult<()>> {
        Box::pin(async move {
            let mut records = self.records.write().map_err(lock_error)?;
            if records.remove(&(collection, id)).is_some() {
                self.revision.fetch_add(1, Ordering::SeqCst);
            }
            Ok(())
        })
    }

    fn list(&self, collection: Collection, project: Option<ProjectId>) -> BoxFuture<'_, StorageResult<Vec<StoredRecord>>> {
        Box::pin(async move {
            let records = self.records.read().map_err(lock_error)?;
            Ok(records
                .iter()
                .filter(|((c, _), r)| *c == collection && (project.is_none() || r.project_id == project))
                .map(|(_, r)| r.clone())
                .collect())
        })
    }

    fn revision(&self) -> BoxFuture<'_, StorageResult<u64>> {
        Box::pin(async move { Ok(self.revision.load(Ordering::SeqCst)) })
    }
}
