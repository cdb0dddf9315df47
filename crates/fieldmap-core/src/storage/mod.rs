//! Storage abstraction for persistence.
//!
//! Backends store JSON records keyed by `(Collection, id)`. The typed layer in
//! [`StorageExt`] maps projects, shapes, sequences and datasets onto records.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::project::{Dataset, Project};
use crate::sequence::Sequence;
use crate::shapes::{MapObject, ProjectId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;
use uuid::Uuid;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Record not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serialization(e.to_string())
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Record collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Projects,
    Objects,
    Sequences,
    Datasets,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Projects,
        Collection::Objects,
        Collection::Sequences,
        Collection::Datasets,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Collection::Projects => "projects",
            Collection::Objects => "objects",
            Collection::Sequences => "sequences",
            Collection::Datasets => "datasets",
        }
    }
}

/// A stored JSON record with the keys needed for lookup and filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRecord {
    pub id: Uuid,
    #[serde(default)]
    pub project_id: Option<ProjectId>,
    pub body: serde_json::Value,
}

/// Trait for record storage backends.
pub trait Storage: Send + Sync {
    /// Insert or replace a record.
    fn put(&self, collection: Collection, record: StoredRecord) -> BoxFuture<'_, StorageResult<()>>;

    fn get(&self, collection: Collection, id: Uuid) -> BoxFuture<'_, StorageResult<StoredRecord>>;

    /// Delete a record. Deleting a missing record is not an error.
    fn delete(&self, collection: Collection, id: Uuid) -> BoxFuture<'_, StorageResult<()>>;

    /// All records of a collection, optionally only those owned by `project`.
    fn list(&self, collection: Collection, project: Option<ProjectId>) -> BoxFuture<'_, StorageResult<Vec<StoredRecord>>>;

    /// Monotonic counter bumped by every write, for change detection.
    fn revision(&self) -> BoxFuture<'_, StorageResult<u64>>;
}

/// A type that is persisted as a record.
pub trait Record: Serialize + DeserializeOwned + 'static {
    const COLLECTION: Collection;

    fn record_id(&self) -> Uuid;

    fn owner(&self) -> Option<ProjectId>;

    fn to_record(&self) -> StorageResult<StoredRecord> {
        Ok(StoredRecord {
            id: self.record_id(),
            project_id: self.owner(),
            body: serde_json::to_value(self)?,
        })
    }

    fn from_record(record: StoredRecord) -> StorageResult<Self> {
        Ok(serde_json::from_value(record.body)?)
    }
}

impl Record for Project {
    const COLLECTION: Collection = Collection::Projects;
    fn record_id(&self) -> Uuid {
        self.id
    }
    fn owner(&self) -> Option<ProjectId> {
        None
    }
}

impl Record for MapObject {
    const COLLECTION: Collection = Collection::Objects;
    fn record_id(&self) -> Uuid {
        self.id
    }
    fn owner(&self) -> Option<ProjectId> {
        Some(self.project_id)
    }
}

impl Record for Sequence {
    const COLLECTION: Collection = Collection::Sequences;
    fn record_id(&self) -> Uuid {
        self.id
    }
    fn owner(&self) -> Option<ProjectId> {
        Some(self.project_id)
    }
}

impl Record for Dataset {
    const COLLECTION: Collection = Collection::Datasets;
    fn record_id(&self) -> Uuid {
        self.id
    }
    fn owner(&self) -> Option<ProjectId> {
        Some(self.project_id)
    }
}

/// Typed helpers over any [`Storage`].
pub trait StorageExt: Storage {
    fn save<'a, R: Record>(&'a self, value: &R) -> BoxFuture<'a, StorageResult<()>>
    where
        Self: 'a,
    {
        let record = value.to_record();
        Box::pin(async move { self.put(R::COLLECTION, record?).await })
    }

    fn load<'a, R: Record>(&'a self, id: Uuid) -> BoxFuture<'a, StorageResult<R>>
    where
        Self: 'a,
    {
        Box::pin(async move { R::from_record(self.get(R::COLLECTION, id).await?) })
    }

    fn remove<R: Record>(&self, id: Uuid) -> BoxFuture<'_, StorageResult<()>> {
        self.delete(R::COLLECTION, id)
    }

    fn load_all<'a, R: Record>(&'a self, project: Option<ProjectId>) -> BoxFuture<'a, StorageResult<Vec<R>>>
    where
        Self: 'a,
    {
        Box::pin(async move {
            self.list(R::COLLECTION, project)
                .await?
                .into_iter()
                .map(R::from_record)
                .collect()
        })
    }
}

impl<S: Storage + ?Sized> StorageExt for S {}
