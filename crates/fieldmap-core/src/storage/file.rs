//! File-based storage implementation.

use super::{BoxFuture, Collection, Storage, StorageError, StorageResult, StoredRecord};
use crate::shapes::ProjectId;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const REVISION_FILE: &str = "revision";

/// File-based storage.
///
/// Stores each record as `<base>/<collection>/<id>.json`. A `revision` file in
/// the base directory counts writes so other processes can notice changes.
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a new file storage with the given base directory.
    ///
    /// Creates the directory if it doesn't exist.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        for collection in Collection::ALL {
            let dir = base_path.join(collection.name());
            fs::create_dir_all(&dir).map_err(|e| {
                StorageError::Io(format!("Failed to create {}: {}", dir.display(), e))
            })?;
        }
        Ok(Self { base_path })
    }

    /// Create file storage in the default location (`<data dir>/fieldmap`).
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;
        Self::new(base.join("fieldmap"))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn record_path(&self, collection: Collection, id: Uuid) -> PathBuf {
        self.base_path
            .join(collection.name())
            .join(format!("{}.json", id))
    }

    fn read_revision(&self) -> StorageResult<u64> {
        let path = self.base_path.join(REVISION_FILE);
        match fs::read_to_string(&path) {
            Ok(s) => s
                .trim()
                .parse()
                .map_err(|e| StorageError::Serialization(format!("Bad revision file: {}", e))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(StorageError::Io(format!("Failed to read {}: {}", path.display(), e))),
        }
    }

    fn bump_revision(&self) -> StorageResult<()> {
        let next = self.read_revision()? + 1;
        let path = self.base_path.join(REVISION_FILE);
        fs::write(&path, next.to_string())
            .map_err(|e| StorageError::Io(format!("Failed to write {}: {}", path.display(), e)))
    }
}

fn read_record(path: &Path) -> StorageResult<StoredRecord> {
    let json = fs::read_to_string(path)
        .map_err(|e| StorageError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
    serde_json::from_str(&json)
        .map_err(|e| StorageError::Serialization(format!("Failed to parse {}: {}", path.display(), e)))
}

impl Storage for FileStorage {
    fn put(&self, collection: Collection, record: StoredRecord) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.record_path(collection, record.id);
        let json = match serde_json::to_string_pretty(&record) {
            Ok(j) => j,
            Err(e) => return Box::pin(async move { Err(StorageError::Serialization(e.to_string())) }),
        };

        Box::pin(async move {
            fs::write(&path, json)
                .map_err(|e| StorageError::Io(format!("Failed to write {}: {}", path.display(), e)))?;
            self.bump_revision()
        })
    }

    fn get(&self, collection: Collection, id: Uuid) -> BoxFuture<'_, StorageResult<StoredRecord>> {
        let path = self.record_path(collection, id);
        Box::pin(async move {
            if !path.exists() {
                return Err(StorageError::NotFound(format!("{}/{}", collection.name(), id)));
            }
            read_record(&path)
        })
    }

    fn delete(&self, collection: Collection, id: Uuid) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.record_path(collection, id);
        Box::pin(async move {
            if path.exists() {
                fs::remove_file(&path)
                    .map_err(|e| StorageError::Io(format!("Failed to delete {}: {}", path.display(), e)))?;
                self.bump_revision()?;
            }
            Ok(())
        })
    }

    fn list(&self, collection: Collection, project: Option<ProjectId>) -> BoxFuture<'_, StorageResult<Vec<StoredRecord>>> {
        let dir = self.base_path.join(collection.name());
        Box::pin(async move {
            if !dir.exists() {
                return Ok(vec![]);
            }
            let entries = fs::read_dir(&dir)
                .map_err(|e| StorageError::Io(format!("Failed to read directory: {}", e)))?;

            let mut records = Vec::new();
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().map(|e| e == "json").unwrap_or(false) {
                    match read_record(&path) {
                        Ok(r) if project.is_none() || r.project_id == project => records.push(r),
                        Ok(_) => {}
                        Err(e) => log::warn!("Skipping unreadable record: {}", e),
                    }
                }
            }
            Ok(records)
        })
    }

    fn revision(&self) -> BoxFuture<'_, StorageResult<u64>> {
        Box::pin(async move { self.read_revision() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pollster::block_on;
    use tempfile::tempdir;

    fn record(project: Option<ProjectId>) -> StoredRecord {
        StoredRecord {
            id: Uuid::new_v4(),
            project_id: project,
            body: serde_json::json!({"name": "Test"}),
        }
    }

    #[test]
    fn test_file_storage_put_get() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
        let rec = record(None);

        block_on(storage.put(Collection::Projects, rec.clone())).unwrap();
        let loaded = block_on(storage.get(Collection::Projects, rec.id)).unwrap();
        assert_eq!(loaded, rec);
        assert!(dir.path().join("projects").join(format!("{}.json", rec.id)).exists());
    }

    #[test]
    fn test_file_storage_not_found() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
        let result = block_on(storage.get(Collection::Objects, Uuid::new_v4()));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_file_storage_list_skips_garbage() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
        let project = Uuid::new_v4();
        block_on(storage.put(Collection::Objects, record(Some(project)))).unwrap();
        block_on(storage.put(Collection::Objects, record(Some(Uuid::new_v4())))).unwrap();
        fs::write(dir.path().join("objects").join("broken.json"), "{").unwrap();
        fs::write(dir.path().join("objects").join("notes.txt"), "hello").unwrap();

        assert_eq!(block_on(storage.list(Collection::Objects, Some(project))).unwrap().len(), 1);
        assert_eq!(block_on(storage.list(Collection::Objects, None)).unwrap().len(), 2);
    }

    #[test]
    fn test_file_storage_delete_and_revision() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
        let rec = record(None);
        assert_eq!(block_on(storage.revision()).unwrap(), 0);

        block_on(storage.put(Collection::Datasets, rec.clone())).unwrap();
        block_on(storage.delete(Collection::Datasets, rec.id)).unwrap();
        block_on(storage.delete(Collection::Datasets, rec.id)).unwrap();
        assert_eq!(block_on(storage.revision()).unwrap(), 2);
        assert!(matches!(
            block_on(storage.get(Collection::Datasets, rec.id)),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn test_revision_visible_to_second_handle() {
        let dir = tempdir().unwrap();
        let a = FileStorage::new(dir.path().to_path_buf()).unwrap();
        let b = FileStorage::new(dir.path().to_path_buf()).unwrap();
        let before = block_on(b.revision()).unwrap();
        block_on(a.put(Collection::Projects, record(None))).unwrap();
        assert!(block_on(b.revision()).unwrap() > before);
    }
}
