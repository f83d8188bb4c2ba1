//! Staging file layout and atomic commit for extracted data.
//!
//! Every extract writes to its own staging subdirectory under `extract/<extract_id>/`; a
//! successful [`ExtractorStorage::commit_extract_files`] call moves every staged file into the
//! `normalize/` folder one rename (or hard-link) at a time, so each file becomes visible to the
//! normalize stage independently rather than as one all-or-nothing batch.

mod errors;
mod puae;
mod writer;

pub use errors::StorageError;
pub use puae::DataItem;
pub use writer::{build_extracted_file_stem, WriterPool};

use std::path::PathBuf;

/// Opaque identifier for a single extraction batch.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExtractId(String);

impl ExtractId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExtractId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Owns the `extract/` and `normalize/` folders under a storage root.
pub struct ExtractorStorage {
    root: PathBuf,
}

const EXTRACT_FOLDER: &str = "extract";
const NORMALIZE_FOLDER: &str = "normalize";

impl ExtractorStorage {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        let storage = ExtractorStorage { root };
        std::fs::create_dir_all(storage.root.join(EXTRACT_FOLDER))
            .map_err(|_| StorageError::StoragePathNotFound(storage.root.join(EXTRACT_FOLDER)))?;
        std::fs::create_dir_all(storage.root.join(NORMALIZE_FOLDER))
            .map_err(|_| StorageError::StoragePathNotFound(storage.root.join(NORMALIZE_FOLDER)))?;
        Ok(storage)
    }

    /// Creates a fresh, empty staging subdirectory and returns its id.
    #[tracing::instrument(skip(self))]
    pub fn create_extract_id(&self) -> Result<ExtractId, StorageError> {
        let id = ExtractId(uuid::Uuid::new_v4().simple().to_string());
        let path = self.extract_path(&id);
        std::fs::create_dir_all(&path).map_err(|_| StorageError::StoragePathNotFound(path))?;
        Ok(id)
    }

    pub fn extract_path(&self, extract_id: &ExtractId) -> PathBuf {
        self.root.join(EXTRACT_FOLDER).join(extract_id.as_str())
    }

    pub fn normalize_path(&self) -> PathBuf {
        self.root.join(NORMALIZE_FOLDER)
    }

    /// Moves every file staged under `extract_id` into the normalize folder, then removes the
    /// now-empty staging directory. Each file move is independently atomic (`with_delete = true`
    /// uses a rename; `false` hard-links instead, leaving the staged copy in place for callers
    /// that want to retain the original).
    #[tracing::instrument(skip(self))]
    pub fn commit_extract_files(&self, extract_id: &ExtractId, with_delete: bool) -> Result<(), StorageError> {
        let extract_dir = self.extract_path(extract_id);
        let entries = std::fs::read_dir(&extract_dir)
            .map_err(|_| StorageError::StoragePathNotFound(extract_dir.clone()))?;

        for entry in entries {
            let entry = entry.map_err(|_| StorageError::StoragePathNotFound(extract_dir.clone()))?;
            let from = entry.path();
            let Some(file_name) = from.file_name() else {
                continue;
            };
            let to = self.normalize_path().join(file_name);
            if with_delete {
                std::fs::rename(&from, &to).map_err(|source| StorageError::AtomicRenameFailed {
                    from: from.clone(),
                    to: to.clone(),
                    source,
                })?;
            } else {
                std::fs::hard_link(&from, &to).map_err(|source| StorageError::AtomicRenameFailed {
                    from: from.clone(),
                    to: to.clone(),
                    source,
                })?;
            }
        }

        if with_delete {
            std::fs::remove_dir_all(&extract_dir)
                .map_err(|_| StorageError::StoragePathNotFound(extract_dir.clone()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_moves_every_staged_file_and_removes_the_staging_directory() {
        let dir = tempfile::tempdir().unwrap();
        let storage = ExtractorStorage::new(dir.path()).unwrap();
        let extract_id = storage.create_extract_id().unwrap();

        let mut pool = WriterPool::new();
        pool.write(
            &storage.extract_path(&extract_id),
            "event",
            "orders",
            DataItem::Json(serde_json::json!({"id": 1})),
        )
        .unwrap();
        pool.write(
            &storage.extract_path(&extract_id),
            "event",
            "orders",
            DataItem::Json(serde_json::json!({"id": 2})),
        )
        .unwrap();
        pool.flush_all().unwrap();

        storage.commit_extract_files(&extract_id, true).unwrap();

        assert!(!storage.extract_path(&extract_id).exists());
        let committed: Vec<_> = std::fs::read_dir(storage.normalize_path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(committed, vec!["event.orders.0".to_string()]);

        let contents = std::fs::read_to_string(storage.normalize_path().join("event.orders.0")).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], r#"{"id":1}"#);
        assert_eq!(lines[1], r#"{"id":2}"#);
    }

    #[test]
    fn hard_link_commit_leaves_the_staged_copy_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let storage = ExtractorStorage::new(dir.path()).unwrap();
        let extract_id = storage.create_extract_id().unwrap();

        let mut pool = WriterPool::new();
        pool.write(
            &storage.extract_path(&extract_id),
            "event",
            "orders",
            DataItem::Json(serde_json::json!({"id": 1})),
        )
        .unwrap();
        pool.flush_all().unwrap();

        storage.commit_extract_files(&extract_id, false).unwrap();

        assert!(storage.extract_path(&extract_id).join("event.orders.0").exists());
        assert!(storage.normalize_path().join("event.orders.0").exists());
    }
}
