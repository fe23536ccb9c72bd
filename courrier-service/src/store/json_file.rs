//! JSON file backend
//!
//! The snapshot is a single pretty-printed JSON document. Writes go to a
//! temporary file in the same directory which is then renamed over the
//! target, so a crash mid-write never leaves a truncated document.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::{Dataset, StorageBackend, StoreResult};
use crate::error::ServiceError;

pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StorageBackend for JsonFileBackend {
    fn load(&self) -> StoreResult<Option<Dataset>> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ServiceError::Persistence(format!(
                    "failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| ServiceError::CorruptSnapshot(format!("{}: {}", self.path.display(), e)))
    }

    fn save(&self, data: &Dataset) -> StoreResult<()> {
        let persistence = |e: std::io::Error| {
            ServiceError::Persistence(format!("failed to write {}: {}", self.path.display(), e))
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(persistence)?;

        let json = serde_json::to_vec_pretty(data)
            .map_err(|e| ServiceError::Persistence(e.to_string()))?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(persistence)?;
        tmp.write_all(&json).map_err(persistence)?;
        tmp.as_file().sync_all().map_err(persistence)?;
        tmp.persist(&self.path).map_err(|e| persistence(e.error))?;

        tracing::debug!(path = %self.path.display(), bytes = json.len(), "Snapshot written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let backend = JsonFileBackend::new(dir.path().join("data.json"));
        assert!(backend.load().unwrap().is_none());
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("data.json");
        let backend = JsonFileBackend::new(&path);

        backend.save(&Dataset::default()).unwrap();
        assert!(path.exists());
        assert_eq!(backend.load().unwrap(), Some(Dataset::default()));
    }

    #[test]
    fn test_garbage_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, "[1, 2").unwrap();

        let backend = JsonFileBackend::new(&path);
        assert!(matches!(
            backend.load(),
            Err(ServiceError::CorruptSnapshot(_))
        ));
    }
}
