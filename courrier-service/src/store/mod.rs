//! Storage abstractions for the service

pub mod json_file;
pub mod memory;
pub mod models;
pub mod records;
pub mod sqlite;

pub use json_file::JsonFileBackend;
pub use memory::{InMemoryBackend, InMemorySessionStore};
pub use models::*;
pub use records::RecordStore;
pub use sqlite::SqliteBackend;

use std::path::Path;

use crate::config::BackendKind;
use crate::error::ServiceError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, ServiceError>;

/// Fixed key the snapshot is stored under in key/value backends
pub const STORAGE_KEY: &str = "mail_system_data";

/// Trait for snapshot persistence
pub trait StorageBackend: Send + Sync {
    /// Load the stored snapshot; `Ok(None)` when nothing was saved yet.
    /// Unparsable data is reported as `ServiceError::CorruptSnapshot`.
    fn load(&self) -> StoreResult<Option<Dataset>>;

    /// Replace the stored snapshot
    fn save(&self, data: &Dataset) -> StoreResult<()>;
}

/// Allow using Box<dyn StorageBackend> as a StorageBackend
impl StorageBackend for Box<dyn StorageBackend> {
    fn load(&self) -> StoreResult<Option<Dataset>> {
        (**self).load()
    }

    fn save(&self, data: &Dataset) -> StoreResult<()> {
        (**self).save(data)
    }
}

/// Trait for session storage
pub trait SessionStore: Send + Sync {
    /// Create a new session for a user
    fn create(&self, user_id: &str) -> StoreResult<Session>;

    /// Get a session by ID
    fn get(&self, session_id: &SessionId) -> StoreResult<Option<Session>>;

    /// Delete a session
    fn delete(&self, session_id: &SessionId) -> StoreResult<()>;

    /// Delete every session of a user
    fn delete_for_user(&self, user_id: &str) -> StoreResult<u64>;
}

/// Open the backend of the given kind at `path`
///
/// `path` is ignored by the memory backend.
pub fn open_backend(kind: BackendKind, path: &Path) -> StoreResult<Box<dyn StorageBackend>> {
    let backend: Box<dyn StorageBackend> = match kind {
        BackendKind::Memory => Box::new(InMemoryBackend::new()),
        BackendKind::Json => Box::new(JsonFileBackend::new(path)),
        BackendKind::Sqlite => {
            let path = path.to_str().ok_or_else(|| {
                ServiceError::Persistence(format!("non UTF-8 database path: {}", path.display()))
            })?;
            Box::new(SqliteBackend::open(path)?)
        }
    };
    tracing::debug!(backend = %kind, path = %path.display(), "Opened storage backend");
    Ok(backend)
}
