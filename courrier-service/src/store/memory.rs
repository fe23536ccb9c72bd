//! In-memory storage implementations

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;
use uuid::Uuid;

use super::{Dataset, Session, SessionId, SessionStore, StorageBackend, StoreResult};
use crate::error::ServiceError;

/// In-memory snapshot backend
///
/// Holds the serialized JSON document, the way browser local storage holds
/// a string under a key, so tests exercise the same encode/decode path as
/// the on-disk backends.
pub struct InMemoryBackend {
    snapshot: RwLock<Option<String>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            snapshot: RwLock::new(None),
        }
    }

    /// Start from an already stored document (for testing purposes)
    pub fn with_snapshot(json: impl Into<String>) -> Self {
        Self {
            snapshot: RwLock::new(Some(json.into())),
        }
    }

    /// The raw stored document
    pub fn raw(&self) -> Option<String> {
        self.snapshot.read().unwrap().clone()
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageBackend for InMemoryBackend {
    fn load(&self) -> StoreResult<Option<Dataset>> {
        let snapshot = self.snapshot.read().unwrap();
        match snapshot.as_deref() {
            Some(json) => serde_json::from_str(json)
                .map(Some)
                .map_err(|e| ServiceError::CorruptSnapshot(e.to_string())),
            None => Ok(None),
        }
    }

    fn save(&self, data: &Dataset) -> StoreResult<()> {
        let json =
            serde_json::to_string(data).map_err(|e| ServiceError::Persistence(e.to_string()))?;
        *self.snapshot.write().unwrap() = Some(json);
        Ok(())
    }
}

/// In-memory session store
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for InMemorySessionStore {
    fn create(&self, user_id: &str) -> StoreResult<Session> {
        let session = Session {
            id: SessionId(Uuid::new_v4().to_string()),
            user_id: user_id.to_string(),
            created_at: Utc::now(),
        };
        self.sessions
            .write()
            .unwrap()
            .insert(session.id.clone(), session.clone());
        Ok(session)
    }

    fn get(&self, session_id: &SessionId) -> StoreResult<Option<Session>> {
        Ok(self.sessions.read().unwrap().get(session_id).cloned())
    }

    fn delete(&self, session_id: &SessionId) -> StoreResult<()> {
        self.sessions.write().unwrap().remove(session_id);
        Ok(())
    }

    fn delete_for_user(&self, user_id: &str) -> StoreResult<u64> {
        let mut sessions = self.sessions.write().unwrap();
        let before = sessions.len();
        sessions.retain(|_, s| s.user_id != user_id);
        Ok((before - sessions.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_roundtrip() {
        let backend = InMemoryBackend::new();
        assert!(backend.load().unwrap().is_none());

        backend.save(&Dataset::default()).unwrap();
        assert_eq!(backend.load().unwrap(), Some(Dataset::default()));
    }

    #[test]
    fn test_backend_corrupt_snapshot() {
        let backend = InMemoryBackend::with_snapshot("{not json");
        assert!(matches!(
            backend.load(),
            Err(ServiceError::CorruptSnapshot(_))
        ));
    }

    #[test]
    fn test_session_lifecycle() {
        let store = InMemorySessionStore::new();

        let session = store.create("1").unwrap();
        assert!(store.get(&session.id).unwrap().is_some());

        store.delete(&session.id).unwrap();
        assert!(store.get(&session.id).unwrap().is_none());
    }

    #[test]
    fn test_delete_sessions_for_user() {
        let store = InMemorySessionStore::new();
        store.create("1").unwrap();
        store.create("1").unwrap();
        let other = store.create("2").unwrap();

        assert_eq!(store.delete_for_user("1").unwrap(), 2);
        assert!(store.get(&other.id).unwrap().is_some());
    }
}
