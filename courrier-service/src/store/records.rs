//! The record store: in-memory collections flushed to a backend

use super::{Dataset, Record, StorageBackend, StoreResult};
use crate::error::ServiceError;

/// In-memory dataset backed by a [`StorageBackend`]
///
/// Every mutation is applied to a working copy, persisted, and only then
/// made visible. A failed write leaves the store exactly as it was.
pub struct RecordStore<B: StorageBackend> {
    backend: B,
    data: Dataset,
}

impl<B: StorageBackend> RecordStore<B> {
    /// Load the stored snapshot, or seed and persist a fresh one
    ///
    /// An unreadable snapshot is logged and replaced by the seed data in
    /// memory only. The stored document stays untouched until the next write.
    pub fn open<F>(backend: B, seed: F) -> StoreResult<Self>
    where
        F: FnOnce() -> StoreResult<Dataset>,
    {
        let data = match backend.load() {
            Ok(Some(data)) => {
                tracing::info!(
                    users = data.users.len(),
                    courriers = data.courriers.len(),
                    "Loaded stored data"
                );
                data
            }
            Ok(None) => {
                let data = seed()?;
                backend.save(&data)?;
                tracing::info!("Initialized store with default data");
                data
            }
            Err(ServiceError::CorruptSnapshot(reason)) => {
                tracing::error!(%reason, "Failed to parse stored data, using defaults");
                seed()?
            }
            Err(e) => return Err(e),
        };

        Ok(Self { backend, data })
    }

    /// Write the current snapshot to the backend
    pub fn flush(&self) -> StoreResult<()> {
        self.backend.save(&self.data)
    }

    /// Flush and release the backend
    pub fn close(self) -> StoreResult<B> {
        self.flush()?;
        Ok(self.backend)
    }

    pub fn dataset(&self) -> &Dataset {
        &self.data
    }

    pub fn all<R: Record>(&self) -> &[R] {
        R::collection(&self.data)
    }

    pub fn get<R: Record>(&self, id: &str) -> Option<&R> {
        R::collection(&self.data).iter().find(|r| r.id() == id)
    }

    /// Like [`get`](Self::get) but reports a missing record as `NotFound`
    pub fn require<R: Record>(&self, id: &str) -> StoreResult<&R> {
        self.get(id).ok_or_else(|| ServiceError::not_found(R::KIND, id))
    }

    /// Insert a record and return its id; an empty id is replaced by a UUID
    pub fn add<R: Record>(&mut self, mut record: R) -> StoreResult<String> {
        if record.id().is_empty() {
            record.set_id(uuid::Uuid::new_v4().to_string());
        }
        let id = record.id().to_string();

        self.commit(|data| {
            if R::collection(data).iter().any(|r| r.id() == id) {
                return Err(ServiceError::DuplicateId {
                    kind: R::KIND,
                    id: id.clone(),
                });
            }
            record.validate(data)?;
            R::collection_mut(data).push(record);
            Ok(())
        })?;

        tracing::debug!(kind = R::KIND, id = %id, "Record added");
        Ok(id)
    }

    /// Shallow-merge `patch` into the record and return the result
    pub fn update<R: Record>(&mut self, id: &str, patch: R::Patch) -> StoreResult<R> {
        self.modify(id, |record: &mut R| {
            record.apply(patch);
            Ok(record.clone())
        })
    }

    /// Edit a record in place through `f`
    ///
    /// If `f` fails, validation fails or the write fails, nothing changes.
    pub fn modify<R, T, F>(&mut self, id: &str, f: F) -> StoreResult<T>
    where
        R: Record,
        F: FnOnce(&mut R) -> StoreResult<T>,
    {
        let result = self.commit(|data| {
            let index = R::collection(data)
                .iter()
                .position(|r| r.id() == id)
                .ok_or_else(|| ServiceError::not_found(R::KIND, id))?;

            let mut record = R::collection(data)[index].clone();
            let out = f(&mut record)?;
            record.validate(data)?;
            R::collection_mut(data)[index] = record;
            Ok(out)
        })?;

        tracing::debug!(kind = R::KIND, id = %id, "Record updated");
        Ok(result)
    }

    /// Remove a record and return it
    pub fn delete<R: Record>(&mut self, id: &str) -> StoreResult<R> {
        let removed = self.commit(|data| {
            let collection = R::collection_mut(data);
            let index = collection
                .iter()
                .position(|r| r.id() == id)
                .ok_or_else(|| ServiceError::not_found(R::KIND, id))?;
            Ok(collection.remove(index))
        })?;

        tracing::debug!(kind = R::KIND, id = %id, "Record deleted");
        Ok(removed)
    }

    /// Replace the whole dataset
    pub fn replace_all(&mut self, data: Dataset) -> StoreResult<()> {
        self.commit(|current| {
            *current = data;
            Ok(())
        })
    }

    fn commit<T, F>(&mut self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Dataset) -> StoreResult<T>,
    {
        let mut working = self.data.clone();
        let out = f(&mut working)?;

        if let Err(e) = self.backend.save(&working) {
            tracing::error!(error = %e, "Failed to persist data, change discarded");
            return Err(e);
        }

        self.data = working;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use courrier_core::{Category, Courrier, NewCourrier, Priority, Role, User};

    use super::*;
    use crate::store::{InMemoryBackend, LookupPatch, UserPatch};

    fn empty_store() -> RecordStore<InMemoryBackend> {
        RecordStore::open(InMemoryBackend::new(), || Ok(Dataset::default())).unwrap()
    }

    fn category(id: &str, label: &str) -> Category {
        Category {
            id: id.to_string(),
            label: label.to_string(),
            description: String::new(),
        }
    }

    fn user(id: &str, email: &str) -> User {
        User {
            id: id.to_string(),
            email: email.to_string(),
            name: "Test".to_string(),
            password_hash: String::new(),
            role: Role::Agent,
            entity_id: None,
            created_at: Utc::now(),
            is_active: true,
        }
    }

    #[test]
    fn test_add_then_get_roundtrip() {
        let mut store = empty_store();
        let mut original = category("", "Demande");
        original.description = "Requests".to_string();

        let id = store.add(original.clone()).unwrap();
        assert!(!id.is_empty());

        original.id = id.clone();
        let stored: &Category = store.get(&id).unwrap();
        assert_eq!(stored, &original);
    }

    #[test]
    fn test_add_then_get_courrier_roundtrip() {
        let mut store = empty_store();
        let draft = NewCourrier {
            to_entity: "1".to_string(),
            courier_type: "1".to_string(),
            category: "3".to_string(),
            subject: "Demande de salle".to_string(),
            description: "Salle B12".to_string(),
            priority: Priority::Urgent,
            ..Default::default()
        };
        let mut original =
            Courrier::create("", "ESTSB-202403-AB12C", draft, "3", Utc::now()).unwrap();

        let id = store.add(original.clone()).unwrap();

        original.id = id.clone();
        let stored: &Courrier = store.get(&id).unwrap();
        assert_eq!(stored, &original);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut store = empty_store();
        store.add(category("1", "A")).unwrap();
        let result = store.add(category("1", "B"));
        assert!(matches!(result, Err(ServiceError::DuplicateId { .. })));
        assert_eq!(store.all::<Category>().len(), 1);
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let mut store = empty_store();
        let result = store.update::<Category>("nope", LookupPatch::default());
        assert!(matches!(
            result,
            Err(ServiceError::NotFound { kind: "category", .. })
        ));
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let mut store = empty_store();
        assert!(matches!(
            store.delete::<Category>("nope"),
            Err(ServiceError::NotFound { .. })
        ));
    }

    #[test]
    fn test_delete_returns_record() {
        let mut store = empty_store();
        store.add(category("1", "A")).unwrap();
        let removed: Category = store.delete("1").unwrap();
        assert_eq!(removed.label, "A");
        assert!(store.get::<Category>("1").is_none());
    }

    #[test]
    fn test_failed_validation_leaves_store_unchanged() {
        let mut store = empty_store();
        store.add(category("1", "A")).unwrap();

        let result = store.update::<Category>(
            "1",
            LookupPatch {
                label: Some(" ".to_string()),
                description: None,
            },
        );
        assert!(matches!(result, Err(ServiceError::ValidationError(_))));
        assert_eq!(store.get::<Category>("1").unwrap().label, "A");
    }

    #[test]
    fn test_email_unique_case_insensitive() {
        let mut store = empty_store();
        store.add(user("1", "chef@estsb.edu")).unwrap();

        let result = store.add(user("2", "CHEF@estsb.edu"));
        assert!(matches!(result, Err(ServiceError::EmailAlreadyExists)));

        // Updating a user without changing the email is fine
        store
            .update::<User>(
                "1",
                UserPatch {
                    name: Some("Chef".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
    }

    #[test]
    fn test_mutations_are_flushed() {
        let mut store = empty_store();
        store.add(category("1", "A")).unwrap();

        let backend = store.close().unwrap();
        let reloaded = RecordStore::open(backend, || Ok(Dataset::default())).unwrap();
        assert_eq!(reloaded.all::<Category>().len(), 1);
    }
}
