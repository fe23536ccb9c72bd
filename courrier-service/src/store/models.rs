//! Data models for the record store

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use courrier_core::{
    Attachment, Category, CourierType, Courrier, Entity, Priority, RefState, Role, User,
};
use serde::{Deserialize, Serialize};

use super::StoreResult;
use crate::error::ServiceError;

/// The persisted document: six flat collections
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub courriers: Vec<Courrier>,
    #[serde(default)]
    pub courier_types: Vec<CourierType>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub ref_states: Vec<RefState>,
}

impl Dataset {
    pub fn user_by_email(&self, email: &str) -> Option<&User> {
        self.users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
    }
}

/// Unique session identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

/// A logged-in user session
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

/// A record kind held by the store
///
/// Ties a record type to its collection in [`Dataset`], its patch type and
/// the invariants checked before any write.
pub trait Record: Clone + Send + Sync + 'static {
    /// Shallow-merge update; `None` fields are left untouched
    type Patch;

    /// Name used in errors and logs
    const KIND: &'static str;

    fn id(&self) -> &str;

    fn set_id(&mut self, id: String);

    fn apply(&mut self, patch: Self::Patch);

    fn collection(data: &Dataset) -> &Vec<Self>;

    fn collection_mut(data: &mut Dataset) -> &mut Vec<Self>;

    /// Check the record against the rest of the dataset. When updating, the
    /// dataset still holds the previous version of this record.
    fn validate(&self, _data: &Dataset) -> StoreResult<()> {
        Ok(())
    }
}

fn require_label(kind: &str, label: &str) -> StoreResult<()> {
    if label.trim().is_empty() {
        return Err(ServiceError::ValidationError(format!("{} label is required", kind)));
    }
    Ok(())
}

/// Patch for [`User`]
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
    pub entity_id: Option<Option<String>>,
    pub is_active: Option<bool>,
}

impl Record for User {
    type Patch = UserPatch;
    const KIND: &'static str = "user";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn apply(&mut self, patch: UserPatch) {
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(hash) = patch.password_hash {
            self.password_hash = hash;
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
        if let Some(entity_id) = patch.entity_id {
            self.entity_id = entity_id;
        }
        if let Some(active) = patch.is_active {
            self.is_active = active;
        }
    }

    fn collection(data: &Dataset) -> &Vec<Self> {
        &data.users
    }

    fn collection_mut(data: &mut Dataset) -> &mut Vec<Self> {
        &mut data.users
    }

    fn validate(&self, data: &Dataset) -> StoreResult<()> {
        if self.name.trim().is_empty() || self.email.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "name and email are required".to_string(),
            ));
        }
        let taken = data
            .users
            .iter()
            .any(|u| u.id != self.id && u.email.eq_ignore_ascii_case(&self.email));
        if taken {
            return Err(ServiceError::EmailAlreadyExists);
        }
        Ok(())
    }
}

/// Patch for [`Entity`]
#[derive(Debug, Clone, Default)]
pub struct EntityPatch {
    pub label: Option<String>,
    pub description: Option<String>,
    pub parent_entity_id: Option<Option<String>>,
    pub chef_id: Option<Option<String>>,
    pub email: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub code: Option<Option<String>>,
}

impl Record for Entity {
    type Patch = EntityPatch;
    const KIND: &'static str = "entity";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn apply(&mut self, patch: EntityPatch) {
        if let Some(label) = patch.label {
            self.label = label;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(parent) = patch.parent_entity_id {
            self.parent_entity_id = parent;
        }
        if let Some(chef) = patch.chef_id {
            self.chef_id = chef;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(phone) = patch.phone {
            self.phone = phone;
        }
        if let Some(code) = patch.code {
            self.code = code;
        }
    }

    fn collection(data: &Dataset) -> &Vec<Self> {
        &data.entities
    }

    fn collection_mut(data: &mut Dataset) -> &mut Vec<Self> {
        &mut data.entities
    }

    /// Parents must form a forest: walking up from this entity never
    /// comes back to it.
    fn validate(&self, data: &Dataset) -> StoreResult<()> {
        require_label(Self::KIND, &self.label)?;

        let mut seen = HashSet::new();
        let mut cursor = self.parent_entity_id.clone();
        while let Some(parent_id) = cursor {
            if parent_id == self.id {
                return Err(ServiceError::ValidationError(format!(
                    "entity {} cannot be its own ancestor",
                    self.id
                )));
            }
            if !seen.insert(parent_id.clone()) {
                break;
            }
            cursor = data
                .entities
                .iter()
                .find(|e| e.id == parent_id)
                .and_then(|e| e.parent_entity_id.clone());
        }
        Ok(())
    }
}

/// Patch for [`Courrier`]
///
/// State and history are absent on purpose: they only change through
/// `Courrier::change_state`.
#[derive(Debug, Clone, Default)]
pub struct CourrierPatch {
    pub from_entity: Option<Option<String>>,
    pub to_entity: Option<String>,
    pub courier_type: Option<String>,
    pub category: Option<String>,
    pub subject: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub attachments: Option<Vec<Attachment>>,
    pub assigned_to: Option<Option<String>>,
}

impl Record for Courrier {
    type Patch = CourrierPatch;
    const KIND: &'static str = "courrier";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn apply(&mut self, patch: CourrierPatch) {
        if let Some(from) = patch.from_entity {
            self.from_entity = from;
        }
        if let Some(to) = patch.to_entity {
            self.to_entity = to;
        }
        if let Some(ty) = patch.courier_type {
            self.courier_type = ty;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(subject) = patch.subject {
            self.subject = subject;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(attachments) = patch.attachments {
            self.attachments = attachments;
        }
        if let Some(assigned) = patch.assigned_to {
            self.assigned_to = assigned;
        }
    }

    fn collection(data: &Dataset) -> &Vec<Self> {
        &data.courriers
    }

    fn collection_mut(data: &mut Dataset) -> &mut Vec<Self> {
        &mut data.courriers
    }

    fn validate(&self, _data: &Dataset) -> StoreResult<()> {
        let missing = [
            ("subject", &self.subject),
            ("type", &self.courier_type),
            ("category", &self.category),
            ("destination", &self.to_entity),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect::<Vec<_>>();

        if !missing.is_empty() {
            return Err(ServiceError::ValidationError(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }
        // Legacy records may carry no history at all
        if !self.history.is_empty() && !self.history_is_consistent() {
            return Err(ServiceError::ValidationError(format!(
                "courrier {} history does not end in its current state",
                self.id
            )));
        }
        Ok(())
    }
}

/// Patch for the label/description lookup tables
#[derive(Debug, Clone, Default)]
pub struct LookupPatch {
    pub label: Option<String>,
    pub description: Option<String>,
}

macro_rules! lookup_record {
    ($ty:ty, $kind:literal, $field:ident) => {
        impl Record for $ty {
            type Patch = LookupPatch;
            const KIND: &'static str = $kind;

            fn id(&self) -> &str {
                &self.id
            }

            fn set_id(&mut self, id: String) {
                self.id = id;
            }

            fn apply(&mut self, patch: LookupPatch) {
                if let Some(label) = patch.label {
                    self.label = label;
                }
                if let Some(description) = patch.description {
                    self.description = description;
                }
            }

            fn collection(data: &Dataset) -> &Vec<Self> {
                &data.$field
            }

            fn collection_mut(data: &mut Dataset) -> &mut Vec<Self> {
                &mut data.$field
            }

            fn validate(&self, _data: &Dataset) -> StoreResult<()> {
                require_label(Self::KIND, &self.label)
            }
        }
    };
}

lookup_record!(Category, "category", categories);
lookup_record!(CourierType, "courier type", courier_types);

/// Patch for [`RefState`]
#[derive(Debug, Clone, Default)]
pub struct RefStatePatch {
    pub label: Option<String>,
    pub description: Option<String>,
    pub color: Option<Option<String>>,
}

impl Record for RefState {
    type Patch = RefStatePatch;
    const KIND: &'static str = "reference state";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn apply(&mut self, patch: RefStatePatch) {
        if let Some(label) = patch.label {
            self.label = label;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(color) = patch.color {
            self.color = color;
        }
    }

    fn collection(data: &Dataset) -> &Vec<Self> {
        &data.ref_states
    }

    fn collection_mut(data: &mut Dataset) -> &mut Vec<Self> {
        &mut data.ref_states
    }

    fn validate(&self, _data: &Dataset) -> StoreResult<()> {
        require_label(Self::KIND, &self.label)
    }
}
