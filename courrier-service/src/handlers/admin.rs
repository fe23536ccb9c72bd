//! Administration of users, entities and lookup tables

use chrono::Utc;
use courrier_core::{Capability, Category, CourierType, Entity, RefState, Role, User};

use super::{authenticate, authorize};
use crate::crypto::hash_password;
use crate::error::{ServiceError, ServiceResult};
use crate::handlers::auth::check_password_length;
use crate::seed::default_dataset;
use crate::state::AppState;
use crate::store::{EntityPatch, Record, SessionId, SessionStore, StorageBackend, UserPatch};

/// Fields for a new user account
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password: String,
    pub role: Role,
    pub entity_id: Option<String>,
    pub is_active: bool,
}

/// Changes to a user account; a new password is hashed before storing
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
    pub entity_id: Option<Option<String>>,
    pub is_active: Option<bool>,
}

/// Fields for a new entity
#[derive(Debug, Clone, Default)]
pub struct NewEntity {
    pub label: String,
    pub description: String,
    pub parent_entity_id: Option<String>,
    pub chef_id: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub code: Option<String>,
}

fn hash<B, S>(state: &AppState<B, S>, password: &str) -> ServiceResult<String>
where
    B: StorageBackend,
    S: SessionStore,
{
    check_password_length(password, state.config.min_password_length)?;
    hash_password(password, state.config.bcrypt_cost)
        .map_err(|e| ServiceError::Internal(e.to_string()))
}

pub fn list_users<B, S>(state: &AppState<B, S>, session_id: &SessionId) -> ServiceResult<Vec<User>>
where
    B: StorageBackend,
    S: SessionStore,
{
    authorize(state, session_id, Capability::ManageUsers)?;
    Ok(state.store.all::<User>().to_vec())
}

pub fn create_user<B, S>(
    state: &mut AppState<B, S>,
    session_id: &SessionId,
    new_user: NewUser,
) -> ServiceResult<User>
where
    B: StorageBackend,
    S: SessionStore,
{
    let admin = authorize(state, session_id, Capability::ManageUsers)?;
    let password_hash = hash(state, &new_user.password)?;

    let user = User {
        id: String::new(),
        email: new_user.email.trim().to_string(),
        name: new_user.name,
        password_hash,
        role: new_user.role,
        entity_id: new_user.entity_id,
        created_at: Utc::now(),
        is_active: new_user.is_active,
    };
    let id = state.store.add(user)?;

    tracing::info!(user_id = %id, created_by = %admin.id, "User created");
    state.store.require::<User>(&id).cloned()
}

/// Update a user; deactivating an account closes its sessions
pub fn update_user<B, S>(
    state: &mut AppState<B, S>,
    session_id: &SessionId,
    id: &str,
    update: UserUpdate,
) -> ServiceResult<User>
where
    B: StorageBackend,
    S: SessionStore,
{
    authorize(state, session_id, Capability::ManageUsers)?;

    let password_hash = match update.password.as_deref() {
        Some(password) => Some(hash(state, password)?),
        None => None,
    };

    let user = state.store.update::<User>(
        id,
        UserPatch {
            email: update.email.map(|e| e.trim().to_string()),
            name: update.name,
            password_hash,
            role: update.role,
            entity_id: update.entity_id,
            is_active: update.is_active,
        },
    )?;

    if !user.is_active {
        let closed = state.sessions.delete_for_user(&user.id)?;
        tracing::info!(user_id = %user.id, closed_sessions = closed, "User deactivated");
    }

    Ok(user)
}

pub fn delete_user<B, S>(
    state: &mut AppState<B, S>,
    session_id: &SessionId,
    id: &str,
) -> ServiceResult<User>
where
    B: StorageBackend,
    S: SessionStore,
{
    let admin = authorize(state, session_id, Capability::ManageUsers)?;
    let removed = state.store.delete::<User>(id)?;
    state.sessions.delete_for_user(id)?;
    tracing::info!(user_id = %id, deleted_by = %admin.id, "User deleted");
    Ok(removed)
}

/// Entities are visible to every signed-in user
pub fn list_entities<B, S>(
    state: &AppState<B, S>,
    session_id: &SessionId,
) -> ServiceResult<Vec<Entity>>
where
    B: StorageBackend,
    S: SessionStore,
{
    authenticate(state, session_id)?;
    Ok(state.store.all::<Entity>().to_vec())
}

pub fn create_entity<B, S>(
    state: &mut AppState<B, S>,
    session_id: &SessionId,
    new_entity: NewEntity,
) -> ServiceResult<Entity>
where
    B: StorageBackend,
    S: SessionStore,
{
    authorize(state, session_id, Capability::ManageEntities)?;

    let entity = Entity {
        id: String::new(),
        label: new_entity.label,
        description: new_entity.description,
        parent_entity_id: new_entity.parent_entity_id,
        chef_id: new_entity.chef_id,
        email: new_entity.email,
        phone: new_entity.phone,
        code: new_entity.code,
        created_at: Utc::now(),
    };
    let id = state.store.add(entity)?;
    state.store.require::<Entity>(&id).cloned()
}

pub fn update_entity<B, S>(
    state: &mut AppState<B, S>,
    session_id: &SessionId,
    id: &str,
    patch: EntityPatch,
) -> ServiceResult<Entity>
where
    B: StorageBackend,
    S: SessionStore,
{
    authorize(state, session_id, Capability::ManageEntities)?;
    state.store.update::<Entity>(id, patch)
}

/// Remove an entity; courriers routed to it keep the dangling id
pub fn delete_entity<B, S>(
    state: &mut AppState<B, S>,
    session_id: &SessionId,
    id: &str,
) -> ServiceResult<Entity>
where
    B: StorageBackend,
    S: SessionStore,
{
    authorize(state, session_id, Capability::ManageEntities)?;
    state.store.delete::<Entity>(id)
}

/// Lookup tables managed from the referentials screens
pub trait Referential: Record {}

impl Referential for Category {}
impl Referential for CourierType {}
impl Referential for RefState {}

/// Lookup entries are visible to every signed-in user
pub fn list_referential<R, B, S>(
    state: &AppState<B, S>,
    session_id: &SessionId,
) -> ServiceResult<Vec<R>>
where
    R: Referential,
    B: StorageBackend,
    S: SessionStore,
{
    authenticate(state, session_id)?;
    Ok(state.store.all::<R>().to_vec())
}

pub fn create_referential<R, B, S>(
    state: &mut AppState<B, S>,
    session_id: &SessionId,
    record: R,
) -> ServiceResult<R>
where
    R: Referential,
    B: StorageBackend,
    S: SessionStore,
{
    authorize(state, session_id, Capability::ManageReferentials)?;
    let id = state.store.add(record)?;
    tracing::info!(kind = R::KIND, id = %id, "Referential entry created");
    state.store.require::<R>(&id).cloned()
}

pub fn update_referential<R, B, S>(
    state: &mut AppState<B, S>,
    session_id: &SessionId,
    id: &str,
    patch: R::Patch,
) -> ServiceResult<R>
where
    R: Referential,
    B: StorageBackend,
    S: SessionStore,
{
    authorize(state, session_id, Capability::ManageReferentials)?;
    state.store.update::<R>(id, patch)
}

pub fn delete_referential<R, B, S>(
    state: &mut AppState<B, S>,
    session_id: &SessionId,
    id: &str,
) -> ServiceResult<R>
where
    R: Referential,
    B: StorageBackend,
    S: SessionStore,
{
    authorize(state, session_id, Capability::ManageReferentials)?;
    state.store.delete::<R>(id)
}

/// Replace every collection with the default data
pub fn reset_data<B, S>(state: &mut AppState<B, S>, session_id: &SessionId) -> ServiceResult<()>
where
    B: StorageBackend,
    S: SessionStore,
{
    let admin = authorize(state, session_id, Capability::ManageSettings)?;
    let data = default_dataset(state.config.bcrypt_cost)?;
    state.store.replace_all(data)?;
    tracing::warn!(user_id = %admin.id, "Store reset to default data");
    Ok(())
}
