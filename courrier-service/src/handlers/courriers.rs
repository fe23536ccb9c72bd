//! Courrier operations

use chrono::Utc;
use courrier_core::{
    filter_courriers, new_reference, Capability, Courrier, CourrierState, FilterSpec, NewCourrier,
    RoleScope, User,
};

use super::authorize;
use crate::error::{ServiceError, ServiceResult};
use crate::export::to_csv;
use crate::state::AppState;
use crate::store::{CourrierPatch, SessionId, SessionStore, StorageBackend};

/// Look up a courrier the user is allowed to see
///
/// Courriers outside the user's scope are reported as missing.
fn visible<'a, B, S>(
    state: &'a AppState<B, S>,
    user: &User,
    id: &str,
) -> ServiceResult<&'a Courrier>
where
    B: StorageBackend,
    S: SessionStore,
{
    let courrier = state.store.require::<Courrier>(id)?;
    if !RoleScope::for_user(user).admits(courrier) {
        return Err(ServiceError::not_found("courrier", id));
    }
    Ok(courrier)
}

/// Create a courrier in the `new` state
pub fn create<B, S>(
    state: &mut AppState<B, S>,
    session_id: &SessionId,
    draft: NewCourrier,
) -> ServiceResult<Courrier>
where
    B: StorageBackend,
    S: SessionStore,
{
    let user = authorize(state, session_id, Capability::CreateCourrier)?;

    let now = Utc::now();
    let reference = new_reference(&state.config.reference_prefix, now);
    let id = uuid::Uuid::new_v4().to_string();
    let courrier = Courrier::create(id, reference, draft, &user.id, now)?;

    state.store.add(courrier.clone())?;
    tracing::info!(
        courrier = %courrier.id,
        reference = %courrier.reference,
        created_by = %user.id,
        "Courrier created"
    );

    Ok(courrier)
}

/// The list view for the caller
///
/// The role scope in `spec` is always replaced by the caller's own.
pub fn list<'a, B, S>(
    state: &'a AppState<B, S>,
    session_id: &SessionId,
    mut spec: FilterSpec,
) -> ServiceResult<Vec<&'a Courrier>>
where
    B: StorageBackend,
    S: SessionStore,
{
    let user = authorize(state, session_id, Capability::ViewCourriers)?;
    spec.role_scope = RoleScope::for_user(&user);
    Ok(filter_courriers(state.store.all::<Courrier>(), &spec))
}

pub fn get<'a, B, S>(
    state: &'a AppState<B, S>,
    session_id: &SessionId,
    id: &str,
) -> ServiceResult<&'a Courrier>
where
    B: StorageBackend,
    S: SessionStore,
{
    let user = authorize(state, session_id, Capability::ViewCourriers)?;
    visible(state, &user, id)
}

/// Move a courrier to the state named `target` and record it in the history
pub fn change_state<B, S>(
    state: &mut AppState<B, S>,
    session_id: &SessionId,
    id: &str,
    target: &str,
    notes: Option<String>,
) -> ServiceResult<Courrier>
where
    B: StorageBackend,
    S: SessionStore,
{
    let user = authorize(state, session_id, Capability::ChangeState)?;
    let to: CourrierState = target.parse()?;
    let from = visible(state, &user, id)?.state;

    let policy = &state.policy;
    let updated = state.store.modify(id, |courrier: &mut Courrier| {
        courrier.change_state(to, &user.id, notes, policy, Utc::now())?;
        Ok(courrier.clone())
    })?;

    tracing::info!(courrier = %id, %from, %to, actor = %user.id, "Courrier state changed");
    Ok(updated)
}

/// Edit the descriptive fields of a courrier
pub fn update<B, S>(
    state: &mut AppState<B, S>,
    session_id: &SessionId,
    id: &str,
    patch: CourrierPatch,
) -> ServiceResult<Courrier>
where
    B: StorageBackend,
    S: SessionStore,
{
    let user = authorize(state, session_id, Capability::EditCourrier)?;
    visible(state, &user, id)?;
    state.store.update::<Courrier>(id, patch)
}

pub fn delete<B, S>(
    state: &mut AppState<B, S>,
    session_id: &SessionId,
    id: &str,
) -> ServiceResult<Courrier>
where
    B: StorageBackend,
    S: SessionStore,
{
    let user = authorize(state, session_id, Capability::DeleteCourrier)?;
    let removed = state.store.delete::<Courrier>(id)?;
    tracing::info!(courrier = %id, actor = %user.id, "Courrier deleted");
    Ok(removed)
}

/// States the caller may move the courrier to next
///
/// Empty when the caller cannot change states at all.
pub fn available_transitions<B, S>(
    state: &AppState<B, S>,
    session_id: &SessionId,
    id: &str,
) -> ServiceResult<Vec<CourrierState>>
where
    B: StorageBackend,
    S: SessionStore,
{
    let user = authorize(state, session_id, Capability::ViewCourriers)?;
    let courrier = visible(state, &user, id)?;

    if !user.role.can(Capability::ChangeState) {
        return Ok(Vec::new());
    }
    Ok(state.policy.next_states(courrier.state))
}

/// CSV rendering of the caller's list view
pub fn export_csv<B, S>(
    state: &AppState<B, S>,
    session_id: &SessionId,
    spec: FilterSpec,
) -> ServiceResult<String>
where
    B: StorageBackend,
    S: SessionStore,
{
    let user = authorize(state, session_id, Capability::ExportCourriers)?;
    let view = list(state, session_id, spec)?;
    tracing::info!(user_id = %user.id, rows = view.len(), "Courriers exported");
    to_csv(&view, &state.store.dataset().entities)
}
