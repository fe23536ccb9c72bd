//! Operations exposed to front ends
//!
//! Every handler takes the caller's session, resolves it to an active user
//! and checks the role capability before touching the store.

pub mod admin;
pub mod auth;
pub mod courriers;
pub mod dashboard;

use courrier_core::{Capability, User};

use crate::error::{ServiceError, ServiceResult};
use crate::state::AppState;
use crate::store::{SessionId, SessionStore, StorageBackend};

/// Resolve a session to its active user
pub fn authenticate<B, S>(state: &AppState<B, S>, session_id: &SessionId) -> ServiceResult<User>
where
    B: StorageBackend,
    S: SessionStore,
{
    let session = state
        .sessions
        .get(session_id)?
        .ok_or(ServiceError::NotAuthenticated)?;

    let user = state
        .store
        .get::<User>(&session.user_id)
        .cloned()
        .ok_or(ServiceError::NotAuthenticated)?;

    if !user.is_active {
        return Err(ServiceError::AccountInactive);
    }

    Ok(user)
}

/// Resolve a session and require `capability` of its user's role
pub fn authorize<B, S>(
    state: &AppState<B, S>,
    session_id: &SessionId,
    capability: Capability,
) -> ServiceResult<User>
where
    B: StorageBackend,
    S: SessionStore,
{
    let user = authenticate(state, session_id)?;

    if !user.role.can(capability) {
        tracing::warn!(user_id = %user.id, role = %user.role, %capability, "Permission denied");
        return Err(ServiceError::Forbidden {
            role: user.role,
            capability,
        });
    }

    Ok(user)
}
