//! Login, logout and password management

use courrier_core::User;

use crate::crypto::{hash_password, verify_password, MAX_PASSWORD_BYTES};
use crate::error::{ServiceError, ServiceResult};
use crate::state::AppState;
use crate::store::{Session, SessionId, SessionStore, StorageBackend, UserPatch};

/// Check a candidate password against the configured length bounds
pub fn check_password_length(password: &str, min_length: usize) -> ServiceResult<()> {
    if password.chars().count() < min_length {
        return Err(ServiceError::PasswordTooShort(min_length));
    }
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(ServiceError::PasswordTooLong);
    }
    Ok(())
}

/// Authenticate by email and password and open a session
pub fn login<B, S>(state: &AppState<B, S>, email: &str, password: &str) -> ServiceResult<Session>
where
    B: StorageBackend,
    S: SessionStore,
{
    let user = match state.store.dataset().user_by_email(email.trim()) {
        Some(user) => user,
        None => {
            tracing::info!(email, "Login failed: unknown email");
            return Err(ServiceError::InvalidCredentials);
        }
    };

    let valid = !user.password_hash.is_empty()
        && verify_password(password, &user.password_hash)
            .map_err(|e| ServiceError::Internal(e.to_string()))?;

    if !valid {
        tracing::info!(user_id = %user.id, "Login failed: wrong password");
        return Err(ServiceError::InvalidCredentials);
    }

    if !user.is_active {
        tracing::info!(user_id = %user.id, "Login refused: account inactive");
        return Err(ServiceError::AccountInactive);
    }

    let session = state.sessions.create(&user.id)?;
    tracing::info!(user_id = %user.id, role = %user.role, "User logged in");

    Ok(session)
}

/// Close a session; closing an unknown session is not an error
pub fn logout<B, S>(state: &AppState<B, S>, session_id: &SessionId) -> ServiceResult<()>
where
    B: StorageBackend,
    S: SessionStore,
{
    state.sessions.delete(session_id)
}

/// The user behind a session
pub fn current_user<B, S>(state: &AppState<B, S>, session_id: &SessionId) -> ServiceResult<User>
where
    B: StorageBackend,
    S: SessionStore,
{
    super::authenticate(state, session_id)
}

/// Change the caller's own password
///
/// Every session of the user is closed and a fresh one is returned.
pub fn change_password<B, S>(
    state: &mut AppState<B, S>,
    session_id: &SessionId,
    old_password: &str,
    new_password: &str,
) -> ServiceResult<Session>
where
    B: StorageBackend,
    S: SessionStore,
{
    let user = super::authenticate(state, session_id)?;

    check_password_length(new_password, state.config.min_password_length)?;

    let valid = verify_password(old_password, &user.password_hash)
        .map_err(|e| ServiceError::Internal(e.to_string()))?;
    if !valid {
        return Err(ServiceError::InvalidCredentials);
    }

    let password_hash = hash_password(new_password, state.config.bcrypt_cost)
        .map_err(|e| ServiceError::Internal(e.to_string()))?;

    state.store.update::<User>(
        &user.id,
        UserPatch {
            password_hash: Some(password_hash),
            ..Default::default()
        },
    )?;

    let closed = state.sessions.delete_for_user(&user.id)?;
    let session = state.sessions.create(&user.id)?;

    tracing::info!(user_id = %user.id, closed_sessions = closed, "Password changed");
    Ok(session)
}
