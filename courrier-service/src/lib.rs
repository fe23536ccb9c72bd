//! Gestion du Courrier service
//!
//! Application layer over `courrier-core`: a record store with pluggable
//! persistence, password authentication with session tokens, role-checked
//! handlers and CSV export.

pub mod config;
pub mod crypto;
pub mod error;
pub mod export;
pub mod handlers;
pub mod seed;
pub mod state;
pub mod store;

pub use config::{BackendKind, Config};
pub use error::{ServiceError, ServiceResult};
pub use state::AppState;
pub use store::{
    open_backend, InMemoryBackend, InMemorySessionStore, JsonFileBackend, RecordStore, SessionId,
    SessionStore, SqliteBackend, StorageBackend,
};
