//! Application state shared by the handlers

use courrier_core::TransitionPolicy;

use crate::config::Config;
use crate::seed::{default_dataset, upgrade_legacy_passwords};
use crate::store::{RecordStore, SessionStore, StorageBackend, StoreResult};

/// Application state
pub struct AppState<B, S>
where
    B: StorageBackend,
    S: SessionStore,
{
    pub config: Config,
    pub store: RecordStore<B>,
    pub sessions: S,
    pub policy: TransitionPolicy,
}

impl<B, S> AppState<B, S>
where
    B: StorageBackend,
    S: SessionStore,
{
    /// Open the store behind `backend`, seeding it when empty
    ///
    /// Plaintext passwords found in the loaded snapshot are re-hashed and the
    /// upgraded snapshot is written back.
    pub fn open(config: Config, backend: B, sessions: S) -> StoreResult<Self> {
        let cost = config.bcrypt_cost;
        let mut store = RecordStore::open(backend, || default_dataset(cost))?;

        let mut data = store.dataset().clone();
        if upgrade_legacy_passwords(&mut data, cost)? > 0 {
            store.replace_all(data)?;
        }

        let policy = config.transition_policy();
        tracing::debug!(
            backend = %config.backend,
            strict = config.strict_transitions,
            "Application state ready"
        );

        Ok(Self {
            config,
            store,
            sessions,
            policy,
        })
    }
}
