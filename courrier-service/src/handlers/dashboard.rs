//! Dashboard statistics

use std::collections::BTreeMap;

use courrier_core::{aggregate, Capability, Category, CourierType, Courrier, Statistics};
use serde::Serialize;

use super::authorize;
use crate::error::ServiceResult;
use crate::state::AppState;
use crate::store::{SessionId, SessionStore, StorageBackend};

/// Statistics plus display labels for the type and category ids they mention
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub statistics: Statistics,
    pub type_labels: BTreeMap<String, String>,
    pub category_labels: BTreeMap<String, String>,
}

/// Statistics over every courrier in the store
pub fn statistics<B, S>(state: &AppState<B, S>, session_id: &SessionId) -> ServiceResult<Statistics>
where
    B: StorageBackend,
    S: SessionStore,
{
    authorize(state, session_id, Capability::ViewDashboard)?;
    Ok(aggregate(state.store.all::<Courrier>()))
}

pub fn dashboard<B, S>(state: &AppState<B, S>, session_id: &SessionId) -> ServiceResult<Dashboard>
where
    B: StorageBackend,
    S: SessionStore,
{
    let statistics = statistics(state, session_id)?;

    let type_labels = statistics
        .by_type
        .keys()
        .filter_map(|id| {
            state
                .store
                .get::<CourierType>(id)
                .map(|t| (id.clone(), t.label.clone()))
        })
        .collect();
    let category_labels = statistics
        .by_category
        .keys()
        .filter_map(|id| {
            state
                .store
                .get::<Category>(id)
                .map(|c| (id.clone(), c.label.clone()))
        })
        .collect();

    Ok(Dashboard {
        statistics,
        type_labels,
        category_labels,
    })
}
