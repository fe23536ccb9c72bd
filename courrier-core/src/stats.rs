//! Dashboard statistics

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{Courrier, CourrierState, Priority};

/// Counts derived from a courrier collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total: usize,
    /// Always contains every state, zero or not
    pub by_state: BTreeMap<CourrierState, usize>,
    /// Only types that occur
    pub by_type: BTreeMap<String, usize>,
    /// Only categories that occur
    pub by_category: BTreeMap<String, usize>,
    /// Always contains the three known priorities
    pub by_priority: BTreeMap<Priority, usize>,
    /// Courriers created per `YYYY-MM`, ascending
    pub monthly_trend: BTreeMap<String, usize>,
}

impl Statistics {
    pub fn state_count(&self, state: CourrierState) -> usize {
        self.by_state.get(&state).copied().unwrap_or(0)
    }

    pub fn priority_count(&self, priority: &Priority) -> usize {
        self.by_priority.get(priority).copied().unwrap_or(0)
    }
}

/// Reduce a collection (or a filtered view of one) in a single pass
pub fn aggregate<'a, I>(courriers: I) -> Statistics
where
    I: IntoIterator<Item = &'a Courrier>,
{
    let mut stats = Statistics {
        total: 0,
        by_state: CourrierState::ALL.into_iter().map(|s| (s, 0)).collect(),
        by_type: BTreeMap::new(),
        by_category: BTreeMap::new(),
        by_priority: Priority::KNOWN.into_iter().map(|p| (p, 0)).collect(),
        monthly_trend: BTreeMap::new(),
    };

    for courrier in courriers {
        stats.total += 1;
        *stats.by_state.entry(courrier.state).or_insert(0) += 1;
        *stats
            .by_type
            .entry(courrier.courier_type.clone())
            .or_insert(0) += 1;
        *stats
            .by_category
            .entry(courrier.category.clone())
            .or_insert(0) += 1;
        *stats
            .by_priority
            .entry(courrier.priority.clone())
            .or_insert(0) += 1;
        *stats
            .monthly_trend
            .entry(courrier.created_at.format("%Y-%m").to_string())
            .or_insert(0) += 1;
    }

    stats
}
