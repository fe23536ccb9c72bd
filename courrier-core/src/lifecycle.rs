//! Courrier lifecycle tracking
//!
//! A courrier is created in `New` with one history entry. Every state change
//! appends to the history; entries are never removed or reordered.
//!
//! Which transitions are legal depends on the [`TransitionPolicy`]. The
//! default policy is permissive: any state may move to any other state.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};

use crate::model::{Attachment, Courrier, CourrierState, HistoryEntry, Priority};
use crate::{Error, Result};

/// Fields supplied by the author of a new courrier
#[derive(Debug, Clone, Default)]
pub struct NewCourrier {
    pub courier_type: String,
    pub category: String,
    pub to_entity: String,
    pub from_entity: Option<String>,
    pub subject: String,
    pub description: String,
    pub priority: Priority,
    pub attachments: Vec<Attachment>,
    pub assigned_to: Option<String>,
}

impl NewCourrier {
    /// Check that every required field is present
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("subject", &self.subject),
            ("type", &self.courier_type),
            ("category", &self.category),
            ("destination", &self.to_entity),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(format!(
                "missing required fields: {}",
                missing.join(", ")
            )))
        }
    }
}

impl Courrier {
    /// Build a courrier in the `New` state with its first history entry
    pub fn create(
        id: impl Into<String>,
        reference: impl Into<String>,
        draft: NewCourrier,
        creator: &str,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        draft.validate()?;

        Ok(Self {
            id: id.into(),
            reference: reference.into(),
            from_entity: draft.from_entity,
            to_entity: draft.to_entity,
            courier_type: draft.courier_type,
            category: draft.category,
            state: CourrierState::New,
            subject: draft.subject,
            description: draft.description,
            priority: draft.priority,
            created_by: creator.to_string(),
            created_at: now,
            attachments: draft.attachments,
            assigned_to: draft.assigned_to,
            history: vec![HistoryEntry {
                state: CourrierState::New,
                changed_by: creator.to_string(),
                changed_at: now,
                notes: None,
            }],
        })
    }

    /// Move the courrier to `to` and record the change
    ///
    /// The recorded timestamp never goes below the previous entry's, so the
    /// history stays ordered even if the clock steps backwards. On error the
    /// courrier is left untouched.
    pub fn change_state(
        &mut self,
        to: CourrierState,
        actor: &str,
        notes: Option<String>,
        policy: &TransitionPolicy,
        now: DateTime<Utc>,
    ) -> Result<&HistoryEntry> {
        policy.check(self.state, to)?;

        let changed_at = match self.history.last() {
            Some(last) if last.changed_at > now => last.changed_at,
            _ => now,
        };

        self.state = to;
        self.history.push(HistoryEntry {
            state: to,
            changed_by: actor.to_string(),
            changed_at,
            notes: notes.filter(|n| !n.trim().is_empty()),
        });

        Ok(&self.history[self.history.len() - 1])
    }

    /// Most recent history entry
    pub fn last_transition(&self) -> Option<&HistoryEntry> {
        self.history.last()
    }

    /// True when the history ends in the current state and is time-ordered
    pub fn history_is_consistent(&self) -> bool {
        let ends_in_state = self
            .history
            .last()
            .map(|last| last.state == self.state)
            .unwrap_or(false);
        let ordered = self
            .history
            .windows(2)
            .all(|pair| pair[0].changed_at <= pair[1].changed_at);
        ends_in_state && ordered
    }
}

/// Explicit set of allowed `from -> to` edges
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionTable {
    edges: BTreeMap<CourrierState, BTreeSet<CourrierState>>,
}

impl TransitionTable {
    /// A table with no allowed transitions
    pub fn empty() -> Self {
        Self {
            edges: BTreeMap::new(),
        }
    }

    /// The standard office workflow
    pub fn standard() -> Self {
        use CourrierState::*;

        Self::empty()
            .allow(New, InProgress)
            .allow(New, Rejected)
            .allow(New, Archived)
            .allow(InProgress, Treated)
            .allow(InProgress, Rejected)
            .allow(InProgress, Archived)
            .allow(Treated, Archived)
            .allow(Rejected, InProgress)
            .allow(Rejected, Archived)
    }

    /// Add an allowed edge
    pub fn allow(mut self, from: CourrierState, to: CourrierState) -> Self {
        self.edges.entry(from).or_default().insert(to);
        self
    }

    pub fn permits(&self, from: CourrierState, to: CourrierState) -> bool {
        self.edges
            .get(&from)
            .map(|targets| targets.contains(&to))
            .unwrap_or(false)
    }

    pub fn next_states(&self, from: CourrierState) -> Vec<CourrierState> {
        self.edges
            .get(&from)
            .map(|targets| targets.iter().copied().collect())
            .unwrap_or_default()
    }
}

impl Default for TransitionTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Which state changes `change_state` accepts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TransitionPolicy {
    /// Any state may move to any state
    #[default]
    Permissive,
    /// Only edges listed in the table are accepted
    Table(TransitionTable),
}

impl TransitionPolicy {
    /// Policy backed by [`TransitionTable::standard`]
    pub fn strict() -> Self {
        TransitionPolicy::Table(TransitionTable::standard())
    }

    pub fn check(&self, from: CourrierState, to: CourrierState) -> Result<()> {
        match self {
            TransitionPolicy::Permissive => Ok(()),
            TransitionPolicy::Table(table) if table.permits(from, to) => Ok(()),
            TransitionPolicy::Table(_) => Err(Error::IllegalTransition { from, to }),
        }
    }

    /// States a user interface should offer from `from`
    ///
    /// Under the permissive policy `Treated` offers nothing, although
    /// `change_state` would still accept a transition out of it.
    pub fn next_states(&self, from: CourrierState) -> Vec<CourrierState> {
        match self {
            TransitionPolicy::Permissive if from == CourrierState::Treated => Vec::new(),
            TransitionPolicy::Permissive => CourrierState::ALL
                .into_iter()
                .filter(|state| *state != from)
                .collect(),
            TransitionPolicy::Table(table) => table.next_states(from),
        }
    }
}
