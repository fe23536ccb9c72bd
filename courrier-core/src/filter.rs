//! Filter, search and sort over a courrier collection
//!
//! [`filter_courriers`] is pure: it borrows the full collection and returns a
//! new ordered view without touching the input.

use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;

use crate::model::{Courrier, CourrierState, Priority, Role, User};
use crate::{Error, Result};

/// Sentinel selector meaning "no restriction"
pub const ALL: &str = "all";

/// Courriers a user may see, derived from their role
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RoleScope {
    /// Admins, super admins, auditors and users without an entity see everything
    #[default]
    All,
    /// Courriers sent to the agent's entity or created by the agent
    Agent { user_id: String, entity_id: String },
    /// Courriers sent to the chef's entity
    Chef { entity_id: String },
}

impl RoleScope {
    /// Scope for `user`. Agents and chefs are only restricted once they
    /// belong to an entity.
    pub fn for_user(user: &User) -> Self {
        let Some(entity_id) = user.entity_id.clone() else {
            return RoleScope::All;
        };
        match user.role {
            Role::Agent => RoleScope::Agent {
                user_id: user.id.clone(),
                entity_id,
            },
            Role::Chef => RoleScope::Chef { entity_id },
            Role::SuperAdmin | Role::Admin | Role::Auditor => RoleScope::All,
        }
    }

    pub fn admits(&self, courrier: &Courrier) -> bool {
        match self {
            RoleScope::All => true,
            RoleScope::Agent { user_id, entity_id } => {
                courrier.to_entity == *entity_id || courrier.created_by == *user_id
            }
            RoleScope::Chef { entity_id } => courrier.to_entity == *entity_id,
        }
    }
}

/// Ordering applied after filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    DateDesc,
    DateAsc,
    Priority,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::DateDesc => "date_desc",
            SortOrder::DateAsc => "date_asc",
            SortOrder::Priority => "priority",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "date_desc" => Ok(SortOrder::DateDesc),
            "date_asc" => Ok(SortOrder::DateAsc),
            "priority" => Ok(SortOrder::Priority),
            other => Err(Error::InvalidSortOrder(other.to_string())),
        }
    }
}

/// What a list view should show
///
/// `None` in any selector means "all". With the default value the output is
/// the input, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    pub role_scope: RoleScope,
    pub text_query: Option<String>,
    pub state: Option<CourrierState>,
    pub courier_type: Option<String>,
    pub category: Option<String>,
    pub priority: Option<Priority>,
    pub entity: Option<String>,
    pub sort: Option<SortOrder>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scoped_to(mut self, user: &User) -> Self {
        self.role_scope = RoleScope::for_user(user);
        self
    }

    pub fn query(mut self, text: impl Into<String>) -> Self {
        self.text_query = Some(text.into());
        self
    }

    pub fn sorted(mut self, order: SortOrder) -> Self {
        self.sort = Some(order);
        self
    }

    fn matches(&self, courrier: &Courrier, needle: Option<&str>) -> bool {
        if !self.role_scope.admits(courrier) {
            return false;
        }

        if let Some(needle) = needle {
            let hit = [&courrier.reference, &courrier.subject, &courrier.description]
                .iter()
                .any(|field| field.to_lowercase().contains(needle));
            if !hit {
                return false;
            }
        }

        self.state.map_or(true, |s| courrier.state == s)
            && self.courier_type.as_ref().map_or(true, |t| courrier.courier_type == *t)
            && self.category.as_ref().map_or(true, |c| courrier.category == *c)
            && self.priority.as_ref().map_or(true, |p| courrier.priority == *p)
            && self.entity.as_ref().map_or(true, |e| courrier.to_entity == *e)
    }
}

/// Derive a list view from the full collection
pub fn filter_courriers<'a>(all: &'a [Courrier], spec: &FilterSpec) -> Vec<&'a Courrier> {
    let needle = spec
        .text_query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_lowercase);

    let mut view: Vec<&Courrier> = all
        .iter()
        .filter(|c| spec.matches(c, needle.as_deref()))
        .collect();

    // sort_by_key is stable, ties keep input order
    match spec.sort {
        None => {}
        Some(SortOrder::DateDesc) => view.sort_by_key(|c| Reverse(c.created_at)),
        Some(SortOrder::DateAsc) => view.sort_by_key(|c| c.created_at),
        Some(SortOrder::Priority) => view.sort_by_key(|c| c.priority.rank()),
    }

    view
}

/// Parse a selector where `"all"` (or an empty string) means no restriction
pub fn parse_selector<T: FromStr>(raw: &str) -> std::result::Result<Option<T>, T::Err> {
    let raw = raw.trim();
    if raw.is_empty() || raw == ALL {
        Ok(None)
    } else {
        raw.parse().map(Some)
    }
}
