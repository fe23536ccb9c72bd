//! Gestion du Courrier core library
//!
//! Domain model for internal mail tracking:
//! - Courriers are routed to organizational entities and move through a
//!   fixed state lifecycle with an append-only history
//! - List views are derived by a pure filter/sort/search engine
//! - Dashboards are derived by a single-pass aggregation engine
//! - Roles map to a static capability table

pub mod access;
pub mod error;
pub mod filter;
pub mod lifecycle;
pub mod model;
pub mod reference;
pub mod stats;

pub use access::Capability;
pub use error::Error;
pub use filter::{filter_courriers, parse_selector, FilterSpec, RoleScope, SortOrder};
pub use lifecycle::{NewCourrier, TransitionPolicy, TransitionTable};
pub use model::{
    Attachment, Category, CourierType, Courrier, CourrierState, Entity, HistoryEntry, Priority,
    RefState, Role, User,
};
pub use reference::{generate_reference, new_reference, DEFAULT_PREFIX};
pub use stats::{aggregate, Statistics};

/// Result type for courrier-core operations
pub type Result<T> = std::result::Result<T, Error>;
