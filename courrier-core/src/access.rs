//! Role capabilities
//!
//! Static role -> allowed-action table. Callers check it before any
//! mutation, not only when deciding which controls to display.

use std::fmt;

use crate::model::Role;

/// An action a role may be allowed to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    ViewDashboard,
    ViewCourriers,
    ExportCourriers,
    CreateCourrier,
    EditCourrier,
    ChangeState,
    DeleteCourrier,
    ManageEntities,
    ManageReferentials,
    ManageUsers,
    ManageSettings,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ViewDashboard => "view_dashboard",
            Capability::ViewCourriers => "view_courriers",
            Capability::ExportCourriers => "export_courriers",
            Capability::CreateCourrier => "create_courrier",
            Capability::EditCourrier => "edit_courrier",
            Capability::ChangeState => "change_state",
            Capability::DeleteCourrier => "delete_courrier",
            Capability::ManageEntities => "manage_entities",
            Capability::ManageReferentials => "manage_referentials",
            Capability::ManageUsers => "manage_users",
            Capability::ManageSettings => "manage_settings",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const SUPER_ADMIN: &[Capability] = &[
    Capability::ViewDashboard,
    Capability::ViewCourriers,
    Capability::ExportCourriers,
    Capability::CreateCourrier,
    Capability::EditCourrier,
    Capability::ChangeState,
    Capability::DeleteCourrier,
    Capability::ManageEntities,
    Capability::ManageReferentials,
    Capability::ManageUsers,
    Capability::ManageSettings,
];

const ADMIN: &[Capability] = &[
    Capability::ViewDashboard,
    Capability::ViewCourriers,
    Capability::ExportCourriers,
    Capability::CreateCourrier,
    Capability::EditCourrier,
    Capability::ChangeState,
    Capability::DeleteCourrier,
    Capability::ManageEntities,
    Capability::ManageReferentials,
    Capability::ManageUsers,
];

const CHEF: &[Capability] = &[
    Capability::ViewDashboard,
    Capability::ViewCourriers,
    Capability::ExportCourriers,
    Capability::CreateCourrier,
    Capability::ChangeState,
];

const AGENT: &[Capability] = &[
    Capability::ViewDashboard,
    Capability::ViewCourriers,
    Capability::ExportCourriers,
    Capability::CreateCourrier,
    Capability::EditCourrier,
    Capability::ChangeState,
];

const AUDITOR: &[Capability] = &[
    Capability::ViewDashboard,
    Capability::ViewCourriers,
    Capability::ExportCourriers,
];

impl Role {
    pub fn capabilities(&self) -> &'static [Capability] {
        match self {
            Role::SuperAdmin => SUPER_ADMIN,
            Role::Admin => ADMIN,
            Role::Chef => CHEF,
            Role::Agent => AGENT,
            Role::Auditor => AUDITOR,
        }
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}
