//! Record types for the mail tracking domain
//!
//! Field names serialize in camelCase so a persisted snapshot keeps the
//! layout of the original browser storage document.

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Lifecycle state of a courrier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourrierState {
    New,
    InProgress,
    Treated,
    Rejected,
    Archived,
}

impl CourrierState {
    /// Every state, in declaration order
    pub const ALL: [CourrierState; 5] = [
        CourrierState::New,
        CourrierState::InProgress,
        CourrierState::Treated,
        CourrierState::Rejected,
        CourrierState::Archived,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CourrierState::New => "new",
            CourrierState::InProgress => "in_progress",
            CourrierState::Treated => "treated",
            CourrierState::Rejected => "rejected",
            CourrierState::Archived => "archived",
        }
    }

    /// French display label
    pub fn label(&self) -> &'static str {
        match self {
            CourrierState::New => "Nouveau",
            CourrierState::InProgress => "En cours",
            CourrierState::Treated => "Traité",
            CourrierState::Rejected => "Rejeté",
            CourrierState::Archived => "Archivé",
        }
    }
}

impl fmt::Display for CourrierState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CourrierState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        CourrierState::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| Error::InvalidState(s.to_string()))
    }
}

/// Courrier priority
///
/// Values read back from persisted data that are not one of the three known
/// priorities are kept as `Unrecognized` rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Priority {
    Normal,
    Urgent,
    VeryUrgent,
    Unrecognized(String),
}

impl Priority {
    /// The known priorities, in declaration order
    pub const KNOWN: [Priority; 3] = [Priority::Normal, Priority::Urgent, Priority::VeryUrgent];

    pub fn as_str(&self) -> &str {
        match self {
            Priority::Normal => "normal",
            Priority::Urgent => "urgent",
            Priority::VeryUrgent => "very_urgent",
            Priority::Unrecognized(raw) => raw,
        }
    }

    /// Severity rank used when sorting by priority (lower sorts first)
    pub fn rank(&self) -> u8 {
        match self {
            Priority::VeryUrgent => 0,
            Priority::Urgent => 1,
            Priority::Normal => 2,
            Priority::Unrecognized(_) => 3,
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Normal
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict parse for user input; unknown values are an error.
impl FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match Priority::from(s.to_string()) {
            Priority::Unrecognized(raw) => Err(Error::InvalidPriority(raw)),
            known => Ok(known),
        }
    }
}

impl From<String> for Priority {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "normal" => Priority::Normal,
            "urgent" => Priority::Urgent,
            "very_urgent" => Priority::VeryUrgent,
            _ => Priority::Unrecognized(raw),
        }
    }
}

impl From<Priority> for String {
    fn from(priority: Priority) -> Self {
        match priority {
            Priority::Unrecognized(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Admin,
    Chef,
    Agent,
    Auditor,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::SuperAdmin,
        Role::Admin,
        Role::Chef,
        Role::Agent,
        Role::Auditor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Admin => "admin",
            Role::Chef => "chef",
            Role::Agent => "agent",
            Role::Auditor => "auditor",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "Super Admin",
            Role::Admin => "Admin",
            Role::Chef => "Chef d'Entité",
            Role::Agent => "Agent",
            Role::Auditor => "Auditeur",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| Error::InvalidRole(s.to_string()))
    }
}

/// A user account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    /// bcrypt hash; legacy snapshots stored the plaintext under `password`
    #[serde(alias = "password")]
    pub password_hash: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}

/// An organizational unit that sends and receives courriers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_entity_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chef_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One state change in a courrier's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub state: CourrierState,
    pub changed_by: String,
    pub changed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A file attached to a courrier, stored inline as a data URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub size: u64,
    pub url: String,
    pub uploaded_at: DateTime<Utc>,
}

impl Attachment {
    /// Encode file contents into an inline attachment
    pub fn from_bytes(
        id: impl Into<String>,
        name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: &[u8],
        uploaded_at: DateTime<Utc>,
    ) -> Self {
        let mime_type = mime_type.into();
        let url = format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes));
        Self {
            id: id.into(),
            name: name.into(),
            mime_type,
            size: bytes.len() as u64,
            url,
            uploaded_at,
        }
    }

    /// Decode the inline data URL back into raw bytes
    pub fn decode(&self) -> Result<Vec<u8>> {
        let payload = self
            .url
            .strip_prefix("data:")
            .and_then(|rest| rest.split_once(";base64,"))
            .map(|(_, data)| data)
            .ok_or_else(|| {
                Error::InvalidAttachment(format!("{} is not a base64 data URL", self.name))
            })?;
        Ok(STANDARD.decode(payload)?)
    }
}

/// A tracked piece of correspondence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Courrier {
    pub id: String,
    pub reference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_entity: Option<String>,
    pub to_entity: String,
    #[serde(rename = "type")]
    pub courier_type: String,
    pub category: String,
    pub state: CourrierState,
    pub subject: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

/// Courrier category lookup entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub description: String,
}

/// Courrier type lookup entry (incoming, outgoing, internal...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourierType {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub description: String,
}

/// Display metadata for a lifecycle state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefState {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_parse_roundtrip() {
        for state in CourrierState::ALL {
            assert_eq!(state.as_str().parse::<CourrierState>().unwrap(), state);
        }
        assert!(matches!(
            "closed".parse::<CourrierState>(),
            Err(Error::InvalidState(s)) if s == "closed"
        ));
    }

    #[test]
    fn test_unknown_priority_preserved_from_storage() {
        let priority: Priority = serde_json::from_str("\"low\"").unwrap();
        assert_eq!(priority, Priority::Unrecognized("low".to_string()));
        assert_eq!(priority.rank(), 3);
        assert_eq!(serde_json::to_string(&priority).unwrap(), "\"low\"");

        assert!("low".parse::<Priority>().is_err());
        assert_eq!("very_urgent".parse::<Priority>().unwrap(), Priority::VeryUrgent);
    }

    #[test]
    fn test_legacy_user_password_field() {
        let json = r#"{
            "id": "1",
            "email": "admin@estsb.edu",
            "name": "Admin EST SB",
            "password": "hashedPassword123",
            "role": "super_admin",
            "createdAt": "2024-01-15T10:00:00.000Z",
            "isActive": true
        }"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.password_hash, "hashedPassword123");
        assert_eq!(user.role, Role::SuperAdmin);
        assert!(user.entity_id.is_none());

        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("passwordHash").is_some());
        assert!(value.get("entityId").is_none());
    }

    #[test]
    fn test_courrier_type_field_renamed() {
        let json = r#"{
            "id": "c1",
            "reference": "ESTSB-202401-AB12C",
            "toEntity": "1",
            "type": "1",
            "category": "2",
            "state": "in_progress",
            "subject": "Demande de salle",
            "priority": "urgent",
            "createdBy": "3",
            "createdAt": "2024-01-15T10:00:00Z"
        }"#;
        let courrier: Courrier = serde_json::from_str(json).unwrap();
        assert_eq!(courrier.courier_type, "1");
        assert_eq!(courrier.state, CourrierState::InProgress);
        assert!(courrier.history.is_empty());
        assert!(courrier.attachments.is_empty());
    }

    #[test]
    fn test_attachment_data_url() {
        let attachment =
            Attachment::from_bytes("a1", "note.txt", "text/plain", b"bonjour", Utc::now());
        assert_eq!(attachment.url, "data:text/plain;base64,Ym9uam91cg==");
        assert_eq!(attachment.size, 7);
        assert_eq!(attachment.decode().unwrap(), b"bonjour");
    }

    #[test]
    fn test_attachment_rejects_non_data_url() {
        let mut attachment =
            Attachment::from_bytes("a1", "x.bin", "application/octet-stream", b"x", Utc::now());
        attachment.url = "https://example.com/x.bin".to_string();
        assert!(matches!(attachment.decode(), Err(Error::InvalidAttachment(_))));
    }
}
