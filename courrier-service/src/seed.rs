//! Default data for a fresh store

use chrono::Utc;
use courrier_core::{Category, CourierType, Entity, RefState, Role, User};

use crate::crypto::{hash_password, is_bcrypt_hash};
use crate::error::ServiceError;
use crate::store::{Dataset, StoreResult};

/// Password of the seeded demo accounts
pub const DEMO_PASSWORD: &str = "hashedPassword123";

/// Build the initial dataset, hashing demo passwords with `cost`
pub fn default_dataset(cost: u32) -> StoreResult<Dataset> {
    let now = Utc::now();
    let hash = hash_password(DEMO_PASSWORD, cost)
        .map_err(|e| ServiceError::Internal(e.to_string()))?;

    let user = |id: &str, email: &str, name: &str, role: Role, entity_id: Option<&str>| User {
        id: id.to_string(),
        email: email.to_string(),
        name: name.to_string(),
        password_hash: hash.clone(),
        role,
        entity_id: entity_id.map(str::to_string),
        created_at: now,
        is_active: true,
    };

    let entity = |id: &str,
                  label: &str,
                  description: &str,
                  email: &str,
                  code: &str,
                  chef: Option<&str>| Entity {
        id: id.to_string(),
        label: label.to_string(),
        description: description.to_string(),
        parent_entity_id: None,
        chef_id: chef.map(str::to_string),
        email: Some(email.to_string()),
        phone: Some("+212 5XX XXX XXX".to_string()),
        code: Some(code.to_string()),
        created_at: now,
    };

    let lookup = |id: &str, label: &str, description: &str| {
        (id.to_string(), label.to_string(), description.to_string())
    };

    Ok(Dataset {
        users: vec![
            user("1", "admin@estsb.edu", "Admin EST SB", Role::SuperAdmin, None),
            user("2", "chef.info@estsb.edu", "Chef Informatique", Role::Chef, Some("1")),
            user("3", "agent.mail@estsb.edu", "Agent Courrier", Role::Agent, None),
        ],
        entities: vec![
            entity(
                "1",
                "Informatique",
                "Department of Computer Science",
                "info@estsb.edu",
                "INFO",
                Some("2"),
            ),
            entity(
                "2",
                "Génie Mécanique",
                "Department of Mechanical Engineering",
                "mechanic@estsb.edu",
                "MECH",
                None,
            ),
            entity(
                "3",
                "Administration",
                "Administrative Department",
                "admin@estsb.edu",
                "ADM",
                None,
            ),
        ],
        courriers: Vec::new(),
        courier_types: [
            lookup("1", "Entrant", "Incoming mail"),
            lookup("2", "Sortant", "Outgoing mail"),
            lookup("3", "Interne", "Internal mail"),
        ]
        .into_iter()
        .map(|(id, label, description)| CourierType { id, label, description })
        .collect(),
        categories: [
            lookup("1", "Réclamation", "Complaints"),
            lookup("2", "Incident", "Incidents"),
            lookup("3", "Demande", "Requests"),
            lookup("4", "Administration", "Administrative"),
            lookup("5", "Convocation", "Summons"),
            lookup("6", "Autre", "Other"),
        ]
        .into_iter()
        .map(|(id, label, description)| Category { id, label, description })
        .collect(),
        ref_states: [
            ("1", "Nouveau", "#3B82F6"),
            ("2", "En cours", "#F59E0B"),
            ("3", "Traité", "#10B981"),
            ("4", "Rejeté", "#EF4444"),
            ("5", "Archivé", "#6B7280"),
        ]
        .into_iter()
        .map(|(id, label, color)| RefState {
            id: id.to_string(),
            label: label.to_string(),
            description: String::new(),
            color: Some(color.to_string()),
        })
        .collect(),
    })
}

/// Replace plaintext credentials left by older snapshots with bcrypt hashes
///
/// Returns the number of users upgraded.
pub fn upgrade_legacy_passwords(data: &mut Dataset, cost: u32) -> StoreResult<usize> {
    let mut upgraded = 0;
    for user in data.users.iter_mut() {
        if user.password_hash.is_empty() || is_bcrypt_hash(&user.password_hash) {
            continue;
        }
        user.password_hash = hash_password(&user.password_hash, cost)
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        upgraded += 1;
        tracing::warn!(user_id = %user.id, "Upgraded plaintext password to bcrypt hash");
    }
    Ok(upgraded)
}
