//! Users, entities and referentials administration

mod common;

use common::{create_test_state, draft, login, ADMIN, AGENT, CHEF};
use courrier_core::{Category, Courrier, CourierType, Entity, RefState, Role, User};
use courrier_service::handlers::admin::{self, NewEntity, NewUser, UserUpdate};
use courrier_service::handlers::courriers;
use courrier_service::store::{EntityPatch, LookupPatch, RefStatePatch};
use courrier_service::ServiceError;

fn new_user(email: &str) -> NewUser {
    NewUser {
        email: email.to_string(),
        name: "Nouvel Agent".to_string(),
        password: "motdepasse".to_string(),
        role: Role::Agent,
        entity_id: Some("2".to_string()),
        is_active: true,
    }
}

#[test]
fn test_create_user_hashes_password() {
    let mut state = create_test_state();
    let session = login(&state, ADMIN);

    let user = admin::create_user(&mut state, &session, new_user("meca@estsb.edu")).unwrap();

    assert!(!user.id.is_empty());
    assert_ne!(user.password_hash, "motdepasse");
    assert_eq!(admin::list_users(&state, &session).unwrap().len(), 4);
}

#[test]
fn test_duplicate_email_rejected() {
    let mut state = create_test_state();
    let session = login(&state, ADMIN);

    let result = admin::create_user(&mut state, &session, new_user("AGENT.mail@estsb.edu"));
    assert!(matches!(result, Err(ServiceError::EmailAlreadyExists)));

    let result = admin::update_user(
        &mut state,
        &session,
        "2",
        UserUpdate {
            email: Some(AGENT.to_string()),
            ..Default::default()
        },
    );
    assert!(matches!(result, Err(ServiceError::EmailAlreadyExists)));
    assert_eq!(state.store.get::<User>("2").unwrap().email, CHEF);
}

#[test]
fn test_short_password_rejected_for_new_user() {
    let mut state = create_test_state();
    let session = login(&state, ADMIN);

    let mut user = new_user("court@estsb.edu");
    user.password = "abc".to_string();
    let result = admin::create_user(&mut state, &session, user);
    assert!(matches!(result, Err(ServiceError::PasswordTooShort(_))));
}

#[test]
fn test_user_management_requires_capability() {
    let mut state = create_test_state();
    let session = login(&state, CHEF);

    assert!(matches!(
        admin::list_users(&state, &session),
        Err(ServiceError::Forbidden { role: Role::Chef, .. })
    ));
    assert!(matches!(
        admin::delete_user(&mut state, &session, "3"),
        Err(ServiceError::Forbidden { .. })
    ));
}

#[test]
fn test_delete_user_closes_sessions() {
    let mut state = create_test_state();
    let admin_session = login(&state, ADMIN);
    let agent_session = login(&state, AGENT);

    let removed = admin::delete_user(&mut state, &admin_session, "3").unwrap();
    assert_eq!(removed.email, AGENT);
    assert!(matches!(
        courriers::list(&state, &agent_session, Default::default()),
        Err(ServiceError::NotAuthenticated)
    ));

    assert!(matches!(
        admin::delete_user(&mut state, &admin_session, "3"),
        Err(ServiceError::NotFound { kind: "user", .. })
    ));
}

#[test]
fn test_entity_hierarchy_must_stay_acyclic() {
    let mut state = create_test_state();
    let session = login(&state, ADMIN);

    let child = admin::create_entity(
        &mut state,
        &session,
        NewEntity {
            label: "Réseaux".to_string(),
            parent_entity_id: Some("1".to_string()),
            code: Some("NET".to_string()),
            ..Default::default()
        },
    )
    .unwrap();

    // Informatique under its own child would close a loop
    let result = admin::update_entity(
        &mut state,
        &session,
        "1",
        EntityPatch {
            parent_entity_id: Some(Some(child.id.clone())),
            ..Default::default()
        },
    );
    assert!(matches!(result, Err(ServiceError::ValidationError(_))));

    let result = admin::update_entity(
        &mut state,
        &session,
        "1",
        EntityPatch {
            parent_entity_id: Some(Some("1".to_string())),
            ..Default::default()
        },
    );
    assert!(matches!(result, Err(ServiceError::ValidationError(_))));

    assert!(state.store.get::<Entity>("1").unwrap().parent_entity_id.is_none());
}

#[test]
fn test_deleting_entity_leaves_courriers_orphaned() {
    let mut state = create_test_state();
    let session = login(&state, ADMIN);
    let courrier = courriers::create(&mut state, &session, draft("Orphelin")).unwrap();

    admin::delete_entity(&mut state, &session, "1").unwrap();

    let stored = state.store.get::<Courrier>(&courrier.id).unwrap();
    assert_eq!(stored.to_entity, "1");
    assert_eq!(admin::list_entities(&state, &session).unwrap().len(), 2);

    let csv = courriers::export_csv(&state, &session, Default::default()).unwrap();
    assert!(csv.contains("\"Inconnu\""));
}

#[test]
fn test_entities_visible_to_agents_but_not_editable() {
    let mut state = create_test_state();
    let session = login(&state, AGENT);

    assert_eq!(admin::list_entities(&state, &session).unwrap().len(), 3);
    assert!(matches!(
        admin::delete_entity(&mut state, &session, "1"),
        Err(ServiceError::Forbidden { .. })
    ));
}

#[test]
fn test_referential_crud() {
    let mut state = create_test_state();
    let session = login(&state, ADMIN);

    let created = admin::create_referential(
        &mut state,
        &session,
        Category {
            id: String::new(),
            label: "Facture".to_string(),
            description: "Invoices".to_string(),
        },
    )
    .unwrap();
    assert_eq!(admin::list_referential::<Category, _, _>(&state, &session).unwrap().len(), 7);

    let updated = admin::update_referential::<Category, _, _>(
        &mut state,
        &session,
        &created.id,
        LookupPatch {
            label: Some("Factures".to_string()),
            description: None,
        },
    )
    .unwrap();
    assert_eq!(updated.label, "Factures");
    assert_eq!(updated.description, "Invoices");

    let state_entry = admin::update_referential::<RefState, _, _>(
        &mut state,
        &session,
        "1",
        RefStatePatch {
            color: Some(None),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(state_entry.label, "Nouveau");
    assert!(state_entry.color.is_none());

    admin::delete_referential::<CourierType, _, _>(&mut state, &session, "3").unwrap();
    assert!(matches!(
        admin::delete_referential::<CourierType, _, _>(&mut state, &session, "3"),
        Err(ServiceError::NotFound { kind: "courier type", .. })
    ));
}

#[test]
fn test_referentials_require_capability() {
    let mut state = create_test_state();
    let session = login(&state, AGENT);

    assert_eq!(admin::list_referential::<CourierType, _, _>(&state, &session).unwrap().len(), 3);
    let result = admin::update_referential::<Category, _, _>(
        &mut state,
        &session,
        "1",
        LookupPatch {
            label: Some("X".to_string()),
            description: None,
        },
    );
    assert!(matches!(result, Err(ServiceError::Forbidden { .. })));
}

#[test]
fn test_reset_is_super_admin_only() {
    let mut state = create_test_state();
    let admin_session = login(&state, ADMIN);
    let agent_session = login(&state, AGENT);
    courriers::create(&mut state, &agent_session, draft("Effacé")).unwrap();

    assert!(matches!(
        admin::reset_data(&mut state, &agent_session),
        Err(ServiceError::Forbidden { .. })
    ));

    admin::reset_data(&mut state, &admin_session).unwrap();
    assert!(state.store.all::<Courrier>().is_empty());
    assert_eq!(state.store.all::<User>().len(), 3);
}
