//! Common test utilities for service integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use courrier_core::{NewCourrier, Role};
use courrier_service::seed::DEMO_PASSWORD;
use courrier_service::store::{Dataset, StoreResult};
use courrier_service::{
    handlers, AppState, BackendKind, Config, InMemoryBackend, InMemorySessionStore, ServiceError,
    SessionId, StorageBackend,
};

pub const ADMIN: &str = "admin@estsb.edu";
pub const CHEF: &str = "chef.info@estsb.edu";
pub const AGENT: &str = "agent.mail@estsb.edu";

pub type TestState = AppState<InMemoryBackend, InMemorySessionStore>;

/// Config with a low bcrypt cost so tests stay fast
pub fn test_config() -> Config {
    Config {
        backend: BackendKind::Memory,
        bcrypt_cost: 4,
        ..Default::default()
    }
}

/// Seeded in-memory application state
pub fn create_test_state() -> TestState {
    AppState::open(test_config(), InMemoryBackend::new(), InMemorySessionStore::new())
        .expect("Failed to open test state")
}

/// Sign in as one of the seeded accounts
pub fn login<B: StorageBackend>(
    state: &AppState<B, InMemorySessionStore>,
    email: &str,
) -> SessionId {
    handlers::auth::login(state, email, DEMO_PASSWORD)
        .expect("Failed to log in")
        .id
}

/// Create an agent attached to Informatique and sign them in
pub fn informatique_agent<B: StorageBackend>(
    state: &mut AppState<B, InMemorySessionStore>,
    admin_session: &SessionId,
) -> SessionId {
    handlers::admin::create_user(
        state,
        admin_session,
        handlers::admin::NewUser {
            email: "agent.info@estsb.edu".to_string(),
            name: "Agent Informatique".to_string(),
            password: DEMO_PASSWORD.to_string(),
            role: Role::Agent,
            entity_id: Some("1".to_string()),
            is_active: true,
        },
    )
    .expect("Failed to create agent");
    login(state, "agent.info@estsb.edu")
}

/// A valid draft routed to the Informatique entity
pub fn draft(subject: &str) -> NewCourrier {
    NewCourrier {
        courier_type: "1".to_string(),
        category: "3".to_string(),
        to_entity: "1".to_string(),
        subject: subject.to_string(),
        ..Default::default()
    }
}

/// Backend whose writes can be made to fail on demand
pub struct FailingBackend {
    inner: InMemoryBackend,
    failing: Arc<AtomicBool>,
}

impl FailingBackend {
    pub fn new() -> (Self, Arc<AtomicBool>) {
        let failing = Arc::new(AtomicBool::new(false));
        (
            Self {
                inner: InMemoryBackend::new(),
                failing: failing.clone(),
            },
            failing,
        )
    }
}

impl StorageBackend for FailingBackend {
    fn load(&self) -> StoreResult<Option<Dataset>> {
        self.inner.load()
    }

    fn save(&self, data: &Dataset) -> StoreResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ServiceError::Persistence("disk full".to_string()));
        }
        self.inner.save(data)
    }
}
