use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Marketplace role attached to a signed-in session.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Buyer,
    Seller,
    Admin,
    SuperAdmin,
}

impl Role {
    /// Moderation dashboards are admin-only surfaces.
    pub fn can_moderate(self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin)
    }
}

/// Serializable view of the session, hydrated at app start and handed back
/// to whatever persistence the host platform uses.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub access_token: Option<String>,
    pub role: Option<Role>,
}

/// Explicit, injected session handle. The HTTP layer reads the token from
/// here on every outgoing request; tests substitute a fresh context instead
/// of touching any ambient global storage.
#[derive(Clone, Default)]
pub struct SessionContext {
    state: Arc<RwLock<SessionSnapshot>>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hydrate(snapshot: SessionSnapshot) -> Self {
        Self {
            state: Arc::new(RwLock::new(snapshot)),
        }
    }

    pub fn sign_in(&self, token: impl Into<String>, role: Role) {
        let mut state = self.write();
        state.access_token = Some(token.into());
        state.role = Some(role);
        debug!(?role, "session signed in");
    }

    pub fn clear(&self) {
        let mut state = self.write();
        *state = SessionSnapshot::default();
        debug!("session cleared");
    }

    pub fn token(&self) -> Option<String> {
        self.read().access_token.clone()
    }

    pub fn role(&self) -> Option<Role> {
        self.read().role
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().access_token.is_some()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.read().clone()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, SessionSnapshot> {
        match self.state.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, SessionSnapshot> {
        match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
