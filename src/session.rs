// src/session.rs

use crate::core::models::User;
use crate::storage::{Storage, StorageError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

const SESSION_ID_KEY: &str = "session_id";
const USER_KEY: &str = "user";

/// Who is logged in. `is_loading` stays true until the persisted session has been read.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthSession {
    pub user: Option<User>,
    pub is_authenticated: bool,
    pub is_loading: bool,
}

impl Default for AuthSession {
    fn default() -> Self {
        Self {
            user: None,
            is_authenticated: false,
            is_loading: true,
        }
    }
}

/// Holds the authenticated principal for the lifetime of the process.
///
/// Every transition replaces the whole [`AuthSession`] under one lock, so readers never
/// observe a principal without the authenticated flag or the reverse.
pub struct SessionStore {
    storage: Arc<dyn Storage>,
    state: Mutex<AuthSession>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").field("state", &self.snapshot()).finish()
    }
}

impl SessionStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            state: Mutex::new(AuthSession::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, AuthSession> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> AuthSession {
        self.state().clone()
    }

    /// Stored session id, if any, for attaching to API requests.
    pub fn session_id(&self) -> Option<String> {
        match self.storage.get(SESSION_ID_KEY) {
            Ok(id) => id.filter(|id| !id.trim().is_empty()),
            Err(e) => {
                warn!(error = %e, "Could not read stored session id.");
                None
            }
        }
    }

    /// Records a successful login: persists the session id and principal, then marks the
    /// session authenticated.
    pub fn start(&self, session_id: Option<&str>, user: User) -> Result<(), StorageError> {
        match session_id {
            Some(id) => self.storage.set(SESSION_ID_KEY, id)?,
            None => self.storage.remove(SESSION_ID_KEY)?,
        }
        self.set_user(user);
        Ok(())
    }

    /// Sets the principal and the authenticated flag together.
    pub fn set_user(&self, user: User) {
        match serde_json::to_string(&user) {
            Ok(serialized) => {
                if let Err(e) = self.storage.set(USER_KEY, &serialized) {
                    warn!(error = %e, "Could not persist user; session will not survive restart.");
                }
            }
            Err(e) => warn!(error = %e, "Could not serialize user."),
        }
        info!(user_id = %user.id, email = %user.email, "Session started.");
        *self.state() = AuthSession {
            user: Some(user),
            is_authenticated: true,
            is_loading: false,
        };
    }

    /// Clears persisted session markers and resets the principal. Preferences are kept.
    pub fn logout(&self) {
        for key in [SESSION_ID_KEY, USER_KEY] {
            if let Err(e) = self.storage.remove(key) {
                warn!(error = %e, key, "Could not clear persisted session marker.");
            }
        }
        info!("Session cleared.");
        *self.state() = AuthSession {
            user: None,
            is_authenticated: false,
            is_loading: false,
        };
    }

    /// Restores the principal from storage without a network round trip. Missing or
    /// unreadable data leaves the session logged out.
    pub fn load_from_storage(&self) {
        let user = match self.storage.get(USER_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<User>(&raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!(error = %e, "Stored user is unreadable; ignoring it.");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Could not read stored user.");
                None
            }
        };

        debug!(restored = user.is_some(), "Session hydrated from storage.");
        *self.state() = AuthSession {
            is_authenticated: user.is_some(),
            user,
            is_loading: false,
        };
    }
}
