// src/orchestrator/admin.rs

use super::{lock, ListGuard, Observable, OperationGuard, SharedStore, Store};
use crate::api::AdminApi;
use crate::core::envelope::decode_user_list;
use crate::core::error::{extract_error_message, ApiError};
use crate::core::models::{AdminUser, MutationResult, Role};
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

const LIST_FAILED: &str = "Failed to fetch users";
const ROLE_FAILED: &str = "Failed to update user role";
const STATUS_FAILED: &str = "Failed to update user status";
const DELETE_FAILED: &str = "Failed to delete user";

pub const DEFAULT_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdminState {
    pub users: Vec<AdminUser>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl Observable for AdminState {
    fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
    }

    fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }
}

/// Owns the user list of the admin console.
///
/// Only `list` raises the loading flag. Mutations report their outcome as a
/// [`MutationResult`] (and also record failures in [`AdminState::error`]); on success the
/// matching local record is patched in place, without re-fetching the list.
#[derive(Clone)]
pub struct AdminOrchestrator {
    api: Arc<dyn AdminApi>,
    store: SharedStore<AdminState>,
}

impl fmt::Debug for AdminOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminOrchestrator")
            .field("state", &self.snapshot())
            .finish_non_exhaustive()
    }
}

impl AdminOrchestrator {
    pub fn new(api: Arc<dyn AdminApi>) -> Self {
        Self {
            api,
            store: Arc::new(Mutex::new(Store::default())),
        }
    }

    pub fn snapshot(&self) -> AdminState {
        lock(&self.store).state.clone()
    }

    pub fn dispose(&self) {
        lock(&self.store).disposed = true;
    }

    pub async fn list(&self, skip: u32, limit: u32) {
        let _loading = OperationGuard::begin(&self.store);
        let request = ListGuard::begin(&self.store);
        let result = self.api.list_users(skip, limit).await;

        let mut store = lock(&self.store);
        if store.disposed {
            return;
        }
        if !store.is_latest_list(request.seq) {
            debug!(seq = request.seq, "Discarding superseded user list response.");
            return;
        }
        match result {
            Ok(body) => {
                let mut users = decode_user_list(body);
                users.retain(|user| !store.deleted_during_list(&user.id));
                info!(count = users.len(), skip, limit, "User list refreshed.");
                store.state.users = users;
            }
            Err(e) => {
                warn!(error = %e, "Fetching users failed.");
                store.state.error = Some(extract_error_message(&e, LIST_FAILED));
            }
        }
    }

    pub async fn update_role(&self, user_id: &str, role: Role) -> MutationResult {
        self.begin_mutation();
        let result = self.api.update_user_role(user_id, role).await;
        self.finish_mutation(result.map(|_| ()), ROLE_FAILED, |store| {
            if let Some(user) = store.state.users.iter_mut().find(|u| u.id == user_id) {
                user.role = role;
            }
        })
    }

    pub async fn update_status(&self, user_id: &str, active: bool) -> MutationResult {
        self.begin_mutation();
        let result = self.api.update_user_status(user_id, active).await;
        self.finish_mutation(result.map(|_| ()), STATUS_FAILED, |store| {
            if let Some(user) = store.state.users.iter_mut().find(|u| u.id == user_id) {
                user.is_active = active;
            }
        })
    }

    /// Deletes a user. The backend cascades the deletion to the user's scans.
    pub async fn delete(&self, user_id: &str) -> MutationResult {
        self.begin_mutation();
        let result = self.api.delete_user(user_id).await;
        self.finish_mutation(result, DELETE_FAILED, |store| {
            store.state.users.retain(|u| u.id != user_id);
            store.note_deleted(user_id);
        })
    }

    fn begin_mutation(&self) {
        lock(&self.store).state.error = None;
    }

    fn finish_mutation(
        &self,
        result: Result<(), ApiError>,
        fallback: &str,
        apply: impl FnOnce(&mut Store<AdminState>),
    ) -> MutationResult {
        let mut store = lock(&self.store);
        match result {
            Ok(()) => {
                if !store.disposed {
                    apply(&mut *store);
                }
                info!("User update applied.");
                Ok(())
            }
            Err(e) => {
                let message = extract_error_message(&e, fallback);
                warn!(error = %e, %message, "User update failed.");
                if !store.disposed {
                    store.state.error = Some(message.clone());
                }
                Err(message)
            }
        }
    }
}
