// src/orchestrator/scans.rs

use super::{lock, ListGuard, Observable, OperationGuard, SharedStore, Store};
use crate::api::ScanApi;
use crate::core::envelope::decode_scan_list;
use crate::core::error::{extract_error_message, ApiError};
use crate::core::models::{CreateScanRequest, CreateScanResponse, Scan, ScanStatusSnapshot};
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

const LIST_FAILED: &str = "Failed to fetch scans";
const GET_FAILED: &str = "Failed to fetch scan";
const CREATE_FAILED: &str = "Failed to create scan";
const STATUS_FAILED: &str = "Failed to fetch scan status";
const DELETE_FAILED: &str = "Failed to delete scan";

/// What front ends render: the scan collection (newest first), the scan being viewed,
/// whether a request is in flight, and the last error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanState {
    pub scans: Vec<Scan>,
    pub selected_scan: Option<Scan>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl Observable for ScanState {
    fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
    }

    fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }
}

/// Owns the scan collection and keeps it in sync with the backend.
///
/// Operations never return errors: failures are recorded in [`ScanState::error`] and the
/// collection is left exactly as it was.
#[derive(Clone)]
pub struct ScanOrchestrator {
    api: Arc<dyn ScanApi>,
    store: SharedStore<ScanState>,
}

impl fmt::Debug for ScanOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanOrchestrator")
            .field("state", &self.snapshot())
            .finish_non_exhaustive()
    }
}

impl ScanOrchestrator {
    pub fn new(api: Arc<dyn ScanApi>) -> Self {
        Self {
            api,
            store: Arc::new(Mutex::new(Store::default())),
        }
    }

    pub fn snapshot(&self) -> ScanState {
        lock(&self.store).state.clone()
    }

    /// Detaches the orchestrator from its owner. Responses that arrive afterwards are
    /// dropped instead of being applied.
    pub fn dispose(&self) {
        lock(&self.store).disposed = true;
    }

    pub fn clear_error(&self) {
        lock(&self.store).state.error = None;
    }

    /// Replaces the collection with the server's list.
    pub async fn list(&self) {
        let _loading = OperationGuard::begin(&self.store);
        let request = ListGuard::begin(&self.store);
        let result = self.api.list_scans().await;

        let mut store = lock(&self.store);
        if store.disposed {
            debug!("Dropping scan list response after dispose.");
            return;
        }
        if !store.is_latest_list(request.seq) {
            debug!(seq = request.seq, "Discarding superseded scan list response.");
            return;
        }
        match result {
            Ok(body) => {
                let mut scans = decode_scan_list(body);
                scans.retain(|scan| !store.deleted_during_list(&scan.id));
                info!(count = scans.len(), "Scan list refreshed.");
                store.state.scans = scans;
            }
            Err(e) => {
                warn!(error = %e, "Fetching scans failed.");
                store.state.error = Some(extract_error_message(&e, LIST_FAILED));
            }
        }
    }

    /// Fetches one scan and selects it. A matching entry in the collection is replaced
    /// by the fetched record.
    pub async fn get(&self, scan_id: &str) {
        let _loading = OperationGuard::begin(&self.store);
        let result = self
            .api
            .get_scan(scan_id)
            .await
            .and_then(|body| serde_json::from_value::<Scan>(body).map_err(ApiError::from));

        let mut store = lock(&self.store);
        if store.disposed {
            return;
        }
        match result {
            Ok(scan) => {
                if let Some(existing) = store.state.scans.iter_mut().find(|s| s.id == scan.id) {
                    *existing = scan.clone();
                }
                store.state.selected_scan = Some(scan);
            }
            Err(e) => {
                warn!(scan_id, error = %e, "Fetching scan failed.");
                store.state.error = Some(extract_error_message(&e, GET_FAILED));
            }
        }
    }

    /// Submits a new scan. On success a provisional record is put at the front of the
    /// collection and returned; a later `get` or `list` supersedes it.
    pub async fn create(&self, request: CreateScanRequest) -> Option<Scan> {
        let _loading = OperationGuard::begin(&self.store);
        info!(scan_target = %request.target, tools = ?request.tools, "Submitting scan.");
        let result = self
            .api
            .create_scan(&request)
            .await
            .and_then(|body| serde_json::from_value::<CreateScanResponse>(body).map_err(ApiError::from));

        let mut store = lock(&self.store);
        if store.disposed {
            return None;
        }
        match result {
            Ok(response) => {
                let scan = response.into_provisional(&request);
                info!(scan_id = %scan.id, status = %scan.status, "Scan created.");
                store.state.scans.insert(0, scan.clone());
                Some(scan)
            }
            Err(e) => {
                warn!(error = %e, "Creating scan failed.");
                store.state.error = Some(extract_error_message(&e, CREATE_FAILED));
                None
            }
        }
    }

    /// One status round trip. Leaves the state untouched, so it can be called from a
    /// polling loop without flickering the loading flag.
    pub async fn get_status(&self, scan_id: &str) -> Result<ScanStatusSnapshot, String> {
        self.api
            .scan_status(scan_id)
            .await
            .and_then(|body| serde_json::from_value::<ScanStatusSnapshot>(body).map_err(ApiError::from))
            .map_err(|e| {
                debug!(scan_id, error = %e, "Status poll failed.");
                extract_error_message(&e, STATUS_FAILED)
            })
    }

    /// Deletes a scan. The local record is removed only once the server confirms.
    /// Returns whether the deletion succeeded.
    pub async fn delete(&self, scan_id: &str) -> bool {
        let _loading = OperationGuard::begin(&self.store);
        let result = self.api.delete_scan(scan_id).await;

        let mut store = lock(&self.store);
        if store.disposed {
            return result.is_ok();
        }
        match result {
            Ok(()) => {
                store.state.scans.retain(|scan| scan.id != scan_id);
                if store.state.selected_scan.as_ref().is_some_and(|s| s.id == scan_id) {
                    store.state.selected_scan = None;
                }
                store.note_deleted(scan_id);
                info!(scan_id, "Scan deleted.");
                true
            }
            Err(e) => {
                warn!(scan_id, error = %e, "Deleting scan failed.");
                store.state.error = Some(extract_error_message(&e, DELETE_FAILED));
                false
            }
        }
    }
}
