// src/api/mod.rs

// Seams between the orchestrators and the remote backend. The orchestrators only see
// these traits; `client::ApiClient` is the HTTP implementation used at runtime.

/// The reqwest-backed implementation of every API trait.
pub mod client;

use crate::core::error::ApiError;
use crate::core::models::{CreateScanRequest, LoginRequest, Role};
use async_trait::async_trait;
use serde_json::Value;

/// Scan endpoints. Bodies are returned undecoded; shape normalisation belongs to the caller.
#[async_trait]
pub trait ScanApi: Send + Sync {
    /// `GET /scans`
    async fn list_scans(&self) -> Result<Value, ApiError>;
    /// `GET /scans/{id}`
    async fn get_scan(&self, scan_id: &str) -> Result<Value, ApiError>;
    /// `POST /scans`
    async fn create_scan(&self, request: &CreateScanRequest) -> Result<Value, ApiError>;
    /// `GET /scans/{id}/status`
    async fn scan_status(&self, scan_id: &str) -> Result<Value, ApiError>;
    /// `DELETE /scans/{id}`
    async fn delete_scan(&self, scan_id: &str) -> Result<(), ApiError>;
}

/// User administration endpoints.
#[async_trait]
pub trait AdminApi: Send + Sync {
    /// `GET /admin/users?skip&limit`
    async fn list_users(&self, skip: u32, limit: u32) -> Result<Value, ApiError>;
    /// `PATCH /admin/users/{id}/role?new_role=`
    async fn update_user_role(&self, user_id: &str, role: Role) -> Result<Value, ApiError>;
    /// `PATCH /admin/users/{id}/status?is_active=`
    async fn update_user_status(&self, user_id: &str, active: bool) -> Result<Value, ApiError>;
    /// `DELETE /admin/users/{id}`. The backend also removes the user's scans and findings.
    async fn delete_user(&self, user_id: &str) -> Result<(), ApiError>;
}

#[async_trait]
pub trait AuthApi: Send + Sync {
    /// `POST /auth/login`
    async fn login(&self, request: &LoginRequest) -> Result<Value, ApiError>;
    /// `POST /auth/logout`
    async fn logout(&self) -> Result<(), ApiError>;
}
