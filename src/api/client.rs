// src/api/client.rs

use super::{AdminApi, AuthApi, ScanApi};
use crate::config::Config;
use crate::core::error::ApiError;
use crate::core::models::{CreateScanRequest, LoginRequest, Role};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, header};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info};
use url::Url;

/// HTTP client for the scanning backend.
///
/// Cloning is cheap; clones share the connection pool and the session id.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    session_id: Arc<RwLock<Option<String>>>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(concat!("VanguardConsole/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout)
            .build()?;

        info!(base_url = %config.api_base_url, "Creating API client.");

        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
            session_id: Arc::new(RwLock::new(None)),
        })
    }

    /// Sets (or clears) the session id sent with every request.
    pub async fn set_session_id(&self, session_id: Option<String>) {
        *self.session_id.write().await = session_id;
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ApiError> {
        let url = self.endpoint(segments)?;
        debug!(%method, %url, "Preparing API request.");
        let mut builder = self.client.request(method, url);
        if let Some(session_id) = self.session_id.read().await.as_deref() {
            builder = builder.header(header::COOKIE, format!("session_id={}", session_id));
        }
        Ok(builder)
    }

    /// Sends a request and decodes the body as JSON. An empty body decodes to `Null`;
    /// any non-2xx status becomes `ApiError::Status` carrying whatever body came back.
    async fn send(&self, builder: RequestBuilder) -> Result<Value, ApiError> {
        let response = builder.send().await.map_err(|e| {
            error!(error = %e, "API request failed before a response arrived.");
            ApiError::Transport(e)
        })?;
        let status = response.status();
        let bytes = response.bytes().await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            match serde_json::from_slice(&bytes) {
                Ok(body) => body,
                Err(e) if status.is_success() => return Err(ApiError::Decode(e)),
                Err(_) => Value::Null,
            }
        };

        if status.is_success() {
            debug!(%status, "API request succeeded.");
            Ok(body)
        } else {
            error!(%status, "API request rejected by server.");
            Err(ApiError::status(status.as_u16(), body))
        }
    }
}

#[async_trait]
impl ScanApi for ApiClient {
    async fn list_scans(&self) -> Result<Value, ApiError> {
        let builder = self.request(Method::GET, &["scans"]).await?;
        self.send(builder).await
    }

    async fn get_scan(&self, scan_id: &str) -> Result<Value, ApiError> {
        let builder = self.request(Method::GET, &["scans", scan_id]).await?;
        self.send(builder).await
    }

    async fn create_scan(&self, request: &CreateScanRequest) -> Result<Value, ApiError> {
        let builder = self.request(Method::POST, &["scans"]).await?.json(request);
        self.send(builder).await
    }

    async fn scan_status(&self, scan_id: &str) -> Result<Value, ApiError> {
        let builder = self.request(Method::GET, &["scans", scan_id, "status"]).await?;
        self.send(builder).await
    }

    async fn delete_scan(&self, scan_id: &str) -> Result<(), ApiError> {
        let builder = self.request(Method::DELETE, &["scans", scan_id]).await?;
        self.send(builder).await.map(|_| ())
    }
}

#[async_trait]
impl AdminApi for ApiClient {
    async fn list_users(&self, skip: u32, limit: u32) -> Result<Value, ApiError> {
        let builder = self
            .request(Method::GET, &["admin", "users"])
            .await?
            .query(&[("skip", skip), ("limit", limit)]);
        self.send(builder).await
    }

    async fn update_user_role(&self, user_id: &str, role: Role) -> Result<Value, ApiError> {
        let builder = self
            .request(Method::PATCH, &["admin", "users", user_id, "role"])
            .await?
            .query(&[("new_role", role.as_ref())]);
        self.send(builder).await
    }

    async fn update_user_status(&self, user_id: &str, active: bool) -> Result<Value, ApiError> {
        let builder = self
            .request(Method::PATCH, &["admin", "users", user_id, "status"])
            .await?
            .query(&[("is_active", active)]);
        self.send(builder).await
    }

    async fn delete_user(&self, user_id: &str) -> Result<(), ApiError> {
        let builder = self.request(Method::DELETE, &["admin", "users", user_id]).await?;
        self.send(builder).await.map(|_| ())
    }
}

#[async_trait]
impl AuthApi for ApiClient {
    async fn login(&self, request: &LoginRequest) -> Result<Value, ApiError> {
        let builder = self.request(Method::POST, &["auth", "login"]).await?.json(request);
        self.send(builder).await
    }

    async fn logout(&self) -> Result<(), ApiError> {
        let builder = self.request(Method::POST, &["auth", "logout"]).await?;
        self.send(builder).await.map(|_| ())
    }
}
