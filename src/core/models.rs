// src/core/models.rs

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use strum::{AsRefStr, Display, EnumString};

// --- Reusable Result Types ---

/// Outcome of a mutating admin operation. Failures carry a human-readable message
/// and are returned, never raised.
pub type MutationResult<T = ()> = Result<T, String>;

// --- Option Values ---

/// A single configured value for a tool option field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Integer(i64),
    Text(String),
}

impl OptionValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            OptionValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(b) => write!(f, "{}", b),
            OptionValue::Integer(n) => write!(f, "{}", n),
            OptionValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Integer(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Text(value.to_string())
    }
}

/// Field key -> value for one tool.
pub type ToolOptions = BTreeMap<String, OptionValue>;

/// Tool id -> that tool's option values, as submitted with a scan.
pub type ScanOptions = BTreeMap<String, ToolOptions>;

// --- Scans ---

/// Status of a scan job as reported by the backend.
///
/// The backend owns the full set of values, so anything unrecognised is kept verbatim
/// in `Other` instead of being rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ScanStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
    Other(String),
}

impl ScanStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ScanStatus::Pending => "pending",
            ScanStatus::Running => "running",
            ScanStatus::Completed => "completed",
            ScanStatus::Failed => "failed",
            ScanStatus::Other(raw) => raw,
        }
    }

    /// Whether a polling loop can stop watching a scan in this state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanStatus::Completed | ScanStatus::Failed)
    }
}

impl From<String> for ScanStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "pending" => ScanStatus::Pending,
            "running" => ScanStatus::Running,
            "completed" => ScanStatus::Completed,
            "failed" => ScanStatus::Failed,
            _ => ScanStatus::Other(raw),
        }
    }
}

impl From<ScanStatus> for String {
    fn from(status: ScanStatus) -> Self {
        match status {
            ScanStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scan job record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scan {
    #[serde(deserialize_with = "id_from_str_or_int")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub target: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: ScanStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tools_used: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub findings_count: u32,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp", skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Body of `POST /scans`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateScanRequest {
    pub target: String,
    pub tools: Vec<String>,
    pub options: ScanOptions,
}

/// Envelope returned by `POST /scans`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreateScanResponse {
    #[serde(deserialize_with = "id_from_str_or_int")]
    pub scan_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub target: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: ScanStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tools_used: Vec<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub started_at: Option<DateTime<Utc>>,
}

impl CreateScanResponse {
    /// Builds the provisional record shown until the authoritative one is fetched.
    /// Fields the server left out are taken from the originating request.
    pub fn into_provisional(self, request: &CreateScanRequest) -> Scan {
        Scan {
            id: self.scan_id,
            target: if self.target.is_empty() { request.target.clone() } else { self.target },
            status: self.status,
            tools_used: if self.tools_used.is_empty() { request.tools.clone() } else { self.tools_used },
            findings_count: 0,
            started_at: self.started_at,
            completed_at: None,
            error_message: None,
        }
    }
}

/// Point-in-time progress of a scan, from `GET /scans/{id}/status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanStatusSnapshot {
    #[serde(default, alias = "id", deserialize_with = "optional_id")]
    pub scan_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: ScanStatus,
    #[serde(default)]
    pub progress: Option<f32>,
    #[serde(default)]
    pub findings_count: Option<u32>,
    #[serde(default)]
    pub message: Option<String>,
}

// --- Users ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// The authenticated principal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(deserialize_with = "id_from_str_or_int")]
    pub id: String,
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub full_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub role: Role,
    #[serde(default = "default_true", deserialize_with = "null_as_true")]
    pub is_active: bool,
}

/// A user account as seen from the admin console.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminUser {
    #[serde(deserialize_with = "id_from_str_or_int")]
    pub id: String,
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub full_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub role: Role,
    #[serde(default = "default_true", deserialize_with = "null_as_true")]
    pub is_active: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_verified: bool,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub last_login: Option<DateTime<Utc>>,
}

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Envelope returned by `POST /auth/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub session_id: Option<String>,
    pub user: User,
}

fn default_true() -> bool {
    true
}

// --- Lenient decoding helpers ---

/// Accepts identifiers sent either as JSON strings or integers.
fn id_from_str_or_int<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Int(n) => n.to_string(),
    })
}

/// Treats an explicit `null` like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_true<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(true))
}

fn optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Parses RFC 3339 timestamps, or naive ones assumed to be UTC. Anything else becomes `None`.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(|v| v.as_str()).and_then(parse_timestamp))
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_status_is_preserved_verbatim() {
        let scan: Scan = serde_json::from_value(json!({
            "id": 7,
            "target": "example.com",
            "status": "queued_for_retry",
        }))
        .unwrap();

        assert_eq!(scan.id, "7");
        assert_eq!(scan.status, ScanStatus::Other("queued_for_retry".into()));
        assert_eq!(serde_json::to_value(&scan.status).unwrap(), json!("queued_for_retry"));
        assert!(!scan.status.is_terminal());
    }

    #[test]
    fn naive_timestamps_are_read_as_utc() {
        let scan: Scan = serde_json::from_value(json!({
            "id": "abc",
            "target": "10.0.0.1",
            "status": "completed",
            "started_at": "2024-05-01T10:30:00.123456",
        }))
        .unwrap();

        let started = scan.started_at.unwrap();
        assert_eq!(started.to_rfc3339(), "2024-05-01T10:30:00.123456+00:00");
        assert!(scan.status.is_terminal());
    }

    #[test]
    fn garbage_timestamp_does_not_reject_the_record() {
        let user: AdminUser = serde_json::from_value(json!({
            "id": 3,
            "email": "a@b.c",
            "role": "admin",
            "created_at": "yesterday",
            "last_login": null,
        }))
        .unwrap();

        assert_eq!(user.role, Role::Admin);
        assert!(user.created_at.is_none());
        assert!(user.last_login.is_none());
        assert!(user.is_active);
    }

    #[test]
    fn provisional_scan_falls_back_to_request_fields() {
        let request = CreateScanRequest {
            target: "scanme.nmap.org".into(),
            tools: vec!["nmap".into()],
            options: ScanOptions::new(),
        };
        let response: CreateScanResponse =
            serde_json::from_value(json!({ "scan_id": 42, "status": "pending" })).unwrap();

        let scan = response.into_provisional(&request);
        assert_eq!(scan.id, "42");
        assert_eq!(scan.target, "scanme.nmap.org");
        assert_eq!(scan.tools_used, vec!["nmap".to_string()]);
        assert_eq!(scan.findings_count, 0);
    }

    #[test]
    fn status_snapshot_tolerates_sparse_bodies() {
        let snapshot: ScanStatusSnapshot =
            serde_json::from_value(json!({ "scan_id": 12, "status": "running", "progress": 55.5 })).unwrap();
        assert_eq!(snapshot.scan_id.as_deref(), Some("12"));
        assert_eq!(snapshot.progress, Some(55.5));
        assert!(snapshot.message.is_none());

        let bare: ScanStatusSnapshot = serde_json::from_value(json!({ "status": "completed" })).unwrap();
        assert!(bare.scan_id.is_none());
        assert!(bare.status.is_terminal());
    }

    #[test]
    fn null_fields_fall_back_to_defaults() {
        let scan: Scan = serde_json::from_value(json!({
            "id": 5,
            "target": null,
            "status": null,
            "tools_used": null,
            "findings_count": null,
        }))
        .unwrap();
        assert_eq!(scan.target, "");
        assert_eq!(scan.status, ScanStatus::Pending);
        assert!(scan.tools_used.is_empty());
        assert_eq!(scan.findings_count, 0);

        let login: LoginResponse = serde_json::from_value(json!({
            "session_id": "abc",
            "user": { "id": 1, "email": "a@b.c", "full_name": null, "role": null, "is_active": null },
        }))
        .unwrap();
        assert_eq!(login.user.full_name, "");
        assert_eq!(login.user.role, Role::User);
        assert!(login.user.is_active);
    }

    #[test]
    fn option_values_serialize_untagged() {
        let mut tool = ToolOptions::new();
        tool.insert("scan_type".into(), "deep".into());
        tool.insert("os_detection".into(), true.into());
        tool.insert("timing".into(), 4i64.into());

        assert_eq!(
            serde_json::to_value(&tool).unwrap(),
            json!({ "os_detection": true, "scan_type": "deep", "timing": 4 })
        );
    }
}
