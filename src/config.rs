// src/config.rs

use directories::ProjectDirs;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const API_URL_ENV: &str = "VANGUARD_API_URL";
pub const API_TIMEOUT_ENV: &str = "VANGUARD_API_TIMEOUT_SECS";
pub const DATA_DIR_ENV: &str = "VANGUARD_DATA_DIR";

const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid API URL '{value}': {source}")]
    InvalidUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("API URL '{0}' must use http or https")]
    UnsupportedScheme(String),
    #[error("invalid request timeout '{0}' (expected whole seconds)")]
    InvalidTimeout(String),
}

/// Runtime settings for the console.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL every API path is appended to (e.g. `http://localhost:8000/api/v1`).
    pub api_base_url: Url,
    pub request_timeout: Duration,
    /// Where the session, preferences and log file live.
    pub data_dir: PathBuf,
}

impl Config {
    /// Reads the configuration from the process environment, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`] but with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_base_url = parse_api_url(&lookup(API_URL_ENV).unwrap_or_else(|| DEFAULT_API_URL.to_string()))?;

        let request_timeout = match lookup(API_TIMEOUT_ENV) {
            Some(raw) => Duration::from_secs(
                raw.trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidTimeout(raw.clone()))?,
            ),
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let data_dir = lookup(DATA_DIR_ENV).map(PathBuf::from).unwrap_or_else(default_data_dir);

        Ok(Self {
            api_base_url,
            request_timeout,
            data_dir,
        })
    }

    pub fn with_api_url(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.api_base_url = parse_api_url(raw)?;
        Ok(self)
    }
}

pub fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidUrl {
        value: raw.to_string(),
        source,
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(ConfigError::UnsupportedScheme(raw.to_string())),
    }
}

/// Platform data directory (e.g. `~/.local/share/vanguard-console` on Linux), or
/// `./.data` when no home directory can be determined.
pub fn default_data_dir() -> PathBuf {
    ProjectDirs::from("com", "vanguard", env!("CARGO_PKG_NAME"))
        .map(|dirs| dirs.data_local_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".data"))
}
