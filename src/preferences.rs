// src/preferences.rs

use crate::storage::{Storage, StorageError};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::warn;

const SIDEBAR_KEY: &str = "sidebar_collapsed";
const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Theme {
    #[default]
    Dark,
    Light,
    System,
}

/// UI preferences. Persisted independently of the session, so they survive logout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Preferences {
    pub sidebar_collapsed: bool,
    pub theme: Theme,
}

impl Preferences {
    /// Loads preferences; unreadable or unrecognised values fall back to defaults.
    pub fn load(storage: &dyn Storage) -> Self {
        let read = |key: &str| match storage.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, key, "Could not read preference.");
                None
            }
        };

        Self {
            sidebar_collapsed: read(SIDEBAR_KEY).is_some_and(|v| v.trim() == "true"),
            theme: read(THEME_KEY)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or_default(),
        }
    }

    pub fn save(&self, storage: &dyn Storage) -> Result<(), StorageError> {
        storage.set(SIDEBAR_KEY, if self.sidebar_collapsed { "true" } else { "false" })?;
        storage.set(THEME_KEY, &self.theme.to_string())
    }
}
