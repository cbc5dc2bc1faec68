//! Application configuration, loaded from JSON with every field optional.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, StorageError};
use crate::history::DEFAULT_HISTORY_LIMIT;
use crate::pipeline::{PaperSize, Quality};
use crate::storage::{FileStorage, KeyValueStore, MemoryStorage};
use crate::style::StyleSettings;

/// Browser local storage typically allows 5 MiB per origin.
pub const DEFAULT_STORAGE_QUOTA: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    /// Quiet period before an autosave, in milliseconds.
    pub autosave_delay_ms: u64,
    pub paper_size: PaperSize,
    pub quality: Quality,
    pub history_limit: usize,
    /// Directory for file-backed storage; in-memory when unset.
    pub storage_dir: Option<PathBuf>,
    /// Byte limit over all stored values; `None` disables the check.
    pub storage_quota: Option<usize>,
    pub style: StyleSettings,
    /// Show example values in an empty preview header.
    pub placeholders: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            autosave_delay_ms: 2000,
            paper_size: PaperSize::A4,
            quality: Quality::Standard,
            history_limit: DEFAULT_HISTORY_LIMIT,
            storage_dir: None,
            storage_quota: Some(DEFAULT_STORAGE_QUOTA),
            style: StyleSettings::default(),
            placeholders: true,
        }
    }
}

impl AppConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    pub fn autosave_delay(&self) -> Duration {
        Duration::milliseconds(self.autosave_delay_ms as i64)
    }

    /// The configured storage backend.
    pub fn open_storage(&self) -> Result<Box<dyn KeyValueStore>, StorageError> {
        Ok(match &self.storage_dir {
            Some(dir) => Box::new(FileStorage::open(dir, self.storage_quota)?),
            None => Box::new(match self.storage_quota {
                Some(quota) => MemoryStorage::with_quota(quota),
                None => MemoryStorage::new(),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{ColorKey, Template};

    #[test]
    fn partial_json_keeps_defaults() {
        let config = AppConfig::from_json(
            r#"{"paperSize":"letter","style":{"template":"classic","colorKey":"burgundy"}}"#,
        )
        .unwrap();
        assert_eq!(config.paper_size, PaperSize::Letter);
        assert_eq!(config.style.template, Template::Classic);
        assert_eq!(config.style.color_key, ColorKey::Burgundy);
        assert_eq!(config.autosave_delay(), Duration::seconds(2));
        assert_eq!(config.history_limit, 10);
    }

    #[test]
    fn bad_json_is_an_error() {
        assert!(matches!(AppConfig::from_json("{"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn default_storage_is_in_memory() {
        let mut storage = AppConfig::default().open_storage().unwrap();
        storage.set("k", "v").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("v"));
    }
}
