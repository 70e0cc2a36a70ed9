//! FILENAME: app/report-session/src/config.rs
//! Session configuration. Passed explicitly at construction; there is no
//! global config.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};

pub const DEFAULT_STORAGE_KEY: &str = "report-columns-v2";
pub const DEFAULT_DATA_SOURCE: &str = "sales-demo";
pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const DEFAULT_OPTION_LATENCY_MS: u64 = 250;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionConfig {
    /// Key the column state is persisted under.
    pub storage_key: String,
    /// Written into every saved report definition.
    pub data_source_id: String,
    pub page_size: usize,
    /// Simulated latency of the demo option lookup.
    pub option_latency_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            data_source_id: DEFAULT_DATA_SOURCE.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            option_latency_ms: DEFAULT_OPTION_LATENCY_MS,
        }
    }
}

impl SessionConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SessionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage_key.trim().is_empty() {
            return Err(SessionError::Config("storageKey must not be empty".to_string()));
        }
        if self.page_size == 0 {
            return Err(SessionError::Config("pageSize must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn option_latency(&self) -> Duration {
        Duration::from_millis(self.option_latency_ms)
    }
}
