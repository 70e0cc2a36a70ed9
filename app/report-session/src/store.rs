//! FILENAME: app/report-session/src/store.rs
//! Column state persistence behind a small key/value seam.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use report_engine::ColumnStateMap;

use crate::error::{Result, SessionError};

pub trait ColumnStateStore {
    /// Stored map for `key`. Missing or unreadable entries are `None`.
    fn get(&self, key: &str) -> Option<ColumnStateMap>;

    fn set(&mut self, key: &str, map: &ColumnStateMap) -> Result<()>;
}

/// In-process store; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, ColumnStateMap>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

impl ColumnStateStore for MemoryStore {
    fn get(&self, key: &str) -> Option<ColumnStateMap> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, map: &ColumnStateMap) -> Result<()> {
        self.entries.insert(key.to_string(), map.clone());
        Ok(())
    }
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        JsonFileStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
            && !key.starts_with('.');
        if !valid {
            return Err(SessionError::Store(format!("invalid storage key '{}'", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl ColumnStateStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<ColumnStateMap> {
        let path = self.path_for(key).ok()?;
        let text = std::fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&text) {
            Ok(map) => Some(map),
            Err(e) => {
                crate::log_warn!("STORE", "ignoring unreadable column state {:?}: {}", path, e);
                None
            }
        }
    }

    fn set(&mut self, key: &str, map: &ColumnStateMap) -> Result<()> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(map)?;
        std::fs::write(&path, json)?;
        Ok(())
    }
}
