//! File-backed key-value store at ~/.aureo/store.json.
//!
//! Opaque string-to-string map persisted as pretty JSON. A malformed or
//! missing file reads as an empty store; persistence failures are ignored
//! so a read-only home directory never breaks the caller.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

pub struct Store {
    path: PathBuf,
    entries: HashMap<String, String>,
}

impl Store {
    /// Open the store at the default location (~/.aureo/store.json).
    pub fn open() -> Self {
        let path = Self::default_path();
        let entries = Self::read_file(&path).unwrap_or_default();
        Self { path, entries }
    }

    /// Open a store at a specific path (for testing).
    pub fn open_at(path: PathBuf) -> Self {
        let entries = Self::read_file(&path).unwrap_or_default();
        Self { path, entries }
    }

    fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".aureo")
            .join("store.json")
    }

    fn read_file(path: &PathBuf) -> Option<HashMap<String, String>> {
        let data = fs::read_to_string(path).ok()?;
        serde_json::from_str(&data).ok()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|s| s.as_str())
    }

    pub fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
        self.persist();
    }

    pub fn remove(&mut self, key: &str) {
        self.entries.remove(key);
        self.persist();
    }

    fn persist(&self) {
        if let Some(parent) = self.path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        if let Ok(json) = serde_json::to_string_pretty(&self.entries) {
            let _ = fs::write(&self.path, json);
        }
    }
}
