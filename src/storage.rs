//! Key-value storage backends for the preference blob
//!
//! - **FileStorage**: one JSON file per key under the user config directory
//! - **MemoryStorage**: in-process slots, used headless and in tests

use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::storage::{APP_DIR, FILE_EXTENSION};

/// A string-valued slot store, the shape of browser `localStorage`
pub trait Storage {
    /// Read a slot; `Ok(None)` when the key has never been written
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Storage rooted at `<config dir>/tile-sizer`
    pub fn new() -> Self {
        let mut dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        dir.push(APP_DIR);
        Self { dir }
    }

    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{FILE_EXTENSION}"))
    }
}

impl Default for FileStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read preferences from {}", path.display()))?;
        Ok(Some(contents))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create storage directory {}", self.dir.display()))?;
        let path = self.path_for(key);
        fs::write(&path, value)
            .with_context(|| format!("Failed to write preferences to {}", path.display()))?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slots: HashMap<String, String>,
    reject_writes: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, key: &str, value: &str) -> Self {
        self.slots.insert(key.to_string(), value.to_string());
        self
    }

    /// Make every subsequent write fail, like a full or disabled browser store
    pub fn reject_writes(mut self) -> Self {
        self.reject_writes = true;
        self
    }

    pub fn slot(&self, key: &str) -> Option<&str> {
        self.slots.get(key).map(String::as_str)
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.slots.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if self.reject_writes {
            bail!("storage quota exceeded writing '{key}'");
        }
        self.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "tile-sizer-storage-{}-{name}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_file_storage_missing_key() {
        let dir = scratch_dir("missing");
        let storage = FileStorage::in_dir(&dir);
        assert_eq!(storage.get("absent").unwrap(), None);
    }

    #[test]
    fn test_file_storage_creates_directory_on_write() {
        let dir = scratch_dir("write");
        let mut storage = FileStorage::in_dir(dir.join("nested"));
        storage.set("prefs", "{\"currentSize\":80}").unwrap();

        assert!(storage.path_for("prefs").exists());
        assert_eq!(
            storage.get("prefs").unwrap().as_deref(),
            Some("{\"currentSize\":80}")
        );
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_file_storage_path_uses_key() {
        let storage = FileStorage::in_dir("/tmp/x");
        assert_eq!(
            storage.path_for("ha-fusion-size-preferences"),
            PathBuf::from("/tmp/x/ha-fusion-size-preferences.json")
        );
    }

    #[test]
    fn test_default_file_storage_lives_under_app_dir() {
        assert!(FileStorage::new().dir().ends_with(APP_DIR));
    }

    #[test]
    fn test_memory_storage_roundtrip() {
        let mut storage = MemoryStorage::new();
        assert_eq!(storage.get("k").unwrap(), None);
        storage.set("k", "v").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_memory_storage_rejecting_writes() {
        let mut storage = MemoryStorage::new().with_entry("k", "old").reject_writes();
        assert!(storage.set("k", "new").is_err());
        assert_eq!(storage.slot("k"), Some("old"));
    }
}
