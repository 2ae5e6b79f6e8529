//! Preference persistence
//!
//! The sizing state is stored as one JSON blob under `<namespace>-size-preferences`.
//! Loading never fails from the caller's point of view: a missing slot or a
//! blob that does not parse both mean "use defaults". Saving failures are logged
//! and otherwise ignored.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::state::SizingState;
use crate::storage::Storage;

/// On-storage representation of the sizing state
///
/// Every field is optional on read so blobs written by older builds (or by hand)
/// still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedPreferences {
    #[serde(default)]
    pub current_size: Option<f64>,
    #[serde(default)]
    pub component_overrides: BTreeMap<String, f64>,
    /// Milliseconds since the Unix epoch at save time
    #[serde(default)]
    pub timestamp: Option<i64>,
}

impl PersistedPreferences {
    pub fn from_state(state: &SizingState, timestamp: i64) -> Self {
        Self {
            current_size: Some(state.current_size()),
            component_overrides: state
                .component_overrides()
                .iter()
                .map(|(id, size)| (id.as_str().to_string(), *size))
                .collect(),
            timestamp: Some(timestamp),
        }
    }

    pub fn parse(contents: &str) -> Result<Self> {
        serde_json::from_str(contents).context("Failed to parse size preferences JSON")
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to serialize size preferences")
    }
}

pub struct PreferenceStore {
    storage: Box<dyn Storage>,
    key: String,
}

impl PreferenceStore {
    pub fn new(storage: Box<dyn Storage>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    /// Read the stored preferences. `None` when nothing usable is stored.
    pub fn load(&self) -> Option<PersistedPreferences> {
        let contents = match self.storage.get(&self.key) {
            Ok(Some(contents)) => contents,
            Ok(None) => {
                debug!(key = %self.key, "No saved size preferences");
                return None;
            }
            Err(e) => {
                warn!(key = %self.key, error = ?e, "Failed to load size preferences");
                return None;
            }
        };

        match PersistedPreferences::parse(&contents) {
            Ok(prefs) => {
                info!(key = %self.key, current_size = ?prefs.current_size, overrides = prefs.component_overrides.len(), "Loaded size preferences");
                Some(prefs)
            }
            Err(e) => {
                warn!(key = %self.key, error = ?e, "Ignoring corrupt size preferences");
                None
            }
        }
    }

    /// Write the persistable part of `state`, stamped with the current time.
    /// Returns whether the write went through.
    pub fn save(&mut self, state: &SizingState) -> bool {
        match self.try_save(state) {
            Ok(()) => {
                debug!(key = %self.key, current_size = state.current_size(), "Saved size preferences");
                true
            }
            Err(e) => {
                warn!(key = %self.key, error = ?e, "Failed to save size preferences");
                false
            }
        }
    }

    fn try_save(&mut self, state: &SizingState) -> Result<()> {
        let json = PersistedPreferences::from_state(state, epoch_millis()).to_json()?;
        self.storage.set(&self.key, &json)
    }
}

#[cfg(all(feature = "web", target_arch = "wasm32"))]
fn epoch_millis() -> i64 {
    js_sys::Date::now() as i64
}

#[cfg(not(all(feature = "web", target_arch = "wasm32")))]
fn epoch_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SizingConfig;
    use crate::state::ComponentId;
    use crate::storage::MemoryStorage;

    const KEY: &str = "ha-fusion-size-preferences";

    fn store_with(storage: MemoryStorage) -> PreferenceStore {
        PreferenceStore::new(Box::new(storage), KEY)
    }

    fn stored_json(store: &PreferenceStore) -> serde_json::Value {
        let raw = store.storage().get(KEY).unwrap().expect("slot written");
        serde_json::from_str(&raw).unwrap()
    }

    #[test]
    fn test_load_missing_key() {
        let store = store_with(MemoryStorage::new());
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_load_corrupt_json_returns_none() {
        let store = store_with(MemoryStorage::new().with_entry(KEY, "{currentSize: oops"));
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_load_wrong_types_returns_none() {
        let store = store_with(MemoryStorage::new().with_entry(KEY, r#"{"currentSize":"big"}"#));
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_load_tolerates_missing_fields() {
        let store = store_with(MemoryStorage::new().with_entry(KEY, r#"{"currentSize":80}"#));
        let prefs = store.load().unwrap();
        assert_eq!(prefs.current_size, Some(80.0));
        assert!(prefs.component_overrides.is_empty());
        assert_eq!(prefs.timestamp, None);

        let store = store_with(MemoryStorage::new().with_entry(KEY, "{}"));
        assert_eq!(store.load().unwrap().current_size, None);
    }

    #[test]
    fn test_save_writes_camel_case_blob() {
        let mut state = SizingState::new(SizingConfig::default());
        state.set_global_size(90.0);
        state.set_override("sidebar", 45.5);

        let mut store = store_with(MemoryStorage::new());
        assert!(store.save(&state));

        let json = stored_json(&store);
        assert_eq!(json["currentSize"], 90.0);
        assert_eq!(json["componentOverrides"]["sidebar"], 45.5);
        assert!(json["timestamp"].as_i64().unwrap() > 0);
    }

    #[test]
    fn test_save_then_load_roundtrip() {
        let mut state = SizingState::new(SizingConfig::default());
        state.set_global_size(61.35);
        state.set_override("button", 100.0);
        state.set_override("sidebar", 33.5);

        let mut store = store_with(MemoryStorage::new());
        store.save(&state);

        let prefs = store.load().unwrap();
        let restored = SizingState::from_preferences(SizingConfig::default(), &prefs);
        assert_eq!(restored.snapshot(), state.snapshot());
        assert_eq!(restored.effective_size(ComponentId::Button), 100.0);
    }

    #[test]
    fn test_roundtrip_is_exact_for_arbitrary_sizes() {
        // xorshift64, fixed seed
        let mut seed: u64 = 0x9E37_79B9_7F4A_7C15;
        let mut next_size = || {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            30.0 + (seed >> 11) as f64 / (1u64 << 53) as f64 * 120.0
        };

        let mut store = store_with(MemoryStorage::new());
        for _ in 0..20_000 {
            let mut state = SizingState::new(SizingConfig::default());
            state.set_global_size(next_size());
            state.set_override("button", next_size());
            state.set_override("sidebar", next_size());
            assert!(store.save(&state));

            let prefs = store.load().unwrap();
            let restored = SizingState::from_preferences(SizingConfig::default(), &prefs);
            assert_eq!(restored.snapshot(), state.snapshot());
        }
    }

    #[test]
    fn test_save_failure_is_not_fatal() {
        let state = SizingState::new(SizingConfig::default());
        let mut store = store_with(MemoryStorage::new().reject_writes());
        assert!(!store.save(&state));
        assert_eq!(store.load(), None);
    }
}
