//! Sizing configuration
//!
//! Immutable, process-wide settings: size bounds, presets, timings and the
//! namespace used for storage keys and style variables. Built once at startup
//! and handed to the controller.

use anyhow::{ensure, Result};
use std::env;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::constants::{self, presets, sizing, storage, timing};

/// A named quick-select size
#[derive(Debug, Clone, PartialEq)]
pub struct Preset {
    pub name: String,
    pub size: f64,
}

impl Preset {
    pub fn new(name: impl Into<String>, size: f64) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SizingConfig {
    pub default_size: f64,
    pub min_size: f64,
    pub max_size: f64,
    /// Enumeration order matters: the first preset within tolerance wins
    pub presets: Vec<Preset>,
    pub transition: Duration,
    pub notification: Duration,
    pub namespace: String,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            default_size: sizing::DEFAULT_SIZE,
            min_size: sizing::MIN_SIZE,
            max_size: sizing::MAX_SIZE,
            presets: presets::ALL
                .iter()
                .map(|(name, size)| Preset::new(*name, *size))
                .collect(),
            transition: Duration::from_millis(timing::TRANSITION_MS),
            notification: Duration::from_millis(timing::NOTIFICATION_MS),
            namespace: storage::DEFAULT_NAMESPACE.to_string(),
        }
    }
}

impl SizingConfig {
    /// Check the bound invariants: every preset and the default lie within
    /// `[min_size, max_size]`
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.min_size.is_finite() && self.max_size.is_finite(),
            "size bounds must be finite (min={}, max={})",
            self.min_size,
            self.max_size
        );
        ensure!(
            self.min_size <= self.max_size,
            "min_size {} exceeds max_size {}",
            self.min_size,
            self.max_size
        );
        ensure!(
            self.in_bounds(self.default_size),
            "default_size {} outside [{}, {}]",
            self.default_size,
            self.min_size,
            self.max_size
        );
        for preset in &self.presets {
            ensure!(
                self.in_bounds(preset.size),
                "preset '{}' size {} outside [{}, {}]",
                preset.name,
                preset.size,
                self.min_size,
                self.max_size
            );
        }
        ensure!(!self.namespace.is_empty(), "namespace must not be empty");
        Ok(())
    }

    fn in_bounds(&self, size: f64) -> bool {
        size >= self.min_size && size <= self.max_size
    }

    /// Defaults with environment overrides applied.
    /// Falls back to plain defaults if the overrides produce an invalid config.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        match config.validate() {
            Ok(()) => config,
            Err(e) => {
                error!(error = %e, "Invalid sizing config from environment, using defaults");
                Self::default()
            }
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(namespace) = env::var(constants::env::NAMESPACE) {
            let namespace = namespace.trim();
            if namespace.is_empty() {
                warn!(var = constants::env::NAMESPACE, "Ignoring empty namespace override");
            } else {
                info!(namespace = %namespace, "Using namespace from environment");
                self.namespace = namespace.to_string();
            }
        }
        if let Some(ms) = parse_millis(constants::env::TRANSITION_MS) {
            self.transition = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_millis(constants::env::NOTIFICATION_MS) {
            self.notification = Duration::from_millis(ms);
        }
    }

    /// Key of the storage slot holding the persisted preferences
    pub fn storage_key(&self) -> String {
        format!("{}{}", self.namespace, storage::KEY_SUFFIX)
    }

    /// Full name of a namespaced style variable, e.g. `--ha-fusion-item-height`
    pub fn style_variable(&self, suffix: &str) -> String {
        format!("--{}-{}", self.namespace, suffix)
    }

    pub fn preset(&self, name: &str) -> Option<&Preset> {
        self.presets.iter().find(|p| p.name == name)
    }
}

fn parse_millis(var: &str) -> Option<u64> {
    let raw = env::var(var).ok()?;
    raw.trim()
        .parse::<u64>()
        .inspect_err(|e| error!(var = %var, value = %raw, error = ?e, "failed to parse env var"))
        .ok()
}
