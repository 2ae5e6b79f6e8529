//! Authoritative sizing model
//!
//! Holds the global tile height and the per-component overrides. Every setter
//! clamps into the configured bounds, so the invariant
//! `min_size <= size <= max_size` holds after any mutation.

use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

use crate::config::{Preset, SizingConfig};
use crate::constants::sizing::PRESET_TOLERANCE;
use crate::persistence::PersistedPreferences;

/// Component classes that can be sized independently of the global size
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ComponentId {
    Button,
    Sidebar,
}

impl ComponentId {
    pub const ALL: [ComponentId; 2] = [ComponentId::Button, ComponentId::Sidebar];

    pub fn as_str(self) -> &'static str {
        match self {
            ComponentId::Button => "button",
            ComponentId::Sidebar => "sidebar",
        }
    }

    /// Resolve a panel-supplied id. Unknown ids resolve to nothing.
    pub fn parse(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == id)
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The persistable part of [`SizingState`]
#[derive(Debug, Clone, PartialEq)]
pub struct SizingSnapshot {
    pub current_size: f64,
    pub component_overrides: BTreeMap<ComponentId, f64>,
}

#[derive(Debug, Clone)]
pub struct SizingState {
    config: SizingConfig,
    current_size: f64,
    component_overrides: BTreeMap<ComponentId, f64>,
    panel_visible: bool,
}

impl SizingState {
    /// Fresh state at the configured default size with no overrides
    pub fn new(config: SizingConfig) -> Self {
        let current_size = config.default_size;
        Self {
            config,
            current_size,
            component_overrides: BTreeMap::new(),
            panel_visible: false,
        }
    }

    /// Project loaded preferences onto a fresh state.
    /// Missing (or zero) sizes fall back to the default, values are clamped,
    /// and overrides for unknown components are dropped.
    pub fn from_preferences(config: SizingConfig, prefs: &PersistedPreferences) -> Self {
        let mut state = Self::new(config);
        let size = prefs
            .current_size
            .filter(|size| *size != 0.0)
            .unwrap_or(state.config.default_size);
        state.set_global_size(size);

        for (id, size) in &prefs.component_overrides {
            if !state.set_override(id, *size) {
                warn!(component = %id, "Dropping saved override for unknown component");
            }
        }
        state
    }

    pub fn config(&self) -> &SizingConfig {
        &self.config
    }

    pub fn current_size(&self) -> f64 {
        self.current_size
    }

    pub fn component_overrides(&self) -> &BTreeMap<ComponentId, f64> {
        &self.component_overrides
    }

    pub fn panel_visible(&self) -> bool {
        self.panel_visible
    }

    pub(crate) fn set_panel_visible(&mut self, visible: bool) {
        self.panel_visible = visible;
    }

    /// Bound `value` to `[min_size, max_size]`.
    /// NaN has no position in the range and maps to the default size.
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.config.default_size;
        }
        value.clamp(self.config.min_size, self.config.max_size)
    }

    pub fn set_global_size(&mut self, value: f64) {
        let clamped = self.clamp(value);
        if clamped != value {
            debug!(requested = value, clamped, "Clamped global size");
        }
        self.current_size = clamped;
    }

    /// Set an override for a panel-supplied component id.
    /// Returns false, changing nothing, when the id is not a known component.
    pub fn set_override(&mut self, component: &str, value: f64) -> bool {
        match ComponentId::parse(component) {
            Some(id) => {
                self.set_component_override(id, value);
                true
            }
            None => {
                debug!(component = %component, "Ignoring override for unknown component");
                false
            }
        }
    }

    pub fn set_component_override(&mut self, component: ComponentId, value: f64) {
        let clamped = self.clamp(value);
        self.component_overrides.insert(component, clamped);
    }

    pub fn reset(&mut self) {
        self.current_size = self.config.default_size;
        self.component_overrides.clear();
    }

    pub fn effective_size(&self, component: ComponentId) -> f64 {
        self.component_overrides
            .get(&component)
            .copied()
            .unwrap_or(self.current_size)
    }

    pub fn nearest_preset(&self, size: f64) -> Option<&Preset> {
        self.config
            .presets
            .iter()
            .find(|p| (p.size - size).abs() < PRESET_TOLERANCE)
    }

    /// Name of the preset within tolerance of `size`, first match wins
    pub fn nearest_preset_name(&self, size: f64) -> Option<&str> {
        self.nearest_preset(size).map(|p| p.name.as_str())
    }

    pub fn snapshot(&self) -> SizingSnapshot {
        SizingSnapshot {
            current_size: self.current_size,
            component_overrides: self.component_overrides.clone(),
        }
    }
}
