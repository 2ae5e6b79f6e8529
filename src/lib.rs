//! Dashboard tile sizing core
//!
//! Keeps one global tile height plus per-component overrides, previews slider
//! drags on the live document, commits releases with a transition bracket, and
//! persists the result as a JSON blob.

#![cfg_attr(not(feature = "web"), forbid(unsafe_code))]

pub mod clock;
pub mod config;
pub mod constants;
pub mod controller;
pub mod document;
pub mod logging;
pub mod panel;
pub mod persistence;
pub mod state;
pub mod storage;
pub mod timers;

#[cfg(feature = "web")]
pub mod web;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Preset, SizingConfig};
pub use controller::{Controller, PanelState};
pub use document::{ApplicationEngine, ApplyMode, MemoryDocument, StyleHost};
pub use panel::{NullPanel, Panel, PanelView};
pub use persistence::{PersistedPreferences, PreferenceStore};
pub use state::{ComponentId, SizingSnapshot, SizingState};
pub use storage::{FileStorage, MemoryStorage, Storage};
