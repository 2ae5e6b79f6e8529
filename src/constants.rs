//! Application-wide constants
//!
//! This module contains all magic numbers and string literals used throughout
//! the crate, providing a single source of truth for constant values.

/// Size bounds and defaults (pixels)
pub mod sizing {
    /// Tile height used when nothing has been saved yet
    pub const DEFAULT_SIZE: f64 = 61.35;

    /// Smallest height a tile can be set to
    pub const MIN_SIZE: f64 = 30.0;

    /// Largest height a tile can be set to
    pub const MAX_SIZE: f64 = 150.0;

    /// Slider granularity
    pub const SLIDER_STEP: f64 = 0.5;

    /// Maximum distance between a size and a preset for the preset to count as active
    pub const PRESET_TOLERANCE: f64 = 0.1;
}

/// Built-in presets, in display order
pub mod presets {
    pub const SMALL: (&str, f64) = ("small", 45.0);
    pub const MEDIUM: (&str, f64) = ("medium", 61.35);
    pub const LARGE: (&str, f64) = ("large", 80.0);
    pub const XL: (&str, f64) = ("xl", 100.0);

    pub const ALL: [(&str, f64); 4] = [SMALL, MEDIUM, LARGE, XL];
}

/// Timing of deferred work
pub mod timing {
    /// How long the transition marker stays on restyled elements
    pub const TRANSITION_MS: u64 = 300;

    /// How long the "saved" confirmation stays visible
    pub const NOTIFICATION_MS: u64 = 3000;
}

/// Style names written into the document
pub mod style {
    /// Suffix of the item height variable (`--<namespace>-item-height`)
    pub const ITEM_HEIGHT_VAR: &str = "item-height";

    /// Suffix of the button height variable (`--<namespace>-button-height`)
    pub const BUTTON_HEIGHT_VAR: &str = "button-height";

    /// Class added to elements for the duration of a committed transition
    pub const TRANSITION_CLASS: &str = "size-transition";

    pub const MIN_HEIGHT: &str = "min-height";
    pub const HEIGHT: &str = "height";

    /// Unit suffix for every written length
    pub const PX: &str = "px";
}

/// Class names and CSS selectors identifying restyle targets
pub mod selectors {
    pub const ITEM_CLASS: &str = "item";
    pub const BUTTON_CLASS: &str = "button";
    pub const SIDEBAR_ITEM_CLASS: &str = "sidebar-item";
    pub const SIDEBAR_ID: &str = "sidebar";

    pub const INLINE_MIN_HEIGHT: &str = "[style*=\"min-height\"]";
    pub const BUTTON_LIKE: &str = ".button, [class*=\"button\"]";
    pub const ITEM: &str = ".item";
    pub const SIDEBAR_ITEM: &str = "#sidebar .item, .sidebar-item";
}

/// Preference storage naming
pub mod storage {
    /// Namespace used for the storage key and style variables
    pub const DEFAULT_NAMESPACE: &str = "ha-fusion";

    /// Appended to the namespace to form the storage key
    pub const KEY_SUFFIX: &str = "-size-preferences";

    /// Directory under the user config dir used by the file backend
    pub const APP_DIR: &str = "tile-sizer";

    pub const FILE_EXTENSION: &str = "json";
}

/// Environment variables read at startup
pub mod env {
    pub const LOG_LEVEL: &str = "LOG_LEVEL";
    pub const NAMESPACE: &str = "TILE_SIZER_NAMESPACE";
    pub const TRANSITION_MS: &str = "TILE_SIZER_TRANSITION_MS";
    pub const NOTIFICATION_MS: &str = "TILE_SIZER_NOTIFICATION_MS";
}

/// User-facing messages
pub mod messages {
    pub const SAVED: &str = "Size preferences saved successfully!";
}
