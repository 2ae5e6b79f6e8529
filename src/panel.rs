//! Panel collaborator
//!
//! The panel owns its own markup. The controller pushes it a [`PanelView`]
//! whenever displayed values change, and toggles visibility and notifications.

use serde::Serialize;

use crate::constants::sizing::SLIDER_STEP;
use crate::document::format_px;
use crate::state::{ComponentId, SizingState};

/// Which slider a live value belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slider {
    Global,
    Component(ComponentId),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideView {
    pub component: &'static str,
    pub size: f64,
    pub label: String,
    /// False when the component just inherits the global size
    pub overridden: bool,
}

/// Everything the panel displays, derived from the sizing state
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelView {
    pub visible: bool,
    pub slider_value: f64,
    pub slider_min: f64,
    pub slider_max: f64,
    pub slider_step: f64,
    pub numeric_value: String,
    pub size_label: String,
    pub active_preset: Option<String>,
    pub overrides: Vec<OverrideView>,
}

impl PanelView {
    pub fn from_state(state: &SizingState) -> Self {
        let size = state.current_size();
        let config = state.config();
        Self {
            visible: state.panel_visible(),
            slider_value: size,
            slider_min: config.min_size,
            slider_max: config.max_size,
            slider_step: SLIDER_STEP,
            numeric_value: size.to_string(),
            size_label: format_px(size),
            active_preset: state.nearest_preset_name(size).map(str::to_string),
            overrides: ComponentId::ALL
                .into_iter()
                .map(|component| {
                    let size = state.effective_size(component);
                    OverrideView {
                        component: component.as_str(),
                        size,
                        label: format_px(size),
                        overridden: state.component_overrides().contains_key(&component),
                    }
                })
                .collect(),
        }
    }
}

pub trait Panel {
    fn refresh(&mut self, view: &PanelView);

    fn set_visible(&mut self, visible: bool);

    /// A slider is being dragged; only its value label should follow
    fn live_value(&mut self, _slider: Slider, _size: f64) {}

    fn notify(&mut self, message: &str);

    fn dismiss_notification(&mut self) {}
}

/// Panel that displays nothing, for headless hosts
#[derive(Debug, Default)]
pub struct NullPanel;

impl Panel for NullPanel {
    fn refresh(&mut self, _view: &PanelView) {}

    fn set_visible(&mut self, _visible: bool) {}

    fn notify(&mut self, _message: &str) {}
}
