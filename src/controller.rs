//! Interaction controller
//!
//! Turns panel callbacks into sizing state changes and engine calls.
//! Drag events (`on_*_input`) only preview; release events commit.
//! Every commit applies to the document before it is persisted, so a failing
//! store never holds back the visual update.

use std::time::Duration;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::config::SizingConfig;
use crate::constants::messages;
use crate::document::{ApplicationEngine, ApplyMode, StyleHost};
use crate::panel::{Panel, PanelView, Slider};
use crate::persistence::PreferenceStore;
use crate::state::{ComponentId, SizingState};
use crate::storage::Storage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelState {
    Hidden,
    Visible,
}

#[derive(Debug, Clone, PartialEq)]
struct Notice {
    message: String,
    dismiss_at: Duration,
}

pub struct Controller<H: StyleHost> {
    state: SizingState,
    engine: ApplicationEngine,
    store: PreferenceStore,
    host: H,
    panel: Box<dyn Panel>,
    clock: Box<dyn Clock>,
    notice: Option<Notice>,
}

impl<H: StyleHost> Controller<H> {
    /// Restore saved preferences (or defaults) and apply them to the document.
    /// The panel starts hidden.
    pub fn start(
        config: SizingConfig,
        host: H,
        storage: Box<dyn Storage>,
        panel: Box<dyn Panel>,
        clock: Box<dyn Clock>,
    ) -> Self {
        let store = PreferenceStore::new(storage, config.storage_key());
        let engine = ApplicationEngine::new(&config);
        let state = match store.load() {
            Some(prefs) => SizingState::from_preferences(config, &prefs),
            None => SizingState::new(config),
        };

        let mut controller = Self {
            state,
            engine,
            store,
            host,
            panel,
            clock,
            notice: None,
        };
        controller.apply_committed();
        info!(
            current_size = controller.state.current_size(),
            overrides = controller.state.component_overrides().len(),
            "Size customizer started"
        );
        controller
    }

    pub fn state(&self) -> &SizingState {
        &self.state
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn store(&self) -> &PreferenceStore {
        &self.store
    }

    pub fn panel_state(&self) -> PanelState {
        if self.state.panel_visible() {
            PanelState::Visible
        } else {
            PanelState::Hidden
        }
    }

    /// Message of the confirmation currently on screen, if any
    pub fn notification(&self) -> Option<&str> {
        self.notice.as_ref().map(|n| n.message.as_str())
    }

    pub fn pending_cleanups(&self) -> usize {
        self.engine.pending_cleanups()
    }

    /// Current values for the panel controls
    pub fn refresh_display(&self) -> PanelView {
        PanelView::from_state(&self.state)
    }

    pub fn on_toggle_requested(&mut self) {
        match self.panel_state() {
            PanelState::Hidden => self.show_panel(),
            PanelState::Visible => self.hide_panel(),
        }
    }

    /// Close button, Escape, or a click outside the panel
    pub fn on_close_requested(&mut self) {
        if self.panel_state() == PanelState::Visible {
            self.hide_panel();
        }
    }

    pub fn on_preset_selected(&mut self, size: f64) {
        self.commit_size(size);
    }

    /// Commit a preset by name; unknown names are ignored
    pub fn on_preset_named(&mut self, name: &str) {
        match self.state.config().preset(name).map(|p| p.size) {
            Some(size) => self.commit_size(size),
            None => debug!(preset = %name, "Ignoring unknown preset"),
        }
    }

    /// Slider drag tick: preview only, the state is left untouched
    pub fn on_slider_input(&mut self, size: f64) {
        if !size.is_finite() {
            debug!(size, "Ignoring non-finite slider value");
            return;
        }
        let now = self.clock.now();
        self.engine
            .apply_global(&mut self.host, size, ApplyMode::Preview, now);
        self.panel.live_value(Slider::Global, size);
    }

    pub fn on_slider_committed(&mut self, size: f64) {
        self.commit_size(size);
    }

    /// Numeric field commit. The leading number is taken and clamped; text
    /// that does not start with one is ignored.
    pub fn on_numeric_committed(&mut self, raw: &str) {
        match parse_leading_number(raw) {
            Some(size) if size.is_finite() => {
                let size = self.state.clamp(size);
                self.commit_size(size);
            }
            _ => debug!(input = %raw, "Ignoring non-numeric size input"),
        }
    }

    /// Override slider drag tick: preview only
    pub fn on_override_input(&mut self, component: &str, size: f64) {
        if !size.is_finite() {
            debug!(component = %component, size, "Ignoring non-finite override value");
            return;
        }
        let now = self.clock.now();
        self.engine
            .apply_override(&mut self.host, component, size, ApplyMode::Preview, now);
        if let Some(id) = ComponentId::parse(component) {
            self.panel.live_value(Slider::Component(id), size);
        }
    }

    /// Override slider release: record and persist. The preview write already
    /// put the value on screen, so nothing is re-applied.
    pub fn on_override_committed(&mut self, component: &str, size: f64) {
        if !size.is_finite() {
            debug!(component = %component, size, "Ignoring non-finite override value");
            return;
        }
        if self.state.set_override(component, size) {
            info!(component = %component, size = self.state.clamp(size), "Committed component override");
            self.store.save(&self.state);
        }
    }

    pub fn on_reset(&mut self) {
        self.state.reset();
        info!(size = self.state.current_size(), "Reset sizes to default");
        self.apply_committed();
        let view = self.refresh_display();
        self.panel.refresh(&view);
        self.store.save(&self.state);
    }

    /// Persist, close the panel, and confirm
    pub fn on_apply(&mut self) {
        self.store.save(&self.state);
        self.hide_panel();

        let dismiss_at = self.clock.now() + self.state.config().notification;
        self.panel.notify(messages::SAVED);
        self.notice = Some(Notice {
            message: messages::SAVED.to_string(),
            dismiss_at,
        });
    }

    /// Run deferred work that has come due: transition marker cleanups and
    /// notification dismissal. Hosts call this from their event loop.
    pub fn tick(&mut self) {
        let now = self.clock.now();
        self.engine.run_due_cleanups(&mut self.host, now);

        if self.notice.as_ref().is_some_and(|n| n.dismiss_at <= now) {
            self.notice = None;
            self.panel.dismiss_notification();
        }
    }

    fn show_panel(&mut self) {
        self.state.set_panel_visible(true);
        self.panel.set_visible(true);
        let view = self.refresh_display();
        self.panel.refresh(&view);
    }

    fn hide_panel(&mut self) {
        self.state.set_panel_visible(false);
        self.panel.set_visible(false);
    }

    fn commit_size(&mut self, size: f64) {
        self.state.set_global_size(size);
        info!(size = self.state.current_size(), "Committed global size");
        self.apply_committed();
        let view = self.refresh_display();
        self.panel.refresh(&view);
        self.store.save(&self.state);
    }

    fn apply_committed(&mut self) {
        let now = self.clock.now();
        self.engine.run_due_cleanups(&mut self.host, now);
        self.engine
            .apply_all(&mut self.host, &self.state, ApplyMode::Commit, now);
    }
}

/// Leading decimal number of `raw`, ignoring whatever follows it
/// (`"12px"` reads as 12, `" 7.5 rem"` as 7.5)
fn parse_leading_number(raw: &str) -> Option<f64> {
    let text = raw.trim_start();
    let bytes = text.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let int_end = digits_from(end);
    let mut mantissa_digits = int_end - end;
    end = int_end;
    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        mantissa_digits += frac_end - end - 1;
        end = frac_end;
    }
    if mantissa_digits == 0 {
        return None;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }
    text[..end].parse().ok()
}
