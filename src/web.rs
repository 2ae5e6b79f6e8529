//! Browser host via wasm-bindgen.
//!
//! This module is only compiled when the `web` feature is enabled.
//!
//! # JavaScript Example
//!
//! ```javascript
//! import init, { tile_sizer_init, SizeCustomizer } from './tile_sizer.js';
//!
//! await init();
//! tile_sizer_init("warn");
//!
//! const sizer = new SizeCustomizer("ha-fusion", {
//!   refresh: view => render(view),
//!   setVisible: visible => panel.classList.toggle('visible', visible),
//!   liveValue: (slider, size) => label(slider).textContent = `${size}px`,
//!   notify: message => showToast(message),
//!   dismissNotification: () => hideToast(),
//! });
//! slider.addEventListener('input', e => sizer.onSliderInput(parseFloat(e.target.value)));
//! slider.addEventListener('change', e => sizer.onSliderCommitted(parseFloat(e.target.value)));
//! ```
//!
//! Transition marker cleanups and notification dismissal run on `setTimeout`,
//! so the page never has to call `tick()`.

use anyhow::{anyhow, Context, Result};
use js_sys::Function;
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;
use tracing::{warn, Level};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::HtmlElement;

use crate::clock::Clock;
use crate::config::SizingConfig;
use crate::controller::{Controller, PanelState};
use crate::document::{StyleHost, StyleProperty, Target, WriteCondition};
use crate::logging;
use crate::panel::{Panel, PanelView, Slider};
use crate::storage::{MemoryStorage, Storage};

fn js_error(err: JsValue) -> anyhow::Error {
    anyhow!("{err:?}")
}

/// Run `callback` once after `delay` via `window.setTimeout`
fn set_timeout(callback: impl FnOnce() + 'static, delay: Duration) -> Result<()> {
    let window = web_sys::window().context("No window available")?;
    let callback = Closure::once_into_js(callback);
    let delay = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
    window
        .set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), delay)
        .map_err(js_error)?;
    Ok(())
}

/// Strip `class` from every element in `document` that carries it
fn strip_class(document: &web_sys::Document, class: &str) -> usize {
    let list = match document.query_selector_all(&format!(".{class}")) {
        Ok(list) => list,
        Err(e) => {
            warn!(class = %class, error = ?e, "Class query failed");
            return 0;
        }
    };
    (0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|node| node.dyn_into::<web_sys::Element>().ok())
        .filter(|el| el.class_list().remove_1(class).is_ok())
        .count()
}

/// The live page document
pub struct WebDocument {
    document: web_sys::Document,
}

impl WebDocument {
    pub fn new() -> Result<Self> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .context("No document available")?;
        Ok(Self { document })
    }

    fn elements(&self, target: Target) -> Vec<HtmlElement> {
        let list = match self.document.query_selector_all(target.selector()) {
            Ok(list) => list,
            Err(e) => {
                warn!(selector = target.selector(), error = ?e, "Selector query failed");
                return Vec::new();
            }
        };
        (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|node| node.dyn_into::<HtmlElement>().ok())
            .collect()
    }
}

impl StyleHost for WebDocument {
    fn set_variable(&mut self, name: &str, value: &str) {
        let Some(root) = self
            .document
            .document_element()
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
        else {
            warn!(variable = %name, "No root element to set style variable on");
            return;
        };
        if let Err(e) = root.style().set_property(name, value) {
            warn!(variable = %name, error = ?e, "Failed to set style variable");
        }
    }

    fn restyle(
        &mut self,
        target: Target,
        property: StyleProperty,
        value: &str,
        condition: WriteCondition,
    ) -> usize {
        let name = property.css_name();
        self.elements(target)
            .into_iter()
            .filter(|el| {
                let current = el
                    .style()
                    .get_property_value(name)
                    .ok()
                    .filter(|v| !v.is_empty());
                condition.allows(current.as_deref())
            })
            .filter(|el| el.style().set_property(name, value).is_ok())
            .count()
    }

    fn add_class(&mut self, target: Target, class: &str) -> usize {
        self.elements(target)
            .into_iter()
            .filter(|el| el.class_list().add_1(class).is_ok())
            .count()
    }

    fn remove_class_everywhere(&mut self, class: &str) -> usize {
        strip_class(&self.document, class)
    }

    fn schedule_class_removal(&mut self, class: &str, delay: Duration) -> bool {
        let document = self.document.clone();
        let class = class.to_string();
        let cleanup = move || {
            strip_class(&document, &class);
        };
        match set_timeout(cleanup, delay) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = ?e, "Falling back to queued marker cleanup");
                false
            }
        }
    }
}

/// `window.localStorage`
pub struct LocalStorage {
    storage: web_sys::Storage,
}

impl LocalStorage {
    pub fn new() -> Result<Self> {
        let storage = web_sys::window()
            .context("No window available")?
            .local_storage()
            .map_err(js_error)?
            .context("localStorage is disabled")?;
        Ok(Self { storage })
    }
}

impl Storage for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.storage.get_item(key).map_err(js_error)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.storage.set_item(key, value).map_err(js_error)
    }
}

/// Milliseconds from `Date.now()`, relative to construction
pub struct WebClock {
    origin_ms: f64,
}

impl WebClock {
    pub fn new() -> Self {
        Self {
            origin_ms: js_sys::Date::now(),
        }
    }
}

impl Default for WebClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for WebClock {
    fn now(&self) -> Duration {
        let elapsed = (js_sys::Date::now() - self.origin_ms).max(0.0);
        Duration::from_millis(elapsed as u64)
    }
}

/// Panel callbacks supplied by the page script
///
/// Every hook is optional. Missing hooks are skipped and hooks that throw are logged.
pub struct JsPanel {
    refresh: Option<Function>,
    set_visible: Option<Function>,
    live_value: Option<Function>,
    notify: Option<Function>,
    dismiss: Option<Function>,
    notification: Duration,
    /// Bumped on every notification so a stale timer never hides a newer one
    shown: Rc<Cell<u64>>,
}

impl JsPanel {
    pub fn new(callbacks: &JsValue, notification: Duration) -> Self {
        let hook = |name: &str| {
            js_sys::Reflect::get(callbacks, &JsValue::from_str(name))
                .ok()
                .and_then(|f| f.dyn_into::<Function>().ok())
        };
        Self {
            refresh: hook("refresh"),
            set_visible: hook("setVisible"),
            live_value: hook("liveValue"),
            notify: hook("notify"),
            dismiss: hook("dismissNotification"),
            notification,
            shown: Rc::new(Cell::new(0)),
        }
    }

    fn call(hook: &Option<Function>, name: &str, args: &[JsValue]) {
        let Some(f) = hook else {
            return;
        };
        let result = match args {
            [] => f.call0(&JsValue::NULL),
            [a] => f.call1(&JsValue::NULL, a),
            [a, b, ..] => f.call2(&JsValue::NULL, a, b),
        };
        if let Err(e) = result {
            warn!(hook = %name, error = ?e, "Panel callback failed");
        }
    }
}

impl Panel for JsPanel {
    fn refresh(&mut self, view: &PanelView) {
        let view = match serde_json::to_string(view)
            .map_err(anyhow::Error::from)
            .and_then(|json| js_sys::JSON::parse(&json).map_err(js_error))
        {
            Ok(view) => view,
            Err(e) => {
                warn!(error = ?e, "Failed to convert panel view");
                return;
            }
        };
        Self::call(&self.refresh, "refresh", &[view]);
    }

    fn set_visible(&mut self, visible: bool) {
        Self::call(&self.set_visible, "setVisible", &[JsValue::from_bool(visible)]);
    }

    fn live_value(&mut self, slider: Slider, size: f64) {
        let slider = match slider {
            Slider::Global => "global",
            Slider::Component(id) => id.as_str(),
        };
        Self::call(
            &self.live_value,
            "liveValue",
            &[JsValue::from_str(slider), JsValue::from_f64(size)],
        );
    }

    fn notify(&mut self, message: &str) {
        let generation = self.shown.get() + 1;
        self.shown.set(generation);
        Self::call(&self.notify, "notify", &[JsValue::from_str(message)]);

        let shown = Rc::clone(&self.shown);
        let dismiss = self.dismiss.clone();
        let timer = set_timeout(
            move || {
                if shown.get() == generation {
                    shown.set(0);
                    Self::call(&dismiss, "dismissNotification", &[]);
                }
            },
            self.notification,
        );
        if let Err(e) = timer {
            warn!(error = ?e, "Notification will stay until the next tick");
        }
    }

    fn dismiss_notification(&mut self) {
        if self.shown.get() != 0 {
            self.shown.set(0);
            Self::call(&self.dismiss, "dismissNotification", &[]);
        }
    }
}

fn log_level(level: Level) -> log::Level {
    match level {
        Level::TRACE => log::Level::Trace,
        Level::DEBUG => log::Level::Debug,
        Level::INFO => log::Level::Info,
        Level::WARN => log::Level::Warn,
        Level::ERROR => log::Level::Error,
    }
}

/// Call once before constructing a [`SizeCustomizer`]. Routes panics and log
/// output (at `level`, default `warn`) to the browser console.
#[wasm_bindgen]
pub fn tile_sizer_init(level: Option<String>) {
    console_error_panic_hook::set_once();
    let level = level.as_deref().map_or(Level::WARN, logging::parse_level);
    console_log::init_with_level(log_level(level)).ok();
}

/// Sizing core exposed to the page's panel script
#[wasm_bindgen]
pub struct SizeCustomizer {
    controller: Controller<WebDocument>,
}

#[wasm_bindgen]
impl SizeCustomizer {
    /// `callbacks` is an object with optional `refresh`, `setVisible`,
    /// `liveValue`, `notify` and `dismissNotification` functions
    #[wasm_bindgen(constructor)]
    pub fn new(namespace: Option<String>, callbacks: JsValue) -> Result<SizeCustomizer, JsValue> {
        let mut config = SizingConfig::default();
        if let Some(namespace) = namespace {
            config.namespace = namespace;
        }
        config
            .validate()
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        let document = WebDocument::new().map_err(|e| JsValue::from_str(&e.to_string()))?;
        let storage: Box<dyn Storage> = match LocalStorage::new() {
            Ok(storage) => Box::new(storage),
            Err(e) => {
                warn!(error = ?e, "localStorage unavailable, preferences will not persist");
                Box::new(MemoryStorage::new())
            }
        };

        let panel = JsPanel::new(&callbacks, config.notification);
        Ok(SizeCustomizer {
            controller: Controller::start(
                config,
                document,
                storage,
                Box::new(panel),
                Box::new(WebClock::new()),
            ),
        })
    }

    #[wasm_bindgen(js_name = onPresetSelected)]
    pub fn on_preset_selected(&mut self, size: f64) {
        self.controller.on_preset_selected(size);
    }

    #[wasm_bindgen(js_name = onPresetNamed)]
    pub fn on_preset_named(&mut self, name: &str) {
        self.controller.on_preset_named(name);
    }

    #[wasm_bindgen(js_name = onSliderInput)]
    pub fn on_slider_input(&mut self, size: f64) {
        self.controller.on_slider_input(size);
    }

    #[wasm_bindgen(js_name = onSliderCommitted)]
    pub fn on_slider_committed(&mut self, size: f64) {
        self.controller.on_slider_committed(size);
    }

    #[wasm_bindgen(js_name = onNumericCommitted)]
    pub fn on_numeric_committed(&mut self, raw: &str) {
        self.controller.on_numeric_committed(raw);
    }

    #[wasm_bindgen(js_name = onOverrideInput)]
    pub fn on_override_input(&mut self, component: &str, size: f64) {
        self.controller.on_override_input(component, size);
    }

    #[wasm_bindgen(js_name = onOverrideCommitted)]
    pub fn on_override_committed(&mut self, component: &str, size: f64) {
        self.controller.on_override_committed(component, size);
    }

    #[wasm_bindgen(js_name = onReset)]
    pub fn on_reset(&mut self) {
        self.controller.on_reset();
    }

    #[wasm_bindgen(js_name = onApply)]
    pub fn on_apply(&mut self) {
        self.controller.on_apply();
    }

    #[wasm_bindgen(js_name = onToggleRequested)]
    pub fn on_toggle_requested(&mut self) {
        self.controller.on_toggle_requested();
    }

    #[wasm_bindgen(js_name = onCloseRequested)]
    pub fn on_close_requested(&mut self) {
        self.controller.on_close_requested();
    }

    /// Panel values as JSON
    #[wasm_bindgen(js_name = refreshDisplay)]
    pub fn refresh_display(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.controller.refresh_display())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn visible(&self) -> bool {
        self.controller.panel_state() == PanelState::Visible
    }

    pub fn notification(&mut self) -> Option<String> {
        self.controller.tick();
        self.controller.notification().map(str::to_string)
    }

    /// Run queued work now. Only needed when `setTimeout` is unavailable.
    pub fn tick(&mut self) {
        self.controller.tick();
    }
}
