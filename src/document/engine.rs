//! Projection of the sizing state onto the document
//!
//! Two modes:
//! - **Preview**: immediate write, no transition marker, nothing scheduled.
//!   Used for every drag tick.
//! - **Commit**: the transition marker is added to all candidate elements right
//!   before the write, and an independent cleanup stripping it from the whole
//!   document is scheduled `transition` later. Hosts with timers of their own
//!   run the cleanup themselves; otherwise it waits in the engine's queue until
//!   [`ApplicationEngine::run_due_cleanups`]. Cleanups are idempotent, so
//!   overlapping commits never need to cancel each other.
//!
//! The engine holds no sizing state of its own: the same inputs always produce
//! the same document.

use std::time::Duration;
use tracing::{debug, trace};

use super::host::{StyleHost, StyleProperty, Target, WriteCondition};
use crate::config::SizingConfig;
use crate::constants::style;
use crate::state::{ComponentId, SizingState};
use crate::timers::DeferredQueue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyMode {
    Preview,
    Commit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Rule {
    target: Target,
    property: StyleProperty,
    condition: WriteCondition,
}

/// Element rewrites performed for a global size change, in order
const GLOBAL_RULES: [Rule; 3] = [
    Rule {
        target: Target::InlineMinHeight,
        property: StyleProperty::MinHeight,
        condition: WriteCondition::IfPixels,
    },
    Rule {
        target: Target::ButtonLike,
        property: StyleProperty::MinHeight,
        condition: WriteCondition::IfSet,
    },
    Rule {
        target: Target::Item,
        property: StyleProperty::Height,
        condition: WriteCondition::IfPixels,
    },
];

/// Selector registry: which elements a component override rewrites, and how
fn component_rule(component: ComponentId) -> Rule {
    match component {
        ComponentId::Button => Rule {
            target: Target::ButtonLike,
            property: StyleProperty::MinHeight,
            condition: WriteCondition::Always,
        },
        ComponentId::Sidebar => Rule {
            target: Target::SidebarItem,
            property: StyleProperty::Height,
            condition: WriteCondition::Always,
        },
    }
}

/// Pixel length as written to the document, e.g. `61.35px`, `90px`
pub fn format_px(size: f64) -> String {
    format!("{size}{}", style::PX)
}

#[derive(Debug)]
pub struct ApplicationEngine {
    item_height_var: String,
    button_height_var: String,
    marker_class: String,
    transition: Duration,
    cleanups: DeferredQueue<()>,
}

impl ApplicationEngine {
    pub fn new(config: &SizingConfig) -> Self {
        Self {
            item_height_var: config.style_variable(style::ITEM_HEIGHT_VAR),
            button_height_var: config.style_variable(style::BUTTON_HEIGHT_VAR),
            marker_class: style::TRANSITION_CLASS.to_string(),
            transition: config.transition,
            cleanups: DeferredQueue::new(),
        }
    }

    /// Write the global size: both style variables, then the matched elements
    pub fn apply_global(
        &mut self,
        host: &mut dyn StyleHost,
        size: f64,
        mode: ApplyMode,
        now: Duration,
    ) -> usize {
        let value = format_px(size);
        let candidates: Vec<Target> = GLOBAL_RULES.iter().map(|r| r.target).collect();

        self.mark(host, &candidates, mode);
        host.set_variable(&self.item_height_var, &value);
        host.set_variable(&self.button_height_var, &value);
        let written = self.restyle_matched_elements(host, size);
        self.schedule_cleanup(host, mode, now);

        trace!(size, ?mode, written, "Applied global size");
        written
    }

    /// Rewrite pixel heights on every element the global size governs.
    /// Returns the number of element writes.
    pub fn restyle_matched_elements(&self, host: &mut dyn StyleHost, size: f64) -> usize {
        let value = format_px(size);
        GLOBAL_RULES
            .iter()
            .map(|rule| host.restyle(rule.target, rule.property, &value, rule.condition))
            .sum()
    }

    /// Apply an override for a panel-supplied component id.
    /// Unknown ids match no elements.
    pub fn apply_override(
        &mut self,
        host: &mut dyn StyleHost,
        component: &str,
        size: f64,
        mode: ApplyMode,
        now: Duration,
    ) -> usize {
        match ComponentId::parse(component) {
            Some(id) => self.apply_component(host, id, size, mode, now),
            None => {
                debug!(component = %component, "No elements for unknown component");
                0
            }
        }
    }

    pub fn apply_component(
        &mut self,
        host: &mut dyn StyleHost,
        component: ComponentId,
        size: f64,
        mode: ApplyMode,
        now: Duration,
    ) -> usize {
        let rule = component_rule(component);

        self.mark(host, &[rule.target], mode);
        let written = host.restyle(rule.target, rule.property, &format_px(size), rule.condition);
        self.schedule_cleanup(host, mode, now);

        trace!(%component, size, ?mode, written, "Applied component override");
        written
    }

    /// Global size first, then every override on top of it
    pub fn apply_all(
        &mut self,
        host: &mut dyn StyleHost,
        state: &SizingState,
        mode: ApplyMode,
        now: Duration,
    ) {
        self.apply_global(host, state.current_size(), mode, now);
        for (component, size) in state.component_overrides() {
            self.apply_component(host, *component, *size, mode, now);
        }
    }

    /// Run every queued cleanup whose time has come. Returns the number run.
    pub fn run_due_cleanups(&mut self, host: &mut dyn StyleHost, now: Duration) -> usize {
        let due = self.cleanups.take_due(now).len();
        for _ in 0..due {
            host.remove_class_everywhere(&self.marker_class);
        }
        due
    }

    pub fn pending_cleanups(&self) -> usize {
        self.cleanups.len()
    }

    pub fn next_cleanup_due(&self) -> Option<Duration> {
        self.cleanups.next_due()
    }

    fn mark(&self, host: &mut dyn StyleHost, targets: &[Target], mode: ApplyMode) {
        if mode == ApplyMode::Commit {
            for target in targets {
                host.add_class(*target, &self.marker_class);
            }
        }
    }

    fn schedule_cleanup(&mut self, host: &mut dyn StyleHost, mode: ApplyMode, now: Duration) {
        if mode != ApplyMode::Commit {
            return;
        }
        if !host.schedule_class_removal(&self.marker_class, self.transition) {
            self.cleanups.schedule(now + self.transition, ());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::memory::{Element, ElementId, MemoryDocument};

    const MARKER: &str = "size-transition";

    struct Fixture {
        doc: MemoryDocument,
        tile: ElementId,
        em_tile: ElementId,
        min_height_px: ElementId,
        button: ElementId,
        bare_button: ElementId,
        sidebar_item: ElementId,
        sidebar_class: ElementId,
    }

    fn fixture() -> Fixture {
        let mut doc = MemoryDocument::new();
        Fixture {
            tile: doc.push(Element::new().class("item").style("height", "61.35px")),
            em_tile: doc.push(Element::new().class("item").style("height", "4em")),
            min_height_px: doc.push(Element::new().class("card").style("min-height", "50px")),
            button: doc.push(Element::new().class("button").style("min-height", "2em")),
            bare_button: doc.push(Element::new().class("toggle-button")),
            sidebar_item: doc.push(Element::new().class("item").in_sidebar()),
            sidebar_class: doc.push(Element::new().class("sidebar-item").style("height", "20px")),
            doc,
        }
    }

    fn engine() -> ApplicationEngine {
        ApplicationEngine::new(&SizingConfig::default())
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_format_px() {
        assert_eq!(format_px(61.35), "61.35px");
        assert_eq!(format_px(90.0), "90px");
        assert_eq!(format_px(45.5), "45.5px");
    }

    #[test]
    fn test_apply_global_writes_variables_and_elements() {
        let mut f = fixture();
        let mut engine = engine();
        engine.apply_global(&mut f.doc, 80.0, ApplyMode::Preview, ms(0));

        assert_eq!(f.doc.variable("--ha-fusion-item-height"), Some("80px"));
        assert_eq!(f.doc.variable("--ha-fusion-button-height"), Some("80px"));
        assert_eq!(f.doc.element(f.tile).get_style("height"), Some("80px"));
        assert_eq!(f.doc.element(f.min_height_px).get_style("min-height"), Some("80px"));
        // button-like with min-height already set is rewritten regardless of unit
        assert_eq!(f.doc.element(f.button).get_style("min-height"), Some("80px"));
        // non-pixel heights and unset min-heights are left alone
        assert_eq!(f.doc.element(f.em_tile).get_style("height"), Some("4em"));
        assert_eq!(f.doc.element(f.bare_button).get_style("min-height"), None);
    }

    #[test]
    fn test_preview_never_marks_or_schedules() {
        let mut f = fixture();
        let mut engine = engine();
        for size in [40.0, 50.0, 60.0] {
            engine.apply_global(&mut f.doc, size, ApplyMode::Preview, ms(0));
            engine.apply_override(&mut f.doc, "sidebar", size, ApplyMode::Preview, ms(0));
        }
        assert!(f.doc.with_class(MARKER).is_empty());
        assert_eq!(engine.pending_cleanups(), 0);
    }

    #[test]
    fn test_commit_brackets_write_with_marker() {
        let mut f = fixture();
        let mut engine = engine();
        engine.apply_global(&mut f.doc, 90.0, ApplyMode::Commit, ms(1000));

        assert!(f.doc.element(f.tile).has_class(MARKER));
        assert!(f.doc.element(f.min_height_px).has_class(MARKER));
        assert!(f.doc.element(f.bare_button).has_class(MARKER));
        assert_eq!(engine.pending_cleanups(), 1);
        assert_eq!(engine.next_cleanup_due(), Some(ms(1300)));

        assert_eq!(engine.run_due_cleanups(&mut f.doc, ms(1299)), 0);
        assert!(f.doc.element(f.tile).has_class(MARKER));

        assert_eq!(engine.run_due_cleanups(&mut f.doc, ms(1300)), 1);
        assert!(f.doc.with_class(MARKER).is_empty());
    }

    #[test]
    fn test_overlapping_commits_clean_up_independently() {
        let mut f = fixture();
        let mut engine = engine();
        engine.apply_global(&mut f.doc, 70.0, ApplyMode::Commit, ms(0));
        engine.apply_global(&mut f.doc, 75.0, ApplyMode::Commit, ms(100));
        assert_eq!(engine.pending_cleanups(), 2);

        // first cleanup already strips the marker; the second is a harmless no-op
        engine.run_due_cleanups(&mut f.doc, ms(300));
        assert!(f.doc.with_class(MARKER).is_empty());
        engine.run_due_cleanups(&mut f.doc, ms(400));
        assert!(f.doc.with_class(MARKER).is_empty());
        assert_eq!(engine.pending_cleanups(), 0);
        assert_eq!(f.doc.element(f.tile).get_style("height"), Some("75px"));
    }

    #[test]
    fn test_cleanup_reaches_elements_that_left_their_set() {
        let mut f = fixture();
        let mut engine = engine();
        engine.apply_global(&mut f.doc, 90.0, ApplyMode::Commit, ms(0));
        assert!(f.doc.element(f.tile).has_class(MARKER));

        // tile stops being an `.item` while the transition runs
        f.doc.element_mut(f.tile).classes.retain(|c| c != "item");
        engine.run_due_cleanups(&mut f.doc, ms(300));
        assert!(!f.doc.element(f.tile).has_class(MARKER));
        assert!(f.doc.with_class(MARKER).is_empty());
    }

    /// Document whose host runs its own timers
    #[derive(Default)]
    struct TimedDocument {
        doc: MemoryDocument,
        timers: Vec<(String, Duration)>,
    }

    impl TimedDocument {
        fn fire_all(&mut self) {
            for (class, _) in std::mem::take(&mut self.timers) {
                self.doc.remove_class_everywhere(&class);
            }
        }
    }

    impl StyleHost for TimedDocument {
        fn set_variable(&mut self, name: &str, value: &str) {
            self.doc.set_variable(name, value);
        }

        fn restyle(
            &mut self,
            target: Target,
            property: StyleProperty,
            value: &str,
            condition: WriteCondition,
        ) -> usize {
            self.doc.restyle(target, property, value, condition)
        }

        fn add_class(&mut self, target: Target, class: &str) -> usize {
            self.doc.add_class(target, class)
        }

        fn remove_class_everywhere(&mut self, class: &str) -> usize {
            self.doc.remove_class_everywhere(class)
        }

        fn schedule_class_removal(&mut self, class: &str, delay: Duration) -> bool {
            self.timers.push((class.to_string(), delay));
            true
        }
    }

    #[test]
    fn test_host_timers_take_over_cleanup() {
        let mut host = TimedDocument::default();
        let tile = host.doc.push(Element::new().class("item").style("height", "40px"));
        let mut engine = engine();

        for i in 0..1000 {
            engine.apply_global(&mut host, 50.0 + (i % 50) as f64, ApplyMode::Commit, ms(i));
        }
        assert_eq!(engine.pending_cleanups(), 0);
        assert_eq!(host.timers.len(), 1000);
        assert!(host.timers.iter().all(|(c, d)| c == MARKER && *d == ms(300)));
        assert!(host.doc.element(tile).has_class(MARKER));

        host.fire_all();
        assert!(host.doc.with_class(MARKER).is_empty());
        assert_eq!(host.doc.element(tile).get_style("height"), Some("99px"));
    }

    #[test]
    fn test_apply_override_button_and_sidebar() {
        let mut f = fixture();
        let mut engine = engine();

        let buttons = engine.apply_override(&mut f.doc, "button", 55.0, ApplyMode::Preview, ms(0));
        assert_eq!(buttons, 2);
        assert_eq!(f.doc.element(f.bare_button).get_style("min-height"), Some("55px"));
        assert_eq!(f.doc.element(f.button).get_style("min-height"), Some("55px"));

        let sidebar = engine.apply_override(&mut f.doc, "sidebar", 42.0, ApplyMode::Preview, ms(0));
        assert_eq!(sidebar, 2);
        assert_eq!(f.doc.element(f.sidebar_item).get_style("height"), Some("42px"));
        assert_eq!(f.doc.element(f.sidebar_class).get_style("height"), Some("42px"));
        // main grid tiles untouched
        assert_eq!(f.doc.element(f.tile).get_style("height"), Some("61.35px"));
    }

    #[test]
    fn test_apply_override_unknown_component_touches_nothing() {
        let mut f = fixture();
        let before = f.doc.clone();
        let mut engine = engine();

        let written = engine.apply_override(&mut f.doc, "header", 99.0, ApplyMode::Commit, ms(0));
        assert_eq!(written, 0);
        assert_eq!(engine.pending_cleanups(), 0);
        assert_eq!(f.doc.element(f.tile), before.element(f.tile));
        assert_eq!(f.doc.element(f.button), before.element(f.button));
        assert!(f.doc.with_class(MARKER).is_empty());
    }

    #[test]
    fn test_apply_all_layers_overrides_over_global() {
        let mut f = fixture();
        let mut engine = engine();
        let mut state = SizingState::new(SizingConfig::default());
        state.set_global_size(100.0);
        state.set_override("button", 40.0);

        engine.apply_all(&mut f.doc, &state, ApplyMode::Commit, ms(0));
        assert_eq!(f.doc.element(f.tile).get_style("height"), Some("100px"));
        assert_eq!(f.doc.element(f.button).get_style("min-height"), Some("40px"));
        assert_eq!(f.doc.element(f.bare_button).get_style("min-height"), Some("40px"));
        assert_eq!(engine.pending_cleanups(), 2);
    }

    #[test]
    fn test_apply_all_is_idempotent() {
        let mut f = fixture();
        let mut engine = engine();
        let mut state = SizingState::new(SizingConfig::default());
        state.set_global_size(88.0);
        state.set_override("sidebar", 33.0);

        engine.apply_all(&mut f.doc, &state, ApplyMode::Preview, ms(0));
        let once = f.doc.clone();
        engine.apply_all(&mut f.doc, &state, ApplyMode::Preview, ms(0));

        for id in [f.tile, f.button, f.sidebar_item, f.sidebar_class, f.min_height_px] {
            assert_eq!(f.doc.element(id), once.element(id));
        }
    }
}
