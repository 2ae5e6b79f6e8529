//! The document collaborator
//!
//! The engine never touches elements directly. It names a [`Target`] set and
//! asks the host to rewrite one style property across it, so the same engine
//! drives a browser DOM or the in-memory model.

use std::time::Duration;

use crate::constants::{selectors, style};

/// Element sets the engine can address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    /// Elements with an inline `min-height`
    InlineMinHeight,
    /// Class `button`, or any class containing `button`
    ButtonLike,
    /// Class `item`
    Item,
    /// `item` elements inside `#sidebar`, or class `sidebar-item`
    SidebarItem,
}

impl Target {
    /// CSS selector equivalent of this set
    pub fn selector(self) -> &'static str {
        match self {
            Target::InlineMinHeight => selectors::INLINE_MIN_HEIGHT,
            Target::ButtonLike => selectors::BUTTON_LIKE,
            Target::Item => selectors::ITEM,
            Target::SidebarItem => selectors::SIDEBAR_ITEM,
        }
    }
}

/// Style properties the engine writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleProperty {
    MinHeight,
    Height,
}

impl StyleProperty {
    pub fn css_name(self) -> &'static str {
        match self {
            StyleProperty::MinHeight => style::MIN_HEIGHT,
            StyleProperty::Height => style::HEIGHT,
        }
    }
}

/// Which matched elements actually get rewritten
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteCondition {
    Always,
    /// Only if the property already has an inline value
    IfSet,
    /// Only if the current inline value is a pixel length
    IfPixels,
}

impl WriteCondition {
    /// Decide from the element's current inline value of the property
    pub fn allows(self, current: Option<&str>) -> bool {
        match self {
            WriteCondition::Always => true,
            WriteCondition::IfSet => current.is_some_and(|v| !v.is_empty()),
            WriteCondition::IfPixels => current.is_some_and(|v| v.contains(style::PX)),
        }
    }
}

pub trait StyleHost {
    /// Set a document-wide custom property, e.g. `--ha-fusion-item-height`
    fn set_variable(&mut self, name: &str, value: &str);

    /// Rewrite `property` to `value` on every element of `target` that passes
    /// `condition`. Returns the number of elements written.
    fn restyle(
        &mut self,
        target: Target,
        property: StyleProperty,
        value: &str,
        condition: WriteCondition,
    ) -> usize;

    /// Add `class` to every element of `target`. Returns the number of elements matched.
    fn add_class(&mut self, target: Target, class: &str) -> usize;

    /// Remove `class` from every element carrying it, whatever set it belongs to now.
    /// Removing an absent class is a no-op.
    fn remove_class_everywhere(&mut self, class: &str) -> usize;

    /// Arrange for `class` to be stripped from the whole document after `delay`
    /// using the host's own timers. Returns false when the host has none, in
    /// which case the caller keeps the removal queued itself.
    fn schedule_class_removal(&mut self, _class: &str, _delay: Duration) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_conditions() {
        assert!(WriteCondition::Always.allows(None));
        assert!(!WriteCondition::IfSet.allows(None));
        assert!(!WriteCondition::IfSet.allows(Some("")));
        assert!(WriteCondition::IfSet.allows(Some("3em")));
        assert!(WriteCondition::IfPixels.allows(Some("40px")));
        assert!(!WriteCondition::IfPixels.allows(Some("3em")));
        assert!(!WriteCondition::IfPixels.allows(None));
    }

    #[test]
    fn test_target_selectors() {
        assert_eq!(Target::Item.selector(), ".item");
        assert_eq!(Target::SidebarItem.selector(), "#sidebar .item, .sidebar-item");
        assert_eq!(StyleProperty::MinHeight.css_name(), "min-height");
    }
}
