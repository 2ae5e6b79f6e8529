//! In-memory document model
//!
//! A flat list of elements with classes, inline styles and a sidebar flag,
//! matched with the same rules the browser selectors express. Used for headless
//! runs and as the document in tests.

use std::collections::BTreeMap;

use super::host::{StyleHost, StyleProperty, Target, WriteCondition};
use crate::constants::selectors::{BUTTON_CLASS, ITEM_CLASS, SIDEBAR_ITEM_CLASS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(usize);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub classes: Vec<String>,
    pub style: BTreeMap<String, String>,
    /// Descendant of the `#sidebar` container
    pub in_sidebar: bool,
}

impl Element {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    pub fn style(mut self, property: &str, value: &str) -> Self {
        self.style.insert(property.to_string(), value.to_string());
        self
    }

    pub fn in_sidebar(mut self) -> Self {
        self.in_sidebar = true;
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn get_style(&self, property: &str) -> Option<&str> {
        self.style.get(property).map(String::as_str)
    }

    pub fn matches(&self, target: Target) -> bool {
        match target {
            Target::InlineMinHeight => self.style.contains_key(StyleProperty::MinHeight.css_name()),
            Target::ButtonLike => {
                self.has_class(BUTTON_CLASS) || self.classes.iter().any(|c| c.contains(BUTTON_CLASS))
            }
            Target::Item => self.has_class(ITEM_CLASS),
            Target::SidebarItem => {
                (self.in_sidebar && self.has_class(ITEM_CLASS)) || self.has_class(SIDEBAR_ITEM_CLASS)
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    elements: Vec<Element>,
    variables: BTreeMap<String, String>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, element: Element) -> ElementId {
        self.elements.push(element);
        ElementId(self.elements.len() - 1)
    }

    pub fn element(&self, id: ElementId) -> &Element {
        &self.elements[id.0]
    }

    pub fn element_mut(&mut self, id: ElementId) -> &mut Element {
        &mut self.elements[id.0]
    }

    pub fn variable(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(String::as_str)
    }

    /// Elements currently carrying `class`
    pub fn with_class(&self, class: &str) -> Vec<ElementId> {
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, el)| el.has_class(class))
            .map(|(i, _)| ElementId(i))
            .collect()
    }

    fn matching_mut(&mut self, target: Target) -> impl Iterator<Item = &mut Element> {
        self.elements.iter_mut().filter(move |el| el.matches(target))
    }
}

impl StyleHost for MemoryDocument {
    fn set_variable(&mut self, name: &str, value: &str) {
        self.variables.insert(name.to_string(), value.to_string());
    }

    fn restyle(
        &mut self,
        target: Target,
        property: StyleProperty,
        value: &str,
        condition: WriteCondition,
    ) -> usize {
        let name = property.css_name();
        let mut written = 0;
        for el in self.matching_mut(target) {
            if condition.allows(el.get_style(name)) {
                el.style.insert(name.to_string(), value.to_string());
                written += 1;
            }
        }
        written
    }

    fn add_class(&mut self, target: Target, class: &str) -> usize {
        let mut matched = 0;
        for el in self.matching_mut(target) {
            if !el.has_class(class) {
                el.classes.push(class.to_string());
            }
            matched += 1;
        }
        matched
    }

    fn remove_class_everywhere(&mut self, class: &str) -> usize {
        let mut removed = 0;
        for el in self.elements.iter_mut().filter(|el| el.has_class(class)) {
            el.classes.retain(|c| c != class);
            removed += 1;
        }
        removed
    }
}
