//! DOM glue
//!
//! Every lookup is checked; a missing element is reported once and then
//! skipped so a trimmed-down page still runs.

use std::cell::RefCell;
use std::collections::HashSet;

use web_sys::{Document, Element};

/// CSS class used to hide panels
const HIDDEN: &str = "hidden";

/// Thin wrapper over the page document
pub struct Dom {
    document: Document,
    reported: RefCell<HashSet<String>>,
}

impl Dom {
    /// Wrap the current window's document
    pub fn new() -> Option<Self> {
        let document = web_sys::window()?.document()?;
        Some(Self {
            document,
            reported: RefCell::new(HashSet::new()),
        })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Element by id, warning the first time it is missing
    pub fn element(&self, id: &str) -> Option<Element> {
        let el = self.document.get_element_by_id(id);
        if el.is_none() && self.reported.borrow_mut().insert(id.to_string()) {
            log::warn!("Element #{} not found; skipping", id);
        }
        el
    }

    /// Replace an element's text if it changed
    pub fn set_text(&self, id: &str, text: &str) {
        if let Some(el) = self.element(id) {
            if el.text_content().as_deref() != Some(text) {
                el.set_text_content(Some(text));
            }
        }
    }

    /// Show or hide an element via the `hidden` class
    pub fn set_visible(&self, id: &str, visible: bool) {
        if let Some(el) = self.element(id) {
            let _ = el.class_list().toggle_with_force(HIDDEN, !visible);
        }
    }

    /// Add or remove an arbitrary class
    pub fn set_class(&self, id: &str, class: &str, on: bool) {
        if let Some(el) = self.element(id) {
            let _ = el.class_list().toggle_with_force(class, on);
        }
    }

    /// Flip visibility, returning whether the element is now shown
    pub fn toggle_visible(&self, id: &str) -> bool {
        let Some(el) = self.element(id) else {
            return false;
        };
        match el.class_list().toggle(HIDDEN) {
            Ok(hidden) => !hidden,
            Err(_) => false,
        }
    }

    /// Blocking confirm dialog; a failed dialog counts as cancel
    pub fn confirm(&self, message: &str) -> bool {
        web_sys::window()
            .and_then(|w| w.confirm_with_message(message).ok())
            .unwrap_or(false)
    }
}
