//! Document abstraction
//!
//! Components never touch a concrete DOM. They work against [`Document`] and
//! [`Element`], implemented by the browser bindings (`shelf-web`) and by
//! [`SnapshotDocument`], a parsed HTML page with a mutable overlay.
//!
//! Mutations are infallible from the caller's side: a binding that fails to
//! apply one logs it and carries on.

pub mod snapshot;

pub use snapshot::{SnapshotDocument, SnapshotElement};

/// What the host should do with the event that triggered a handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDisposition {
    /// Let the browser run its default action
    Default,
    /// Call `preventDefault()` (e.g. don't follow the enclosing link)
    PreventDefault,
}

/// One element of a page
pub trait Element: Clone {
    fn attribute(&self, name: &str) -> Option<String>;
    fn set_attribute(&self, name: &str, value: &str);
    fn remove_attribute(&self, name: &str);

    fn has_class(&self, class: &str) -> bool;
    fn add_class(&self, class: &str);
    fn remove_class(&self, class: &str);

    /// Text content, whitespace as in the markup
    fn text(&self) -> String;

    /// Replace the element's children with a text node
    fn set_text(&self, text: &str);

    /// Show or hide the element (`display: none`)
    fn set_hidden(&self, hidden: bool);

    /// Set one inline style property
    fn set_style(&self, property: &str, value: &str);

    /// Descendants matching a CSS selector, in document order
    fn select(&self, selector: &str) -> Vec<Self>;

    /// Add or remove a class
    fn set_class(&self, class: &str, present: bool) {
        if present {
            self.add_class(class);
        } else {
            self.remove_class(class);
        }
    }
}

/// A loaded page
pub trait Document {
    type Element: Element;

    fn body(&self) -> Option<Self::Element>;

    fn element_by_id(&self, id: &str) -> Option<Self::Element>;

    /// Elements matching a CSS selector, in document order
    fn select(&self, selector: &str) -> Vec<Self::Element>;

    /// Replace the `<style>` element with this id in `<head>`
    ///
    /// `None` or blank CSS only removes the existing element.
    fn set_style_sheet(&self, id: &str, css: Option<&str>);
}
