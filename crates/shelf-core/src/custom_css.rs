//! Reader-written style sheets
//!
//! Each book may carry its own CSS (`custom_css_<book id>`), and one shared
//! sheet (`custom_css_default`) covers every book without its own. Both live
//! in the durable store; constrained sessions have no custom CSS at all and
//! the editing panel is hidden.
//!
//! The active sheet is a single `<style id="custom-user-css">` in `<head>`,
//! replaced on every apply.

use std::rc::Rc;

use tracing::debug;

use crate::dom::{Document, Element};
use crate::location::PageLocation;
use crate::mode::{Mode, Session};
use crate::storage::KeyValueStore;

/// Id of the injected `<style>` element
pub const STYLE_ELEMENT_ID: &str = "custom-user-css";

/// Key of the sheet shared by every book
pub const DEFAULT_KEY: &str = "custom_css_default";

/// Editing panel, hidden in constrained mode
pub const PANEL_SELECTOR: &str = ".custom-css-panel";

pub const PANEL_TOGGLE_ID: &str = "cssPanelToggle";
pub const PANEL_CONTENT_ID: &str = "cssPanelContent";
pub const INPUT_ID: &str = "customCssInput";
pub const SAVE_ID: &str = "saveCssBtn";
pub const SAVE_DEFAULT_ID: &str = "saveAsDefaultBtn";
pub const LOAD_DEFAULT_ID: &str = "loadDefaultBtn";
pub const RESET_ID: &str = "resetCssBtn";
pub const PREVIEW_ID: &str = "previewCssBtn";

/// Per-book and default custom CSS
pub struct CustomCss {
    store: Option<Rc<dyn KeyValueStore>>,
    book_key: Option<String>,
}

impl CustomCss {
    pub fn new(session: &Session, location: &PageLocation) -> Self {
        let store = match session.mode() {
            Mode::Standard => Some(session.durable()),
            Mode::Constrained => None,
        };
        Self {
            store,
            book_key: location.book_id().map(Self::key),
        }
    }

    /// Store key for one book's sheet
    pub fn key(book_id: &str) -> String {
        format!("custom_css_{}", book_id)
    }

    /// Whether custom CSS is kept in this session
    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// The book's own sheet, else the default sheet
    pub fn load(&self) -> Option<String> {
        self.book_key
            .as_deref()
            .and_then(|key| self.read(key))
            .or_else(|| self.stored_default())
    }

    pub fn stored_default(&self) -> Option<String> {
        self.read(DEFAULT_KEY)
    }

    /// Store a sheet for this book
    pub fn save(&self, css: &str) -> bool {
        match &self.book_key {
            Some(key) => self.write(key, css),
            None => false,
        }
    }

    /// Store the sheet shared by every book
    pub fn save_as_default(&self, css: &str) -> bool {
        self.write(DEFAULT_KEY, css)
    }

    /// Drop this book's sheet
    ///
    /// Returns the default sheet, which takes over.
    pub fn reset(&self) -> Option<String> {
        let (Some(store), Some(key)) = (&self.store, &self.book_key) else {
            return None;
        };
        if let Err(e) = store.delete(key) {
            e.log_failure(&format!("Could not delete {}", key));
        }
        self.stored_default()
    }

    /// Replace the injected sheet; blank CSS removes it
    pub fn apply<D: Document>(document: &D, css: &str) {
        document.set_style_sheet(STYLE_ELEMENT_ID, Some(css));
        debug!("Applied {} bytes of custom CSS", css.trim().len());
    }

    /// Hide the editing panel
    pub fn hide_panel<D: Document>(document: &D) {
        for panel in document.select(PANEL_SELECTOR) {
            panel.set_hidden(true);
        }
    }

    fn read(&self, key: &str) -> Option<String> {
        let store = self.store.as_ref()?;
        match store.get(key) {
            Ok(value) => value.filter(|css| !css.is_empty()),
            Err(e) => {
                e.log_failure(&format!("Could not read {}", key));
                None
            }
        }
    }

    fn write(&self, key: &str, css: &str) -> bool {
        let Some(store) = &self.store else {
            return false;
        };
        match store.set(key, css) {
            Ok(()) => true,
            Err(e) => {
                e.log_failure(&format!("Could not store {}", key));
                false
            }
        }
    }
}
