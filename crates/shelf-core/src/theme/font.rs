//! Font preference (read-only)
//!
//! Written by other surfaces; this runtime only applies it on load.

use crate::config::Config;
use crate::dom::{Document, Element};
use crate::storage::KeyValueStore;

/// Family value that defers to the custom font string
pub const CUSTOM_FAMILY: &str = "custom";

/// The font family to show, resolved from the active store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontPreference {
    family: String,
}

impl FontPreference {
    /// Resolve the preference
    ///
    /// - absent family: the configured default stack
    /// - `custom`: the stored custom string verbatim (default stack if absent)
    /// - anything else: used as-is
    pub fn load(store: &dyn KeyValueStore, config: &Config) -> Self {
        let read = |key: &str| match store.get(key) {
            Ok(value) => value.filter(|v| !v.trim().is_empty()),
            Err(e) => {
                e.log_failure(&format!("Could not read {}", key));
                None
            }
        };

        let family = match read(&config.font_family_key) {
            Some(family) if family == CUSTOM_FAMILY => read(&config.font_family_input_key),
            other => other,
        }
        .unwrap_or_else(|| config.default_font_stack.clone());

        Self { family }
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    /// Set `font-family` on `<body>`
    pub fn apply<D: Document>(&self, document: &D) {
        if let Some(body) = document.body() {
            body.set_style("font-family", &self.family);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SYSTEM_FONT_STACK;
    use crate::dom::SnapshotDocument;
    use crate::storage::MemoryStore;

    #[test]
    fn test_default_stack() {
        let font = FontPreference::load(&MemoryStore::new(), &Config::default());
        assert_eq!(font.family(), SYSTEM_FONT_STACK);
    }

    #[test]
    fn test_named_family() {
        let store = MemoryStore::with_entries([("font_family", "Georgia, serif")]);
        let font = FontPreference::load(&store, &Config::default());
        assert_eq!(font.family(), "Georgia, serif");
    }

    #[test]
    fn test_custom_family() {
        let store = MemoryStore::with_entries([
            ("font_family", "custom"),
            ("font_family_input", "\"LXGW WenKai\", serif"),
        ]);
        let font = FontPreference::load(&store, &Config::default());
        assert_eq!(font.family(), "\"LXGW WenKai\", serif");
    }

    #[test]
    fn test_custom_without_input_falls_back() {
        let store = MemoryStore::with_entries([("font_family", "custom")]);
        let font = FontPreference::load(&store, &Config::default());
        assert_eq!(font.family(), SYSTEM_FONT_STACK);
    }

    #[test]
    fn test_apply_sets_body_style() {
        let doc = SnapshotDocument::parse("<html><body></body></html>");
        let store = MemoryStore::with_entries([("font_family", "Georgia")]);
        FontPreference::load(&store, &Config::default()).apply(&doc);
        assert_eq!(doc.body().unwrap().style("font-family").as_deref(), Some("Georgia"));
    }
}
