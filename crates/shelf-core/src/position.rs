//! Reading position tracking
//!
//! One entry per book, keyed by the book identifier, holding the fragment of
//! the last chapter visited (`#chapter_<n>`).
//!
//! - Chapter pages record their own fragment on load.
//! - The book home forgets the entry whenever it is loaded without a chapter
//!   fragment: landing there directly means "start over".
//! - The library index appends the stored fragment to each book link so that
//!   following it restores the reader to the remembered chapter.
//!
//! Stored fragments are not checked against the table of contents.

use std::rc::Rc;

use tracing::debug;

use crate::dom::{Document, Element};
use crate::location::PageLocation;
use crate::storage::KeyValueStore;

/// Book links on the library index; their `id` is the book identifier
pub const BOOK_LINK_SELECTOR: &str = "a.book-link";

/// Links from a chapter page back to its book home
pub const BOOK_HOME_LINK_SELECTOR: &str = "a.a-book-home";

/// Embedded book home (table of contents) on chapter pages
pub const BOOK_HOME_FRAME_ID: &str = "bookHomeIframe";

/// Reads and writes per-book reading positions in the active store
pub struct ReadingPositionTracker {
    store: Rc<dyn KeyValueStore>,
}

impl ReadingPositionTracker {
    pub fn new(store: Rc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Stored fragment for a book
    pub fn position(&self, book_id: &str) -> Option<String> {
        match self.store.get(book_id) {
            Ok(value) => value.filter(|fragment| !fragment.is_empty()),
            Err(e) => {
                e.log_failure(&format!("Could not read position for {}", book_id));
                None
            }
        }
    }

    /// Book home load: delete the position unless a chapter is being restored
    ///
    /// Returns whether a delete was issued.
    pub fn forget_unless_restoring(&self, location: &PageLocation) -> bool {
        let Some(book_id) = location.book_id() else {
            return false;
        };
        if location.has_chapter_fragment() {
            debug!("Restoring {} to {}", book_id, location.fragment());
            return false;
        }

        if let Err(e) = self.store.delete(book_id) {
            e.log_failure(&format!("Could not forget position for {}", book_id));
        }
        debug!("Forgot position for {}", book_id);
        true
    }

    /// Chapter page load: store this chapter and point the book home links
    /// and embedded frame at it
    ///
    /// Returns the recorded fragment.
    pub fn record_chapter_visit<D: Document>(
        &self,
        document: &D,
        location: &PageLocation,
    ) -> Option<String> {
        let book_id = location.book_id()?;
        let anchor = location.chapter_anchor()?;

        self.write(book_id, &anchor);
        for link in document.select(BOOK_HOME_LINK_SELECTOR) {
            if let Some(href) = link.attribute("href") {
                link.set_attribute("href", &with_fragment(&href, &anchor));
            }
        }
        if let Some(frame) = document.element_by_id(BOOK_HOME_FRAME_ID) {
            if let Some(src) = frame.attribute("src") {
                frame.set_attribute("src", &with_fragment(&src, &anchor));
            }
        }
        Some(anchor)
    }

    /// Navigation or unload: store the fragment if it names a chapter
    pub fn remember(&self, location: &PageLocation) -> bool {
        match location.book_id() {
            Some(book_id) if location.has_chapter_fragment() => {
                self.write(book_id, location.fragment());
                true
            }
            _ => false,
        }
    }

    /// Library index: append each book's stored fragment to its link
    ///
    /// Returns the number of links changed. Never writes to the store.
    pub fn decorate_library_links<D: Document>(&self, document: &D) -> usize {
        let mut decorated = 0;
        for link in document.select(BOOK_LINK_SELECTOR) {
            let Some(book_id) = link.attribute("id") else {
                continue;
            };
            let (Some(fragment), Some(href)) = (self.position(&book_id), link.attribute("href"))
            else {
                continue;
            };
            link.set_attribute("href", &with_fragment(&href, &fragment));
            decorated += 1;
        }
        debug!("Decorated {} book links with reading positions", decorated);
        decorated
    }

    fn write(&self, book_id: &str, fragment: &str) {
        if let Err(e) = self.store.set(book_id, fragment) {
            e.log_failure(&format!("Could not store position for {}", book_id));
        }
    }
}

/// Replace the fragment of `href` with `fragment`
fn with_fragment(href: &str, fragment: &str) -> String {
    let base = href.split_once('#').map_or(href, |(base, _)| base);
    format!("{}{}", base, fragment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::dom::SnapshotDocument;
    use crate::storage::MemoryStore;

    fn tracker(store: &Rc<MemoryStore>) -> ReadingPositionTracker {
        ReadingPositionTracker::new(Rc::clone(store) as Rc<dyn KeyValueStore>)
    }

    fn loc(path: &str, fragment: &str) -> PageLocation {
        PageLocation::new(path, fragment, &Config::default())
    }

    #[test]
    fn test_plain_book_home_forgets() {
        let store = Rc::new(MemoryStore::with_entries([("a1b2", "#chapter_3")]));
        let tracker = tracker(&store);

        assert!(tracker.forget_unless_restoring(&loc("/book/a1b2/index.html", "")));
        assert_eq!(tracker.position("a1b2"), None);
    }

    #[test]
    fn test_non_chapter_fragment_forgets() {
        let store = Rc::new(MemoryStore::with_entries([("a1b2", "#chapter_3")]));
        let tracker = tracker(&store);

        assert!(tracker.forget_unless_restoring(&loc("/book/a1b2/index.html", "#toc")));
        assert_eq!(tracker.position("a1b2"), None);
    }

    #[test]
    fn test_chapter_fragment_keeps_position() {
        let store = Rc::new(MemoryStore::with_entries([("a1b2", "#chapter_3")]));
        let tracker = tracker(&store);

        assert!(!tracker.forget_unless_restoring(&loc("/book/a1b2/index.html", "#chapter_7")));
        assert_eq!(tracker.position("a1b2").as_deref(), Some("#chapter_3"));
    }

    #[test]
    fn test_missing_book_id_is_noop() {
        let store = Rc::new(MemoryStore::with_entries([("a1b2", "#chapter_3")]));
        let tracker = tracker(&store);

        assert!(!tracker.forget_unless_restoring(&loc("/index.html", "")));
        assert!(!tracker.remember(&loc("/index.html", "#chapter_1")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remember_only_chapter_fragments() {
        let store = Rc::new(MemoryStore::new());
        let tracker = tracker(&store);

        assert!(!tracker.remember(&loc("/book/a1b2/index.html", "#top")));
        assert!(store.is_empty());

        assert!(tracker.remember(&loc("/book/a1b2/index.html", "#chapter_2")));
        assert_eq!(tracker.position("a1b2").as_deref(), Some("#chapter_2"));
    }

    #[test]
    fn test_record_chapter_visit() {
        let store = Rc::new(MemoryStore::new());
        let tracker = tracker(&store);
        let doc = SnapshotDocument::parse(
            r#"<html><body>
                <a href="/book/a1b2/index.html" class="a-book-home">Dune</a>
                <iframe id="bookHomeIframe" src="/book/a1b2/index.html"></iframe>
            </body></html>"#,
        );

        let recorded = tracker.record_chapter_visit(&doc, &loc("/book/a1b2/chapter_5.html", ""));
        assert_eq!(recorded.as_deref(), Some("#chapter_5"));
        assert_eq!(tracker.position("a1b2").as_deref(), Some("#chapter_5"));
        assert_eq!(
            doc.select("a.a-book-home")[0].attribute("href").as_deref(),
            Some("/book/a1b2/index.html#chapter_5")
        );
        assert_eq!(
            doc.element_by_id("bookHomeIframe").unwrap().attribute("src").as_deref(),
            Some("/book/a1b2/index.html#chapter_5")
        );
    }

    #[test]
    fn test_bare_chapter_prefix_keeps_position() {
        let store = Rc::new(MemoryStore::with_entries([("a1b2", "#chapter_3")]));
        let tracker = tracker(&store);

        assert!(!tracker.forget_unless_restoring(&loc("/book/a1b2/index.html", "#chapter_")));
        assert_eq!(tracker.position("a1b2").as_deref(), Some("#chapter_3"));
    }

    #[test]
    fn test_decorate_library_links() {
        let store = Rc::new(MemoryStore::with_entries([("a1b2", "#chapter_3")]));
        let tracker = tracker(&store);
        let doc = SnapshotDocument::parse(
            r#"<html><body>
                <a href="/book/a1b2/index.html" class="book-link" id="a1b2">Dune</a>
                <a href="/book/c3d4/index.html" class="book-link" id="c3d4">Emma</a>
            </body></html>"#,
        );

        assert_eq!(tracker.decorate_library_links(&doc), 1);
        let links = doc.select("a.book-link");
        assert_eq!(
            links[0].attribute("href").as_deref(),
            Some("/book/a1b2/index.html#chapter_3")
        );
        assert_eq!(links[1].attribute("href").as_deref(), Some("/book/c3d4/index.html"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_with_fragment_replaces_existing() {
        assert_eq!(with_fragment("/book/x/index.html", "#chapter_1"), "/book/x/index.html#chapter_1");
        assert_eq!(
            with_fragment("/book/x/index.html#chapter_1", "#chapter_2"),
            "/book/x/index.html#chapter_2"
        );
    }

    #[test]
    fn test_unavailable_store_degrades() {
        let tracker = ReadingPositionTracker::new(Rc::new(MemoryStore::unavailable()));
        assert_eq!(tracker.position("a1b2"), None);
        assert!(tracker.forget_unless_restoring(&loc("/book/a1b2/", "")));
        assert!(tracker.remember(&loc("/book/a1b2/", "#chapter_1")));
    }
}
