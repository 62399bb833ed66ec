//! Library index filtering
//!
//! The index page renders every book as a card and a tag cloud above them.
//! Two independent filters narrow the cards:
//!
//! - a text query, matched case-insensitively against title or author
//! - one selected tag, or the `All` sentinel
//!
//! A card is shown iff it passes both. Changing one filter never resets the
//! other.

use tracing::debug;

use crate::config::Config;
use crate::dom::{Document, Element, EventDisposition};

pub const CARD_SELECTOR: &str = ".book-card";
pub const TITLE_SELECTOR: &str = ".book-title";
pub const AUTHOR_SELECTOR: &str = ".book-author";
pub const CARD_TAG_SELECTOR: &str = ".book-tag";
pub const CARD_LINK_SELECTOR: &str = "a.book-link";
pub const CLOUD_TAG_SELECTOR: &str = ".tag-cloud-item";
pub const SEARCH_SELECTOR: &str = ".search-box";

/// Class marking the selected tag-cloud entry
pub const ACTIVE_CLASS: &str = "active";

/// One book as rendered on the index page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookEntry {
    pub title: String,
    pub author: String,
    pub tags: Vec<String>,
    pub link: Option<String>,
}

impl BookEntry {
    /// Read an entry from its card element
    pub fn from_card<E: Element>(card: &E) -> Self {
        let text_of = |selector: &str| {
            card.select(selector)
                .first()
                .map(|e| e.text().trim().to_string())
                .unwrap_or_default()
        };

        Self {
            title: text_of(TITLE_SELECTOR),
            author: text_of(AUTHOR_SELECTOR),
            tags: card
                .select(CARD_TAG_SELECTOR)
                .iter()
                .map(|tag| tag.text().trim().to_string())
                .filter(|tag| !tag.is_empty())
                .collect(),
            link: card
                .select(CARD_LINK_SELECTOR)
                .first()
                .and_then(|link| link.attribute("href")),
        }
    }

    /// Whether title or author contains the (already lowercased) query
    pub fn matches_query(&self, query: &str) -> bool {
        query.is_empty()
            || self.title.to_lowercase().contains(query)
            || self.author.to_lowercase().contains(query)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// The tag half of the filter
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TagFilter {
    #[default]
    All,
    Tag(String),
}

impl TagFilter {
    /// Interpret a tag label; the configured sentinel means every book
    pub fn from_label(label: &str, all_label: &str) -> Self {
        let label = label.trim();
        if label == all_label {
            TagFilter::All
        } else {
            TagFilter::Tag(label.to_string())
        }
    }

    pub fn matches(&self, entry: &BookEntry) -> bool {
        match self {
            TagFilter::All => true,
            TagFilter::Tag(tag) => entry.has_tag(tag),
        }
    }
}

/// Visibility rule: text predicate AND tag predicate
pub fn is_visible(entry: &BookEntry, query: &str, tag: &TagFilter) -> bool {
    entry.matches_query(&query.trim().to_lowercase()) && tag.matches(entry)
}

/// Filter state over the cards of one index page
pub struct LibraryFilter<E: Element> {
    cards: Vec<(E, BookEntry)>,
    cloud: Vec<(E, String)>,
    query: String,
    tag: TagFilter,
    all_label: String,
}

impl<E: Element> LibraryFilter<E> {
    /// Collect cards and tag cloud from the page
    pub fn from_document<D: Document<Element = E>>(document: &D, config: &Config) -> Self {
        let cards: Vec<_> = document
            .select(CARD_SELECTOR)
            .into_iter()
            .map(|card| {
                let entry = BookEntry::from_card(&card);
                (card, entry)
            })
            .collect();
        let cloud: Vec<_> = document
            .select(CLOUD_TAG_SELECTOR)
            .into_iter()
            .map(|item| {
                let label = item.text().trim().to_string();
                (item, label)
            })
            .collect();
        debug!("Library has {} books and {} cloud tags", cards.len(), cloud.len());

        Self {
            cards,
            cloud,
            query: String::new(),
            tag: TagFilter::All,
            all_label: config.all_tag_label.clone(),
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &BookEntry> {
        self.cards.iter().map(|(_, entry)| entry)
    }

    pub fn tag(&self) -> &TagFilter {
        &self.tag
    }

    /// Update the text query and re-filter; returns the visible count
    pub fn set_query(&mut self, query: &str) -> usize {
        self.query = query.trim().to_lowercase();
        self.refresh()
    }

    /// Select a tag (or the sentinel), mark it in the cloud, and re-filter
    pub fn select_tag(&mut self, label: &str) -> usize {
        self.tag = TagFilter::from_label(label, &self.all_label);
        self.mark_active(label.trim());
        self.refresh()
    }

    /// Click on a tag-cloud entry
    pub fn tag_cloud_click(&mut self, label: &str) -> EventDisposition {
        self.select_tag(label);
        EventDisposition::Default
    }

    /// Click on a tag shown inside a card: filter, don't follow the card link
    pub fn card_tag_click(&mut self, label: &str) -> EventDisposition {
        self.select_tag(label);
        EventDisposition::PreventDefault
    }

    /// Titles of the currently shown books, in page order
    pub fn visible_titles(&self) -> Vec<&str> {
        self.entries()
            .filter(|entry| self.shows(entry))
            .map(|entry| entry.title.as_str())
            .collect()
    }

    /// Re-evaluate every card; returns the visible count
    pub fn refresh(&self) -> usize {
        let mut visible = 0;
        for (card, entry) in &self.cards {
            let shown = self.shows(entry);
            card.set_hidden(!shown);
            visible += usize::from(shown);
        }
        debug!(
            "Filter query={:?} tag={:?}: {} of {} visible",
            self.query,
            self.tag,
            visible,
            self.cards.len()
        );
        visible
    }

    fn shows(&self, entry: &BookEntry) -> bool {
        entry.matches_query(&self.query) && self.tag.matches(entry)
    }

    fn mark_active(&self, label: &str) {
        for (item, _) in &self.cloud {
            item.remove_class(ACTIVE_CLASS);
        }
        if let Some((item, _)) = self.cloud.iter().find(|(_, l)| l == label) {
            item.add_class(ACTIVE_CLASS);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{SnapshotDocument, SnapshotElement};

    const INDEX: &str = r#"<html><body>
        <input type="text" class="search-box">
        <div class="tag-cloud">
            <div class="tag-cloud-item active">All</div>
            <div class="tag-cloud-item">romance</div>
            <div class="tag-cloud-item">scifi</div>
        </div>
        <div class="book-grid">
            <div class="book-card">
                <a href="/book/d1/index.html" class="book-link" id="d1">
                    <h3 class="book-title">Dune</h3>
                    <div class="book-author">Frank Herbert</div>
                    <div class="book-tags"><span class="book-tag">scifi</span></div>
                </a>
            </div>
            <div class="book-card">
                <a href="/book/e2/index.html" class="book-link" id="e2">
                    <h3 class="book-title">Emma</h3>
                    <div class="book-author">Jane Austen</div>
                    <div class="book-tags"><span class="book-tag">romance</span></div>
                </a>
            </div>
            <div class="book-card">
                <a href="/book/n3/index.html" class="book-link" id="n3">
                    <h3 class="book-title">Notes</h3>
                    <div class="book-author"></div>
                </a>
            </div>
        </div>
    </body></html>"#;

    fn filter() -> (SnapshotDocument, LibraryFilter<SnapshotElement>) {
        let doc = SnapshotDocument::parse(INDEX);
        let filter = LibraryFilter::from_document(&doc, &Config::default());
        (doc, filter)
    }

    fn active_cloud(doc: &SnapshotDocument) -> Vec<String> {
        doc.select(CLOUD_TAG_SELECTOR)
            .iter()
            .filter(|item| item.has_class(ACTIVE_CLASS))
            .map(|item| item.text())
            .collect()
    }

    #[test]
    fn test_reads_entries() {
        let (_doc, filter) = filter();
        let entries: Vec<_> = filter.entries().cloned().collect();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].title, "Dune");
        assert_eq!(entries[0].author, "Frank Herbert");
        assert_eq!(entries[0].tags, vec!["scifi"]);
        assert_eq!(entries[0].link.as_deref(), Some("/book/d1/index.html"));
        assert!(entries[2].tags.is_empty());
    }

    #[test]
    fn test_query_and_tag_intersect() {
        let (_doc, mut filter) = filter();

        assert_eq!(filter.set_query("e"), 3);
        assert_eq!(filter.visible_titles(), vec!["Dune", "Emma", "Notes"]);

        assert_eq!(filter.select_tag("scifi"), 1);
        assert_eq!(filter.visible_titles(), vec!["Dune"]);

        // Changing the query keeps the tag
        assert_eq!(filter.set_query("austen"), 0);
        assert_eq!(filter.select_tag("All"), 1);
        assert_eq!(filter.visible_titles(), vec!["Emma"]);
    }

    #[test]
    fn test_query_is_case_insensitive_and_trimmed() {
        let (doc, mut filter) = filter();
        assert_eq!(filter.set_query("  HERBERT "), 1);

        let cards = doc.select(CARD_SELECTOR);
        assert!(!cards[0].is_hidden());
        assert!(cards[1].is_hidden());
        assert!(cards[2].is_hidden());

        assert_eq!(filter.set_query(""), 3);
        assert!(cards.iter().all(|card| !card.is_hidden()));
    }

    #[test]
    fn test_query_does_not_match_tags() {
        let (_doc, mut filter) = filter();
        assert_eq!(filter.set_query("romance"), 0);
    }

    #[test]
    fn test_single_active_cloud_tag() {
        let (doc, mut filter) = filter();
        assert_eq!(active_cloud(&doc), vec!["All"]);

        filter.tag_cloud_click("romance");
        assert_eq!(active_cloud(&doc), vec!["romance"]);

        filter.tag_cloud_click("scifi");
        assert_eq!(active_cloud(&doc), vec!["scifi"]);
    }

    #[test]
    fn test_card_tag_click_prevents_navigation() {
        let (doc, mut filter) = filter();

        assert_eq!(filter.card_tag_click("romance"), EventDisposition::PreventDefault);
        assert_eq!(active_cloud(&doc), vec!["romance"]);
        assert_eq!(filter.visible_titles(), vec!["Emma"]);
        assert_eq!(filter.tag(), &TagFilter::Tag("romance".to_string()));
    }

    #[test]
    fn test_tag_missing_from_cloud() {
        let (doc, mut filter) = filter();
        assert_eq!(filter.select_tag("poetry"), 0);
        assert!(active_cloud(&doc).is_empty());
    }

    #[test]
    fn test_visibility_rule() {
        let dune = BookEntry {
            title: "Dune".to_string(),
            author: "Herbert".to_string(),
            tags: vec!["scifi".to_string()],
            link: None,
        };
        let emma = BookEntry {
            title: "Emma".to_string(),
            author: "Austen".to_string(),
            tags: vec!["romance".to_string()],
            link: None,
        };
        let scifi = TagFilter::Tag("scifi".to_string());

        assert!(is_visible(&dune, "e", &TagFilter::All));
        assert!(is_visible(&emma, "e", &TagFilter::All));
        assert!(is_visible(&dune, "e", &scifi));
        assert!(!is_visible(&emma, "e", &scifi));
        assert!(!is_visible(&dune, "x", &TagFilter::All));
    }

    #[test]
    fn test_tag_filter_from_label() {
        assert_eq!(TagFilter::from_label(" All ", "All"), TagFilter::All);
        assert_eq!(
            TagFilter::from_label("all", "All"),
            TagFilter::Tag("all".to_string())
        );
    }
}
