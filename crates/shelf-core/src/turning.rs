//! Page-turning layout for chapters
//!
//! A chapter is read either by scrolling or one page at a time. The choice
//! is global and kept in the active store under `turning` (`"true"` when
//! on, absent otherwise). The page reached in each chapter is kept in the
//! durable store only, under `book_<id>_chapter_<n>_turning_position`;
//! constrained sessions always start a chapter on its first page.
//!
//! Splitting a chapter needs layout, so the host measures the blocks of
//! `#content`, groups them with [`split_pages`], wraps each group in a
//! `.pagination-page` and hands the page count to [`PageTurner::paginated`].

use std::ops::Range;
use std::rc::Rc;

use tracing::debug;

use crate::config::Config;
use crate::dom::{Document, Element};
use crate::location::{PageKind, PageLocation};
use crate::mode::{Mode, Session};
use crate::storage::KeyValueStore;

/// Class on `<body>` and the content container while turning pages
pub const TURNING_CLASS: &str = "pagination-mode";

pub const CONTENT_CONTAINER_SELECTOR: &str = ".content-container";

/// Element whose children are split into pages
pub const CONTENT_ID: &str = "content";

/// Class of the wrapper around each page's blocks
pub const PAGE_CLASS: &str = "pagination-page";

/// Class of the page currently shown
pub const CURRENT_PAGE_CLASS: &str = "active";

/// Controls that switch between scrolling and turning
pub const TOGGLE_IDS: [&str; 2] = ["togglePagination", "mobileTogglePagination"];

pub const INFO_ID: &str = "paginationInfo";
pub const CURRENT_PAGE_ID: &str = "currentPage";
pub const TOTAL_PAGES_ID: &str = "totalPages";
pub const PREV_PAGE_ID: &str = "prevPage";
pub const NEXT_PAGE_ID: &str = "nextPage";
pub const PAGE_JUMP_ID: &str = "pageJumpInput";
pub const GO_TO_PAGE_ID: &str = "goToPage";
pub const PROGRESS_BAR_ID: &str = "progressBar";

/// Page furniture hidden while turning pages
pub const HIDDEN_WHILE_TURNING: [&str; 5] = [
    ".custom-css-panel",
    ".breadcrumb",
    "footer",
    "#tocToggle",
    "#mobileTocBtn",
];

/// Vertical padding subtracted from the content height to get a page's capacity
pub const PAGE_PADDING: f64 = 150.0;

/// How a chapter is read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    #[default]
    Scrolling,
    Turning,
}

impl Layout {
    pub fn toggled(self) -> Layout {
        match self {
            Layout::Scrolling => Layout::Turning,
            Layout::Turning => Layout::Scrolling,
        }
    }
}

/// Group consecutive blocks into pages
///
/// A page is closed when the next block would overflow `capacity`; a block
/// taller than a page gets a page of its own. There is always at least one
/// page, empty when there are no blocks.
pub fn split_pages(heights: &[f64], capacity: f64) -> Vec<Range<usize>> {
    let mut pages = Vec::new();
    let mut start = 0;
    let mut filled = 0.0;

    for (index, height) in heights.iter().enumerate() {
        let height = if height.is_finite() { height.max(0.0) } else { 0.0 };
        if filled > 0.0 && filled + height > capacity {
            pages.push(start..index);
            start = index;
            filled = 0.0;
        }
        filled += height;
    }
    pages.push(start..heights.len());
    pages
}

/// Layout preference plus the page shown in a paginated chapter
pub struct PageTurner {
    preference: Rc<dyn KeyValueStore>,
    preference_key: String,
    progress: Option<Rc<dyn KeyValueStore>>,
    layout: Layout,
    current: usize,
    total: usize,
}

impl PageTurner {
    /// Read the layout preference from the active store
    pub fn load(session: &Session, config: &Config) -> Self {
        let preference = session.active();
        let layout = match preference.get(&config.turning_key) {
            Ok(Some(value)) if value == "true" => Layout::Turning,
            Ok(_) => Layout::Scrolling,
            Err(e) => {
                e.log_failure("Could not read layout preference");
                Layout::Scrolling
            }
        };
        let progress = match session.mode() {
            Mode::Standard => Some(session.durable()),
            Mode::Constrained => None,
        };

        Self {
            preference,
            preference_key: config.turning_key.clone(),
            progress,
            layout,
            current: 0,
            total: 0,
        }
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Page shown, once the chapter has been paginated
    pub fn current_page(&self) -> Option<usize> {
        (self.total > 0).then_some(self.current)
    }

    pub fn total_pages(&self) -> usize {
        self.total
    }

    /// Arrow keys turn pages in standard sessions only
    pub fn arrow_keys_enabled(&self) -> bool {
        self.layout == Layout::Turning && self.progress.is_some()
    }

    /// Persist a layout choice
    pub fn set_layout(&mut self, layout: Layout) -> bool {
        self.layout = layout;
        let written = match layout {
            Layout::Turning => self.preference.set(&self.preference_key, "true"),
            Layout::Scrolling => self.preference.delete(&self.preference_key),
        };
        match written {
            Ok(()) => true,
            Err(e) => {
                e.log_failure("Could not store layout preference");
                false
            }
        }
    }

    /// Mark the page as paginated and hide what a paged view leaves out
    pub fn render_turning<D: Document>(document: &D) {
        if let Some(body) = document.body() {
            body.add_class(TURNING_CLASS);
        }
        for container in document.select(CONTENT_CONTAINER_SELECTOR) {
            container.add_class(TURNING_CLASS);
        }
        for selector in HIDDEN_WHILE_TURNING {
            for element in document.select(selector) {
                element.set_hidden(true);
            }
        }
        if let Some(info) = document.element_by_id(INFO_ID) {
            info.set_style("display", "flex");
        }
    }

    /// Store key for a chapter page, `None` for other pages
    pub fn progress_key(location: &PageLocation) -> Option<String> {
        let book_id = location.book_id()?;
        match location.kind() {
            PageKind::Chapter(chapter) => {
                Some(format!("book_{}_{}_turning_position", book_id, chapter))
            }
            _ => None,
        }
    }

    /// The host split the chapter into `total` pages; show the first one to read
    ///
    /// Resumes at the stored page when it is still in range.
    pub fn paginated<D: Document>(
        &mut self,
        document: &D,
        location: &PageLocation,
        total: usize,
    ) -> usize {
        self.total = total.max(1);
        if let Some(jump) = document.element_by_id(PAGE_JUMP_ID) {
            jump.set_attribute("max", &self.total.to_string());
        }

        let start = self
            .restore(location)
            .filter(|page| *page < self.total)
            .unwrap_or(0);
        self.show(document, location, start);
        debug!("Paginated into {} pages, starting at {}", self.total, start);
        start
    }

    /// Show one page by index; `None` when out of range
    pub fn show<D: Document>(
        &mut self,
        document: &D,
        location: &PageLocation,
        index: usize,
    ) -> Option<usize> {
        if index >= self.total {
            return None;
        }
        self.current = index;

        for (i, page) in document.select(&format!(".{}", PAGE_CLASS)).iter().enumerate() {
            page.set_class(CURRENT_PAGE_CLASS, i == index);
        }

        let number = (index + 1).to_string();
        if let Some(current) = document.element_by_id(CURRENT_PAGE_ID) {
            current.set_text(&number);
        }
        if let Some(total) = document.element_by_id(TOTAL_PAGES_ID) {
            total.set_text(&self.total.to_string());
        }
        if let Some(jump) = document.element_by_id(PAGE_JUMP_ID) {
            jump.set_attribute("value", &number);
        }
        if let Some(bar) = document.element_by_id(PROGRESS_BAR_ID) {
            let progress = (index + 1) as f64 / self.total as f64 * 100.0;
            bar.set_style("width", &format!("{}%", progress));
        }
        set_disabled(document, PREV_PAGE_ID, index == 0);
        set_disabled(document, NEXT_PAGE_ID, index + 1 == self.total);

        self.save(location);
        Some(index)
    }

    pub fn next<D: Document>(&mut self, document: &D, location: &PageLocation) -> Option<usize> {
        self.show(document, location, self.current + 1)
    }

    pub fn previous<D: Document>(
        &mut self,
        document: &D,
        location: &PageLocation,
    ) -> Option<usize> {
        let index = self.current.checked_sub(1)?;
        self.show(document, location, index)
    }

    /// Jump to a page by its 1-based number
    pub fn jump<D: Document>(
        &mut self,
        document: &D,
        location: &PageLocation,
        number: usize,
    ) -> Option<usize> {
        let index = number.checked_sub(1)?;
        self.show(document, location, index)
    }

    fn restore(&self, location: &PageLocation) -> Option<usize> {
        let store = self.progress.as_ref()?;
        let key = Self::progress_key(location)?;
        let raw = match store.get(&key) {
            Ok(value) => value?,
            Err(e) => {
                e.log_failure(&format!("Could not read page {}", key));
                return None;
            }
        };
        let page = raw.trim().parse::<usize>().ok();
        if page.is_none() {
            debug!("Ignoring stored page {:?} for {}", raw, key);
        }
        page
    }

    fn save(&self, location: &PageLocation) {
        if self.layout != Layout::Turning {
            return;
        }
        let (Some(store), Some(key)) = (&self.progress, Self::progress_key(location)) else {
            return;
        };
        if let Err(e) = store.set(&key, &self.current.to_string()) {
            e.log_failure(&format!("Could not store page {}", key));
        }
    }
}

fn set_disabled<D: Document>(document: &D, id: &str, disabled: bool) {
    let Some(button) = document.element_by_id(id) else {
        return;
    };
    if disabled {
        button.set_attribute("disabled", "");
    } else {
        button.remove_attribute("disabled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::SnapshotDocument;
    use crate::storage::MemoryStore;

    const CHAPTER: &str = r#"<html><body>
        <nav class="breadcrumb"><a href="/index.html">Library</a></nav>
        <div class="content-container">
            <div id="content">
                <div class="pagination-page"><p>One</p></div>
                <div class="pagination-page"><p>Two</p></div>
                <div class="pagination-page"><p>Three</p></div>
            </div>
        </div>
        <div id="paginationInfo" style="display: none">
            <button id="prevPage">Prev</button>
            <span id="currentPage">1</span> / <span id="totalPages">1</span>
            <input type="number" id="pageJumpInput" min="1" max="1" value="1">
            <button id="nextPage">Next</button>
        </div>
        <div id="progressBar"></div>
        <footer>Shelf</footer>
    </body></html>"#;

    fn session(mode: Mode, durable: &Rc<MemoryStore>, transport: &Rc<MemoryStore>) -> Session {
        Session::with_mode(
            mode,
            Rc::clone(durable) as Rc<dyn KeyValueStore>,
            Rc::clone(transport) as Rc<dyn KeyValueStore>,
        )
    }

    fn chapter() -> PageLocation {
        PageLocation::new("/book/a1b2/chapter_7.html", "", &Config::default())
    }

    #[test]
    fn test_split_pages() {
        assert_eq!(split_pages(&[100.0, 100.0, 100.0], 250.0), vec![0..2, 2..3]);
        assert_eq!(split_pages(&[400.0, 50.0], 250.0), vec![0..1, 1..2]);
        assert_eq!(split_pages(&[0.0, 300.0, 10.0], 250.0), vec![0..2, 2..3]);
        assert_eq!(split_pages(&[], 250.0), vec![0..0]);
    }

    #[test]
    fn test_progress_key_shape() {
        assert_eq!(
            PageTurner::progress_key(&chapter()).as_deref(),
            Some("book_a1b2_chapter_7_turning_position")
        );
        let home = PageLocation::new("/book/a1b2/index.html", "", &Config::default());
        assert_eq!(PageTurner::progress_key(&home), None);
    }

    #[test]
    fn test_preference_follows_active_store() {
        let durable = Rc::new(MemoryStore::new());
        let transport = Rc::new(MemoryStore::new());
        let config = Config::default();

        let mut turner = PageTurner::load(&session(Mode::Constrained, &durable, &transport), &config);
        assert_eq!(turner.layout(), Layout::Scrolling);
        assert!(turner.set_layout(Layout::Turning));
        assert_eq!(transport.get("turning").unwrap().as_deref(), Some("true"));
        assert!(durable.is_empty());

        let turner = PageTurner::load(&session(Mode::Constrained, &durable, &transport), &config);
        assert_eq!(turner.layout(), Layout::Turning);
        assert!(!turner.arrow_keys_enabled());

        let mut turner = PageTurner::load(&session(Mode::Standard, &durable, &transport), &config);
        assert_eq!(turner.layout(), Layout::Scrolling);
        assert!(turner.set_layout(Layout::Turning));
        assert!(turner.set_layout(Layout::Scrolling));
        assert_eq!(durable.get("turning").unwrap(), None);
    }

    #[test]
    fn test_paginated_resumes_stored_page() {
        let durable = Rc::new(MemoryStore::with_entries([
            ("turning", "true"),
            ("book_a1b2_chapter_7_turning_position", "2"),
        ]));
        let transport = Rc::new(MemoryStore::new());
        let mut turner =
            PageTurner::load(&session(Mode::Standard, &durable, &transport), &Config::default());
        let doc = SnapshotDocument::parse(CHAPTER);

        assert_eq!(turner.paginated(&doc, &chapter(), 3), 2);
        assert_eq!(turner.current_page(), Some(2));

        let pages = doc.select(".pagination-page");
        assert!(!pages[0].has_class("active"));
        assert!(pages[2].has_class("active"));
        assert_eq!(doc.element_by_id("currentPage").unwrap().text(), "3");
        assert_eq!(doc.element_by_id("totalPages").unwrap().text(), "3");
        assert_eq!(
            doc.element_by_id("pageJumpInput").unwrap().attribute("max").as_deref(),
            Some("3")
        );
        assert_eq!(doc.element_by_id("progressBar").unwrap().style("width").as_deref(), Some("100%"));
        assert!(doc.element_by_id("nextPage").unwrap().attribute("disabled").is_some());
        assert!(doc.element_by_id("prevPage").unwrap().attribute("disabled").is_none());
    }

    #[test]
    fn test_out_of_range_page_starts_over() {
        let durable = Rc::new(MemoryStore::with_entries([
            ("turning", "true"),
            ("book_a1b2_chapter_7_turning_position", "9"),
        ]));
        let transport = Rc::new(MemoryStore::new());
        let mut turner =
            PageTurner::load(&session(Mode::Standard, &durable, &transport), &Config::default());
        let doc = SnapshotDocument::parse(CHAPTER);

        assert_eq!(turner.paginated(&doc, &chapter(), 3), 0);
        assert_eq!(
            durable.get("book_a1b2_chapter_7_turning_position").unwrap().as_deref(),
            Some("0")
        );
    }

    #[test]
    fn test_turning_saves_progress() {
        let durable = Rc::new(MemoryStore::with_entries([("turning", "true")]));
        let transport = Rc::new(MemoryStore::new());
        let mut turner =
            PageTurner::load(&session(Mode::Standard, &durable, &transport), &Config::default());
        let doc = SnapshotDocument::parse(CHAPTER);
        turner.paginated(&doc, &chapter(), 3);

        assert_eq!(turner.previous(&doc, &chapter()), None);
        assert_eq!(turner.next(&doc, &chapter()), Some(1));
        assert_eq!(turner.jump(&doc, &chapter(), 3), Some(2));
        assert_eq!(turner.next(&doc, &chapter()), None);
        assert_eq!(turner.jump(&doc, &chapter(), 0), None);
        assert_eq!(turner.jump(&doc, &chapter(), 4), None);
        assert_eq!(
            durable.get("book_a1b2_chapter_7_turning_position").unwrap().as_deref(),
            Some("2")
        );
    }

    #[test]
    fn test_constrained_never_stores_progress() {
        let durable = Rc::new(MemoryStore::with_entries([(
            "book_a1b2_chapter_7_turning_position",
            "2",
        )]));
        let transport = Rc::new(MemoryStore::with_entries([("turning", "true")]));
        let mut turner =
            PageTurner::load(&session(Mode::Constrained, &durable, &transport), &Config::default());
        let doc = SnapshotDocument::parse(CHAPTER);

        assert_eq!(turner.paginated(&doc, &chapter(), 3), 0);
        assert_eq!(turner.next(&doc, &chapter()), Some(1));
        assert_eq!(
            durable.get("book_a1b2_chapter_7_turning_position").unwrap().as_deref(),
            Some("2")
        );
        assert_eq!(transport.len(), 1);
    }

    #[test]
    fn test_render_turning() {
        let doc = SnapshotDocument::parse(CHAPTER);
        PageTurner::render_turning(&doc);

        assert!(doc.body().unwrap().has_class("pagination-mode"));
        assert!(doc.select(".content-container")[0].has_class("pagination-mode"));
        assert!(doc.select(".breadcrumb")[0].is_hidden());
        assert!(doc.select("footer")[0].is_hidden());
        assert_eq!(
            doc.element_by_id("paginationInfo").unwrap().style("display").as_deref(),
            Some("flex")
        );
    }
}
