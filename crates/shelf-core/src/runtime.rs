//! Page runtime
//!
//! One boot sequence for every generated page, specialized by [`PageKind`]:
//!
//! 1. the session's mode is shown on `<body>`
//! 2. root-relative resources get the deployment prefix
//! 3. theme and font are applied
//! 4. page-kind work: link decoration and filter setup on the index,
//!    position reset on the book home; on chapters, visit recording, custom
//!    CSS, and either the page-turning layout or scroll restore
//!
//! After boot the host forwards user events to the handler methods.

use tracing::{debug, info};

use crate::config::Config;
use crate::custom_css::CustomCss;
use crate::dom::{Document, EventDisposition};
use crate::library::LibraryFilter;
use crate::location::{PageKind, PageLocation};
use crate::mode::{render_mode, Mode, Session};
use crate::paths::BasePath;
use crate::position::ReadingPositionTracker;
use crate::scroll::ScrollMemory;
use crate::storage::StorageResult;
use crate::theme::{FontPreference, Theme, ThemeController};
use crate::turning::{Layout, PageTurner};

/// Everything one loaded page needs to respond to the reader
pub struct PageRuntime<D: Document> {
    document: D,
    location: PageLocation,
    config: Config,
    session: Session,
    base_path: BasePath,
    theme: ThemeController,
    font: FontPreference,
    positions: ReadingPositionTracker,
    scroll: ScrollMemory,
    library: Option<LibraryFilter<D::Element>>,
    custom_css: Option<CustomCss>,
    turner: Option<PageTurner>,
    restored_scroll: Option<f64>,
}

impl<D: Document> PageRuntime<D> {
    /// Run the page-load sequence
    pub fn boot(document: D, location: PageLocation, session: Session, config: Config) -> Self {
        let mode = session.mode();
        render_mode(&document, mode);

        let base_path = BasePath::from_path(location.path(), &config);
        base_path.apply(&document);

        let theme = ThemeController::load(session.active(), &config);
        theme.apply(&document);
        let font = FontPreference::load(session.active().as_ref(), &config);
        font.apply(&document);

        let positions = ReadingPositionTracker::new(session.active());
        let scroll = ScrollMemory::new(&session);
        let mut library = None;
        let mut custom_css = None;
        let mut turner = None;
        let mut restored_scroll = None;

        match location.kind() {
            PageKind::Library => {
                positions.decorate_library_links(&document);
                library = Some(LibraryFilter::from_document(&document, &config));
            }
            PageKind::BookHome => {
                positions.forget_unless_restoring(&location);
            }
            PageKind::Chapter(_) => {
                positions.record_chapter_visit(&document, &location);

                let css = CustomCss::new(&session, &location);
                match css.load() {
                    Some(sheet) => CustomCss::apply(&document, &sheet),
                    None if !css.is_enabled() => CustomCss::hide_panel(&document),
                    None => {}
                }
                custom_css = Some(css);

                let pages = PageTurner::load(&session, &config);
                match pages.layout() {
                    Layout::Turning => PageTurner::render_turning(&document),
                    Layout::Scrolling => restored_scroll = scroll.restore(&location),
                }
                turner = Some(pages);
            }
        }

        info!(
            "Booted {:?} page (mode {:?}, prefix {}, theme {})",
            location.kind(),
            mode,
            base_path.as_str(),
            theme.theme()
        );

        Self {
            document,
            location,
            config,
            session,
            base_path,
            theme,
            font,
            positions,
            scroll,
            library,
            custom_css,
            turner,
            restored_scroll,
        }
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    pub fn location(&self) -> &PageLocation {
        &self.location
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn mode(&self) -> Mode {
        self.session.mode()
    }

    pub fn base_path(&self) -> &BasePath {
        &self.base_path
    }

    pub fn theme(&self) -> Theme {
        self.theme.theme()
    }

    pub fn font(&self) -> &FontPreference {
        &self.font
    }

    /// Library filter, present on the index page only
    pub fn library(&self) -> Option<&LibraryFilter<D::Element>> {
        self.library.as_ref()
    }

    /// Offset the host should scroll to after boot
    pub fn restored_scroll(&self) -> Option<f64> {
        self.restored_scroll
    }

    /// Chapter layout; always scrolling outside chapters
    pub fn layout(&self) -> Layout {
        self.turner
            .as_ref()
            .map_or(Layout::Scrolling, PageTurner::layout)
    }

    /// Page state, present on chapter pages only
    pub fn pages(&self) -> Option<&PageTurner> {
        self.turner.as_ref()
    }

    /// Custom CSS the editor starts with
    pub fn custom_css_text(&self) -> Option<String> {
        self.custom_css.as_ref().and_then(CustomCss::load)
    }

    /// Theme toggle clicked
    pub fn toggle_theme(&mut self) -> Theme {
        self.theme.toggle(&self.document)
    }

    /// Search box edited; returns the number of visible books
    pub fn search_input(&mut self, query: &str) -> usize {
        match self.library.as_mut() {
            Some(library) => library.set_query(query),
            None => 0,
        }
    }

    /// Tag-cloud entry clicked
    pub fn tag_cloud_click(&mut self, tag: &str) -> EventDisposition {
        match self.library.as_mut() {
            Some(library) => library.tag_cloud_click(tag),
            None => EventDisposition::Default,
        }
    }

    /// Tag inside a book card clicked
    pub fn card_tag_click(&mut self, tag: &str) -> EventDisposition {
        match self.library.as_mut() {
            Some(library) => library.card_tag_click(tag),
            None => EventDisposition::Default,
        }
    }

    /// Fragment changed or the page is being left
    pub fn navigated(&mut self, location: PageLocation) -> bool {
        self.location = location;
        self.positions.remember(&self.location)
    }

    /// Window scrolled (chapter pages)
    pub fn scrolled(&self, offset: f64) -> bool {
        if self.layout() == Layout::Turning {
            return false;
        }
        self.scroll.save(&self.location, offset)
    }

    /// Layout toggle clicked; returns the new layout
    ///
    /// Entering the turning layout restyles the page, and the host then
    /// paginates it. Leaving it needs a reload, which the host does.
    pub fn toggle_layout(&mut self) -> Option<Layout> {
        let turner = self.turner.as_mut()?;
        let layout = turner.layout().toggled();
        turner.set_layout(layout);
        if layout == Layout::Turning {
            PageTurner::render_turning(&self.document);
        }
        debug!("Layout toggled to {:?}", layout);
        Some(layout)
    }

    /// Host split the chapter into `total` pages; returns the page shown
    pub fn paginated(&mut self, total: usize) -> Option<usize> {
        let turner = self.turner.as_mut()?;
        Some(turner.paginated(&self.document, &self.location, total))
    }

    /// Next or previous page; `None` at either end
    pub fn turn_page(&mut self, forward: bool) -> Option<usize> {
        let turner = self.turner.as_mut()?;
        if forward {
            turner.next(&self.document, &self.location)
        } else {
            turner.previous(&self.document, &self.location)
        }
    }

    /// Page number typed into the jump box
    pub fn jump_to_page(&mut self, number: usize) -> Option<usize> {
        let turner = self.turner.as_mut()?;
        turner.jump(&self.document, &self.location, number)
    }

    /// Save this book's CSS and apply it
    pub fn save_custom_css(&self, css: &str) -> bool {
        let Some(custom_css) = self.editable_css() else {
            return false;
        };
        let saved = custom_css.save(css);
        CustomCss::apply(&self.document, css);
        saved
    }

    /// Save the CSS shared by books without their own
    pub fn save_default_css(&self, css: &str) -> bool {
        self.editable_css()
            .is_some_and(|custom_css| custom_css.save_as_default(css))
    }

    /// Apply the shared CSS; `None` when there is none
    pub fn load_default_css(&self) -> Option<String> {
        let css = self.editable_css()?.stored_default()?;
        CustomCss::apply(&self.document, &css);
        Some(css)
    }

    /// Drop this book's CSS and fall back to the shared CSS, if any
    pub fn reset_custom_css(&self) -> Option<String> {
        let css = self.editable_css()?.reset();
        CustomCss::apply(&self.document, css.as_deref().unwrap_or_default());
        css
    }

    /// Apply CSS without saving it
    pub fn preview_custom_css(&self, css: &str) {
        if self.editable_css().is_some() {
            CustomCss::apply(&self.document, css);
        }
    }

    fn editable_css(&self) -> Option<&CustomCss> {
        self.custom_css.as_ref().filter(|custom_css| custom_css.is_enabled())
    }

    /// Mode switch control activated; the host reloads on success
    pub fn switch_mode(&self, target: Mode) -> StorageResult<()> {
        debug!("Mode switch requested: {:?} -> {:?}", self.mode(), target);
        self.session.switch_to(target, &self.config)
    }
}
