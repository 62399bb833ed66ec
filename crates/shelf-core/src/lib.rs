//! Shelf Core Library
//!
//! Reading-state runtime for a statically served e-book collection. Each
//! generated page (library index, book home, chapter) boots a
//! [`PageRuntime`] that remembers where the reader left off, keeps their
//! theme and custom CSS, filters the library, turns chapters into pages on
//! request, and fixes resource paths when the site lives under a URL prefix.
//!
//! # Architecture
//!
//! - **Storage**: one [`KeyValueStore`] trait, a durable store and a
//!   cookie-backed transport store
//! - **Session**: the storage [`Mode`], detected once per page load
//! - **Document**: a minimal DOM abstraction, implemented for the browser in
//!   `shelf-web` and for parsed HTML by [`SnapshotDocument`]
//!
//! # Quick Start
//!
//! ```text
//! let config = Config::default();
//! let session = Session::new(durable, transport, &config);
//! let location = PageLocation::parse("/book/a1b2/chapter_3.html", &config);
//! let mut runtime = PageRuntime::boot(document, location, session, config);
//!
//! runtime.toggle_theme();
//! ```
//!
//! # Modules
//!
//! - `runtime`: page boot sequence and event handlers (main entry point)
//! - `storage`: key-value stores and their errors
//! - `mode`: storage mode detection and switching
//! - `location`: URL parsing into page kind and book identifier
//! - `position`: per-book reading positions
//! - `theme`: light/dark theme and font preference
//! - `paths`: deployment prefix resolution
//! - `library`: index page search and tag filtering
//! - `scroll`: per-chapter scroll offsets
//! - `turning`: page-turning layout and per-chapter page
//! - `custom_css`: per-book and default reader style sheets
//! - `dom`: document abstraction
//! - `config`: runtime configuration

pub mod config;
pub mod custom_css;
pub mod dom;
pub mod library;
pub mod location;
pub mod mode;
pub mod paths;
pub mod position;
pub mod runtime;
pub mod scroll;
pub mod storage;
pub mod theme;
pub mod turning;

pub use config::Config;
pub use custom_css::CustomCss;
pub use dom::{Document, Element, EventDisposition, SnapshotDocument, SnapshotElement};
pub use library::{BookEntry, LibraryFilter, TagFilter};
pub use location::{PageKind, PageLocation};
pub use mode::{Mode, Session};
pub use paths::BasePath;
pub use position::ReadingPositionTracker;
pub use runtime::PageRuntime;
pub use scroll::ScrollMemory;
pub use storage::{
    CookieSource, CookieStore, KeyValueStore, MemoryCookieSource, MemoryStore, StorageError,
    StorageResult,
};
pub use theme::{FontPreference, Theme, ThemeController};
pub use turning::{split_pages, Layout, PageTurner};
