//! Page location
//!
//! Every page-load decision starts from the current URL. The generated site
//! has three page shapes:
//!
//! ```text
//! <prefix>/index.html                       library index
//! <prefix>/book/<book-id>/index.html        book home (table of contents)
//! <prefix>/book/<book-id>/chapter_<n>.html  chapter
//! ```
//!
//! Book pages may carry a `#chapter_<n>` fragment, which is how a remembered
//! reading position is restored.

use crate::config::Config;

/// Which of the generated page shapes is loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageKind {
    Library,
    BookHome,
    /// A chapter page; holds the chapter name (`chapter_<n>`)
    Chapter(String),
}

/// The current URL, split into the parts the runtime cares about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLocation {
    path: String,
    fragment: String,
    book_id: Option<String>,
    kind: PageKind,
    chapter_fragment_prefix: String,
}

impl PageLocation {
    /// Parse a path and fragment (`#` optional) under the given config
    pub fn new(path: impl Into<String>, fragment: &str, config: &Config) -> Self {
        let path = path.into();
        let fragment = normalize_fragment(fragment);
        let book_id = book_id_in(&path, &config.book_marker);
        let kind = match (&book_id, chapter_in(&path, &config.chapter_prefix)) {
            (Some(_), Some(chapter)) => PageKind::Chapter(chapter),
            (Some(_), None) => PageKind::BookHome,
            (None, _) => PageKind::Library,
        };

        Self {
            path,
            fragment,
            book_id,
            kind,
            chapter_fragment_prefix: config.chapter_fragment_prefix(),
        }
    }

    /// Parse a `pathname[?query][#fragment]` string
    pub fn parse(url: &str, config: &Config) -> Self {
        let (rest, fragment) = url.split_once('#').unwrap_or((url, ""));
        let path = rest.split_once('?').map_or(rest, |(path, _)| path);
        Self::new(path, fragment, config)
    }

    /// URL path, as given
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Fragment including the leading `#`, or empty
    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    /// Identifier of the book this page belongs to
    ///
    /// `None` when the path has no segment after the book marker.
    pub fn book_id(&self) -> Option<&str> {
        self.book_id.as_deref()
    }

    pub fn kind(&self) -> &PageKind {
        &self.kind
    }

    /// Whether the fragment starts with the chapter prefix (`#chapter_`)
    ///
    /// A bare `#chapter_` counts.
    pub fn has_chapter_fragment(&self) -> bool {
        self.fragment.starts_with(&self.chapter_fragment_prefix)
    }

    /// Fragment that restores this chapter page from the book home
    pub fn chapter_anchor(&self) -> Option<String> {
        match &self.kind {
            PageKind::Chapter(chapter) => Some(format!("#{}", chapter)),
            _ => None,
        }
    }

    /// Same location with a different fragment
    pub fn with_fragment(&self, fragment: &str) -> Self {
        Self {
            fragment: normalize_fragment(fragment),
            ..self.clone()
        }
    }
}

fn normalize_fragment(fragment: &str) -> String {
    let fragment = fragment.trim();
    if fragment.is_empty() || fragment == "#" {
        String::new()
    } else if fragment.starts_with('#') {
        fragment.to_string()
    } else {
        format!("#{}", fragment)
    }
}

fn book_id_in(path: &str, marker: &str) -> Option<String> {
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    segments.by_ref().find(|segment| *segment == marker)?;
    segments.next().map(str::to_string)
}

fn chapter_in(path: &str, prefix: &str) -> Option<String> {
    let last = path.rsplit('/').next()?;
    let stem = last.strip_suffix(".html")?;
    (stem.len() > prefix.len() && stem.starts_with(prefix)).then(|| stem.to_string())
}
