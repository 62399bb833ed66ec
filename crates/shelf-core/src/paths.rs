//! Resource path resolution under a deployment prefix
//!
//! Generated pages reference shared assets and other pages with root-relative
//! paths (`/assets/library.css`, `/book/<id>/chapter_1.html`). When the site
//! is served below a prefix (`/library/...`) those references must carry the
//! prefix too. The prefix is derived from the current page path:
//!
//! ```text
//! /library/book/<id>/chapter_3.html  ->  /library/
//! /library/index.html                ->  /library/
//! /index.html                        ->  /        (nothing to do)
//! ```

use tracing::debug;

use crate::config::Config;
use crate::dom::{Document, Element};

/// Elements whose `src`/`href` may need the prefix
pub const RESOURCE_SELECTOR: &str =
    r#"iframe[src^="/"], a[href^="/"], img[src^="/"], script[src^="/"], link[rel="stylesheet"][href^="/"]"#;

const REWRITTEN_ATTRIBUTES: [&str; 2] = ["src", "href"];

/// Deployment root of the site, always starting and ending with `/`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasePath(String);

impl BasePath {
    /// Derive the prefix from the current page path
    pub fn from_path(path: &str, config: &Config) -> Self {
        let marker = format!("/{}/", config.book_marker);
        let root = match path.split_once(&marker) {
            Some((before, _)) => before,
            None => path.strip_suffix(&config.index_file).unwrap_or(path),
        };
        Self::new(root)
    }

    /// Normalize a prefix to `/…/` form
    pub fn new(prefix: &str) -> Self {
        let trimmed = prefix.trim_matches('/');
        if trimmed.is_empty() {
            Self("/".to_string())
        } else {
            Self(format!("/{}/", trimmed))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the site is served from the domain root
    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Prefixed form of a reference, or `None` when it must be left alone
    ///
    /// Left alone: anything not root-relative, absolute (`http…`),
    /// protocol-relative (`//…`), or already carrying the prefix.
    pub fn rewrite(&self, reference: &str) -> Option<String> {
        if self.is_root()
            || !reference.starts_with('/')
            || reference.starts_with("http")
            || reference.starts_with("//")
            || reference.starts_with(self.0.as_str())
        {
            return None;
        }
        Some(format!("{}{}", self.0.trim_end_matches('/'), reference))
    }

    /// Rewrite every root-relative resource reference on the page
    ///
    /// Returns the number of attributes changed. Running it again changes
    /// nothing.
    pub fn apply<D: Document>(&self, document: &D) -> usize {
        if self.is_root() {
            return 0;
        }

        let mut rewritten = 0;
        for element in document.select(RESOURCE_SELECTOR) {
            for attribute in REWRITTEN_ATTRIBUTES {
                let Some(value) = element.attribute(attribute) else {
                    continue;
                };
                if let Some(prefixed) = self.rewrite(&value) {
                    element.set_attribute(attribute, &prefixed);
                    rewritten += 1;
                }
            }
        }
        debug!("Prefixed {} resource references with {}", rewritten, self.0);
        rewritten
    }
}
