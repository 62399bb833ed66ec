//! Per-chapter scroll offsets
//!
//! Kept in the durable store only: a cookie per chapter would bloat every
//! request, so constrained sessions neither save nor restore.

use std::rc::Rc;

use tracing::debug;

use crate::location::{PageKind, PageLocation};
use crate::mode::{Mode, Session};
use crate::storage::KeyValueStore;

/// Remembers how far down each chapter the reader scrolled
pub struct ScrollMemory {
    store: Option<Rc<dyn KeyValueStore>>,
}

impl ScrollMemory {
    pub fn new(session: &Session) -> Self {
        let store = match session.mode() {
            Mode::Standard => Some(session.durable()),
            Mode::Constrained => None,
        };
        Self { store }
    }

    /// Whether offsets are kept at all in this session
    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Store key for a chapter page, `None` for other pages
    pub fn key(location: &PageLocation) -> Option<String> {
        let book_id = location.book_id()?;
        match location.kind() {
            PageKind::Chapter(chapter) => {
                Some(format!("book_{}_{}_scroll_position", book_id, chapter))
            }
            _ => None,
        }
    }

    /// Record the current offset in CSS pixels
    pub fn save(&self, location: &PageLocation, offset: f64) -> bool {
        let (Some(store), Some(key)) = (&self.store, Self::key(location)) else {
            return false;
        };
        let offset = if offset.is_finite() { offset.max(0.0) } else { 0.0 };
        match store.set(&key, &format!("{:.0}", offset)) {
            Ok(()) => true,
            Err(e) => {
                e.log_failure(&format!("Could not store scroll offset {}", key));
                false
            }
        }
    }

    /// Offset to scroll back to on load
    pub fn restore(&self, location: &PageLocation) -> Option<f64> {
        let store = self.store.as_ref()?;
        let key = Self::key(location)?;
        let raw = match store.get(&key) {
            Ok(value) => value?,
            Err(e) => {
                e.log_failure(&format!("Could not read scroll offset {}", key));
                return None;
            }
        };
        let offset = raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|offset| offset.is_finite() && *offset >= 0.0);
        if offset.is_none() {
            debug!("Ignoring stored scroll offset {:?} for {}", raw, key);
        }
        offset
    }
}
