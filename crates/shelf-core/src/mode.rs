//! Storage mode detection
//!
//! Some reading devices cannot be trusted with a durable per-origin store, so
//! a page runs in one of two modes:
//!
//! - **Standard**: state lives in the durable store
//! - **Constrained**: state lives in cookies
//!
//! The mode is read from a flag cookie (`kindle-mode`), always through the
//! transport store since the durable one may not exist. It is derived once
//! per page load by [`Session::new`]; every component asks the session for
//! the active store instead of looking at the flag again.

use std::rc::Rc;

use tracing::{debug, info};

use crate::config::Config;
use crate::dom::{Document, Element};
use crate::storage::{KeyValueStore, StorageResult};

/// Class added to `<body>` in constrained mode
pub const CONSTRAINED_BODY_CLASS: &str = "kindle-mode";

/// Index-page control shown while constrained; activating it leaves the mode
pub const LEAVE_CONSTRAINED_ID: &str = "kindleModeValueYes";

/// Index-page control shown while standard; activating it enters the mode
pub const ENTER_CONSTRAINED_ID: &str = "kindleModeValueNot";

/// Which store a page session uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Standard,
    Constrained,
}

impl Mode {
    /// Read the mode flag through the transport store
    ///
    /// Only the exact value `"true"` selects constrained mode; absence and
    /// read failures mean standard.
    pub fn detect(transport: &dyn KeyValueStore, flag_key: &str) -> Mode {
        match transport.get(flag_key) {
            Ok(Some(value)) if value == "true" => Mode::Constrained,
            Ok(_) => Mode::Standard,
            Err(e) => {
                e.log_failure(&format!("Could not read mode flag '{}'", flag_key));
                Mode::Standard
            }
        }
    }

    pub fn is_constrained(self) -> bool {
        self == Mode::Constrained
    }
}

/// The stores available to one page load, plus the mode chosen for it
pub struct Session {
    mode: Mode,
    durable: Rc<dyn KeyValueStore>,
    transport: Rc<dyn KeyValueStore>,
}

impl Session {
    /// Detect the mode and build the session
    pub fn new(
        durable: Rc<dyn KeyValueStore>,
        transport: Rc<dyn KeyValueStore>,
        config: &Config,
    ) -> Self {
        let mode = Mode::detect(transport.as_ref(), &config.mode_flag_key);
        info!("Storage mode: {:?}", mode);
        Self::with_mode(mode, durable, transport)
    }

    /// Build a session with a known mode
    pub fn with_mode(
        mode: Mode,
        durable: Rc<dyn KeyValueStore>,
        transport: Rc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            mode,
            durable,
            transport,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The store every component reads and writes in this mode
    pub fn active(&self) -> Rc<dyn KeyValueStore> {
        match self.mode {
            Mode::Standard => Rc::clone(&self.durable),
            Mode::Constrained => Rc::clone(&self.transport),
        }
    }

    /// The durable store, regardless of mode
    pub fn durable(&self) -> Rc<dyn KeyValueStore> {
        Rc::clone(&self.durable)
    }

    /// The transport store, regardless of mode
    pub fn transport(&self) -> Rc<dyn KeyValueStore> {
        Rc::clone(&self.transport)
    }

    /// Persist a mode choice for the next page load
    ///
    /// The current session keeps its mode; the host reloads the page.
    pub fn switch_to(&self, target: Mode, config: &Config) -> StorageResult<()> {
        debug!("Switching storage mode to {:?}", target);
        match target {
            Mode::Constrained => self.transport.set(&config.mode_flag_key, "true"),
            Mode::Standard => self.transport.delete(&config.mode_flag_key),
        }
    }
}

/// Reflect the mode in the page: body class plus the index-page switch
pub fn render_mode<D: Document>(document: &D, mode: Mode) {
    if let Some(body) = document.body() {
        body.set_class(CONSTRAINED_BODY_CLASS, mode.is_constrained());
    }
    if let Some(leave) = document.element_by_id(LEAVE_CONSTRAINED_ID) {
        leave.set_hidden(!mode.is_constrained());
    }
    if let Some(enter) = document.element_by_id(ENTER_CONSTRAINED_ID) {
        enter.set_hidden(mode.is_constrained());
    }
}

/// Mode a switch control leads to, if `id` names one
pub fn switch_target(id: &str) -> Option<Mode> {
    match id {
        LEAVE_CONSTRAINED_ID => Some(Mode::Standard),
        ENTER_CONSTRAINED_ID => Some(Mode::Constrained),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::SnapshotDocument;
    use crate::storage::{CookieStore, MemoryCookieSource, MemoryStore};

    fn cookies(raw: &[(&'static str, &'static str)]) -> Rc<dyn KeyValueStore> {
        Rc::new(CookieStore::new(
            MemoryCookieSource::with_cookies(raw.iter().copied()),
            3650,
        ))
    }

    #[test]
    fn test_detect_constrained() {
        let transport = cookies(&[("kindle-mode", "true")]);
        assert_eq!(Mode::detect(transport.as_ref(), "kindle-mode"), Mode::Constrained);
    }

    #[test]
    fn test_detect_defaults_to_standard() {
        assert_eq!(Mode::detect(cookies(&[]).as_ref(), "kindle-mode"), Mode::Standard);
        assert_eq!(
            Mode::detect(cookies(&[("kindle-mode", "false")]).as_ref(), "kindle-mode"),
            Mode::Standard
        );
        assert_eq!(
            Mode::detect(cookies(&[("kindle-mode", "TRUE")]).as_ref(), "kindle-mode"),
            Mode::Standard
        );
        assert_eq!(
            Mode::detect(&MemoryStore::unavailable(), "kindle-mode"),
            Mode::Standard
        );
    }

    #[test]
    fn test_flag_in_durable_store_is_ignored() {
        let durable: Rc<dyn KeyValueStore> =
            Rc::new(MemoryStore::with_entries([("kindle-mode", "true")]));
        let session = Session::new(durable, cookies(&[]), &Config::default());
        assert_eq!(session.mode(), Mode::Standard);
    }

    #[test]
    fn test_active_store_follows_mode() {
        let durable: Rc<dyn KeyValueStore> = Rc::new(MemoryStore::new());
        let transport = cookies(&[("kindle-mode", "true")]);
        let session = Session::new(Rc::clone(&durable), Rc::clone(&transport), &Config::default());

        session.active().set("theme", "dark").unwrap();
        assert_eq!(transport.get("theme").unwrap().as_deref(), Some("dark"));
        assert_eq!(durable.get("theme").unwrap(), None);
    }

    #[test]
    fn test_switch_to_writes_flag_but_keeps_session_mode() {
        let config = Config::default();
        let session = Session::new(Rc::new(MemoryStore::new()), cookies(&[]), &config);

        session.switch_to(Mode::Constrained, &config).unwrap();
        assert_eq!(session.mode(), Mode::Standard);
        assert_eq!(Mode::detect(session.transport().as_ref(), "kindle-mode"), Mode::Constrained);

        session.switch_to(Mode::Standard, &config).unwrap();
        assert_eq!(Mode::detect(session.transport().as_ref(), "kindle-mode"), Mode::Standard);
    }

    #[test]
    fn test_render_mode() {
        let doc = SnapshotDocument::parse(
            r#"<html><body>
                <a id="kindleModeValueYes">Kindle Mode</a>
                <a id="kindleModeValueNot">Not Kindle</a>
            </body></html>"#,
        );

        render_mode(&doc, Mode::Constrained);
        assert!(doc.body().unwrap().has_class("kindle-mode"));
        assert!(!doc.element_by_id(LEAVE_CONSTRAINED_ID).unwrap().is_hidden());
        assert!(doc.element_by_id(ENTER_CONSTRAINED_ID).unwrap().is_hidden());

        render_mode(&doc, Mode::Standard);
        assert!(!doc.body().unwrap().has_class("kindle-mode"));
        assert!(doc.element_by_id(LEAVE_CONSTRAINED_ID).unwrap().is_hidden());
        assert!(!doc.element_by_id(ENTER_CONSTRAINED_ID).unwrap().is_hidden());
    }

    #[test]
    fn test_switch_target() {
        assert_eq!(switch_target("kindleModeValueYes"), Some(Mode::Standard));
        assert_eq!(switch_target("kindleModeValueNot"), Some(Mode::Constrained));
        assert_eq!(switch_target("themeToggle"), None);
    }
}
