//! Light/dark theme
//!
//! The preference is global (not per book) and lives in the active store
//! under `theme`. Dark is shown by a `dark-mode` class on `<body>` and a sun
//! icon on every theme toggle; light by the absence of the class and a moon.

pub mod font;

pub use font::FontPreference;

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use tracing::debug;

use crate::config::Config;
use crate::dom::{Document, Element};
use crate::storage::KeyValueStore;

/// Body class present while the dark theme is shown
pub const DARK_BODY_CLASS: &str = "dark-mode";

const ICON_DARK: &str = "fa-sun";
const ICON_LIGHT: &str = "fa-moon";

/// Presentation theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("unknown theme: {}", other)),
        }
    }
}

/// Owns the theme preference: loads it, shows it, flips and persists it
pub struct ThemeController {
    theme: Theme,
    store: Rc<dyn KeyValueStore>,
    key: String,
    toggle_ids: Vec<String>,
}

impl ThemeController {
    /// Read the stored theme; absent or unknown values mean light
    pub fn load(store: Rc<dyn KeyValueStore>, config: &Config) -> Self {
        let theme = match store.get(&config.theme_key) {
            Ok(Some(value)) => value.parse().unwrap_or_else(|e| {
                debug!("Ignoring stored theme: {}", e);
                Theme::Light
            }),
            Ok(None) => Theme::Light,
            Err(e) => {
                e.log_failure("Could not read theme");
                Theme::Light
            }
        };

        Self {
            theme,
            store,
            key: config.theme_key.clone(),
            toggle_ids: config.theme_toggle_ids.clone(),
        }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Show the current theme on the page
    pub fn apply<D: Document>(&self, document: &D) {
        let dark = self.theme == Theme::Dark;
        if let Some(body) = document.body() {
            body.set_class(DARK_BODY_CLASS, dark);
        }
        for id in &self.toggle_ids {
            let Some(toggle) = document.element_by_id(id) else {
                continue;
            };
            for icon in toggle.select("i") {
                icon.set_class(ICON_DARK, dark);
                icon.set_class(ICON_LIGHT, !dark);
            }
        }
    }

    /// Flip the theme, show it, and persist it
    ///
    /// A failed write is logged; the page still shows the new theme.
    pub fn toggle<D: Document>(&mut self, document: &D) -> Theme {
        self.theme = self.theme.toggled();
        self.apply(document);
        if let Err(e) = self.store.set(&self.key, self.theme.as_str()) {
            e.log_failure(&format!("Could not persist theme {}", self.theme));
        }
        debug!("Theme toggled to {}", self.theme);
        self.theme
    }
}
