//! Runtime configuration
//!
//! Configuration is resolved from:
//! 1. Default values
//! 2. An optional TOML document embedded in the page
//!    (`<script id="shelf-config" type="application/toml">`)
//!
//! Every field has a default, so an empty document is a valid config.

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

/// Id of the element that may carry an embedded config document
pub const CONFIG_ELEMENT_ID: &str = "shelf-config";

/// Font stack used when no font preference is stored
pub const SYSTEM_FONT_STACK: &str = "-apple-system, BlinkMacSystemFont, \"Segoe UI\", Roboto, \
     \"Helvetica Neue\", Arial, \"Noto Sans\", sans-serif";

/// Longest lifetime accepted for transport-store entries (about a century)
pub const MAX_COOKIE_EXPIRY_DAYS: i64 = 36_500;

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Transport-store key whose value `"true"` selects constrained mode
    #[serde(default = "default_mode_flag_key")]
    pub mode_flag_key: String,

    /// Key holding the theme preference
    #[serde(default = "default_theme_key")]
    pub theme_key: String,

    /// Key holding the font family preference
    #[serde(default = "default_font_family_key")]
    pub font_family_key: String,

    /// Key holding the custom font family, used when the family is `custom`
    #[serde(default = "default_font_family_input_key")]
    pub font_family_input_key: String,

    /// Font stack applied when nothing is stored
    #[serde(default = "default_font_stack")]
    pub default_font_stack: String,

    /// Key holding the page-turning preference (`"true"` when on)
    #[serde(default = "default_turning_key")]
    pub turning_key: String,

    /// Lifetime given to every transport-store entry
    #[serde(default = "default_cookie_expiry_days")]
    pub cookie_expiry_days: i64,

    /// Path segment that precedes the book identifier
    #[serde(default = "default_book_marker")]
    pub book_marker: String,

    /// Prefix shared by chapter fragments and chapter file names
    #[serde(default = "default_chapter_prefix")]
    pub chapter_prefix: String,

    /// File name of the library index page
    #[serde(default = "default_index_file")]
    pub index_file: String,

    /// Tag-cloud label that matches every book
    #[serde(default = "default_all_tag_label")]
    pub all_tag_label: String,

    /// Ids of the controls that toggle the theme
    #[serde(default = "default_theme_toggle_ids")]
    pub theme_toggle_ids: Vec<String>,

    /// Log filter directives (tracing-subscriber `EnvFilter` syntax)
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode_flag_key: default_mode_flag_key(),
            theme_key: default_theme_key(),
            font_family_key: default_font_family_key(),
            font_family_input_key: default_font_family_input_key(),
            default_font_stack: default_font_stack(),
            turning_key: default_turning_key(),
            cookie_expiry_days: default_cookie_expiry_days(),
            book_marker: default_book_marker(),
            chapter_prefix: default_chapter_prefix(),
            index_file: default_index_file(),
            all_tag_label: default_all_tag_label(),
            theme_toggle_ids: default_theme_toggle_ids(),
            log_filter: default_log_filter(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML string
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let config: Config = toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            (1..=MAX_COOKIE_EXPIRY_DAYS).contains(&self.cookie_expiry_days),
            "cookie_expiry_days must be between 1 and {}, got {}",
            MAX_COOKIE_EXPIRY_DAYS,
            self.cookie_expiry_days
        );
        ensure!(
            !self.book_marker.is_empty() && !self.book_marker.contains('/'),
            "book_marker must be a single path segment, got {:?}",
            self.book_marker
        );
        ensure!(!self.chapter_prefix.is_empty(), "chapter_prefix must not be empty");
        ensure!(!self.mode_flag_key.is_empty(), "mode_flag_key must not be empty");
        Ok(())
    }

    /// The fragment form of the chapter prefix (`#chapter_`)
    pub fn chapter_fragment_prefix(&self) -> String {
        format!("#{}", self.chapter_prefix)
    }
}

fn default_mode_flag_key() -> String {
    "kindle-mode".to_string()
}

fn default_theme_key() -> String {
    "theme".to_string()
}

fn default_font_family_key() -> String {
    "font_family".to_string()
}

fn default_font_family_input_key() -> String {
    "font_family_input".to_string()
}

fn default_font_stack() -> String {
    SYSTEM_FONT_STACK.to_string()
}

fn default_turning_key() -> String {
    "turning".to_string()
}

fn default_cookie_expiry_days() -> i64 {
    3650
}

fn default_book_marker() -> String {
    "book".to_string()
}

fn default_chapter_prefix() -> String {
    "chapter_".to_string()
}

fn default_index_file() -> String {
    "index.html".to_string()
}

fn default_all_tag_label() -> String {
    "All".to_string()
}

fn default_theme_toggle_ids() -> Vec<String> {
    vec!["themeToggle".to_string(), "mobileThemeBtn".to_string()]
}

fn default_log_filter() -> String {
    "shelf_core=info,shelf_web=info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.mode_flag_key, "kindle-mode");
        assert_eq!(config.theme_key, "theme");
        assert_eq!(config.turning_key, "turning");
        assert_eq!(config.cookie_expiry_days, 3650);
        assert_eq!(config.book_marker, "book");
        assert_eq!(config.chapter_fragment_prefix(), "#chapter_");
    }

    #[test]
    fn test_empty_document_is_default() {
        let config = Config::load_from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_str() {
        let toml = r#"
            cookie_expiry_days = 30
            all_tag_label = "Everything"
            theme_toggle_ids = ["themeToggle"]
        "#;

        let config = Config::load_from_str(toml).unwrap();
        assert_eq!(config.cookie_expiry_days, 30);
        assert_eq!(config.all_tag_label, "Everything");
        assert_eq!(config.theme_toggle_ids, vec!["themeToggle"]);
        // Untouched fields keep their defaults
        assert_eq!(config.theme_key, "theme");
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(Config::load_from_str("cookie_expiry_days = 0").is_err());
        assert!(Config::load_from_str("cookie_expiry_days = 100000000").is_err());
        assert!(Config::load_from_str("cookie_expiry_days = 36500").is_ok());
        assert!(Config::load_from_str(r#"book_marker = "a/b""#).is_err());
        assert!(Config::load_from_str(r#"chapter_prefix = """#).is_err());
    }

    #[test]
    fn test_serialization() {
        let config = Config {
            log_filter: "shelf_core=debug".to_string(),
            ..Config::default()
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("mode_flag_key"));
        assert!(toml_str.contains("log_filter"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }
}
