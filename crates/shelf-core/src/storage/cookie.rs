//! Transport-attached store (cookies)
//!
//! Cookies have no native delete and default to session lifetime, so:
//! - every write carries an explicit far-future `expires` and `path=/`
//! - delete overwrites the entry with an expiry at the epoch
//!
//! Values are percent-encoded on write and decoded on read. Entry size is
//! not checked; browsers silently drop oversized cookies.

use std::cell::RefCell;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use super::{KeyValueStore, StorageResult};

/// Characters left unescaped, matching `encodeURIComponent`
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Expiry written by `delete`
pub const EPOCH_EXPIRES: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

/// HTTP date layout used in `expires` attributes
const HTTP_DATE: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Latest expiry browsers reliably accept
fn latest_expiry() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(9999, 12, 31)
        .and_then(|date| date.and_hms_opt(23, 59, 59))
        .map(|naive| naive.and_utc())
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Raw access to a cookie jar, shaped like `document.cookie`
///
/// Reading yields every visible cookie as `a=1; b=2`; writing applies one
/// `Set-Cookie`-style assignment.
pub trait CookieSource {
    fn read(&self) -> StorageResult<String>;
    fn write(&self, assignment: &str) -> StorageResult<()>;
}

impl<T: CookieSource + ?Sized> CookieSource for std::rc::Rc<T> {
    fn read(&self) -> StorageResult<String> {
        (**self).read()
    }

    fn write(&self, assignment: &str) -> StorageResult<()> {
        (**self).write(assignment)
    }
}

type Clock = Box<dyn Fn() -> DateTime<Utc>>;

/// Key-value store over a cookie jar
pub struct CookieStore<S> {
    source: S,
    lifetime: Duration,
    clock: Clock,
}

impl<S: CookieSource> CookieStore<S> {
    /// Create a store whose entries live for `expiry_days`
    pub fn new(source: S, expiry_days: i64) -> Self {
        Self {
            source,
            lifetime: Duration::try_days(expiry_days).unwrap_or(Duration::MAX),
            clock: Box::new(Utc::now),
        }
    }

    /// Replace the clock used to compute expiry dates
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Get the underlying cookie source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Build the assignment written by `set`
    pub fn assignment(&self, key: &str, value: &str) -> String {
        let expires = (self.clock)()
            .checked_add_signed(self.lifetime)
            .filter(|expires| *expires <= latest_expiry())
            .unwrap_or_else(latest_expiry);
        format!(
            "{}={}; expires={}; path=/",
            key,
            utf8_percent_encode(value, COMPONENT),
            expires.format(HTTP_DATE)
        )
    }
}

impl<S: CookieSource> KeyValueStore for CookieStore<S> {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let raw = self.source.read()?;
        Ok(find_cookie(&raw, key))
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.source.write(&self.assignment(key, value))
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        self.source
            .write(&format!("{}=; expires={}; path=/", key, EPOCH_EXPIRES))
    }

    fn name(&self) -> &'static str {
        "cookie"
    }
}

/// Find and decode the first cookie named `key` in a `document.cookie` string
pub fn find_cookie(raw: &str, key: &str) -> Option<String> {
    raw.split(';')
        .filter_map(|pair| pair.trim_start().split_once('='))
        .find(|(name, _)| name.trim() == key)
        .map(|(_, value)| percent_decode_str(value.trim()).decode_utf8_lossy().into_owned())
}

/// In-memory cookie jar with browser expiry semantics
///
/// Assignments whose `expires` lies in the past remove the cookie; all other
/// attributes are ignored.
#[derive(Debug, Default)]
pub struct MemoryCookieSource {
    jar: RefCell<Vec<(String, String)>>,
    assignments: RefCell<Vec<String>>,
}

impl MemoryCookieSource {
    /// Create an empty jar
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a jar holding raw (already encoded) cookies
    pub fn with_cookies<'a>(cookies: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let source = Self::new();
        source.jar.replace(
            cookies
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        source
    }

    /// Every assignment written so far, oldest first
    pub fn assignments(&self) -> Vec<String> {
        self.assignments.borrow().clone()
    }
}

impl CookieSource for MemoryCookieSource {
    fn read(&self) -> StorageResult<String> {
        Ok(self
            .jar
            .borrow()
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; "))
    }

    fn write(&self, assignment: &str) -> StorageResult<()> {
        self.assignments.borrow_mut().push(assignment.to_string());

        let mut parts = assignment.split(';');
        let Some((name, value)) = parts.next().and_then(|pair| pair.split_once('=')) else {
            return Ok(());
        };
        let name = name.trim().to_string();

        let expired = parts
            .filter_map(|attr| attr.trim().split_once('='))
            .filter(|(attr, _)| attr.eq_ignore_ascii_case("expires"))
            .filter_map(|(_, date)| DateTime::parse_from_rfc2822(date.trim()).ok())
            .any(|date| date.with_timezone(&Utc) <= Utc::now());

        let mut jar = self.jar.borrow_mut();
        jar.retain(|(existing, _)| *existing != name);
        if !expired {
            jar.push((name, value.trim().to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn pinned() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn store() -> CookieStore<MemoryCookieSource> {
        CookieStore::new(MemoryCookieSource::new(), 3650).with_clock(pinned)
    }

    #[test]
    fn test_assignment_format() {
        let store = store();
        assert_eq!(
            store.assignment("theme", "dark"),
            "theme=dark; expires=Tue, 27 Feb 2035 12:00:00 GMT; path=/"
        );
    }

    #[test]
    fn test_far_future_expiry_is_clamped() {
        let store = CookieStore::new(MemoryCookieSource::new(), 100_000_000).with_clock(pinned);
        assert_eq!(
            store.assignment("theme", "dark"),
            "theme=dark; expires=Fri, 31 Dec 9999 23:59:59 GMT; path=/"
        );

        store.set("theme", "dark").unwrap();
        assert_eq!(store.get("theme").unwrap().as_deref(), Some("dark"));

        let extreme = CookieStore::new(MemoryCookieSource::new(), i64::MAX).with_clock(pinned);
        assert!(extreme.assignment("theme", "dark").contains("9999"));
    }

    #[test]
    fn test_set_then_get() {
        let store = store();
        store.set("a1b2c3", "#chapter_3").unwrap();

        assert_eq!(store.get("a1b2c3").unwrap().as_deref(), Some("#chapter_3"));
        assert_eq!(store.get("other").unwrap(), None);

        // The raw cookie carries the encoded fragment
        assert!(store.source().read().unwrap().contains("a1b2c3=%23chapter_3"));
    }

    #[test]
    fn test_delete_writes_epoch_expiry() {
        let store = store();
        store.set("theme", "dark").unwrap();
        store.delete("theme").unwrap();

        assert_eq!(store.get("theme").unwrap(), None);
        let last = store.source().assignments().pop().unwrap();
        assert_eq!(last, "theme=; expires=Thu, 01 Jan 1970 00:00:00 GMT; path=/");
    }

    #[test]
    fn test_delete_matches_durable_semantics() {
        let durable = crate::storage::MemoryStore::new();
        let transport = store();

        for kv in [&durable as &dyn KeyValueStore, &transport as &dyn KeyValueStore] {
            kv.set("book", "#chapter_1").unwrap();
            kv.delete("book").unwrap();
            assert_eq!(kv.get("book").unwrap(), None, "{}", kv.name());
        }
    }

    #[test]
    fn test_find_cookie_parsing() {
        let raw = "kindle-mode=true; theme=dark;font_family=Georgia%2C%20serif";
        assert_eq!(find_cookie(raw, "kindle-mode").as_deref(), Some("true"));
        assert_eq!(find_cookie(raw, "theme").as_deref(), Some("dark"));
        assert_eq!(find_cookie(raw, "font_family").as_deref(), Some("Georgia, serif"));
        assert_eq!(find_cookie(raw, "kindle"), None);
        assert_eq!(find_cookie("", "theme"), None);
    }

    #[test]
    fn test_value_with_equals_sign() {
        let raw = "font_family_input=a=b";
        assert_eq!(find_cookie(raw, "font_family_input").as_deref(), Some("a=b"));
    }

    #[test]
    fn test_invalid_percent_encoding_is_lossy() {
        let raw = "theme=%FFdark";
        let value = find_cookie(raw, "theme").unwrap();
        assert!(value.ends_with("dark"));
    }

    #[test]
    fn test_overwrite_keeps_single_entry() {
        let store = store();
        store.set("theme", "dark").unwrap();
        store.set("theme", "light").unwrap();
        assert_eq!(store.source().read().unwrap(), "theme=light");
    }
}
