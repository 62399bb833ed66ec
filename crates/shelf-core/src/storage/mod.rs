//! Storage layer
//!
//! All reading state lives in one of two client-side key-value stores:
//!
//! - **Durable**: unbounded lifetime, per origin, never sent over the network
//!   (`localStorage` in the browser, [`MemoryStore`] natively)
//! - **Transport**: cookies; every entry rides along with each request, so
//!   entries must stay small and need an explicit expiry ([`CookieStore`])
//!
//! Both implement [`KeyValueStore`]. Which one is active for a page load is
//! decided once by [`crate::mode::Session`].

pub mod cookie;
pub mod error;
pub mod memory;

pub use cookie::{CookieSource, CookieStore, MemoryCookieSource};
pub use error::{StorageError, StorageResult};
pub use memory::MemoryStore;

/// Uniform string key-value surface over a client-side store
///
/// Methods take `&self`: stores are single-threaded handles onto state that
/// lives outside the runtime.
pub trait KeyValueStore {
    /// Read a value; `Ok(None)` when the key is absent
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove a value; removing an absent key succeeds
    fn delete(&self, key: &str) -> StorageResult<()>;

    /// Short name used in log lines
    fn name(&self) -> &'static str;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for std::rc::Rc<T> {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        (**self).delete(key)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
