//! In-memory durable store
//!
//! Has the semantics of `localStorage` (no expiry, no size ceiling) and is
//! what tests and native hosts use in its place.

use std::cell::RefCell;
use std::collections::BTreeMap;

use super::{KeyValueStore, StorageError, StorageResult};

/// Durable key-value store backed by a map
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<BTreeMap<String, String>>,
    unavailable: bool,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-filled with entries
    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: RefCell::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
            unavailable: false,
        }
    }

    /// Create a store that fails every operation, like a disabled `localStorage`
    pub fn unavailable() -> Self {
        Self {
            entries: RefCell::default(),
            unavailable: true,
        }
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Whether the store holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    fn check(&self) -> StorageResult<()> {
        if self.unavailable {
            return Err(StorageError::Unavailable("memory store disabled".to_string()));
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.check()?;
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.check()?;
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        self.check()?;
        self.entries.borrow_mut().remove(key);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
