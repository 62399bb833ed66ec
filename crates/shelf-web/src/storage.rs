//! Browser stores
//!
//! - [`LocalStorage`]: the durable store (`window.localStorage`)
//! - [`DocumentCookies`]: the raw cookie jar (`document.cookie`) behind the
//!   transport store

use shelf_core::storage::{CookieSource, KeyValueStore, StorageError, StorageResult};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{HtmlDocument, Storage, Window};

/// Human-readable text for a thrown JS value
pub fn js_details(value: &JsValue) -> String {
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

/// `localStorage`, or nothing when the browser withholds it
pub struct LocalStorage {
    storage: Option<Storage>,
}

impl LocalStorage {
    pub fn from_window(window: &Window) -> Self {
        // Throws in some privacy modes; treat that like a missing store
        let storage = window.local_storage().ok().flatten();
        Self { storage }
    }

    fn storage(&self) -> StorageResult<&Storage> {
        self.storage
            .as_ref()
            .ok_or_else(|| StorageError::Unavailable("localStorage is not available".to_string()))
    }
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.storage()?
            .get_item(key)
            .map_err(|e| StorageError::from_backend("get", key, js_details(&e)))
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.storage()?
            .set_item(key, value)
            .map_err(|e| StorageError::from_backend("set", key, js_details(&e)))
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        self.storage()?
            .remove_item(key)
            .map_err(|e| StorageError::from_backend("delete", key, js_details(&e)))
    }

    fn name(&self) -> &'static str {
        "localStorage"
    }
}

/// `document.cookie` as a [`CookieSource`]
pub struct DocumentCookies {
    document: HtmlDocument,
}

impl DocumentCookies {
    pub fn new(document: &web_sys::Document) -> StorageResult<Self> {
        let document = document
            .clone()
            .dyn_into::<HtmlDocument>()
            .map_err(|_| StorageError::Unavailable("document has no cookie jar".to_string()))?;
        Ok(Self { document })
    }
}

impl CookieSource for DocumentCookies {
    fn read(&self) -> StorageResult<String> {
        self.document
            .cookie()
            .map_err(|e| StorageError::from_backend("read", "document.cookie", js_details(&e)))
    }

    fn write(&self, assignment: &str) -> StorageResult<()> {
        self.document
            .set_cookie(assignment)
            .map_err(|e| StorageError::from_backend("write", "document.cookie", js_details(&e)))
    }
}
