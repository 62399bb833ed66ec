//! Shelf Web
//!
//! Browser entry point for the reading-state runtime. Loaded by every
//! generated page; on start it:
//!
//! 1. reads the optional embedded config and installs console logging
//! 2. opens `localStorage` and `document.cookie`
//! 3. boots a [`PageRuntime`] over the live document
//! 4. registers the page's event listeners, paginating the chapter first
//!    when the reader prefers turning pages

pub mod dom;
pub mod events;
pub mod logging;
pub mod pages;
pub mod storage;

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{anyhow, Context, Result};
use shelf_core::config::CONFIG_ELEMENT_ID;
use shelf_core::{Config, CookieStore, KeyValueStore, PageRuntime, Session};
use tracing::warn;
use wasm_bindgen::prelude::*;

use crate::dom::WebDocument;
use crate::storage::{js_details, DocumentCookies, LocalStorage};

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    boot().map_err(|e| JsValue::from_str(&format!("shelf: {:#}", e)))
}

fn boot() -> Result<()> {
    let window = web_sys::window().context("No window")?;
    let document = window.document().context("Window has no document")?;

    let embedded = document
        .get_element_by_id(CONFIG_ELEMENT_ID)
        .and_then(|element| element.text_content());
    let parsed = embedded.as_deref().map(Config::load_from_str).transpose();
    let config = match &parsed {
        Ok(Some(config)) => config.clone(),
        _ => Config::default(),
    };
    logging::init(&config.log_filter);
    if let Err(e) = parsed {
        warn!("Ignoring embedded config: {:#}", e);
    }

    let durable: Rc<dyn KeyValueStore> = Rc::new(LocalStorage::from_window(&window));
    let cookies = DocumentCookies::new(&document).context("Failed to open cookie jar")?;
    let transport: Rc<dyn KeyValueStore> =
        Rc::new(CookieStore::new(cookies, config.cookie_expiry_days));
    let session = Session::new(durable, transport, &config);

    let location =
        events::current_location(&window, &config).context("Failed to read page location")?;
    let runtime = PageRuntime::boot(WebDocument(document), location, session, config);

    if let Some(offset) = runtime.restored_scroll() {
        if runtime.location().fragment().is_empty() {
            window.scroll_to_with_x_and_y(0.0, offset);
        }
    }

    events::wire(&window, Rc::new(RefCell::new(runtime)))
        .map_err(|e| anyhow!("Failed to register listeners: {}", js_details(&e)))
}
