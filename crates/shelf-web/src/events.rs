//! Event wiring
//!
//! Every control gets one listener for the lifetime of the page. Listeners
//! forward to the shared [`PageRuntime`] and apply its [`EventDisposition`].

use std::cell::RefCell;
use std::rc::Rc;

use shelf_core::custom_css::{
    INPUT_ID, LOAD_DEFAULT_ID, PANEL_CONTENT_ID, PANEL_TOGGLE_ID, PREVIEW_ID, RESET_ID,
    SAVE_DEFAULT_ID, SAVE_ID,
};
use shelf_core::dom::{Document, Element, EventDisposition};
use shelf_core::library::{CARD_TAG_SELECTOR, CLOUD_TAG_SELECTOR, SEARCH_SELECTOR};
use shelf_core::mode::{switch_target, ENTER_CONSTRAINED_ID, LEAVE_CONSTRAINED_ID};
use shelf_core::turning::{GO_TO_PAGE_ID, NEXT_PAGE_ID, PAGE_JUMP_ID, PREV_PAGE_ID, TOGGLE_IDS};
use shelf_core::{Config, Layout, PageKind, PageLocation, PageRuntime};
use tracing::{debug, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    Event, EventTarget, HtmlInputElement, HtmlTextAreaElement, KeyboardEvent, ScrollBehavior,
    ScrollToOptions, Window,
};

use crate::dom::WebDocument;
use crate::pages;
use crate::storage::js_details;

/// Controls that scroll the window back to the top
const SCROLL_TO_TOP_IDS: [&str; 2] = ["scrollToTopBtn", "mobileTopBtn"];

type SharedRuntime = Rc<RefCell<PageRuntime<WebDocument>>>;

/// Current URL as a [`PageLocation`]
pub fn current_location(window: &Window, config: &Config) -> Option<PageLocation> {
    let location = window.location();
    let path = location.pathname().ok()?;
    let hash = location.hash().unwrap_or_default();
    Some(PageLocation::new(path, &hash, config))
}

/// Register every listener the page needs
pub fn wire(window: &Window, runtime: SharedRuntime) -> Result<(), JsValue> {
    let (document, config, kind) = {
        let runtime = runtime.borrow();
        (
            runtime.document().clone(),
            runtime.config().clone(),
            runtime.location().kind().clone(),
        )
    };

    for id in &config.theme_toggle_ids {
        let Some(toggle) = document.element_by_id(id) else {
            continue;
        };
        let runtime = runtime.clone();
        on(&toggle.0, "click", move |_| {
            runtime.borrow_mut().toggle_theme();
        })?;
    }

    for id in SCROLL_TO_TOP_IDS {
        let Some(button) = document.element_by_id(id) else {
            continue;
        };
        let window = window.clone();
        on(&button.0, "click", move |_| {
            let options = ScrollToOptions::new();
            options.set_top(0.0);
            options.set_behavior(ScrollBehavior::Smooth);
            window.scroll_to_with_scroll_to_options(&options);
        })?;
    }

    match kind {
        PageKind::Library => wire_library(window, &document, &runtime)?,
        PageKind::Chapter(_) => {
            wire_turning(window, &document, &runtime)?;
            wire_custom_css(window, &document, &runtime)?;
        }
        PageKind::BookHome => {}
    }

    {
        let runtime = runtime.clone();
        let window_for_handler = window.clone();
        on(window, "hashchange", move |_| {
            let mut runtime = runtime.borrow_mut();
            if let Some(location) = current_location(&window_for_handler, runtime.config()) {
                runtime.navigated(location);
            }
        })?;
    }

    {
        let runtime = runtime.clone();
        let window_for_handler = window.clone();
        on(window, "pagehide", move |_| {
            let mut runtime = runtime.borrow_mut();
            if let Some(location) = current_location(&window_for_handler, runtime.config()) {
                runtime.navigated(location);
            }
            if let Ok(offset) = window_for_handler.scroll_y() {
                runtime.scrolled(offset);
            }
        })?;
    }

    if matches!(kind, PageKind::Chapter(_)) {
        let window_for_handler = window.clone();
        on(window, "scroll", move |_| {
            if let Ok(offset) = window_for_handler.scroll_y() {
                runtime.borrow().scrolled(offset);
            }
        })?;
    }

    debug!("Listeners registered for {:?} page", kind);
    Ok(())
}

fn wire_library(
    window: &Window,
    document: &WebDocument,
    runtime: &SharedRuntime,
) -> Result<(), JsValue> {
    for search in document.select(SEARCH_SELECTOR) {
        let runtime = runtime.clone();
        on(&search.0, "input", move |event| {
            let query = event
                .target()
                .and_then(|target| target.dyn_into::<HtmlInputElement>().ok())
                .map(|input| input.value())
                .unwrap_or_default();
            runtime.borrow_mut().search_input(&query);
        })?;
    }

    for item in document.select(CLOUD_TAG_SELECTOR) {
        let runtime = runtime.clone();
        let tag = item.text();
        on(&item.0, "click", move |event| {
            let disposition = runtime.borrow_mut().tag_cloud_click(&tag);
            settle(&event, disposition);
        })?;
    }

    for card_tag in document.select(CARD_TAG_SELECTOR) {
        let runtime = runtime.clone();
        let tag = card_tag.text();
        on(&card_tag.0, "click", move |event| {
            let disposition = runtime.borrow_mut().card_tag_click(&tag);
            settle(&event, disposition);
        })?;
    }

    for id in [LEAVE_CONSTRAINED_ID, ENTER_CONSTRAINED_ID] {
        let (Some(control), Some(target)) = (document.element_by_id(id), switch_target(id)) else {
            continue;
        };
        let runtime = runtime.clone();
        let window = window.clone();
        on(&control.0, "click", move |event| {
            event.prevent_default();
            if let Err(e) = runtime.borrow().switch_mode(target) {
                warn!("Could not switch storage mode: {}", e);
                return;
            }
            let location = window.location();
            let reload = location
                .pathname()
                .and_then(|pathname| location.replace(&pathname));
            if let Err(e) = reload {
                warn!("Could not reload after mode switch: {}", js_details(&e));
            }
        })?;
    }

    Ok(())
}

fn wire_turning(
    window: &Window,
    document: &WebDocument,
    runtime: &SharedRuntime,
) -> Result<(), JsValue> {
    if runtime.borrow().layout() == Layout::Turning {
        start_turning(document, runtime);
    }

    for id in TOGGLE_IDS {
        let Some(toggle) = document.element_by_id(id) else {
            continue;
        };
        let runtime = runtime.clone();
        let document = document.clone();
        let window = window.clone();
        on(&toggle.0, "click", move |_| {
            let (layout, constrained) = {
                let runtime = runtime.borrow();
                (runtime.layout(), runtime.mode().is_constrained())
            };
            match layout {
                Layout::Scrolling => {
                    if runtime.borrow_mut().toggle_layout().is_some() {
                        start_turning(&document, &runtime);
                    }
                }
                Layout::Turning => {
                    if !constrained
                        && !confirm(&window, "Are you sure you want to exit the page-turning mode?")
                    {
                        return;
                    }
                    runtime.borrow_mut().toggle_layout();
                    if let Err(e) = window.location().reload() {
                        warn!("Could not reload after leaving page turning: {}", js_details(&e));
                    }
                }
            }
        })?;
    }

    for (id, forward) in [(PREV_PAGE_ID, false), (NEXT_PAGE_ID, true)] {
        let Some(button) = document.element_by_id(id) else {
            continue;
        };
        let runtime = runtime.clone();
        let document = document.clone();
        on(&button.0, "click", move |_| {
            if runtime.borrow_mut().turn_page(forward).is_none() {
                debug!("No page to turn to");
            }
            sync_jump_input(&document, &runtime);
        })?;
    }

    if let Some(go) = document.element_by_id(GO_TO_PAGE_ID) {
        let runtime = runtime.clone();
        let document = document.clone();
        on(&go.0, "click", move |_| go_to_page(&document, &runtime))?;
    }

    if let Some(jump) = document.element_by_id(PAGE_JUMP_ID) {
        let runtime = runtime.clone();
        let document = document.clone();
        on(&jump.0, "keypress", move |event| {
            let enter = event
                .dyn_ref::<KeyboardEvent>()
                .is_some_and(|key| key.key() == "Enter");
            if enter {
                go_to_page(&document, &runtime);
            }
        })?;
    }

    {
        let runtime = runtime.clone();
        let document_for_handler = document.clone();
        on(&document.0, "keydown", move |event| {
            let Some(key) = event.dyn_ref::<KeyboardEvent>() else {
                return;
            };
            let forward = match key.key().as_str() {
                "ArrowLeft" => false,
                "ArrowRight" => true,
                _ => return,
            };
            let enabled = runtime
                .borrow()
                .pages()
                .is_some_and(|pages| pages.arrow_keys_enabled());
            if enabled {
                runtime.borrow_mut().turn_page(forward);
                sync_jump_input(&document_for_handler, &runtime);
            }
        })?;
    }

    Ok(())
}

fn start_turning(document: &WebDocument, runtime: &SharedRuntime) {
    match pages::paginate(&document.0) {
        Ok(total) => {
            runtime.borrow_mut().paginated(total);
            sync_jump_input(document, runtime);
        }
        Err(e) => warn!("Could not split chapter into pages: {}", js_details(&e)),
    }
}

fn go_to_page(document: &WebDocument, runtime: &SharedRuntime) {
    let number = input(document, PAGE_JUMP_ID)
        .and_then(|jump| jump.value().trim().parse::<usize>().ok());
    let shown = number.and_then(|number| runtime.borrow_mut().jump_to_page(number));
    if shown.is_none() {
        let total = runtime.borrow().pages().map_or(0, |pages| pages.total_pages());
        warn!("Page number must be between 1 and {}", total);
    }
    sync_jump_input(document, runtime);
}

/// The jump box's live value drifts from its `value` attribute once edited
fn sync_jump_input(document: &WebDocument, runtime: &SharedRuntime) {
    let current = runtime.borrow().pages().and_then(|pages| pages.current_page());
    if let (Some(jump), Some(current)) = (input(document, PAGE_JUMP_ID), current) {
        jump.set_value(&(current + 1).to_string());
    }
}

fn wire_custom_css(
    window: &Window,
    document: &WebDocument,
    runtime: &SharedRuntime,
) -> Result<(), JsValue> {
    if let Some(css) = runtime.borrow().custom_css_text() {
        set_css_input(document, &css);
    }

    if let (Some(toggle), Some(content)) = (
        document.element_by_id(PANEL_TOGGLE_ID),
        document.element_by_id(PANEL_CONTENT_ID),
    ) {
        let icon = toggle.select("i").into_iter().next();
        on(&toggle.0, "click", move |_| {
            let expanded = !content.has_class("expanded");
            content.set_class("expanded", expanded);
            if let Some(icon) = &icon {
                icon.set_class("fa-chevron-up", expanded);
                icon.set_class("fa-chevron-down", !expanded);
            }
        })?;
    }

    let buttons: [(&str, CssAction); 5] = [
        (SAVE_ID, CssAction::Save),
        (SAVE_DEFAULT_ID, CssAction::SaveDefault),
        (LOAD_DEFAULT_ID, CssAction::LoadDefault),
        (RESET_ID, CssAction::Reset),
        (PREVIEW_ID, CssAction::Preview),
    ];
    for (id, action) in buttons {
        let Some(button) = document.element_by_id(id) else {
            continue;
        };
        let runtime = runtime.clone();
        let document = document.clone();
        let window = window.clone();
        on(&button.0, "click", move |_| {
            let css = css_input(&document).map(|input| input.value()).unwrap_or_default();
            let runtime = runtime.borrow();
            match action {
                CssAction::Save => {
                    runtime.save_custom_css(&css);
                }
                CssAction::SaveDefault => {
                    if confirm(
                        &window,
                        "Save as the default style? It applies to every book without its own.",
                    ) {
                        runtime.save_default_css(&css);
                    }
                }
                CssAction::LoadDefault => {
                    if !confirm(&window, "Load the default style? This replaces the current CSS.") {
                        return;
                    }
                    match runtime.load_default_css() {
                        Some(default) => set_css_input(&document, &default),
                        None => warn!("No default style stored"),
                    }
                }
                CssAction::Reset => {
                    if confirm(&window, "Reset the custom CSS for this book?") {
                        let fallback = runtime.reset_custom_css().unwrap_or_default();
                        set_css_input(&document, &fallback);
                    }
                }
                CssAction::Preview => runtime.preview_custom_css(&css),
            }
        })?;
    }

    Ok(())
}

#[derive(Debug, Clone, Copy)]
enum CssAction {
    Save,
    SaveDefault,
    LoadDefault,
    Reset,
    Preview,
}

fn css_input(document: &WebDocument) -> Option<HtmlTextAreaElement> {
    document
        .0
        .get_element_by_id(INPUT_ID)
        .and_then(|element| element.dyn_into::<HtmlTextAreaElement>().ok())
}

fn set_css_input(document: &WebDocument, css: &str) {
    if let Some(input) = css_input(document) {
        input.set_value(css);
    }
}

fn input(document: &WebDocument, id: &str) -> Option<HtmlInputElement> {
    document
        .0
        .get_element_by_id(id)
        .and_then(|element| element.dyn_into::<HtmlInputElement>().ok())
}

fn confirm(window: &Window, message: &str) -> bool {
    window.confirm_with_message(message).unwrap_or(false)
}

fn settle(event: &Event, disposition: EventDisposition) {
    if disposition == EventDisposition::PreventDefault {
        event.prevent_default();
        event.stop_propagation();
    }
}

fn on(
    target: &EventTarget,
    event: &str,
    handler: impl FnMut(Event) + 'static,
) -> Result<(), JsValue> {
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
    target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}
