//! Live DOM behind the `shelf-core` document traits

use shelf_core::dom::{Document, Element};
use tracing::warn;
use wasm_bindgen::JsCast;
use web_sys::{HtmlElement, NodeList};

use crate::storage::js_details;

/// A live element
#[derive(Clone)]
pub struct WebElement(pub web_sys::Element);

impl WebElement {
    fn with_style(&self, f: impl FnOnce(&web_sys::CssStyleDeclaration) -> Result<(), wasm_bindgen::JsValue>) {
        let Some(element) = self.0.dyn_ref::<HtmlElement>() else {
            return;
        };
        if let Err(e) = f(&element.style()) {
            warn!("Could not update style on <{}>: {}", self.0.tag_name(), js_details(&e));
        }
    }
}

impl Element for WebElement {
    fn attribute(&self, name: &str) -> Option<String> {
        self.0.get_attribute(name)
    }

    fn set_attribute(&self, name: &str, value: &str) {
        if let Err(e) = self.0.set_attribute(name, value) {
            warn!("Could not set {} on <{}>: {}", name, self.0.tag_name(), js_details(&e));
        }
    }

    fn remove_attribute(&self, name: &str) {
        if let Err(e) = self.0.remove_attribute(name) {
            warn!("Could not remove {} from <{}>: {}", name, self.0.tag_name(), js_details(&e));
        }
    }

    fn has_class(&self, class: &str) -> bool {
        self.0.class_list().contains(class)
    }

    fn add_class(&self, class: &str) {
        if let Err(e) = self.0.class_list().add_1(class) {
            warn!("Could not add class {}: {}", class, js_details(&e));
        }
    }

    fn remove_class(&self, class: &str) {
        if let Err(e) = self.0.class_list().remove_1(class) {
            warn!("Could not remove class {}: {}", class, js_details(&e));
        }
    }

    fn text(&self) -> String {
        self.0.text_content().unwrap_or_default()
    }

    fn set_text(&self, text: &str) {
        self.0.set_text_content(Some(text));
    }

    fn set_hidden(&self, hidden: bool) {
        // An empty value hands display back to the stylesheet
        self.with_style(|style| style.set_property("display", if hidden { "none" } else { "" }));
    }

    fn set_style(&self, property: &str, value: &str) {
        self.with_style(|style| style.set_property(property, value));
    }

    fn select(&self, selector: &str) -> Vec<Self> {
        match self.0.query_selector_all(selector) {
            Ok(nodes) => elements(&nodes),
            Err(e) => {
                warn!("Bad selector {:?}: {}", selector, js_details(&e));
                Vec::new()
            }
        }
    }
}

/// The live page
#[derive(Clone)]
pub struct WebDocument(pub web_sys::Document);

impl Document for WebDocument {
    type Element = WebElement;

    fn body(&self) -> Option<WebElement> {
        self.0.body().map(|body| WebElement(body.into()))
    }

    fn element_by_id(&self, id: &str) -> Option<WebElement> {
        self.0.get_element_by_id(id).map(WebElement)
    }

    fn select(&self, selector: &str) -> Vec<WebElement> {
        match self.0.query_selector_all(selector) {
            Ok(nodes) => elements(&nodes),
            Err(e) => {
                warn!("Bad selector {:?}: {}", selector, js_details(&e));
                Vec::new()
            }
        }
    }

    fn set_style_sheet(&self, id: &str, css: Option<&str>) {
        if let Some(existing) = self.0.get_element_by_id(id) {
            existing.remove();
        }
        let Some(css) = css.filter(|css| !css.trim().is_empty()) else {
            return;
        };
        let Some(head) = self.0.head() else {
            warn!("No <head> to add style sheet {} to", id);
            return;
        };
        let added = self.0.create_element("style").and_then(|style| {
            style.set_id(id);
            style.set_text_content(Some(css));
            head.append_child(&style)
        });
        if let Err(e) = added {
            warn!("Could not add style sheet {}: {}", id, js_details(&e));
        }
    }
}

fn elements(nodes: &NodeList) -> Vec<WebElement> {
    (0..nodes.length())
        .filter_map(|i| nodes.get(i))
        .filter_map(|node| node.dyn_into::<web_sys::Element>().ok())
        .map(WebElement)
        .collect()
}
