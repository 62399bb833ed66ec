//! Parsed HTML page with a mutable overlay
//!
//! The markup is parsed once with `scraper`; mutations (attributes, classes,
//! inline styles, visibility) are recorded in an overlay keyed by element
//! position. Selectors always match against the markup as parsed, while
//! reads return the current (overlaid) values. Style sheets added through
//! [`Document::set_style_sheet`] are kept beside the markup, by id.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

use scraper::{ElementRef, Html, Selector};
use tracing::warn;

use super::{Document, Element};

#[derive(Debug, Clone, Default)]
struct Overlay {
    attributes: BTreeMap<String, String>,
    classes: Vec<String>,
    styles: BTreeMap<String, String>,
    text: Option<String>,
    hidden: bool,
}

struct Page {
    html: Html,
    overlays: RefCell<HashMap<usize, Overlay>>,
    sheets: RefCell<BTreeMap<String, String>>,
}

impl Page {
    fn elements(&self) -> impl Iterator<Item = ElementRef<'_>> {
        self.html.root_element().descendants().filter_map(ElementRef::wrap)
    }

    fn element(&self, index: usize) -> Option<ElementRef<'_>> {
        self.elements().nth(index)
    }

    fn index_of(&self, element: ElementRef<'_>) -> Option<usize> {
        self.elements().position(|candidate| candidate.id() == element.id())
    }

    fn initial_overlay(&self, index: usize) -> Overlay {
        let Some(element) = self.element(index) else {
            return Overlay::default();
        };
        let value = element.value();
        Overlay {
            attributes: value
                .attrs()
                .filter(|(name, _)| *name != "class")
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
            classes: value.classes().map(str::to_string).collect(),
            styles: BTreeMap::new(),
            text: None,
            hidden: false,
        }
    }
}

fn parse_selector(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(selector) => Some(selector),
        Err(e) => {
            warn!("Invalid selector {:?}: {:?}", selector, e);
            None
        }
    }
}

/// A parsed page
#[derive(Clone)]
pub struct SnapshotDocument {
    page: Rc<Page>,
}

impl SnapshotDocument {
    /// Parse a full HTML document
    pub fn parse(markup: &str) -> Self {
        Self {
            page: Rc::new(Page {
                html: Html::parse_document(markup),
                overlays: RefCell::new(HashMap::new()),
                sheets: RefCell::new(BTreeMap::new()),
            }),
        }
    }

    /// Contents of a style sheet added at runtime
    pub fn style_sheet(&self, id: &str) -> Option<String> {
        self.page.sheets.borrow().get(id).cloned()
    }

    fn wrap(&self, element: ElementRef<'_>) -> Option<SnapshotElement> {
        self.page.index_of(element).map(|index| SnapshotElement {
            page: Rc::clone(&self.page),
            index,
        })
    }
}

impl fmt::Debug for SnapshotDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotDocument")
            .field("elements", &self.page.elements().count())
            .field("modified", &self.page.overlays.borrow().len())
            .finish()
    }
}

impl Document for SnapshotDocument {
    type Element = SnapshotElement;

    fn body(&self) -> Option<SnapshotElement> {
        self.select("body").into_iter().next()
    }

    fn element_by_id(&self, id: &str) -> Option<SnapshotElement> {
        self.select("[id]")
            .into_iter()
            .find(|element| element.attribute("id").as_deref() == Some(id))
    }

    fn select(&self, selector: &str) -> Vec<SnapshotElement> {
        let Some(selector) = parse_selector(selector) else {
            return Vec::new();
        };
        self.page
            .html
            .select(&selector)
            .filter_map(|element| self.wrap(element))
            .collect()
    }

    fn set_style_sheet(&self, id: &str, css: Option<&str>) {
        let mut sheets = self.page.sheets.borrow_mut();
        sheets.remove(id);
        if let Some(css) = css.filter(|css| !css.trim().is_empty()) {
            sheets.insert(id.to_string(), css.to_string());
        }
    }
}

/// One element of a [`SnapshotDocument`]
#[derive(Clone)]
pub struct SnapshotElement {
    page: Rc<Page>,
    index: usize,
}

impl SnapshotElement {
    fn current(&self) -> Overlay {
        self.page
            .overlays
            .borrow()
            .get(&self.index)
            .cloned()
            .unwrap_or_else(|| self.page.initial_overlay(self.index))
    }

    fn with_overlay<R>(&self, f: impl FnOnce(&mut Overlay) -> R) -> R {
        let mut overlays = self.page.overlays.borrow_mut();
        let overlay = overlays
            .entry(self.index)
            .or_insert_with(|| self.page.initial_overlay(self.index));
        f(overlay)
    }

    /// Current classes, in order
    pub fn classes(&self) -> Vec<String> {
        self.current().classes
    }

    /// Current value of an inline style property
    pub fn style(&self, property: &str) -> Option<String> {
        self.current().styles.get(property).cloned()
    }

    /// Whether the element has been hidden
    pub fn is_hidden(&self) -> bool {
        self.current().hidden
    }
}

impl fmt::Debug for SnapshotElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self
            .page
            .element(self.index)
            .map(|element| element.value().name().to_string())
            .unwrap_or_default();
        f.debug_struct("SnapshotElement")
            .field("name", &name)
            .field("index", &self.index)
            .finish()
    }
}

impl Element for SnapshotElement {
    fn attribute(&self, name: &str) -> Option<String> {
        let current = self.current();
        if name == "class" {
            return (!current.classes.is_empty()).then(|| current.classes.join(" "));
        }
        current.attributes.get(name).cloned()
    }

    fn set_attribute(&self, name: &str, value: &str) {
        self.with_overlay(|overlay| {
            if name == "class" {
                overlay.classes = value.split_whitespace().map(str::to_string).collect();
            } else {
                overlay
                    .attributes
                    .insert(name.to_string(), value.to_string());
            }
        });
    }

    fn remove_attribute(&self, name: &str) {
        self.with_overlay(|overlay| {
            if name == "class" {
                overlay.classes.clear();
            } else {
                overlay.attributes.remove(name);
            }
        });
    }

    fn has_class(&self, class: &str) -> bool {
        self.current().classes.iter().any(|c| c == class)
    }

    fn add_class(&self, class: &str) {
        self.with_overlay(|overlay| {
            if !overlay.classes.iter().any(|c| c == class) {
                overlay.classes.push(class.to_string());
            }
        });
    }

    fn remove_class(&self, class: &str) {
        self.with_overlay(|overlay| overlay.classes.retain(|c| c != class));
    }

    fn text(&self) -> String {
        if let Some(text) = self.current().text {
            return text;
        }
        self.page
            .element(self.index)
            .map(|element| element.text().collect())
            .unwrap_or_default()
    }

    fn set_text(&self, text: &str) {
        self.with_overlay(|overlay| overlay.text = Some(text.to_string()));
    }

    fn set_hidden(&self, hidden: bool) {
        self.with_overlay(|overlay| overlay.hidden = hidden);
    }

    fn set_style(&self, property: &str, value: &str) {
        self.with_overlay(|overlay| {
            overlay
                .styles
                .insert(property.to_string(), value.to_string());
        });
    }

    fn select(&self, selector: &str) -> Vec<SnapshotElement> {
        let Some(selector) = parse_selector(selector) else {
            return Vec::new();
        };
        let Some(element) = self.page.element(self.index) else {
            return Vec::new();
        };
        element
            .select(&selector)
            .filter_map(|found| {
                self.page.index_of(found).map(|index| SnapshotElement {
                    page: Rc::clone(&self.page),
                    index,
                })
            })
            .collect()
    }
}
