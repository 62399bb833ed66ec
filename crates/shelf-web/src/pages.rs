//! Splitting a chapter into pages
//!
//! Needs real layout, so it lives with the browser bindings: the blocks of
//! `#content` are measured, grouped by [`split_pages`] and moved into one
//! `.pagination-page` wrapper per page.

use shelf_core::turning::{split_pages, CONTENT_ID, PAGE_CLASS, PAGE_PADDING};
use tracing::debug;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, HtmlElement, Node};

/// Wrap the chapter content into pages; returns the page count
///
/// A chapter without `#content` has no pages.
pub fn paginate(document: &Document) -> Result<usize, JsValue> {
    let Some(content) = document.get_element_by_id(CONTENT_ID) else {
        return Ok(0);
    };

    let children = content.children();
    let blocks: Vec<web_sys::Element> = (0..children.length())
        .filter_map(|i| children.item(i))
        .collect();

    if blocks.is_empty() {
        // Bare text: everything goes on a single page
        let nodes = content.child_nodes();
        let nodes: Vec<Node> = (0..nodes.length()).filter_map(|i| nodes.get(i)).collect();
        let page = new_page(document)?;
        for node in &nodes {
            page.append_child(node)?;
        }
        content.append_child(&page)?;
        return Ok(1);
    }

    let heights: Vec<f64> = blocks
        .iter()
        .map(|block| {
            block
                .dyn_ref::<HtmlElement>()
                .map_or(0.0, |element| f64::from(element.offset_height()))
        })
        .collect();
    let capacity = f64::from(content.client_height()) - PAGE_PADDING;
    let pages = split_pages(&heights, capacity);

    for range in &pages {
        let page = new_page(document)?;
        for block in &blocks[range.clone()] {
            page.append_child(block)?;
        }
        content.append_child(&page)?;
    }

    debug!("Split {} blocks into {} pages", blocks.len(), pages.len());
    Ok(pages.len())
}

fn new_page(document: &Document) -> Result<web_sys::Element, JsValue> {
    let page = document.create_element("div")?;
    page.set_class_name(PAGE_CLASS);
    Ok(page)
}
