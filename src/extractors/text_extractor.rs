//! Flattened text content of DOM elements
//!
//! Every field parser matches against the string produced here, so the join
//! and trim rules are part of the parsing contract: child texts are joined
//! with a single space and only the outer result loses leading/trailing
//! spaces. Text nodes are returned verbatim.

use scraper::{ElementRef, Node};

/// Flatten an element's text content into one string
pub fn flatten_text(element: ElementRef<'_>) -> String {
    let parts: Vec<String> = element
        .children()
        .map(|child| match child.value() {
            Node::Element(_) => ElementRef::wrap(child).map(flatten_text).unwrap_or_default(),
            Node::Text(text) => (**text).to_string(),
            _ => String::new(),
        })
        .collect();

    parts.join(" ").trim_matches(' ').to_string()
}
