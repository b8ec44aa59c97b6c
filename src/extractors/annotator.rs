//! Text-derived class annotations for selector tooling
//!
//! Short elements get a `q-<slug>` class token derived from their flattened
//! text, so that a selector picker can target e.g. `.q-fort-worth`. The parsed
//! document is left untouched: tokens are recorded in a side table keyed by
//! element identity.

use std::sync::LazyLock;
use std::time::Instant;

use regex::Regex;
use scraper::ElementRef;
use tracing::debug;

use super::flatten_text;

/// Elements whose flattened text is longer than this are not annotated.
/// Measured in UTF-16 code units, the way browsers report text length.
pub const MAX_ANNOTATED_TEXT_LEN: usize = 40;

static NON_SLUG_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9a-z]+").expect("valid regex"));

/// Lowercase, collapse every run outside `[0-9a-z]` to `-`, trim hyphens.
/// Returns `None` when nothing is left.
pub fn slugify(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    let slug = NON_SLUG_RUN.replace_all(&lower, "-");
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        None
    } else {
        Some(slug.to_string())
    }
}

/// One annotated element and the class token it received
#[derive(Debug, Clone)]
pub struct Annotation<'a> {
    pub element: ElementRef<'a>,
    pub class_token: String,
}

/// Annotation side table, in pre-order of the annotated subtree
#[derive(Debug, Clone, Default)]
pub struct Annotations<'a> {
    entries: Vec<Annotation<'a>>,
}

impl<'a> Annotations<'a> {
    /// The `q-` token assigned to `element`, if any
    pub fn class_token(&self, element: ElementRef<'a>) -> Option<&str> {
        self.entries
            .iter()
            .find(|a| a.element == element)
            .map(|a| a.class_token.as_str())
    }

    /// The element's class attribute with its annotation appended.
    ///
    /// Unannotated elements report their original attribute unchanged.
    pub fn class_attr(&self, element: ElementRef<'a>) -> Option<String> {
        let existing = element.value().attr("class");
        match self.class_token(element) {
            Some(token) => Some(format!("{} {}", existing.unwrap_or(""), token)),
            None => existing.map(String::from),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Annotation<'a>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Annotate `root` and every descendant element, parents before children
pub fn annotate(root: ElementRef<'_>) -> Annotations<'_> {
    let start = Instant::now();
    let mut annotations = Annotations::default();
    let mut visited = 0usize;

    visit(root, &mut annotations, &mut visited);

    debug!(
        visited,
        annotated = annotations.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "annotated document"
    );
    annotations
}

fn visit<'a>(element: ElementRef<'a>, annotations: &mut Annotations<'a>, visited: &mut usize) {
    *visited += 1;

    let text = flatten_text(element);
    if text.encode_utf16().count() <= MAX_ANNOTATED_TEXT_LEN {
        if let Some(slug) = slugify(&text) {
            annotations.entries.push(Annotation {
                element,
                class_token: format!("q-{slug}"),
            });
        }
    }

    for child in element.children().filter_map(ElementRef::wrap) {
        visit(child, annotations, visited);
    }
}
