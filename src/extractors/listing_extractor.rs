//! Rule-driven listing extraction
//!
//! For every container matched by a rule, each field rule's parser runs on
//! every matching descendant. The partial records are merged into a
//! [`Candidate`] holding the distinct values seen per field, and the candidate
//! becomes a [`Listing`] only when no field is contradictory.

use scraper::{ElementRef, Html};
use tracing::debug;

use super::{Field, FieldValue, Listing, PartialRecord, Rule, RuleTable};

/// Distinct values observed per field within one container
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidate {
    fields: Vec<(Field, Vec<FieldValue>)>,
}

impl Candidate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Distinct values seen for `field`, in first-seen order
    pub fn values(&self, field: Field) -> Option<&[FieldValue]> {
        self.fields
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, values)| values.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &[FieldValue])> {
        self.fields.iter().map(|(f, values)| (*f, values.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields with more than one distinct value, e.g. `price: 350000 | 425000`
    pub fn conflict_summary(&self) -> String {
        self.fields
            .iter()
            .filter(|(_, values)| values.len() != 1)
            .map(|(field, values)| {
                let values: Vec<String> = values.iter().map(FieldValue::to_string).collect();
                format!("{field}: {}", values.join(" | "))
            })
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn insert(&mut self, field: Field, value: &FieldValue) {
        let idx = match self.fields.iter().position(|(f, _)| *f == field) {
            Some(idx) => idx,
            None => {
                self.fields.push((field, Vec::new()));
                self.fields.len() - 1
            }
        };

        let values = &mut self.fields[idx].1;
        if !values.contains(value) {
            values.push(value.clone());
        }
    }
}

/// Fold one parser result into the candidate.
///
/// `None` (no match) leaves the candidate unchanged, as does a value the field
/// already holds.
pub fn merge_candidate(mut candidate: Candidate, record: Option<PartialRecord>) -> Candidate {
    if let Some(record) = record {
        for (field, value) in record.iter() {
            candidate.insert(field, value);
        }
    }
    candidate
}

/// Collapse a candidate into a listing.
///
/// Returns `None` for an empty candidate, or when any field has other than
/// exactly one distinct value.
pub fn resolve_listing(candidate: &Candidate) -> Option<Listing> {
    if candidate.is_empty() {
        return None;
    }

    candidate
        .iter()
        .map(|(field, values)| match values {
            [value] => Some((field, value.clone())),
            _ => None,
        })
        .collect::<Option<Listing>>()
}

/// Run a rule's field parsers over one container
pub fn extract_container(container: ElementRef<'_>, rule: &Rule) -> Option<Listing> {
    let mut records = Vec::new();
    for field_rule in rule.fields() {
        for element in container.select(field_rule.selector()) {
            records.push(field_rule.parser().parse(element));
        }
    }

    let candidate = records.into_iter().fold(Candidate::new(), merge_candidate);
    let listing = resolve_listing(&candidate);

    if listing.is_none() && !candidate.is_empty() {
        debug!(
            container = rule.container_str(),
            conflicting = %candidate.conflict_summary(),
            "discarding ambiguous candidate"
        );
    }
    listing
}

/// Apply one rule to every matching container under `root`, in document order
pub fn apply_rule(root: ElementRef<'_>, rule: &Rule) -> Vec<Listing> {
    collect_listings(root.select(rule.container()), rule)
}

/// Apply every rule of the table under `root`, concatenating in table order.
///
/// No deduplication happens across rules: a container matched by two rules
/// can yield two listings.
pub fn extract(root: ElementRef<'_>, rules: &RuleTable) -> Vec<Listing> {
    rules
        .rules()
        .iter()
        .flat_map(|rule| apply_rule(root, rule))
        .collect()
}

/// Like [`extract`], but containers are searched across the whole document
pub fn extract_document(document: &Html, rules: &RuleTable) -> Vec<Listing> {
    rules
        .rules()
        .iter()
        .flat_map(|rule| collect_listings(document.select(rule.container()), rule))
        .collect()
}

fn collect_listings<'a>(
    containers: impl Iterator<Item = ElementRef<'a>>,
    rule: &Rule,
) -> Vec<Listing> {
    let mut matched = 0usize;
    let listings: Vec<Listing> = containers
        .inspect(|_| matched += 1)
        .filter_map(|container| extract_container(container, rule))
        .collect();

    debug!(
        container = rule.container_str(),
        matched,
        listings = listings.len(),
        "applied rule"
    );
    listings
}
