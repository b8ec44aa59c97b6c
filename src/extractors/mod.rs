//! Listing extraction modules
//!
//! Each module covers one stage of the pipeline: text flattening, DOM
//! annotation, per-field parsing, rule configuration, and listing assembly.

mod annotator;
mod field_parsers;
mod listing_extractor;
mod rules;
mod text_extractor;

pub use annotator::*;
pub use field_parsers::*;
pub use listing_extractor::*;
pub use rules::*;
pub use text_extractor::*;

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// Semantic field recognized by a parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Address,
    City,
    State,
    PostalCode,
    Country,
    Price,
    Beds,
    Baths,
    ExternalId,
    Sqft,
}

impl Field {
    /// Key used in JSON output and oracle files
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Address => "address",
            Field::City => "city",
            Field::State => "state",
            Field::PostalCode => "postal_code",
            Field::Country => "country",
            Field::Price => "price",
            Field::Beds => "beds",
            Field::Baths => "baths",
            Field::ExternalId => "external_id",
            Field::Sqft => "sqft",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scalar value of a single field
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Int(i64),
    Text(String),
}

impl FieldValue {
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Int(n) => Value::from(*n),
            FieldValue::Text(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(n) => write!(f, "{n}"),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

/// Fields recognized by one parser invocation, in the order the parser emits them.
///
/// An empty record is representable but no shipped parser produces one: a
/// parser that does not match returns `None` instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialRecord {
    entries: Vec<(Field, FieldValue)>,
}

impl PartialRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert. A repeated field replaces the earlier value.
    pub fn with(mut self, field: Field, value: impl Into<FieldValue>) -> Self {
        let value = value.into();
        match self.entries.iter_mut().find(|(f, _)| *f == field) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((field, value)),
        }
        self
    }

    pub fn get(&self, field: Field) -> Option<&FieldValue> {
        self.entries
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &FieldValue)> {
        self.entries.iter().map(|(f, v)| (*f, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A validated, unambiguous listing: every field maps to exactly one value.
///
/// Serializes as a flat JSON object with fields in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    fields: Vec<(Field, FieldValue)>,
}

impl Listing {
    pub fn get(&self, field: Field) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &FieldValue)> {
        self.fields.iter().map(|(f, v)| (*f, v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Convert to a JSON object, the shape oracle records are compared in
    pub fn to_record(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .map(|(f, v)| (f.as_str().to_string(), v.to_json()))
            .collect()
    }
}

impl FromIterator<(Field, FieldValue)> for Listing {
    fn from_iter<I: IntoIterator<Item = (Field, FieldValue)>>(iter: I) -> Self {
        Listing {
            fields: iter.into_iter().collect(),
        }
    }
}

impl Serialize for Listing {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (field, value) in &self.fields {
            map.serialize_entry(field.as_str(), value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_record_replaces_repeated_field() {
        let record = PartialRecord::new()
            .with(Field::Beds, 2)
            .with(Field::Beds, 3);
        assert_eq!(record.len(), 1);
        assert_eq!(record.get(Field::Beds), Some(&FieldValue::Int(3)));
    }

    #[test]
    fn test_empty_partial_record_is_representable() {
        let record = PartialRecord::new();
        assert!(record.is_empty());
        assert_eq!(record.get(Field::Price), None);
    }

    #[test]
    fn test_listing_serializes_in_field_order() {
        let listing: Listing = vec![
            (Field::Price, FieldValue::Int(350000)),
            (Field::City, FieldValue::from("Springfield")),
        ]
        .into_iter()
        .collect();

        let json = serde_json::to_string(&listing).unwrap();
        assert_eq!(json, r#"{"price":350000,"city":"Springfield"}"#);
    }

    #[test]
    fn test_listing_to_record() {
        let listing: Listing = vec![
            (Field::ExternalId, FieldValue::from("AB12345")),
            (Field::Sqft, FieldValue::Int(1200)),
        ]
        .into_iter()
        .collect();

        let record = listing.to_record();
        assert_eq!(record["external_id"], "AB12345");
        assert_eq!(record["sqft"], 1200);
    }

    #[test]
    fn test_field_value_deserializes_untagged() {
        let values: Vec<FieldValue> = serde_json::from_str(r#"[3, "IL"]"#).unwrap();
        assert_eq!(values, vec![FieldValue::Int(3), FieldValue::from("IL")]);
    }
}
