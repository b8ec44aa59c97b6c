//! Oracle files and comparison of extracted listings against them
//!
//! An oracle is newline-delimited JSON, one expected record per non-empty
//! line. Records are compared by their canonical form: top-level entries
//! sorted by key and serialized, so field order never matters.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Error, Result};
use crate::extractors::Listing;

/// A flat JSON record, as found in oracle files
pub type Record = Map<String, Value>;

/// Read and parse an oracle file
pub fn read_oracle(path: &Path) -> Result<Vec<Record>> {
    let content = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_oracle(&content, path)
}

/// Parse oracle content; `path` is only used for error messages
pub fn parse_oracle(content: &str, path: &Path) -> Result<Vec<Record>> {
    let mut records = Vec::new();

    for (idx, line) in content.split('\n').enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let value: Value = serde_json::from_str(line).map_err(|source| Error::OracleLine {
            path: path.to_path_buf(),
            line: idx + 1,
            source,
        })?;

        match value {
            Value::Object(record) => records.push(record),
            _ => {
                return Err(Error::OracleRecord {
                    path: path.to_path_buf(),
                    line: idx + 1,
                })
            }
        }
    }

    debug!(path = %path.display(), records = records.len(), "parsed oracle");
    Ok(records)
}

/// Record entries sorted by key
pub fn canonicalize(record: &Record) -> Vec<(&str, &Value)> {
    let mut entries: Vec<(&str, &Value)> = record.iter().map(|(k, v)| (k.as_str(), v)).collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
}

/// Serialized canonical form, e.g. `[["baths",2],["beds",3]]`.
///
/// Integral floats serialize as integers, so `3.0` and `3` are the same value.
pub fn canonical_key(record: &Record) -> String {
    let pairs: Vec<Value> = canonicalize(record)
        .into_iter()
        .map(|(k, v)| Value::Array(vec![Value::String(k.to_string()), normalize_numbers(v)]))
        .collect();
    Value::Array(pairs).to_string()
}

fn normalize_numbers(value: &Value) -> Value {
    match value {
        Value::Number(n) if !n.is_i64() && !n.is_u64() => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
                Value::from(f as i64)
            }
            _ => value.clone(),
        },
        Value::Array(items) => Value::Array(items.iter().map(normalize_numbers).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), normalize_numbers(v)))
                .collect(),
        ),
        _ => value.clone(),
    }
}

/// Outcome of comparing expected records with actual ones
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Comparison {
    /// Expected records that were found
    pub both: Vec<Record>,
    /// Expected records that were not found
    pub missing: Vec<Record>,
    /// Actual records that no expected record asked for
    pub extra: Vec<Record>,
}

impl Comparison {
    /// True when nothing is missing and nothing is extra
    pub fn is_match(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty()
    }
}

/// Compare expected with actual records.
///
/// Each expected record is looked up by a linear scan over `actual`. Matches
/// are not consumed, so duplicates on either side are satisfied by a single
/// equal record on the other side.
pub fn compare(expected: &[Record], actual: &[Record]) -> Comparison {
    let actual_keys: Vec<String> = actual.iter().map(canonical_key).collect();
    let mut found: HashSet<String> = HashSet::new();

    for record in expected {
        let needle = canonical_key(record);
        if actual_keys.iter().any(|candidate| *candidate == needle) {
            found.insert(needle);
        }
    }

    let mut comparison = Comparison::default();
    for record in expected {
        if found.contains(&canonical_key(record)) {
            comparison.both.push(record.clone());
        } else {
            comparison.missing.push(record.clone());
        }
    }
    for (record, key) in actual.iter().zip(&actual_keys) {
        if !found.contains(key) {
            comparison.extra.push(record.clone());
        }
    }

    comparison
}

/// Compare oracle records with extracted listings
pub fn compare_listings(expected: &[Record], listings: &[Listing]) -> Comparison {
    let actual: Vec<Record> = listings.iter().map(Listing::to_record).collect();
    compare(expected, &actual)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::{Field, FieldValue};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn rec(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn test_parse_oracle_skips_blank_lines() {
        let content = "{\"beds\":3}\n\n{\"price\":350000,\"city\":\"Austin\"}\n";
        let records = parse_oracle(content, Path::new("x.jsonl")).unwrap();
        assert_eq!(
            records,
            vec![
                rec(json!({"beds": 3})),
                rec(json!({"price": 350000, "city": "Austin"})),
            ]
        );
    }

    #[test]
    fn test_parse_oracle_malformed_line() {
        let content = "{\"beds\":3}\n{beds: 4}\n";
        let err = parse_oracle(content, Path::new("x.jsonl")).unwrap_err();
        match err {
            Error::OracleLine { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_oracle_rejects_non_object() {
        let err = parse_oracle("[1, 2]\n", Path::new("x.jsonl")).unwrap_err();
        assert!(matches!(err, Error::OracleRecord { line: 1, .. }));
    }

    #[test]
    fn test_canonicalize_ignores_insertion_order() {
        let mut a = Record::new();
        a.insert("price".to_string(), json!(350000));
        a.insert("beds".to_string(), json!(3));

        let mut b = Record::new();
        b.insert("beds".to_string(), json!(3));
        b.insert("price".to_string(), json!(350000));

        assert_eq!(canonicalize(&a), canonicalize(&b));
        assert_eq!(canonical_key(&a), canonical_key(&b));
        assert_eq!(canonical_key(&a), r#"[["beds",3],["price",350000]]"#);
    }

    #[test]
    fn test_canonical_key_distinguishes_value_types() {
        let number = rec(json!({"postal_code": 62704}));
        let text = rec(json!({"postal_code": "62704"}));
        assert!(canonical_key(&number) != canonical_key(&text));
    }

    #[test]
    fn test_canonical_key_integral_floats_equal_integers() {
        let float = rec(json!({"beds": 3.0, "price": 350000.0}));
        let int = rec(json!({"beds": 3, "price": 350000}));
        assert_eq!(canonical_key(&float), canonical_key(&int));

        let fractional = rec(json!({"baths": 2.5}));
        assert_eq!(canonical_key(&fractional), r#"[["baths",2.5]]"#);
    }

    #[test]
    fn test_compare_float_oracle_against_listing() {
        let expected = parse_oracle("{\"beds\":3.0}\n", Path::new("x.jsonl")).unwrap();
        let listing: Listing = vec![(Field::Beds, FieldValue::Int(3))].into_iter().collect();

        let comparison = compare_listings(&expected, &[listing]);
        assert!(comparison.is_match(), "{comparison:#?}");
    }

    #[test]
    fn test_compare_extra() {
        let expected = vec![rec(json!({"beds": 3}))];
        let actual = vec![rec(json!({"beds": 3})), rec(json!({"beds": 4}))];

        let comparison = compare(&expected, &actual);
        assert_eq!(comparison.missing, Vec::<Record>::new());
        assert_eq!(comparison.extra, vec![rec(json!({"beds": 4}))]);
        assert_eq!(comparison.both, vec![rec(json!({"beds": 3}))]);
        assert!(!comparison.is_match());
    }

    #[test]
    fn test_compare_missing() {
        let expected = vec![rec(json!({"beds": 3, "baths": 2}))];
        let actual = vec![rec(json!({"beds": 3}))];

        let comparison = compare(&expected, &actual);
        assert_eq!(comparison.missing, expected);
        assert_eq!(comparison.extra, actual);
    }

    #[test]
    fn test_compare_self_is_match() {
        let records = vec![
            rec(json!({"beds": 3, "price": 350000})),
            rec(json!({"address": "1 Elm St", "city": "Austin", "state": "TX"})),
            rec(json!({})),
        ];
        let comparison = compare(&records, &records);
        assert!(comparison.is_match());
        assert_eq!(comparison.both.len(), records.len());
    }

    // Duplicate counts are not checked: one actual record satisfies any
    // number of equal expected records, and vice versa.
    #[test]
    fn test_compare_duplicates_are_lenient() {
        let expected = vec![rec(json!({"beds": 3})), rec(json!({"beds": 3}))];
        let actual = vec![rec(json!({"beds": 3}))];
        assert!(compare(&expected, &actual).is_match());
        assert!(compare(&actual, &expected).is_match());
    }

    #[test]
    fn test_compare_serializes_all_sections() {
        let comparison = compare(&[rec(json!({"beds": 1}))], &[]);
        let json = serde_json::to_value(&comparison).unwrap();
        assert_eq!(json, json!({"both": [], "missing": [{"beds": 1}], "extra": []}));
    }
}
