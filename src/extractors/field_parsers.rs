//! Field parsers: flattened element text to a partial listing record
//!
//! Each parser tries an ordered list of patterns against the element's
//! flattened text and returns the record for the first one that matches.
//! Only US addresses and dollar prices are recognized.

use std::sync::LazyLock;

use regex::Regex;
use scraper::ElementRef;
use serde::{Deserialize, Serialize};

use super::{flatten_text, Field, PartialRecord};

static STREET_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(.+), (.+), ([A-Z][A-Z]) +([0-9]{5})").expect("valid regex")
});

static PRICE: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        Regex::new(r"\$([0-9]{1,3}, *[0-9]{3}, *[0-9]{3})").expect("valid regex"),
        Regex::new(r"\$([0-9]{3}, *[0-9]{3})").expect("valid regex"),
    ]
});

static BEDS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        Regex::new(r"(?i)^ *([0-9]) *beds? *$").expect("valid regex"),
        Regex::new(r"(?i)^ *([0-9]) *bedbeds *$").expect("valid regex"),
    ]
});

static BATHS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^ *([0-9]) *baths? *$").expect("valid regex"));

static MLS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ *MLS *#? *([A-Z0-9]{5,15}) *$").expect("valid regex"));

// Tolerates "sqft", "sq. ft", "square feet", "squarefoot" and similar
static SQFT: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        Regex::new(r"(?i)^ *([0-9]{1,2},? *[0-9]{3}) *squ?a?r?e?\.? ?fe?e?o?o?t[. ]*$")
            .expect("valid regex"),
        Regex::new(r"(?i)^ *([0-9]{3}) *squ?a?r?e?\.? ?fe?e?o?o?t[. ]*$").expect("valid regex"),
    ]
});

/// The closed set of field parsers a rule can refer to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldParser {
    StreetAddress,
    Price,
    Beds,
    Baths,
    Mls,
    Sqft,
}

impl FieldParser {
    /// Parse an element's flattened text
    pub fn parse(&self, element: ElementRef<'_>) -> Option<PartialRecord> {
        self.parse_text(&flatten_text(element))
    }

    /// Parse already-flattened text
    pub fn parse_text(&self, text: &str) -> Option<PartialRecord> {
        match self {
            FieldParser::StreetAddress => parse_street_address(text),
            FieldParser::Price => parse_price(text),
            FieldParser::Beds => parse_beds(text),
            FieldParser::Baths => parse_baths(text),
            FieldParser::Mls => parse_mls(text),
            FieldParser::Sqft => parse_sqft(text),
        }
    }

}

/// `<street>, <city>, <ST> <zip>`; country is always US
pub fn parse_street_address(text: &str) -> Option<PartialRecord> {
    let caps = STREET_ADDRESS.captures(text)?;
    Some(
        PartialRecord::new()
            .with(Field::Address, &caps[1])
            .with(Field::City, &caps[2])
            .with(Field::State, &caps[3])
            .with(Field::PostalCode, &caps[4])
            .with(Field::Country, "US"),
    )
}

/// `$1,234,567` or `$123,456`
pub fn parse_price(text: &str) -> Option<PartialRecord> {
    let price = first_capture(PRICE.iter(), text).and_then(parse_grouped_int)?;
    Some(PartialRecord::new().with(Field::Price, price))
}

/// `3 beds`, `3 Bed`, `3bedbeds`
pub fn parse_beds(text: &str) -> Option<PartialRecord> {
    let beds = first_capture(BEDS.iter(), text).and_then(parse_grouped_int)?;
    Some(PartialRecord::new().with(Field::Beds, beds))
}

/// `2 baths`, `1 Bath`
pub fn parse_baths(text: &str) -> Option<PartialRecord> {
    let baths = first_capture(std::iter::once(&*BATHS), text).and_then(parse_grouped_int)?;
    Some(PartialRecord::new().with(Field::Baths, baths))
}

/// `MLS #AB12345`; the identifier is kept as written
pub fn parse_mls(text: &str) -> Option<PartialRecord> {
    let id = first_capture(std::iter::once(&*MLS), text)?;
    Some(PartialRecord::new().with(Field::ExternalId, id))
}

/// `1,250 sqft`, `850 sq. ft.`, `2 400 square feet`
pub fn parse_sqft(text: &str) -> Option<PartialRecord> {
    let sqft = first_capture(SQFT.iter(), text).and_then(parse_grouped_int)?;
    Some(PartialRecord::new().with(Field::Sqft, sqft))
}

/// First capture group of the first pattern that matches
fn first_capture<'t, 'r>(
    patterns: impl IntoIterator<Item = &'r Regex>,
    text: &'t str,
) -> Option<&'t str> {
    patterns
        .into_iter()
        .find_map(|re| re.captures(text).and_then(|caps| caps.get(1)))
        .map(|m| m.as_str())
}

/// Base-10 integer with digit-group commas and spaces removed
fn parse_grouped_int(digits: &str) -> Option<i64> {
    digits
        .chars()
        .filter(|c| *c != ',' && *c != ' ')
        .collect::<String>()
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::FieldValue;
    use pretty_assertions::assert_eq;

    fn int(record: &PartialRecord, field: Field) -> Option<i64> {
        match record.get(field)? {
            FieldValue::Int(n) => Some(*n),
            FieldValue::Text(_) => None,
        }
    }

    #[test]
    fn test_street_address() {
        let record = parse_street_address("123 Main St, Springfield, IL 62704").unwrap();
        let expected = PartialRecord::new()
            .with(Field::Address, "123 Main St")
            .with(Field::City, "Springfield")
            .with(Field::State, "IL")
            .with(Field::PostalCode, "62704")
            .with(Field::Country, "US");
        assert_eq!(record, expected);
    }

    #[test]
    fn test_street_address_greedy_street() {
        let record = parse_street_address("Unit 4, 9 Elm Rd, Austin, TX  73301").unwrap();
        assert_eq!(record.get(Field::Address), Some(&FieldValue::from("Unit 4, 9 Elm Rd")));
        assert_eq!(record.get(Field::City), Some(&FieldValue::from("Austin")));
        assert_eq!(record.get(Field::PostalCode), Some(&FieldValue::from("73301")));
    }

    #[test]
    fn test_street_address_rejects_lowercase_state() {
        assert_eq!(parse_street_address("123 Main St, Springfield, il 62704"), None);
        assert_eq!(parse_street_address("123 Main St Springfield IL 62704"), None);
    }

    #[test]
    fn test_price() {
        assert_eq!(int(&parse_price("$350,000").unwrap(), Field::Price), Some(350000));
        assert_eq!(
            int(&parse_price("Now only $1,250,000!").unwrap(), Field::Price),
            Some(1250000)
        );
        assert_eq!(int(&parse_price("$1, 250, 000").unwrap(), Field::Price), Some(1250000));
    }

    #[test]
    fn test_price_prefers_millions_pattern() {
        // The six-digit pattern would stop at "$12,345" otherwise
        assert_eq!(
            int(&parse_price("$12,345,678").unwrap(), Field::Price),
            Some(12345678)
        );
    }

    #[test]
    fn test_price_rejects_small_amounts() {
        assert_eq!(parse_price("$99,000"), None);
        assert_eq!(parse_price("350,000"), None);
        assert_eq!(parse_price("$350000"), None);
    }

    #[test]
    fn test_beds() {
        assert_eq!(int(&parse_beds("3 Beds").unwrap(), Field::Beds), Some(3));
        assert_eq!(int(&parse_beds(" 1 bed ").unwrap(), Field::Beds), Some(1));
        assert_eq!(int(&parse_beds("4bedbeds").unwrap(), Field::Beds), Some(4));
        assert_eq!(parse_beds("10 beds"), None);
        assert_eq!(parse_beds("3 beds, 2 baths"), None);
    }

    #[test]
    fn test_baths() {
        assert_eq!(int(&parse_baths("3 bath").unwrap(), Field::Baths), Some(3));
        assert_eq!(int(&parse_baths("2 BATHS").unwrap(), Field::Baths), Some(2));
        assert_eq!(parse_baths("2.5 baths"), None);
    }

    #[test]
    fn test_mls() {
        let record = parse_mls("MLS #AB12345").unwrap();
        assert_eq!(record.get(Field::ExternalId), Some(&FieldValue::from("AB12345")));

        let record = parse_mls(" MLS# 2024000111 ").unwrap();
        assert_eq!(record.get(Field::ExternalId), Some(&FieldValue::from("2024000111")));

        assert_eq!(parse_mls("MLS #ab12345"), None);
        assert_eq!(parse_mls("MLS #1234"), None);
        assert_eq!(parse_mls("mls #AB12345"), None);
    }

    #[test]
    fn test_sqft_variants() {
        for text in [
            "1,250 sqft",
            "1,250 sq. ft.",
            "1250 Sq Ft",
            "1, 250 square feet",
            "1,250 SQUAREFOOT",
        ] {
            let record = parse_sqft(text).unwrap_or_else(|| panic!("no match for {text:?}"));
            assert_eq!(int(&record, Field::Sqft), Some(1250), "{text}");
        }

        assert_eq!(int(&parse_sqft("850 sqft").unwrap(), Field::Sqft), Some(850));
    }

    #[test]
    fn test_sqft_rejects() {
        assert_eq!(parse_sqft("85 sqft"), None);
        assert_eq!(parse_sqft("1,250 acres"), None);
        assert_eq!(parse_sqft("about 1,250 sqft"), None);
    }

    #[test]
    fn test_parser_dispatch() {
        assert!(FieldParser::Price.parse_text("$350,000").is_some());
        assert!(FieldParser::Beds.parse_text("$350,000").is_none());
    }

    #[test]
    fn test_parser_names() {
        let parser: FieldParser = serde_json::from_str(r#""street_address""#).unwrap();
        assert_eq!(parser, FieldParser::StreetAddress);
        let parser: FieldParser = serde_json::from_str(r#""mls""#).unwrap();
        assert_eq!(parser, FieldParser::Mls);
    }
}
