//! Rule tables: which containers to look at and which parsers to run inside them
//!
//! A rule table is a configuration value handed to the extraction entry
//! points. The shipped defaults cover two listing layouts; alternative tables
//! can be described in JSON:
//!
//! ```json
//! [{"container": ".card", "fields": [{"selector": ".cost", "parser": "price"}]}]
//! ```

use scraper::Selector;
use serde::{Deserialize, Serialize};

use super::FieldParser;
use crate::error::{Error, Result};

/// Serializable description of a field rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRuleSpec {
    /// CSS selector evaluated inside each container
    pub selector: String,
    pub parser: FieldParser,
}

/// Serializable description of a rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    /// CSS selector for listing containers
    pub container: String,
    pub fields: Vec<FieldRuleSpec>,
}

/// A compiled field rule
#[derive(Debug, Clone)]
pub struct FieldRule {
    source: String,
    selector: Selector,
    parser: FieldParser,
}

impl FieldRule {
    pub fn new(selector: &str, parser: FieldParser) -> Result<Self> {
        Ok(Self {
            source: selector.to_string(),
            selector: parse_selector(selector)?,
            parser,
        })
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    pub fn selector_str(&self) -> &str {
        &self.source
    }

    pub fn parser(&self) -> FieldParser {
        self.parser
    }
}

/// A compiled rule: container selector plus ordered field rules
#[derive(Debug, Clone)]
pub struct Rule {
    source: String,
    container: Selector,
    fields: Vec<FieldRule>,
}

impl Rule {
    pub fn new(container: &str, fields: &[(&str, FieldParser)]) -> Result<Self> {
        let fields = fields
            .iter()
            .map(|(selector, parser)| FieldRule::new(selector, *parser))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            source: container.to_string(),
            container: parse_selector(container)?,
            fields,
        })
    }

    pub fn from_spec(spec: &RuleSpec) -> Result<Self> {
        let fields = spec
            .fields
            .iter()
            .map(|f| FieldRule::new(&f.selector, f.parser))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            source: spec.container.clone(),
            container: parse_selector(&spec.container)?,
            fields,
        })
    }

    pub fn container(&self) -> &Selector {
        &self.container
    }

    pub fn container_str(&self) -> &str {
        &self.source
    }

    pub fn fields(&self) -> &[FieldRule] {
        &self.fields
    }
}

/// Ordered rule table. Order decides listing emission order.
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl RuleTable {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Compile a table from its serializable description
    pub fn compile(specs: &[RuleSpec]) -> Result<Self> {
        let rules = specs.iter().map(Rule::from_spec).collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// Parse and compile a JSON array of rule specs
    pub fn from_json(json: &str) -> Result<Self> {
        let specs: Vec<RuleSpec> = serde_json::from_str(json).map_err(Error::InvalidRules)?;
        Self::compile(&specs)
    }

    /// The shipped table: "property" cards, then "index item" rows
    pub fn listing_defaults() -> Self {
        Self::compile(&default_rule_specs()).expect("default rule selectors are valid")
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::listing_defaults()
    }
}

/// Description of the shipped rule table
pub fn default_rule_specs() -> Vec<RuleSpec> {
    use FieldParser::*;

    fn rule(container: &str, fields: &[(&str, FieldParser)]) -> RuleSpec {
        RuleSpec {
            container: container.to_string(),
            fields: fields
                .iter()
                .map(|(selector, parser)| FieldRuleSpec {
                    selector: selector.to_string(),
                    parser: *parser,
                })
                .collect(),
        }
    }

    vec![
        rule(
            ".property",
            &[
                (".address", StreetAddress),
                ("*", Price),
                ("*", Beds),
                ("*", Baths),
                ("*", Mls),
            ],
        ),
        rule(
            ".idxitem",
            &[
                ("*", StreetAddress),
                ("*", Price),
                ("*", Beds),
                ("*", Baths),
                ("*", Sqft),
                ("*", Mls),
            ],
        ),
    ]
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| Error::InvalidSelector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}
