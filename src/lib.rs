//! Rule-driven real-estate listing extraction from HTML
//!
//! Provides:
//! - Text flattening and `q-` class annotation of DOM elements
//! - Field parsers for US street addresses, prices, beds, baths, MLS ids and square footage
//! - A rule engine merging parser results per container into unambiguous listings
//! - Oracle comparison of extracted listings against expected JSONL records
//! - A file harness and CLI for running documents against their oracles

pub mod cli;
pub mod error;
pub mod extractors;
pub mod harness;
pub mod oracle;

pub use error::{Error, Result};
pub use extractors::*;
pub use oracle::{canonicalize, compare, Comparison, Record};
