//! Oracle test harness: load documents, extract, diff against oracles
//!
//! Each document `<file>` is paired with its oracle `<file>.jsonl`. Documents
//! ending in `.lz4` are LZ4 frame-compressed; the text encoding comes from a
//! BOM or `<meta charset>` declaration. When a document's listings
//! differ from its oracle, the comparison is written as pretty JSON to a
//! sentinel file named after the oracle inside the output directory.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1252};
use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::extractors::{annotate, extract_document, Annotations, Listing, RuleTable};
use crate::oracle::{compare_listings, read_oracle, Comparison};

/// Outcome of a harness run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub files: usize,
    /// Sentinel files written, one per mismatching document
    pub sentinels: Vec<PathBuf>,
}

impl RunSummary {
    pub fn mismatched(&self) -> usize {
        self.sentinels.len()
    }
}

/// Split a command-line argument into `(document, oracle)` paths.
///
/// Either may be given: `page.html` and `page.html.jsonl` name the same pair.
pub fn document_and_oracle(arg: &Path) -> (PathBuf, PathBuf) {
    if arg.extension().is_some_and(|ext| ext == "jsonl") {
        (arg.with_extension(""), arg.to_path_buf())
    } else {
        let mut oracle = arg.as_os_str().to_os_string();
        oracle.push(".jsonl");
        (arg.to_path_buf(), PathBuf::from(oracle))
    }
}

/// Read a document, decompressing `.lz4` files and decoding its charset
pub fn load_document(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let bytes = if path.extension().is_some_and(|ext| ext == "lz4") {
        let mut decoded = Vec::new();
        lz4_flex::frame::FrameDecoder::new(bytes.as_slice())
            .read_to_end(&mut decoded)
            .map_err(|source| Error::Decompress {
                path: path.to_path_buf(),
                source,
            })?;
        decoded
    } else {
        bytes
    };

    let (html, encoding, had_errors) = decode_html(&bytes);
    if had_errors {
        warn!(
            path = %path.display(),
            encoding = encoding.name(),
            "document contains bytes invalid in its encoding; replaced with U+FFFD"
        );
    } else {
        debug!(path = %path.display(), encoding = encoding.name(), "decoded document");
    }
    Ok(html)
}

/// Decode HTML bytes.
///
/// A byte order mark wins, then a `<meta charset>` / `http-equiv` declaration
/// in the first 1024 bytes. Undeclared documents are UTF-8 when they validate
/// as such and windows-1252 otherwise, the HTML default for legacy pages.
/// Returns the text, the encoding used and whether any bytes were malformed.
pub fn decode_html(bytes: &[u8]) -> (String, &'static Encoding, bool) {
    let declared = Encoding::for_bom(bytes)
        .map(|(encoding, _)| encoding)
        .or_else(|| sniff_meta_charset(bytes));

    let encoding = match declared {
        Some(encoding) => encoding,
        None if std::str::from_utf8(bytes).is_ok() => UTF_8,
        None => WINDOWS_1252,
    };

    // decode() strips a matching BOM itself
    let (text, used, had_errors) = encoding.decode(bytes);
    (text.into_owned(), used, had_errors)
}

static META_CHARSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]*?charset\s*=\s*["']?\s*([a-z0-9_:.\-]+)"#).expect("valid regex")
});

fn sniff_meta_charset(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = &bytes[..bytes.len().min(1024)];
    // Declarations are ASCII, so a lossy view of the prefix is enough to find them
    let head = String::from_utf8_lossy(head);
    let label = META_CHARSET.captures(&head)?.get(1)?.as_str();
    let encoding = Encoding::for_label(label.as_bytes())?;

    // A meta tag cannot declare UTF-16: the bytes it was read from are ASCII-compatible
    if encoding == UTF_16LE || encoding == UTF_16BE {
        Some(UTF_8)
    } else {
        Some(encoding)
    }
}

/// Annotate the document body (or the root element when there is none)
pub fn annotate_document(document: &Html) -> Annotations<'_> {
    let root = Selector::parse("body")
        .ok()
        .and_then(|body| document.select(&body).next())
        .unwrap_or_else(|| document.root_element());
    annotate(root)
}

/// Parse, annotate and extract one HTML document.
///
/// Annotation runs first, as it does when the page is prepared for a
/// selector picker; extraction does not read its classes.
pub fn extract_html(html: &str, rules: &RuleTable) -> Vec<Listing> {
    let document = Html::parse_document(html);
    let annotations = annotate_document(&document);
    let listings = extract_document(&document, rules);

    debug!(
        annotated = annotations.len(),
        listings = listings.len(),
        "processed document"
    );
    listings
}

/// Load and extract one document file
pub fn extract_file(path: &Path, rules: &RuleTable) -> Result<Vec<Listing>> {
    let html = load_document(path)?;
    let listings = extract_html(&html, rules);
    info!(path = %path.display(), listings = listings.len(), "extracted document");
    Ok(listings)
}

/// Extract a document and compare it with its oracle
pub fn check_file(document: &Path, oracle: &Path, rules: &RuleTable) -> Result<Comparison> {
    let expected = read_oracle(oracle)?;
    let listings = extract_file(document, rules)?;
    Ok(compare_listings(&expected, &listings))
}

/// Check every file, writing a sentinel into `output_dir` for each mismatch
pub fn run(output_dir: &Path, files: &[PathBuf], rules: &RuleTable) -> Result<RunSummary> {
    if !output_dir.is_dir() {
        return Err(Error::NotADirectory(output_dir.to_path_buf()));
    }

    let mut summary = RunSummary::default();
    for arg in files {
        let (document, oracle) = document_and_oracle(arg);
        let comparison = check_file(&document, &oracle, rules)?;
        summary.files += 1;

        if comparison.is_match() {
            continue;
        }

        warn!(
            document = %document.display(),
            missing = comparison.missing.len(),
            extra = comparison.extra.len(),
            "listings differ from oracle"
        );
        let sentinel = write_sentinel(output_dir, &oracle, &comparison)?;
        summary.sentinels.push(sentinel);
    }

    info!(
        files = summary.files,
        mismatched = summary.mismatched(),
        "oracle run finished"
    );
    Ok(summary)
}

fn write_sentinel(output_dir: &Path, oracle: &Path, comparison: &Comparison) -> Result<PathBuf> {
    let name = oracle
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("oracle.jsonl"));
    let path = output_dir.join(name);

    let json = serde_json::to_string_pretty(comparison)?;
    fs::write(&path, json).map_err(|source| Error::Io {
        path: path.clone(),
        source,
    })?;

    info!(sentinel = %path.display(), "wrote sentinel");
    Ok(path)
}
