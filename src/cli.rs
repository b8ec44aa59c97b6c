//! Command-line interface.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use scraper::Html;
use serde_json::json;

use crate::error::{Error, Result};
use crate::extractors::RuleTable;
use crate::harness;

/// Extract real-estate listings from HTML and check them against oracles.
#[derive(Parser)]
#[command(name = "listing-extract")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// JSON rule table to use instead of the built-in rules
    #[arg(long, global = true)]
    pub rules: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Diff each document's listings against `<file>.jsonl`, writing a
    /// sentinel into OUTPUT_DIR for every mismatch.
    Run {
        /// Directory receiving sentinel files
        output_dir: PathBuf,

        /// Documents (or their `.jsonl` oracles); `.lz4` documents are decompressed
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Print the listings found in a document, one JSON object per line.
    Extract {
        file: PathBuf,
    },

    /// Print the text-derived `q-` classes of a document's elements.
    Annotate {
        file: PathBuf,
    },
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let stdout = io::stdout();
    execute(cli, &mut stdout.lock())
}

/// Execute a parsed command line, writing command output to `out`.
pub fn execute(cli: Cli, out: &mut impl Write) -> Result<()> {
    let rules = match cli.rules.as_deref() {
        Some(path) => load_rules(path)?,
        None => RuleTable::listing_defaults(),
    };

    match cli.command {
        Commands::Run { output_dir, files } => {
            harness::run(&output_dir, &files, &rules)?;
            Ok(())
        }
        Commands::Extract { file } => extract_command(&file, &rules, out),
        Commands::Annotate { file } => annotate_command(&file, out),
    }
}

fn load_rules(path: &Path) -> Result<RuleTable> {
    let json = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    RuleTable::from_json(&json)
}

fn extract_command(file: &Path, rules: &RuleTable, out: &mut impl Write) -> Result<()> {
    for listing in harness::extract_file(file, rules)? {
        let line = serde_json::to_string(&listing)?;
        writeln!(out, "{line}").map_err(stdout_error)?;
    }
    Ok(())
}

fn annotate_command(file: &Path, out: &mut impl Write) -> Result<()> {
    let html = harness::load_document(file)?;
    let document = Html::parse_document(&html);
    let annotations = harness::annotate_document(&document);

    for annotation in annotations.iter() {
        let line = json!({
            "tag": annotation.element.value().name(),
            "class": annotations.class_attr(annotation.element),
        });
        writeln!(out, "{line}").map_err(stdout_error)?;
    }
    Ok(())
}

fn stdout_error(source: io::Error) -> Error {
    Error::Io {
        path: PathBuf::from("<stdout>"),
        source,
    }
}
