//! CLI commands for scopeprint: fingerprint, batch, categories.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::config::Config;
use crate::engine::{BatchReport, FingerprintEngine, Outcome};
use crate::error::Error;
use crate::types::Warning;

/// Output format of the `batch` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// One JSON object per warning, one per line.
    Json,
    /// One aligned line per warning.
    Text,
}

/// Fingerprint every warning of a JSON warning list.
///
/// Exit code 0 when every warning got a fingerprint, 1 otherwise.
///
/// # Errors
///
/// Returns errors from config loading or from reading and parsing the list.
pub fn batch(warnings_path: &Path, format: OutputFormat) -> Result<ExitCode, Error> {
    let config = Config::load(Path::new("."))?;
    let content = std::fs::read_to_string(warnings_path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            return Error::FileNotFound { path: warnings_path.to_path_buf() };
        }
        return Error::Io(e);
    })?;
    let warnings: Vec<Warning> = serde_json::from_str(&content)?;

    let engine = FingerprintEngine::from_config(&config);
    let report = engine.run_batch(&warnings);

    match format {
        OutputFormat::Json => {
            for outcome in &report.outcomes {
                println!("{}", serde_json::to_string(outcome)?);
            }
        },
        OutputFormat::Text => print_text_report(&report),
    }

    let s = report.summary;
    eprintln!(
        "{} fingerprinted, {} no scope, {} unparsable, {} unreadable, {} unsupported",
        s.fingerprinted, s.no_scope, s.unparsable, s.unreadable, s.unsupported,
    );

    if s.all_fingerprinted() {
        return Ok(ExitCode::SUCCESS);
    }
    return Ok(ExitCode::from(1));
}

/// Print the effective category table.
///
/// # Errors
///
/// Returns errors from config loading or JSON serialization.
pub fn categories(json: bool) -> Result<(), Error> {
    let config = Config::load(Path::new("."))?;
    let entries = config.registry().entries();

    if json {
        let rows: Vec<serde_json::Value> = entries
            .iter()
            .map(|(category, kind)| return serde_json::json!({ "category": category, "scope": kind.to_string() }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    let width = entries.iter().map(|(category, _)| return category.len()).max().unwrap_or(0);
    for (category, kind) in &entries {
        println!("{category:<width$}  {kind}");
    }
    println!();
    println!("(anything else)  window:{}", config.window);
    return Ok(());
}

/// Fingerprint a single warning and print the result.
///
/// # Errors
///
/// Returns errors from config loading, reading, parsing, or scope selection.
pub fn fingerprint(file: &str, category: &str, line: u32, show_canonical: bool) -> Result<(), Error> {
    let config = Config::load(Path::new("."))?;
    let engine = FingerprintEngine::from_config(&config);
    let done = engine.fingerprint(&PathBuf::from(file), category, line)?;

    match done.span {
        Some((first, last)) => println!("scope   {} (lines {first}-{last})", done.basis),
        None => println!("scope   {}", done.basis),
    }
    println!("digest  {}", done.fingerprint.digest);
    println!("hash    {:016x}", done.fingerprint.hash);

    if show_canonical {
        if let Some(canonical) = &done.canonical {
            println!();
            println!("{canonical}");
        }
    }
    return Ok(());
}

/// Print one line per outcome of a batch.
fn print_text_report(report: &BatchReport) {
    for entry in &report.outcomes {
        let w = &entry.warning;
        let location = format!("{}:{}", w.file.display(), w.line);
        match &entry.outcome {
            Outcome::Fingerprinted { fingerprint, scope } => {
                println!("OK           {location}  {}  {scope}  {}", w.category, fingerprint.digest);
            },
            Outcome::NoScope { reason } => println!("NO-SCOPE     {location}  {}  ({reason})", w.category),
            Outcome::Unparsable { reason } => println!("UNPARSABLE   {location}  {}  ({reason})", w.category),
            Outcome::Unreadable { reason } => println!("UNREADABLE   {location}  {}  ({reason})", w.category),
            Outcome::Unsupported { reason } => println!("UNSUPPORTED  {location}  {}  ({reason})", w.category),
        }
    }
    return;
}
