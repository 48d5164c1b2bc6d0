//! Fingerprinting engine.
//!
//! An engine lives for one batch. It caches the parse of every file it
//! touches, keyed by absolute path, so that all warnings of a file share a
//! single parse. Dropping the engine drops the cache; a new scan needs a new
//! engine because file content may have changed in between.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use rayon::prelude::*;
use tree_sitter::Language;

use crate::config::Config;
use crate::digest;
use crate::error::Error;
use crate::fulltext;
use crate::grammar;
use crate::hasher;
use crate::registry::CategoryRegistry;
use crate::scope;
use crate::source::{self, DEFAULT_CHARSET, SourceIndex};
use crate::syntax::SyntaxTree;
use crate::types::{Fingerprint, ScopeKind, Warning};

/// Source files larger than this are not read.
pub const MAX_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// What a fingerprint was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Basis {
    /// Raw text of the reported line and this many lines on each side.
    FullText(u32),
    /// A syntax scope of the given (resolved) kind.
    Scope(ScopeKind),
}

impl fmt::Display for Basis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return match self {
            Self::FullText(lines) => write!(f, "full-text:{lines}"),
            Self::Scope(kind) => write!(f, "{kind}"),
        };
    }
}

/// A fingerprint together with how it was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprinted {
    /// Scope kind or full-text window that produced the fingerprint.
    pub basis: Basis,
    /// Canonical scope string; `None` for full-text fingerprints.
    pub canonical: Option<String>,
    /// The fingerprint itself.
    pub fingerprint: Fingerprint,
    /// First and last source line of the scope, when known.
    pub span: Option<(u32, u32)>,
}

/// Line index and syntax tree of one decoded source file.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    /// Meaningful-line index of the text.
    pub index: SourceIndex,
    /// Concrete syntax tree of the text.
    pub tree: SyntaxTree,
}

impl ParsedFile {
    /// Fingerprint the scope of `kind` around `line`.
    ///
    /// # Errors
    ///
    /// Returns `Error::NoEnclosingScope` if the scope does not exist.
    pub fn fingerprint(&self, kind: ScopeKind, line: u32) -> Result<Fingerprinted, Error> {
        let scope = scope::select(&self.tree, &self.index, kind, line)?;
        let canonical = digest::canonicalize(&self.tree, &scope);

        return Ok(Fingerprinted {
            basis: Basis::Scope(scope.resolved),
            fingerprint: hasher::fingerprint(&canonical),
            span: scope.line_span(&self.tree),
            canonical: Some(canonical),
        });
    }

    /// Parse decoded source text.
    ///
    /// # Errors
    ///
    /// Returns `Error::Syntax` if the text does not parse cleanly.
    pub fn parse(text: &str, language: &Language) -> Result<Self, Error> {
        let tree = SyntaxTree::parse(text, language)?;
        return Ok(Self {
            index: SourceIndex::build(text),
            tree,
        });
    }
}

/// Recorded parse failure, replayed for every later warning of the file.
#[derive(Debug, Clone)]
struct SyntaxFailure {
    /// Line of the first error node.
    line: u32,
    /// Parser message.
    message: String,
}

/// Cache slot of one file.
type Cached = Result<Arc<ParsedFile>, SyntaxFailure>;

/// Result class of one warning in a batch.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// The warning has a fingerprint.
    Fingerprinted {
        /// The fingerprint.
        fingerprint: Fingerprint,
        /// Textual form of the basis, e.g. `method` or `window:3`.
        scope: String,
    },
    /// The category's scope does not exist around the line.
    NoScope {
        /// Error text.
        reason: String,
    },
    /// The file could not be read or decoded.
    Unreadable {
        /// Error text.
        reason: String,
    },
    /// The file does not parse.
    Unparsable {
        /// Error text.
        reason: String,
    },
    /// No grammar for the file and no full-text fallback.
    Unsupported {
        /// Error text.
        reason: String,
    },
}

impl Outcome {
    /// Classify the result of fingerprinting one warning.
    fn classify(result: Result<Fingerprinted, Error>) -> Self {
        return match result {
            Ok(done) => Self::Fingerprinted {
                fingerprint: done.fingerprint,
                scope: done.basis.to_string(),
            },
            Err(e @ Error::NoEnclosingScope { .. }) => Self::NoScope { reason: e.to_string() },
            Err(e @ Error::FileNotParsable { .. }) => Self::Unparsable { reason: e.to_string() },
            Err(e @ Error::UnsupportedLanguage { .. }) => Self::Unsupported { reason: e.to_string() },
            Err(e) => Self::Unreadable { reason: e.to_string() },
        };
    }

    /// The fingerprint, if there is one.
    pub const fn fingerprint(&self) -> Option<&Fingerprint> {
        return match self {
            Self::Fingerprinted { fingerprint, .. } => Some(fingerprint),
            _ => None,
        };
    }
}

/// One warning of a batch with its outcome.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct WarningOutcome {
    /// What happened.
    #[serde(flatten)]
    pub outcome: Outcome,
    /// The warning as submitted.
    #[serde(flatten)]
    pub warning: Warning,
}

/// Counts per outcome class of a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct BatchSummary {
    /// Warnings with a fingerprint.
    pub fingerprinted: usize,
    /// Warnings whose scope did not exist.
    pub no_scope: usize,
    /// Warnings in files that do not parse.
    pub unparsable: usize,
    /// Warnings in files that could not be read.
    pub unreadable: usize,
    /// Warnings in files without a grammar.
    pub unsupported: usize,
}

impl BatchSummary {
    /// Whether every warning got a fingerprint.
    pub const fn all_fingerprinted(&self) -> bool {
        return self.fingerprinted == self.total();
    }

    /// Count one outcome.
    fn record(&mut self, outcome: &Outcome) {
        let counter = match outcome {
            Outcome::Fingerprinted { .. } => &mut self.fingerprinted,
            Outcome::NoScope { .. } => &mut self.no_scope,
            Outcome::Unparsable { .. } => &mut self.unparsable,
            Outcome::Unreadable { .. } => &mut self.unreadable,
            Outcome::Unsupported { .. } => &mut self.unsupported,
        };
        *counter = counter.saturating_add(1);
    }

    /// Number of warnings in the batch.
    pub const fn total(&self) -> usize {
        return self
            .fingerprinted
            .saturating_add(self.no_scope)
            .saturating_add(self.unparsable)
            .saturating_add(self.unreadable)
            .saturating_add(self.unsupported);
    }
}

/// Outcomes of a batch, in input order, with their counts.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct BatchReport {
    /// One entry per submitted warning, in submission order.
    pub outcomes: Vec<WarningOutcome>,
    /// Counts per outcome class.
    pub summary: BatchSummary,
}

/// Composes parsing, scope selection, canonicalization and hashing.
#[derive(Debug)]
pub struct FingerprintEngine {
    /// Parse results keyed by absolute path; filled once per file.
    cache: DashMap<PathBuf, Cached>,
    /// Charset label for decoding sources.
    charset: String,
    /// Use full-text fingerprints for files without a grammar.
    full_text_fallback: bool,
    /// Category to scope kind mapping.
    registry: CategoryRegistry,
}

impl FingerprintEngine {
    /// Number of files parsed (or found unparsable) so far.
    pub fn cached_files(&self) -> usize {
        return self.cache.len();
    }

    /// Fingerprint one warning.
    ///
    /// # Errors
    ///
    /// Returns `Error::FileNotParsable` if the file does not parse,
    /// `Error::NoEnclosingScope` if the category's scope does not exist
    /// around the line, `Error::UnsupportedLanguage` for files without a
    /// grammar (unless full-text fallback is on), or read and decode errors.
    pub fn fingerprint(&self, path: &Path, category: &str, line: u32) -> Result<Fingerprinted, Error> {
        let kind = self.registry.lookup(category);

        return match grammar::language_for_path(path) {
            Ok(language) => self.parsed(path, &language)?.fingerprint(kind, line),
            Err(Error::UnsupportedLanguage { .. }) if self.full_text_fallback => {
                let text = read_source(path, &self.charset)?;
                let lines = self.registry.window().get();
                Ok(Fingerprinted {
                    basis: Basis::FullText(lines),
                    canonical: None,
                    fingerprint: fulltext::compute(&text, line, lines),
                    span: None,
                })
            },
            Err(e) => Err(e),
        };
    }

    /// Engine with the charset, fallback and registry of a config.
    pub fn from_config(config: &Config) -> Self {
        return Self::new(config.registry())
            .with_charset(&config.charset)
            .with_full_text_fallback(config.full_text_fallback);
    }

    /// Engine with default settings around a registry.
    pub fn new(registry: CategoryRegistry) -> Self {
        return Self {
            cache: DashMap::new(),
            charset: DEFAULT_CHARSET.to_string(),
            full_text_fallback: false,
            registry,
        };
    }

    /// The parse of `path`, from the cache or freshly parsed.
    ///
    /// Parsing happens outside the map's locks. Two workers racing on the
    /// same file both parse it and the first insert wins.
    ///
    /// # Errors
    ///
    /// Returns `Error::FileNotParsable` for (cached) syntax errors, or read
    /// and decode errors, which are not cached.
    pub fn parsed(&self, path: &Path, language: &Language) -> Result<Arc<ParsedFile>, Error> {
        let key = std::path::absolute(path).unwrap_or_else(|_err| return path.to_path_buf());

        let hit = self.cache.get(&key).map(|entry| return entry.value().clone());
        if let Some(cached) = hit {
            tracing::debug!(file = %key.display(), "parse cache hit");
            return replay(path, cached);
        }

        let text = read_source(path, &self.charset)?;
        let fresh = match ParsedFile::parse(&text, language) {
            Ok(parsed) => {
                tracing::debug!(file = %key.display(), nodes = parsed.tree.len(), "parsed");
                Ok(Arc::new(parsed))
            },
            Err(Error::Syntax { line, message }) => {
                tracing::warn!(file = %key.display(), line, %message, "file not parsable, skipping its warnings");
                Err(SyntaxFailure { line, message })
            },
            Err(e) => return Err(e),
        };

        let stored = self.cache.entry(key).or_insert(fresh).value().clone();
        return replay(path, stored);
    }

    /// The category registry in use.
    pub const fn registry(&self) -> &CategoryRegistry {
        return &self.registry;
    }

    /// Fingerprint a batch of warnings: one parallel task per file, results
    /// in input order. A failing warning never stops the batch.
    pub fn run_batch(&self, warnings: &[Warning]) -> BatchReport {
        let mut groups: Vec<(&Path, Vec<usize>)> = Vec::new();
        let mut slots: HashMap<&Path, usize> = HashMap::new();
        for (idx, warning) in warnings.iter().enumerate() {
            let slot = *slots.entry(warning.file.as_path()).or_insert_with(|| {
                groups.push((warning.file.as_path(), Vec::new()));
                return groups.len().saturating_sub(1);
            });
            if let Some((_, members)) = groups.get_mut(slot) {
                members.push(idx);
            }
        }
        tracing::debug!(warnings = warnings.len(), files = groups.len(), "running batch");

        let per_file: Vec<Vec<(usize, Outcome)>> = groups
            .par_iter()
            .map(|(file, members)| {
                tracing::debug!(file = %file.display(), warnings = members.len(), "fingerprinting file");
                return members
                    .iter()
                    .filter_map(|&idx| {
                        let warning = warnings.get(idx)?;
                        let result = self.fingerprint(&warning.file, &warning.category, warning.line);
                        return Some((idx, Outcome::classify(result)));
                    })
                    .collect();
            })
            .collect();

        let mut ordered: Vec<Option<Outcome>> = warnings.iter().map(|_| return None).collect();
        for (idx, outcome) in per_file.into_iter().flatten() {
            if let Some(slot) = ordered.get_mut(idx) {
                *slot = Some(outcome);
            }
        }

        let mut summary = BatchSummary::default();
        let outcomes = warnings
            .iter()
            .zip(ordered)
            .filter_map(|(warning, outcome)| {
                let outcome = outcome?;
                summary.record(&outcome);
                return Some(WarningOutcome {
                    outcome,
                    warning: warning.clone(),
                });
            })
            .collect();

        return BatchReport { outcomes, summary };
    }

    /// Use `charset` to decode sources.
    #[must_use]
    pub fn with_charset(mut self, charset: &str) -> Self {
        charset.clone_into(&mut self.charset);
        return self;
    }

    /// Turn the full-text fallback for files without a grammar on or off.
    #[must_use]
    pub const fn with_full_text_fallback(mut self, enabled: bool) -> Self {
        self.full_text_fallback = enabled;
        return self;
    }
}

/// Read and decode a source file, enforcing the size limit.
fn read_source(path: &Path, charset: &str) -> Result<String, Error> {
    let missing = |e: std::io::Error| {
        if e.kind() == std::io::ErrorKind::NotFound {
            return Error::FileNotFound { path: path.to_path_buf() };
        }
        return Error::Io(e);
    };

    let size_bytes = std::fs::metadata(path).map_err(missing)?.len();
    if size_bytes > MAX_FILE_SIZE {
        return Err(Error::FileTooLarge {
            file: path.to_path_buf(),
            max_bytes: MAX_FILE_SIZE,
            size_bytes,
        });
    }

    let bytes = std::fs::read(path).map_err(missing)?;
    return source::decode(&bytes, charset);
}

/// Turn a cache slot into the caller's result.
fn replay(path: &Path, cached: Cached) -> Result<Arc<ParsedFile>, Error> {
    return cached.map_err(|failure| {
        return Error::FileNotParsable {
            file: path.to_path_buf(),
            source: Box::new(Error::Syntax {
                line: failure.line,
                message: failure.message,
            }),
        };
    });
}
