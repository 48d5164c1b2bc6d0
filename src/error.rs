/// Crate-level error types for fingerprinting diagnostics.
use std::path::PathBuf;

use crate::types::ScopeKind;

/// Every error carries enough context to produce a useful diagnostic
/// without a debugger. Each variant names the file, line, or reason for failure.
#[allow(clippy::error_impl_error, reason = "crate-level error type re-exported by the library")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A referenced source file does not exist on disk.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The source of a supported file could not be parsed, so none of its
    /// warnings can be fingerprinted.
    #[error("file not parsable: {}: {source}", file.display())]
    FileNotParsable {
        /// File that failed to parse.
        file: PathBuf,
        /// The underlying syntax error.
        source: Box<Error>,
    },

    /// Source file exceeds the size limit.
    #[error("file too large ({size_bytes} bytes, max {max_bytes}): {}", file.display())]
    FileTooLarge {
        /// File that exceeded the size limit.
        file: PathBuf,
        /// Maximum allowed file size in bytes.
        max_bytes: u64,
        /// Actual file size in bytes.
        size_bytes: u64,
    },

    /// The bytes of a file are not valid under the declared charset.
    #[error("invalid {charset} content")]
    InvalidEncoding {
        /// Name of the charset used for decoding.
        charset: String,
    },

    /// A configured scope kind could not be parsed.
    #[error("invalid scope kind: `{value}`")]
    InvalidScopeKind {
        /// The offending textual scope kind.
        value: String,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// Warning records or JSON output could not be (de)serialized.
    #[error("json: {0}")]
    Json(
        /// The wrapped JSON error.
        #[from]
        serde_json::Error,
    ),

    /// A selector found no construct of the requested kind around the line.
    #[error("no enclosing {scope} scope for line {line}")]
    NoEnclosingScope {
        /// One-based line the selector was asked about.
        line: u32,
        /// The scope kind that could not be resolved.
        scope: ScopeKind,
    },

    /// The parser rejected the source text.
    #[error("syntax error at line {line}: {message}")]
    Syntax {
        /// One-based line of the first error node.
        line: u32,
        /// Description of the syntax error.
        message: String,
    },

    /// TOML deserialization failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),

    /// The declared charset label is not known.
    #[error("unsupported charset: `{label}`")]
    UnsupportedCharset {
        /// The charset label as declared.
        label: String,
    },

    /// No grammar registered for this file extension.
    #[error("no grammar for extension: .{ext}")]
    UnsupportedLanguage {
        /// File extension without the leading dot.
        ext: String,
    },
}
