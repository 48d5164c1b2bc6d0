/// Core domain types: warnings, scope policies, source lines and fingerprints.
use std::fmt;
use std::hash::{Hash, Hasher};
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::Error;

/// Window size used when nothing else is configured.
pub const DEFAULT_WINDOW: NonZeroU32 = NonZeroU32::MIN.saturating_add(2);

/// Identity token of a warning's structural context.
///
/// Two fingerprints are equal iff their digests are equal. The `hash` is a
/// lossy fold of the same digest, only good for pre-filtering.
#[derive(Debug, Clone, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fingerprint {
    /// Lowercase hex SHA-256 of the canonical scope serialization.
    pub digest: String,
    /// First eight digest bytes folded into an integer.
    pub hash: u64,
}

impl Hash for Fingerprint {
    /// Hash by digest only, consistent with `PartialEq`.
    fn hash<H: Hasher>(&self, state: &mut H) {
        return self.digest.hash(state);
    }
}

impl PartialEq for Fingerprint {
    /// Digest equality; the folded hash never decides equality.
    fn eq(&self, other: &Self) -> bool {
        return self.digest == other.digest;
    }
}

/// Extraction policy: which part of the syntax tree represents a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    /// Field declarations at the top of the enclosing class body.
    Fields,
    /// The whole compilation unit.
    File,
    /// The innermost method or constructor around the line.
    Method,
    /// `Method`, falling back to the innermost class, then to the file.
    MethodOrClass,
    /// The package declaration only.
    PackageDeclaration,
    /// The anchor line and up to `n` meaningful lines on each side.
    SurroundingWindow(NonZeroU32),
    /// A class around the line. With `include_nested_only` the innermost
    /// class is used and nested type declarations are left out; without it
    /// the outermost class is used verbatim.
    WholeClass {
        /// Select the innermost class instead of the outermost one.
        include_nested_only: bool,
    },
}

impl ScopeKind {
    /// Stable variant name, used as the key of per-scope policy tables.
    pub const fn name(self) -> &'static str {
        return match self {
            Self::Fields => "fields",
            Self::File => "file",
            Self::Method => "method",
            Self::MethodOrClass => "method-or-class",
            Self::PackageDeclaration => "package",
            Self::SurroundingWindow(_) => "window",
            Self::WholeClass { include_nested_only: true } => "class",
            Self::WholeClass { include_nested_only: false } => "outer-class",
        };
    }
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return match self {
            Self::SurroundingWindow(n) => write!(f, "window:{n}"),
            other => f.write_str(other.name()),
        };
    }
}

impl FromStr for ScopeKind {
    type Err = Error;

    /// Parse the textual form produced by `Display`. A bare `window` means
    /// the default window size.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || return Error::InvalidScopeKind { value: s.to_string() };
        let trimmed = s.trim();

        if let Some(size) = trimmed.strip_prefix("window:") {
            let n = size.trim().parse::<NonZeroU32>().map_err(|_err| return invalid())?;
            return Ok(Self::SurroundingWindow(n));
        }

        return match trimmed {
            "class" => Ok(Self::WholeClass { include_nested_only: true }),
            "fields" => Ok(Self::Fields),
            "file" => Ok(Self::File),
            "method" => Ok(Self::Method),
            "method-or-class" => Ok(Self::MethodOrClass),
            "outer-class" => Ok(Self::WholeClass { include_nested_only: false }),
            "package" => Ok(Self::PackageDeclaration),
            "window" => Ok(Self::SurroundingWindow(DEFAULT_WINDOW)),
            _ => Err(invalid()),
        };
    }
}

/// One line of a source file as seen by scope selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLine {
    /// Byte offset one past the last byte of the line, excluding the terminator.
    pub end_offset: usize,
    /// The line holds code: it is neither blank nor wholly inside a comment.
    pub is_meaningful: bool,
    /// One-based line number.
    pub line_number: u32,
    /// Byte offset of the first byte of the line.
    pub start_offset: usize,
}

/// Normalized warning record handed over by the format parsers.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Warning {
    /// Rule or check identifier assigned by the reporting tool.
    pub category: String,
    /// Source file the warning points into.
    pub file: PathBuf,
    /// One-based reported line; 0 means the whole file.
    #[serde(default)]
    pub line: u32,
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "tests")]
mod tests {
    use super::*;

    #[test]
    fn scope_kind_text_round_trips() {
        for text in ["class", "outer-class", "fields", "file", "method", "method-or-class", "package", "window:5"] {
            let kind: ScopeKind = text.parse().unwrap();
            assert_eq!(kind.to_string(), text);
        }
    }

    #[test]
    fn bare_window_uses_default_size() {
        let kind: ScopeKind = "window".parse().unwrap();
        assert_eq!(kind, ScopeKind::SurroundingWindow(DEFAULT_WINDOW));
        assert_eq!(kind.to_string(), "window:3");
    }

    #[test]
    fn rejects_zero_window_and_unknown_names() {
        assert!(matches!("window:0".parse::<ScopeKind>(), Err(Error::InvalidScopeKind { .. })));
        assert!(matches!("statement".parse::<ScopeKind>(), Err(Error::InvalidScopeKind { .. })));
    }

    #[test]
    fn fingerprint_equality_ignores_hash() {
        let a = Fingerprint { digest: "ab".to_string(), hash: 1 };
        let b = Fingerprint { digest: "ab".to_string(), hash: 2 };
        let c = Fingerprint { digest: "cd".to_string(), hash: 1 };
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
