use std::collections::BTreeMap;
use std::num::NonZeroU32;
use std::path::Path;

use encoding_rs::Encoding;

use crate::error::Error;
use crate::registry::CategoryRegistry;
use crate::source::DEFAULT_CHARSET;
use crate::types::{DEFAULT_WINDOW, ScopeKind};

/// Name of the project configuration file.
pub const CONFIG_FILE: &str = ".scopeprint.toml";

/// Project configuration loaded from `.scopeprint.toml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Charset label used to decode source files.
    pub charset: String,
    /// Hash raw lines of files without a grammar instead of rejecting them.
    pub full_text_fallback: bool,
    /// Category overrides, keyed by category as written in the file.
    pub scopes: BTreeMap<String, ScopeKind>,
    /// Window size for built-in windows and unknown categories.
    pub window: NonZeroU32,
}

/// Raw TOML structure for `.scopeprint.toml`.
#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct ScopeprintTomlConfig {
    #[serde(default)]
    charset: Option<String>,
    #[serde(default)]
    full_text_fallback: Option<bool>,
    #[serde(default)]
    scopes: BTreeMap<String, String>,
    #[serde(default)]
    window: Option<NonZeroU32>,
}

impl Default for Config {
    fn default() -> Self {
        return Self {
            charset: DEFAULT_CHARSET.to_string(),
            full_text_fallback: false,
            scopes: BTreeMap::new(),
            window: DEFAULT_WINDOW,
        };
    }
}

impl Config {
    /// Load config from `.scopeprint.toml` in the given root directory.
    /// Returns the defaults if the file doesn't exist. A file that exists but
    /// is malformed is an error, never silently replaced by defaults.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found), or any
    /// error of [`Config::parse`].
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(CONFIG_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            },
            Err(e) => return Err(Error::Io(e)),
        };

        tracing::debug!(path = %path.display(), "loading config");
        return Self::parse(&content);
    }

    /// Parse config text.
    ///
    /// # Errors
    ///
    /// Returns `Error::TomlDe` if the TOML is malformed, `Error::InvalidScopeKind`
    /// for an unparsable scope kind, or `Error::UnsupportedCharset` for an
    /// unknown charset label.
    pub fn parse(content: &str) -> Result<Self, Error> {
        let raw: ScopeprintTomlConfig = toml::from_str(content)?;

        let charset = raw.charset.unwrap_or_else(|| return DEFAULT_CHARSET.to_string());
        if Encoding::for_label(charset.trim().as_bytes()).is_none() {
            return Err(Error::UnsupportedCharset { label: charset });
        }

        let scopes = raw
            .scopes
            .into_iter()
            .map(|(category, kind)| return Ok((category, kind.parse::<ScopeKind>()?)))
            .collect::<Result<BTreeMap<_, _>, Error>>()?;

        return Ok(Self {
            charset,
            full_text_fallback: raw.full_text_fallback.unwrap_or(false),
            scopes,
            window: raw.window.unwrap_or(DEFAULT_WINDOW),
        });
    }

    /// Category registry with this config's window size and overrides.
    pub fn registry(&self) -> CategoryRegistry {
        return CategoryRegistry::new(self.window).with_overrides(self.scopes.iter().map(|(k, v)| return (k, *v)));
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "tests")]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Config::load(dir.path()).unwrap(), Config::default());
    }

    #[test]
    fn reads_all_keys() {
        let config = Config::parse(
            "charset = \"ISO-8859-1\"\nwindow = 5\nfull_text_fallback = true\n\n[scopes]\nMethodLength = \"file\"\n",
        )
        .unwrap();
        assert_eq!(config.charset, "ISO-8859-1");
        assert_eq!(config.window.get(), 5);
        assert!(config.full_text_fallback);
        assert_eq!(config.registry().lookup("MethodLengthCheck"), ScopeKind::File);
        assert_eq!(config.registry().lookup("Unheard"), ScopeKind::SurroundingWindow(config.window));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "window = \"wide\"\n").unwrap();
        assert!(matches!(Config::load(dir.path()), Err(Error::TomlDe(_))));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(Config::parse("window = 0\n"), Err(Error::TomlDe(_))));
        assert!(matches!(Config::parse("[scopes]\nX = \"block\"\n"), Err(Error::InvalidScopeKind { .. })));
        assert!(matches!(Config::parse("charset = \"klingon\"\n"), Err(Error::UnsupportedCharset { .. })));
        assert!(matches!(Config::parse("colour = true\n"), Err(Error::TomlDe(_))));
    }
}
