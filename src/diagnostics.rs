use std::fmt::Write as _;
use std::path::Path;

use crate::config::CONFIG_FILE;
use crate::error::Error;
use crate::types::{DEFAULT_WINDOW, ScopeKind};

/// ANSI bold.
const BOLD: &str = "\x1b[1m";
/// ANSI reset.
const RESET: &str = "\x1b[0m";

/// Render an error as valid markdown with bold headings and print to stderr.
pub fn print_error(e: &Error) {
    let md = render_error(e);
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
    return;
}

/// Render an error as a structured markdown diagnostic.
///
/// Each variant produces a block with what happened and, where the user can
/// do something about it, how to fix it.
pub fn render_error(e: &Error) -> String {
    return match e {
        Error::FileNotParsable { file, source } => render_file_not_parsable(file, source),
        Error::FileTooLarge { file, size_bytes, max_bytes } => render_file_too_large(file, *size_bytes, *max_bytes),
        Error::InvalidEncoding { charset } => render_invalid_encoding(charset),
        Error::InvalidScopeKind { value } => render_invalid_scope_kind(value),
        Error::NoEnclosingScope { line, scope } => render_no_enclosing_scope(*line, *scope),
        Error::UnsupportedCharset { label } => render_unsupported_charset(label),
        Error::UnsupportedLanguage { ext } => render_unsupported_language(ext),
        _ => render_generic(e),
    };
}

/// Variants without a dedicated renderer.
fn render_generic(e: &Error) -> String {
    return match e {
        Error::FileNotFound { path } => format!("\
# Error: File Not Found

`{}` does not exist.
", path.display()),

        Error::Io(e) => format!("\
# Error: I/O

{e}
"),
        Error::Json(e) => format!("\
# Error: Invalid Warning List

{e}

## Fix

The warning list is a JSON array of objects:

    [{{\"file\": \"src/Foo.java\", \"category\": \"NeedBraces\", \"line\": 40}}]
"),
        Error::Syntax { line, message } => format!("\
# Error: Syntax Error

Line {line}: {message}
"),
        Error::TomlDe(e) => format!("\
# Error: Invalid TOML

{e}

## Fix

Check `{CONFIG_FILE}`.
"),
        _ => format!("\
# Error

{e}
"),
    };
}

/// Parse failure with the wrapped syntax error.
fn render_file_not_parsable(file: &Path, source: &Error) -> String {
    return format!("\
# Error: File Not Parsable

`{}` could not be parsed: {source}

No fingerprint is computed for warnings in this file. A different
`charset` in `{CONFIG_FILE}` may help if the file is not UTF-8.
", file.display());
}

/// Size limit exceeded.
fn render_file_too_large(file: &Path, size_bytes: u64, max_bytes: u64) -> String {
    return format!("\
# Error: File Too Large

`{}` is {size_bytes} bytes (max {max_bytes}).
", file.display());
}

/// Bytes malformed for the charset.
fn render_invalid_encoding(charset: &str) -> String {
    return format!("\
# Error: Invalid Encoding

The file is not valid {charset}.

## Fix

Set the charset of your sources in `{CONFIG_FILE}`:

    charset = \"ISO-8859-1\"
");
}

/// Unparsable scope kind, listing the valid ones.
fn render_invalid_scope_kind(value: &str) -> String {
    return format!("\
# Error: Invalid Scope Kind

`{value}` is not a scope kind.

## Valid scope kinds

- `file`
- `class`
- `outer-class`
- `method`
- `method-or-class`
- `fields`
- `package`
- `window:N` (N > 0)
");
}

/// Missing scope, suggesting a wider one.
fn render_no_enclosing_scope(line: u32, scope: ScopeKind) -> String {
    let mut out = format!("\
# Error: No Enclosing Scope

Line {line} is not inside a `{scope}` scope.
");

    let _ = write!(out, "\
\n## Fix

Check the reported line, or map the category to a wider scope in
`{CONFIG_FILE}`:

    [scopes]
    MyCategory = \"{}\"
", fallback_for(scope));
    return out;
}

/// Unknown charset label.
fn render_unsupported_charset(label: &str) -> String {
    return format!("\
# Error: Unsupported Charset

`{label}` is not a known charset label.

## Fix

Use a WHATWG encoding label such as `UTF-8`, `ISO-8859-1` or `windows-1252`.
");
}

/// No grammar for the extension.
fn render_unsupported_language(ext: &str) -> String {
    return format!("\
# Error: Unsupported Language

No grammar for `.{ext}` files.

## Supported extensions

- `.java`

## Fix

Enable raw-text fingerprints for other files in `{CONFIG_FILE}`:

    full_text_fallback = true
");
}

/// Wider scope to suggest when `scope` could not be resolved.
fn fallback_for(scope: ScopeKind) -> ScopeKind {
    return match scope {
        ScopeKind::Method | ScopeKind::Fields => ScopeKind::MethodOrClass,
        _ => ScopeKind::SurroundingWindow(DEFAULT_WINDOW),
    };
}
