//! Charset decoding and the per-file line index.
//!
//! The index flags every line as meaningful (holds code) or skippable
//! (blank, or wholly inside a comment). Scope selection anchors on
//! meaningful lines only, so inserting blank or comment lines never changes
//! which construct a warning resolves to.

use encoding_rs::Encoding;

use crate::error::Error;
use crate::types::SourceLine;

/// Default charset for source files.
pub const DEFAULT_CHARSET: &str = "UTF-8";

/// Decode raw file bytes under the declared charset.
///
/// A byte-order mark wins over the declared charset and is stripped.
/// Malformed input is rejected rather than patched with replacement
/// characters, which would leak decoder recovery into digests.
///
/// # Errors
///
/// Returns `Error::UnsupportedCharset` for an unknown label, or
/// `Error::InvalidEncoding` if the bytes are malformed for the charset.
pub fn decode(bytes: &[u8], charset: &str) -> Result<String, Error> {
    let declared = Encoding::for_label(charset.trim().as_bytes())
        .ok_or_else(|| return Error::UnsupportedCharset { label: charset.to_string() })?;

    let (encoding, payload) = match Encoding::for_bom(bytes) {
        Some((bom_encoding, bom_len)) => (bom_encoding, bytes.get(bom_len..).unwrap_or_default()),
        None => (declared, bytes),
    };

    let text = encoding
        .decode_without_bom_handling_and_without_replacement(payload)
        .ok_or_else(|| return Error::InvalidEncoding { charset: encoding.name().to_string() })?;

    return Ok(text.into_owned());
}

/// Lexical state carried from one line to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lex {
    /// Inside `/* ... */`.
    BlockComment,
    /// Inside a character literal.
    Char,
    /// Plain code.
    Code,
    /// Inside a string literal.
    Str,
    /// Inside a `"""` text block.
    TextBlock,
}

/// Ordered line descriptors for one file.
#[derive(Debug, Clone, Default)]
pub struct SourceIndex {
    /// One descriptor per line, `lines[i].line_number == i + 1`.
    lines: Vec<SourceLine>,
}

impl SourceIndex {
    /// Nearest meaningful line at or before `line`; if there is none, the
    /// first meaningful line after it. `None` only for files without code.
    pub fn anchor(&self, line: u32) -> Option<u32> {
        let before = self
            .lines
            .iter()
            .take(usize::try_from(line).unwrap_or(usize::MAX))
            .rev()
            .find(|l| return l.is_meaningful);
        if let Some(found) = before {
            return Some(found.line_number);
        }

        return self
            .lines
            .iter()
            .skip(usize::try_from(line).unwrap_or(usize::MAX))
            .find(|l| return l.is_meaningful)
            .map(|l| return l.line_number);
    }

    /// Build the index for decoded source text.
    pub fn build(text: &str) -> Self {
        let mut lines = Vec::new();
        let mut state = Lex::Code;
        let mut offset = 0_usize;

        for (idx, piece) in text.split_inclusive('\n').enumerate() {
            let content = piece.trim_end_matches('\n').trim_end_matches('\r');
            let (is_meaningful, next) = scan_line(content.as_bytes(), state);
            state = next;

            lines.push(SourceLine {
                end_offset: offset.saturating_add(content.len()),
                is_meaningful,
                line_number: u32::try_from(idx.saturating_add(1)).unwrap_or(u32::MAX),
                start_offset: offset,
            });
            offset = offset.saturating_add(piece.len());
        }

        return Self { lines };
    }

    /// Whether the file has no lines at all.
    pub const fn is_empty(&self) -> bool {
        return self.lines.is_empty();
    }

    /// Whether the one-based `line` exists and holds code.
    pub fn is_meaningful(&self, line: u32) -> bool {
        return self.line(line).is_some_and(|l| return l.is_meaningful);
    }

    /// Number of lines in the file.
    pub const fn len(&self) -> usize {
        return self.lines.len();
    }

    /// Descriptor of the one-based `line`.
    pub fn line(&self, line: u32) -> Option<&SourceLine> {
        let idx = usize::try_from(line).ok()?.checked_sub(1)?;
        return self.lines.get(idx);
    }

    /// All line descriptors in order.
    pub fn lines(&self) -> &[SourceLine] {
        return &self.lines;
    }

    /// Up to `count` meaningful lines strictly after `line`, ascending.
    pub fn meaningful_after(&self, line: u32, count: usize) -> Vec<u32> {
        return self
            .lines
            .iter()
            .skip(usize::try_from(line).unwrap_or(usize::MAX))
            .filter(|l| return l.is_meaningful)
            .take(count)
            .map(|l| return l.line_number)
            .collect();
    }

    /// Up to `count` meaningful lines strictly before `line`, ascending.
    pub fn meaningful_before(&self, line: u32, count: usize) -> Vec<u32> {
        let preceding = usize::try_from(line.saturating_sub(1)).unwrap_or(usize::MAX);
        let mut found: Vec<u32> = self
            .lines
            .iter()
            .take(preceding)
            .rev()
            .filter(|l| return l.is_meaningful)
            .take(count)
            .map(|l| return l.line_number)
            .collect();
        found.reverse();
        return found;
    }
}

/// Scan one line, returning whether it holds code and the state for the next line.
fn scan_line(bytes: &[u8], start: Lex) -> (bool, Lex) {
    let mut state = start;
    // Continuation lines of a text block are part of a literal.
    let mut has_code = start == Lex::TextBlock && !bytes.iter().all(u8::is_ascii_whitespace);
    let mut i = 0_usize;

    while let Some(&byte) = bytes.get(i) {
        let next = bytes.get(i.saturating_add(1)).copied();
        let mut step = 1_usize;

        match state {
            Lex::BlockComment => {
                if byte == b'*' && next == Some(b'/') {
                    state = Lex::Code;
                    step = 2;
                }
            },
            Lex::Char | Lex::Str => {
                let quote = if state == Lex::Str { b'"' } else { b'\'' };
                if byte == b'\\' {
                    step = 2;
                } else if byte == quote {
                    state = Lex::Code;
                }
            },
            Lex::Code => match (byte, next) {
                (b'/', Some(b'/')) => break,
                (b'/', Some(b'*')) => {
                    state = Lex::BlockComment;
                    step = 2;
                },
                (b'"', Some(b'"')) if bytes.get(i.saturating_add(2)) == Some(&b'"') => {
                    has_code = true;
                    state = Lex::TextBlock;
                    step = 3;
                },
                (b'"', _) => {
                    has_code = true;
                    state = Lex::Str;
                },
                (b'\'', _) => {
                    has_code = true;
                    state = Lex::Char;
                },
                _ => has_code |= !byte.is_ascii_whitespace(),
            },
            Lex::TextBlock => {
                if byte == b'\\' {
                    step = 2;
                } else if bytes.get(i..i.saturating_add(3)) == Some(b"\"\"\"".as_slice()) {
                    state = Lex::Code;
                    step = 3;
                }
            },
        }

        i = i.saturating_add(step);
    }

    // Plain string and char literals never span lines.
    if matches!(state, Lex::Char | Lex::Str) {
        state = Lex::Code;
    }

    return (has_code, state);
}
