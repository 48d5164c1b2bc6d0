/// Full-text fingerprints for files without a grammar.
use crate::hasher;
use crate::types::Fingerprint;

/// Fingerprint the raw text of lines `line - lines ..= line + lines`.
///
/// Line 0 stands for the whole file and selects the first `2 * lines + 1`
/// lines. Line terminators are not part of the hashed text, so CRLF and LF
/// checkouts of the same file agree.
pub fn compute(text: &str, line: u32, lines: u32) -> Fingerprint {
    let center = if line == 0 { lines.saturating_add(1) } else { line };
    let first = center.saturating_sub(lines).max(1);
    let last = center.saturating_add(lines);

    let skip = usize::try_from(first.saturating_sub(1)).unwrap_or(usize::MAX);
    let take = usize::try_from(last.saturating_sub(first).saturating_add(1)).unwrap_or(usize::MAX);
    let context: String = text.lines().skip(skip).take(take).collect();

    return hasher::fingerprint(&context);
}
