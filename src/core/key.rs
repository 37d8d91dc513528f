//! Comparison keys for exact dedup.
//!
//! A record's trailing field (an ordinal, a label) may vary without changing
//! its logical content, so lines are compared on everything before the last
//! delimiter.

/// Delimiter used when none is configured
pub const DEFAULT_DELIMITER: char = ',';

/// Key of `line` using [`DEFAULT_DELIMITER`].
pub fn extract_key(line: &str) -> &str {
    extract_key_with(line, DEFAULT_DELIMITER)
}

/// Substring before the last `delimiter`, or the whole line if absent.
pub fn extract_key_with(line: &str, delimiter: char) -> &str {
    match line.rfind(delimiter) {
        Some(idx) => &line[..idx],
        None => line,
    }
}
