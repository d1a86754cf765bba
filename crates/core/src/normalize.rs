//! Text folding used when matching section titles and cleaning model output.
//!
//! Titles coming out of PDF extraction are often in decomposed Unicode form,
//! carry stray line breaks from multi-line headings, or mix case. Folding
//! brings them to one canonical shape before substring matching.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Regex to collapse any run of whitespace (including newlines) into one space.
static WHITESPACE_COLLAPSE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Leading bullet glyphs a model may put in front of a summary line.
const BULLET_CHARS: &[char] = &['*', '•', '-', '·'];

/// Fold text for case-insensitive substring matching.
///
/// - Composes to Unicode NFC
/// - Lowercases
/// - Collapses whitespace runs to single spaces and trims
pub fn fold_for_match(text: &str) -> String {
    let composed: String = text.nfc().collect();
    let lowered = composed.to_lowercase();
    WHITESPACE_COLLAPSE_REGEX
        .replace_all(&lowered, " ")
        .trim()
        .to_string()
}

/// Strip a leading bullet glyph and surrounding whitespace from a line.
///
/// Returns `None` when the line does not start with a bullet.
pub fn strip_bullet(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    let rest = trimmed.strip_prefix(BULLET_CHARS)?;
    Some(rest.trim())
}

/// Collapse whitespace runs within a single line.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_COLLAPSE_REGEX
        .replace_all(text, " ")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_case_and_whitespace() {
        assert_eq!(fold_for_match("  REFERENCES\n"), "references");
        assert_eq!(fold_for_match("Related\n  Work"), "related work");
    }

    #[test]
    fn test_fold_composes_vietnamese() {
        // "tài liệu" written with combining marks
        let decomposed = "Ta\u{0300}i Lie\u{0323}\u{0302}u";
        assert_eq!(fold_for_match(decomposed), "t\u{e0}i li\u{1ec7}u");
    }

    #[test]
    fn test_strip_bullet() {
        assert_eq!(strip_bullet("• First point"), Some("First point"));
        assert_eq!(strip_bullet("  * Second"), Some("Second"));
        assert_eq!(strip_bullet("- Third "), Some("Third"));
        assert_eq!(strip_bullet("No bullet"), None);
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace(" a \t b\n c "), "a b c");
    }
}
