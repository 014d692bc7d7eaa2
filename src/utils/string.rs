//! String utility functions for text processing

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref MULTI_SPACE_REGEX: Regex = Regex::new(r"\s+").unwrap();
}

/// Collapse every whitespace run into a single space and trim both ends
///
/// # Arguments
///
/// * `s` - The input string
///
/// # Returns
///
/// The string with whitespace runs collapsed
pub fn collapse_whitespace(s: &str) -> String {
    MULTI_SPACE_REGEX.replace_all(s, " ").trim().to_string()
}

/// Keep at most `max_chars` characters of a string
///
/// Counts Unicode scalar values, never splits a character.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

/// Interpret a query-string style flag
///
/// `1` and `true` (any case) are true, everything else is false.
pub fn is_truthy(s: &str) -> bool {
    s == "1" || s.eq_ignore_ascii_case("true")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a   b\t\tc "), "a b c");
        assert_eq!(collapse_whitespace("   "), "");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("香港节点01", 3), "香港节");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn test_is_truthy() {
        assert!(is_truthy("1"));
        assert!(is_truthy("TRUE"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("yes"));
    }
}
