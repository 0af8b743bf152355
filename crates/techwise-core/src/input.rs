//! User input validation and cleanup

use crate::error::InputError;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref DISALLOWED: Regex = Regex::new(r#"[^a-zA-Z0-9,.!?;:'"()\-\s]"#).unwrap();
}

/// Minimum question length accepted by the front ends
pub const DEFAULT_MIN_QUERY_CHARS: usize = 3;

/// Reject empty or too-short questions before any oracle work is done.
///
/// Returns the trimmed question on success.
pub fn validate_query(text: &str, min_chars: usize) -> Result<&str, InputError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(InputError::Empty);
    }

    let actual = trimmed.chars().count();
    if actual < min_chars {
        return Err(InputError::TooShort {
            min: min_chars,
            actual,
        });
    }

    Ok(trimmed)
}

/// Trim, collapse whitespace, drop anything outside ASCII letters, digits and
/// basic punctuation, then lowercase.
pub fn clean_text(text: &str) -> String {
    let collapsed = WHITESPACE.replace_all(text.trim(), " ");
    DISALLOWED.replace_all(&collapsed, "").to_lowercase()
}

/// Collapse whitespace and lowercase, for similarity comparisons
pub fn normalize_text(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").to_lowercase()
}
