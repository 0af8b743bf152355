//! JSON extraction and repair for oracle output
//!
//! Generative models wrap JSON in prose, use single quotes and leave trailing
//! commas. Extraction locates the first balanced `{...}` span by counting
//! brace depth, tries a strict parse, then applies one bounded repair pass.
//!
//! Limitation: only the first top-level object is considered. Output with
//! several independent objects cannot be disambiguated, and braces inside
//! single-quoted strings are counted as structure.

use lazy_static::lazy_static;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;

lazy_static! {
    static ref TRAILING_COMMA: Regex = Regex::new(r",\s*([}\]])").unwrap();
}

/// Find the first balanced `{...}` span.
///
/// Braces inside double-quoted strings are ignored. Returns `None` when there
/// is no `{` or the text ends before the depth returns to zero.
pub fn find_object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + ch.len_utf8();
                    return Some(&text[start..end]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Apply the single repair pass: every `'` becomes `"` and commas directly
/// before `}` or `]` are dropped.
pub fn repair(block: &str) -> String {
    let quoted = block.replace('\'', "\"");
    TRAILING_COMMA.replace_all(&quoted, "$1").into_owned()
}

fn parse_object(block: &str) -> Option<Value> {
    serde_json::from_str::<Value>(block)
        .ok()
        .filter(Value::is_object)
}

/// Extract and parse the first JSON object embedded in `text`.
pub fn extract_json(text: &str) -> Option<Value> {
    let block = find_object_span(text)?;

    if let Some(value) = parse_object(block) {
        return Some(value);
    }

    let repaired = repair(block);
    let value = parse_object(&repaired);
    if value.is_some() {
        tracing::debug!("Recovered JSON object after repair pass");
    }
    value
}

/// Extract the first JSON object and deserialize it into `T`.
pub fn extract_json_as<T: DeserializeOwned>(text: &str) -> Option<T> {
    let value = extract_json(text)?;
    match serde_json::from_value(value) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::debug!("JSON object did not match expected shape: {}", e);
            None
        }
    }
}
