//! Response recovery parser.
//!
//! Models frequently wrap valid JSON in prose or commentary despite
//! instructions. This staged fallback maximizes successful structured
//! recovery without fabricating data:
//!
//! 1. Parse the reply directly as JSON.
//! 2. Repair minor structural slips (trailing commas, an unterminated
//!    string, unclosed brackets) and parse the repaired text.
//! 3. Parse the contents of a fenced code block labeled `json`.
//! 4. Give up with a [`ParseError`] carrying a bounded excerpt.
//!
//! Each stage either fully succeeds or is abandoned; nothing is merged
//! across stages. Stage 2 deliberately never strips surrounding prose, so
//! prose-wrapped replies fall through to the fenced-block stage.

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::{ParseError, ParseResult};

/// Length of the diagnostic excerpt kept from an unparseable reply.
const EXCERPT_CHARS: usize = 200;

/// Recover a JSON object from a raw model reply.
pub fn recover_json(raw: &str) -> ParseResult<Map<String, Value>> {
    // Stage 1: the reply is already valid JSON.
    if let Ok(value) = serde_json::from_str::<Value>(raw.trim()) {
        return require_object(value, raw);
    }

    // Stage 2: syntax repair.
    let repaired = repair_json(raw);
    if let Ok(value) = serde_json::from_str::<Value>(&repaired) {
        return require_object(value, raw);
    }

    // Stage 3: fenced ```json block embedded in prose.
    if let Some(block) = fenced_json_block(raw) {
        if let Ok(value) = serde_json::from_str::<Value>(&block) {
            return require_object(value, raw);
        }
    }

    Err(unrecoverable(raw))
}

/// A parsed reply must be a JSON object; anything else cannot become a
/// record.
fn require_object(value: Value, raw: &str) -> ParseResult<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(unrecoverable(raw)),
    }
}

fn unrecoverable(raw: &str) -> ParseError {
    ParseError::Unrecoverable {
        excerpt: raw.chars().take(EXCERPT_CHARS).collect(),
    }
}

/// Repair minor structural slips in near-JSON text.
///
/// Handles trailing commas before a closer, a single unterminated string,
/// and unclosed braces/brackets. Operates on the reply as-is: text that is
/// not JSON-shaped (prose prefixes, commentary) stays broken on purpose.
pub fn repair_json(raw: &str) -> String {
    let text = raw.trim();
    let mut out = String::with_capacity(text.len() + 4);
    let mut closers: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for c in text.chars() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '{' => {
                closers.push('}');
                out.push(c);
            }
            '[' => {
                closers.push(']');
                out.push(c);
            }
            '}' | ']' => {
                drop_trailing_comma(&mut out);
                if closers.last() == Some(&c) {
                    closers.pop();
                }
                out.push(c);
            }
            _ => out.push(c),
        }
    }

    if in_string {
        out.push('"');
    }
    while let Some(closer) = closers.pop() {
        drop_trailing_comma(&mut out);
        out.push(closer);
    }

    out
}

/// Remove a comma (and any whitespace) hanging before a closer.
fn drop_trailing_comma(out: &mut String) {
    out.truncate(out.trim_end().len());
    if out.ends_with(',') {
        out.pop();
    }
}

/// Find the contents of the first fenced code block labeled `json`.
fn fenced_json_block(raw: &str) -> Option<String> {
    let fence = Regex::new(r"(?s)```json\s*(.*?)```").unwrap();
    fence
        .captures(raw)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage1_valid_json() {
        let map = recover_json(r#"{"title": "Widget", "price": 19.99}"#).unwrap();
        assert_eq!(map["title"], "Widget");
        assert_eq!(map["price"], 19.99);
    }

    #[test]
    fn test_stage1_wins_over_repair() {
        // The string value contains what looks like a structural slip; a
        // repair pass must never get the chance to mangle it.
        let map = recover_json(r#"{"note": "ends with ,}"}"#).unwrap();
        assert_eq!(map["note"], "ends with ,}");
    }

    #[test]
    fn test_stage2_trailing_comma() {
        let map = recover_json(r#"{"title": "Widget", "price": 19.99,}"#).unwrap();
        assert_eq!(map["title"], "Widget");
        assert_eq!(map["price"], 19.99);
    }

    #[test]
    fn test_stage2_trailing_comma_in_array() {
        let map = recover_json(r#"{"tags": ["a", "b",],}"#).unwrap();
        assert_eq!(map["tags"], serde_json::json!(["a", "b"]));
    }

    #[test]
    fn test_stage2_unterminated_reply() {
        // A reply cut off mid-string by the token ceiling.
        let map = recover_json(r#"{"title": "Widg"#).unwrap();
        assert_eq!(map["title"], "Widg");
    }

    #[test]
    fn test_stage2_unclosed_brackets() {
        let map = recover_json(r#"{"tags": ["a", "b"]"#).unwrap();
        assert_eq!(map["tags"], serde_json::json!(["a", "b"]));
    }

    #[test]
    fn test_stage3_fenced_block_in_prose() {
        let raw = "Sure! Here is the extracted data:\n```json\n{\"title\": \"Widget\"}\n```\nLet me know if you need more.";
        let map = recover_json(raw).unwrap();
        assert_eq!(map["title"], "Widget");
    }

    #[test]
    fn test_stage3_requires_json_label() {
        let raw = "Here it is:\n```\n{\"title\": \"Widget\"}\n```";
        assert!(recover_json(raw).is_err());
    }

    #[test]
    fn test_unrecoverable_carries_bounded_excerpt() {
        let raw = "I could not find any structured data on this page. ".repeat(20);
        let err = recover_json(&raw).unwrap_err();
        let ParseError::Unrecoverable { excerpt } = err;
        assert_eq!(excerpt.chars().count(), 200);
        assert!(raw.starts_with(&excerpt));
    }

    #[test]
    fn test_non_object_top_level_is_an_error() {
        assert!(recover_json("[1, 2, 3]").is_err());
        assert!(recover_json("42").is_err());
    }

    #[test]
    fn test_repair_preserves_valid_json() {
        let valid = r#"{"a": [1, 2], "b": {"c": "d,e"}}"#;
        assert_eq!(repair_json(valid), valid);
    }
}
