//! Cleaning of raw field values before they reach the record store
//!
//! Every step is idempotent, and so is the whole pipeline: sanitizing an
//! already sanitized value returns it unchanged.

use std::borrow::Cow;

/// Characters that may follow a backslash in an escape sequence
const ESCAPE_SUFFIXES: [char; 7] = ['\\', '\'', '"', '0', 'n', 'r', 'Z'];

/// Run all sanitizing steps over one raw field value
pub fn sanitize(raw: &str, enclosure: u8) -> String {
    let trimmed = strip_enclosure(raw, enclosure);
    let listed = unserialize_list(trimmed);
    escape(&listed)
}

/// Remove one leading and one trailing enclosure character
///
/// A trailing enclosure preceded by an odd run of backslashes belongs to an
/// escape sequence and is kept.
pub fn strip_enclosure(value: &str, enclosure: u8) -> &str {
    let enclosure = enclosure as char;
    let value = value.strip_prefix(enclosure).unwrap_or(value);

    match value.strip_suffix(enclosure) {
        Some(rest) if !ends_with_escape(rest) => rest,
        _ => value,
    }
}

fn ends_with_escape(value: &str) -> bool {
    value.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

/// Turn an exported JSON list back into the comma-joined list form
///
/// Only flat arrays of strings, numbers and booleans are rewritten. The value
/// is left alone when the joined form would itself look like a list.
pub fn unserialize_list(value: &str) -> Cow<'_, str> {
    let trimmed = value.trim();
    if !(trimmed.starts_with('[') && trimmed.ends_with(']')) {
        return Cow::Borrowed(value);
    }

    let Ok(items) = serde_json::from_str::<Vec<serde_json::Value>>(trimmed) else {
        return Cow::Borrowed(value);
    };

    let mut parts = Vec::with_capacity(items.len());
    for item in items {
        match item {
            serde_json::Value::String(s) => parts.push(s),
            serde_json::Value::Number(n) => parts.push(n.to_string()),
            serde_json::Value::Bool(b) => parts.push(b.to_string()),
            _ => return Cow::Borrowed(value),
        }
    }

    let joined = parts.join(",");
    if joined.trim_start().starts_with('[') {
        return Cow::Borrowed(value);
    }
    Cow::Owned(joined)
}

/// Backslash-escape quotes, backslashes and control characters
///
/// Existing escape sequences pass through untouched; a backslash that does
/// not start one is doubled.
pub fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.peek() {
                Some(&next) if ESCAPE_SUFFIXES.contains(&next) => {
                    escaped.push('\\');
                    escaped.push(next);
                    chars.next();
                }
                _ => escaped.push_str("\\\\"),
            },
            '\0' => escaped.push_str("\\0"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\x1a' => escaped.push_str("\\Z"),
            '\'' => escaped.push_str("\\'"),
            '"' => escaped.push_str("\\\""),
            other => escaped.push(other),
        }
    }

    escaped
}

/// Reverse [`escape`] for stores that bind values as parameters
pub fn unescape(value: &str) -> String {
    let mut raw = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            raw.push(c);
            continue;
        }
        let decoded = match chars.peek() {
            Some('0') => '\0',
            Some('n') => '\n',
            Some('r') => '\r',
            Some('Z') => '\x1a',
            Some(&other @ ('\\' | '\'' | '"')) => other,
            _ => {
                raw.push('\\');
                continue;
            }
        };
        chars.next();
        raw.push(decoded);
    }

    raw
}
