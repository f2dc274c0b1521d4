//! Front-matter headers.
//!
//! A text source may open with `key: value` lines, ended by a blank line:
//!
//! ```text
//! title: Hello
//! date: 2024-06-15
//! summary: A long summary
//!   continued on an indented line
//!
//! Body starts here.
//! ```
//!
//! Keys are lower-cased with `-` mapped to `_`. HTML documents supply the
//! same fields through `<title>` and `<meta name content>`.

use regex::Regex;
use std::sync::LazyLock;

static RE_HEADER_START: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\w+:\s+").unwrap());

/// Ordered header fields with normalized keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    fields: Vec<(String, String)>,
}

impl Header {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing an earlier value for the same key.
    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        let key = normalize_key(key);
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(field) => field.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

pub fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace('-', "_")
}

/// Split a leading header off `text`.
///
/// Text without a header comes back whole with an empty header.
pub fn split_header(text: &str) -> (Header, &str) {
    let first_line = text.lines().next().unwrap_or_default();
    if !RE_HEADER_START.is_match(first_line) {
        return (Header::new(), text);
    }

    let (block, body) = split_at_blank_line(text);
    let mut header = Header::new();
    let mut last_key: Option<String> = None;

    for line in block.lines() {
        if line.starts_with(char::is_whitespace) {
            if let Some(key) = &last_key
                && let Some(field) = header.fields.iter_mut().find(|(k, _)| k == key)
            {
                field.1.push(' ');
                field.1.push_str(line.trim());
            }
            continue;
        }
        let (key, value) = line.split_once(':').unwrap_or((line, ""));
        header.insert(key, value.trim());
        last_key = Some(normalize_key(key));
    }

    (header, body)
}

/// Header block and the body after the first blank line.
fn split_at_blank_line(text: &str) -> (&str, &str) {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if line.trim().is_empty() {
            return (&text[..offset], &text[offset + line.len()..]);
        }
        offset += line.len();
    }
    (text, "")
}

/// Parse `true`/`false` header values.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}
