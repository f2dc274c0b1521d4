//! HTML utility functions.
//!
//! - `escape()`, `unescape()` - entity escaping for text and attributes
//! - `Tokenizer` - a forgiving tag scanner that keeps byte offsets, so callers
//!   can report line/column positions and splice attributes into the source
//! - `add_attributes()` - rewrite selected start tags with extra attributes

use anyhow::Result;
use std::borrow::Cow;
use std::ops::Range;

// =============================================================================
// HTML Escaping
// =============================================================================

const ESCAPE_CHARS: [char; 5] = ['<', '>', '&', '"', '\''];

#[inline]
fn escape_char(c: char) -> Option<&'static str> {
    match c {
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '&' => Some("&amp;"),
        '"' => Some("&quot;"),
        '\'' => Some("&#39;"),
        _ => None,
    }
}

/// Escape HTML special characters in text or attribute values.
///
/// Uses `Cow` to avoid allocation when no escaping is needed.
pub fn escape(s: &str) -> Cow<'_, str> {
    if !s.contains(ESCAPE_CHARS) {
        return Cow::Borrowed(s);
    }

    let mut result = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match escape_char(c) {
            Some(entity) => result.push_str(entity),
            None => result.push(c),
        }
    }
    Cow::Owned(result)
}

/// Unescape HTML entities back to characters.
///
/// Handles the common named entities and numeric character references;
/// anything else is left as written.
pub fn unescape(s: &str) -> Cow<'_, str> {
    if !s.contains('&') {
        return Cow::Borrowed(s);
    }

    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        result.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let decoded = after
            .find(';')
            .filter(|&end| end > 0 && end <= 10)
            .and_then(|end| decode_entity(&after[..end]).map(|c| (c, end)));
        match decoded {
            Some((c, end)) => {
                result.push(c);
                rest = &after[end + 1..];
            }
            None => {
                result.push('&');
                rest = after;
            }
        }
    }
    result.push_str(rest);
    Cow::Owned(result)
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{00A0}'),
        s if s.starts_with("#x") || s.starts_with("#X") => {
            u32::from_str_radix(&s[2..], 16).ok().and_then(char::from_u32)
        }
        s if s.starts_with('#') => s[1..].parse().ok().and_then(char::from_u32),
        _ => None,
    }
}

/// True when `&` at the start of `s` begins a character reference.
pub fn starts_with_reference(s: &str) -> bool {
    let Some(body) = s.strip_prefix('&') else {
        return false;
    };
    let Some(end) = body.find(';') else {
        return false;
    };
    let name = &body[..end];
    !name.is_empty()
        && match name.strip_prefix('#') {
            Some(num) => {
                let digits = num.strip_prefix(['x', 'X']).unwrap_or(num);
                !digits.is_empty() && digits.chars().all(|c| c.is_ascii_hexdigit())
            }
            None => name.chars().all(|c| c.is_ascii_alphanumeric()),
        }
}

// =============================================================================
// Element Classification
// =============================================================================

/// Void elements never have content or an end tag.
#[inline]
pub fn is_void_element(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "source"
            | "track"
            | "wbr"
    )
}

/// Elements whose content is not parsed as markup.
#[inline]
pub fn is_raw_text_element(tag: &str) -> bool {
    matches!(tag, "script" | "style" | "textarea" | "title")
}

/// Elements whose end tag may be omitted.
#[inline]
pub fn has_optional_end_tag(tag: &str) -> bool {
    matches!(
        tag,
        "html"
            | "head"
            | "body"
            | "p"
            | "li"
            | "dt"
            | "dd"
            | "tr"
            | "td"
            | "th"
            | "thead"
            | "tbody"
            | "tfoot"
            | "option"
            | "optgroup"
            | "colgroup"
            | "rt"
            | "rp"
    )
}

/// Block-level start tags that implicitly close an open `<p>`.
#[inline]
pub fn closes_paragraph(tag: &str) -> bool {
    matches!(
        tag,
        "address"
            | "article"
            | "aside"
            | "blockquote"
            | "div"
            | "dl"
            | "fieldset"
            | "figure"
            | "footer"
            | "form"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "header"
            | "hr"
            | "main"
            | "nav"
            | "ol"
            | "p"
            | "pre"
            | "section"
            | "table"
            | "ul"
    )
}

// =============================================================================
// Attribute Parsing
// =============================================================================

/// Parse the attribute section of a start tag.
///
/// Input: `src="a.png" alt='A' hidden`
/// Output: `[("src", "a.png"), ("alt", "A"), ("hidden", "")]`
///
/// Names are lower-cased, values are unescaped, duplicates are kept.
pub fn parse_attributes(s: &str) -> Vec<(String, String)> {
    let mut attrs = Vec::new();
    let mut rest = s.trim_start();

    while !rest.is_empty() {
        let name_end = rest
            .find(|c: char| c == '=' || c.is_whitespace())
            .unwrap_or(rest.len());
        let name = rest[..name_end].to_ascii_lowercase();
        rest = rest[name_end..].trim_start();

        let value = match rest.strip_prefix('=') {
            Some(after_eq) => {
                let after_eq = after_eq.trim_start();
                match after_eq.chars().next() {
                    Some(quote @ ('"' | '\'')) => {
                        let body = &after_eq[1..];
                        let end = body.find(quote).unwrap_or(body.len());
                        rest = body.get(end + 1..).unwrap_or("");
                        &body[..end]
                    }
                    _ => {
                        let end = after_eq
                            .find(char::is_whitespace)
                            .unwrap_or(after_eq.len());
                        rest = &after_eq[end..];
                        &after_eq[..end]
                    }
                }
            }
            None => "",
        };

        if !name.is_empty() {
            attrs.push((name, unescape(value).into_owned()));
        }
        rest = rest.trim_start();
    }

    attrs
}

// =============================================================================
// Tokenizer
// =============================================================================

/// A start tag with its position in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTag {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub self_closing: bool,
    /// `<` through `>`.
    pub span: Range<usize>,
}

impl StartTag {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|(key, _)| key == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// `<!DOCTYPE ...>` or any other `<!...>`/`<?...>` declaration.
    Declaration(Range<usize>),
    Comment(Range<usize>),
    Start(StartTag),
    End { name: String, span: Range<usize> },
    Text { text: &'a str, offset: usize },
    /// Markup opened at `offset` and never closed before end of input.
    Unterminated { what: &'static str, offset: usize },
}

/// Forgiving HTML scanner.
///
/// Never fails: malformed markup surfaces as `Token::Unterminated` or as
/// text, which leaves judgement to the caller.
pub struct Tokenizer<'a> {
    src: &'a str,
    pos: usize,
    raw_text: Option<String>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            raw_text: None,
        }
    }

    fn read_raw_text(&mut self, name: &str) -> Option<Token<'a>> {
        let start = self.pos;
        let rest = &self.src[start..];
        let closing = format!("</{name}");
        let end = rest
            .to_ascii_lowercase()
            .find(&closing)
            .map_or(self.src.len(), |i| start + i);
        self.pos = end;
        (end > start).then(|| Token::Text {
            text: &self.src[start..end],
            offset: start,
        })
    }

    fn start_tag(&mut self, start: usize) -> Token<'a> {
        let rest = &self.src[start..];
        let bytes = rest.as_bytes();

        let mut name_end = 1;
        while name_end < bytes.len()
            && (bytes[name_end].is_ascii_alphanumeric()
                || matches!(bytes[name_end], b'-' | b':' | b'_'))
        {
            name_end += 1;
        }
        let name = rest[1..name_end].to_ascii_lowercase();

        let mut quote: Option<u8> = None;
        let mut close = name_end;
        while close < bytes.len() {
            let b = bytes[close];
            match quote {
                Some(q) if b == q => quote = None,
                Some(_) => {}
                None if b == b'"' || b == b'\'' => quote = Some(b),
                None if b == b'>' => break,
                None => {}
            }
            close += 1;
        }
        if close >= bytes.len() {
            self.pos = self.src.len();
            return Token::Unterminated {
                what: "tag",
                offset: start,
            };
        }

        let inner = rest[name_end..close].trim_end();
        let self_closing = inner.strip_suffix('/').is_some_and(|before| {
            before.is_empty() || before.ends_with(|c: char| c.is_whitespace() || c == '"' || c == '\'')
        });
        let attr_src = if self_closing {
            &inner[..inner.len() - 1]
        } else {
            inner
        };

        self.pos = start + close + 1;
        if !self_closing && is_raw_text_element(&name) {
            self.raw_text = Some(name.clone());
        }

        Token::Start(StartTag {
            attrs: parse_attributes(attr_src),
            name,
            self_closing,
            span: start..start + close + 1,
        })
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        if let Some(name) = self.raw_text.take()
            && let Some(text) = self.read_raw_text(&name)
        {
            return Some(text);
        }

        let start = self.pos;
        if start >= self.src.len() {
            return None;
        }
        let rest = &self.src[start..];
        let bytes = rest.as_bytes();

        if let Some(body) = rest.strip_prefix("<!--") {
            return Some(match body.find("-->") {
                Some(i) => {
                    let end = start + 4 + i + 3;
                    self.pos = end;
                    Token::Comment(start..end)
                }
                None => {
                    self.pos = self.src.len();
                    Token::Unterminated {
                        what: "comment",
                        offset: start,
                    }
                }
            });
        }

        if rest.starts_with("<!") || rest.starts_with("<?") {
            return Some(match rest.find('>') {
                Some(i) => {
                    self.pos = start + i + 1;
                    Token::Declaration(start..start + i + 1)
                }
                None => {
                    self.pos = self.src.len();
                    Token::Unterminated {
                        what: "declaration",
                        offset: start,
                    }
                }
            });
        }

        if bytes.len() > 2 && bytes[0] == b'<' && bytes[1] == b'/' && bytes[2].is_ascii_alphabetic()
        {
            return Some(match rest.find('>') {
                Some(i) => {
                    self.pos = start + i + 1;
                    Token::End {
                        name: rest[2..i].trim().to_ascii_lowercase(),
                        span: start..start + i + 1,
                    }
                }
                None => {
                    self.pos = self.src.len();
                    Token::Unterminated {
                        what: "end tag",
                        offset: start,
                    }
                }
            });
        }

        if bytes.len() > 1 && bytes[0] == b'<' && bytes[1].is_ascii_alphabetic() {
            return Some(self.start_tag(start));
        }

        // A lone `<` that opens nothing is text.
        let from = usize::from(bytes[0] == b'<');
        let end = rest[from..].find('<').map_or(self.src.len(), |i| start + from + i);
        self.pos = end;
        Some(Token::Text {
            text: &self.src[start..end],
            offset: start,
        })
    }
}

// =============================================================================
// Rewriting
// =============================================================================

/// Rewrite start tags, appending the attributes `extra` returns for each.
pub fn add_attributes<F>(html: &str, mut extra: F) -> Result<String>
where
    F: FnMut(&StartTag) -> Result<Vec<(String, String)>>,
{
    let mut out = String::with_capacity(html.len() + 64);
    let mut copied = 0;

    for token in Tokenizer::new(html) {
        let Token::Start(tag) = token else {
            continue;
        };
        let attrs = extra(&tag)?;
        if attrs.is_empty() {
            continue;
        }

        // Insert before `>` or `/>`, after any trailing whitespace is skipped.
        let close = tag.span.end - 1;
        let before_close = if tag.self_closing {
            html[tag.span.start..close]
                .rfind('/')
                .map_or(close, |i| tag.span.start + i)
        } else {
            close
        };
        let insert_at = tag.span.start + html[tag.span.start..before_close].trim_end().len();

        out.push_str(&html[copied..insert_at]);
        for (key, value) in attrs {
            out.push(' ');
            out.push_str(&key);
            out.push_str("=\"");
            out.push_str(&escape(&value));
            out.push('"');
        }
        copied = insert_at;
    }

    out.push_str(&html[copied..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(escape("hello"), "hello");
        assert_eq!(escape("<a href=\"x\">"), "&lt;a href=&quot;x&quot;&gt;");
        assert_eq!(escape("it's & more"), "it&#39;s &amp; more");
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape("a &amp; b"), "a & b");
        assert_eq!(unescape("&lt;p&gt;"), "<p>");
        assert_eq!(unescape("&#65;&#x42;"), "AB");
        assert_eq!(unescape("fish & chips"), "fish & chips");
        assert_eq!(unescape("&unknown;"), "&unknown;");
    }

    #[test]
    fn test_starts_with_reference() {
        assert!(starts_with_reference("&amp; rest"));
        assert!(starts_with_reference("&#8217;"));
        assert!(starts_with_reference("&#x2019;"));
        assert!(!starts_with_reference("& chips"));
        assert!(!starts_with_reference("&;"));
        assert!(!starts_with_reference("&amp"));
    }

    #[test]
    fn test_parse_attributes() {
        let attrs = parse_attributes(r#"src="a.png" ALT='A &amp; B' hidden width=10"#);
        assert_eq!(
            attrs,
            vec![
                ("src".to_string(), "a.png".to_string()),
                ("alt".to_string(), "A & B".to_string()),
                ("hidden".to_string(), String::new()),
                ("width".to_string(), "10".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_attributes_keeps_duplicates() {
        let attrs = parse_attributes(r#"id="a" id="b""#);
        assert_eq!(attrs.len(), 2);
    }

    #[test]
    fn test_tokenizer_basic() {
        let html = "<!DOCTYPE html><p class=x>Hi<br/></p><!-- c -->";
        let tokens: Vec<_> = Tokenizer::new(html).collect();
        assert!(matches!(tokens[0], Token::Declaration(_)));
        let Token::Start(p) = &tokens[1] else {
            panic!("expected start tag");
        };
        assert_eq!(p.name, "p");
        assert_eq!(p.attr("class"), Some("x"));
        assert!(matches!(tokens[2], Token::Text { text: "Hi", .. }));
        let Token::Start(br) = &tokens[3] else {
            panic!("expected br");
        };
        assert!(br.self_closing);
        assert!(matches!(&tokens[4], Token::End { name, .. } if name == "p"));
        assert!(matches!(tokens[5], Token::Comment(_)));
    }

    #[test]
    fn test_tokenizer_raw_text() {
        let html = "<script>if (a < b) { x = '</p>'; }</script><p>";
        let tokens: Vec<_> = Tokenizer::new(html).collect();
        assert!(matches!(tokens[1], Token::Text { text, .. } if text.contains("a < b")));
        assert!(matches!(&tokens[2], Token::End { name, .. } if name == "script"));
    }

    #[test]
    fn test_tokenizer_unquoted_slash_value_is_not_self_closing() {
        let tokens: Vec<_> = Tokenizer::new("<a href=/docs/>x</a>").collect();
        let Token::Start(a) = &tokens[0] else {
            panic!("expected start tag");
        };
        assert!(!a.self_closing);
        assert_eq!(a.attr("href"), Some("/docs/"));
    }

    #[test]
    fn test_tokenizer_unterminated() {
        let tokens: Vec<_> = Tokenizer::new("<p>ok</p><img src=\"x").collect();
        assert!(matches!(
            tokens.last(),
            Some(Token::Unterminated { what: "tag", offset: 9 })
        ));
    }

    #[test]
    fn test_tokenizer_lone_angle_is_text() {
        let tokens: Vec<_> = Tokenizer::new("1 < 2").collect();
        assert_eq!(tokens.len(), 2);
        assert!(matches!(tokens[1], Token::Text { text: "< 2", .. }));
    }

    #[test]
    fn test_add_attributes() {
        let html = r#"<p><img src="a.png" /><img src="b.png"></p>"#;
        let out = add_attributes(html, |tag| {
            Ok(if tag.name == "img" {
                vec![("width".to_string(), "4".to_string())]
            } else {
                Vec::new()
            })
        })
        .unwrap();
        assert_eq!(
            out,
            r#"<p><img src="a.png" width="4" /><img src="b.png" width="4"></p>"#
        );
    }
}
