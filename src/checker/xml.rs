//! Strict XML parsing into a small element tree.
//!
//! Stricter than a browser: mismatched end tags, undefined entities,
//! content after the document element and unclosed elements all fail.
//! Namespaces are resolved by hand so schema rules can match on
//! `(namespace, local name)` pairs.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use rustc_hash::FxHashMap;

use super::report::{Diagnostic, Severity};
use super::schema;
use crate::utils::line_col;

/// A problem at a byte offset of the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub offset: usize,
    pub message: String,
}

impl Violation {
    pub fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }

    pub fn diagnostic(&self, src: &str) -> Diagnostic {
        let (line, column) = line_col(src, self.offset);
        Diagnostic {
            line,
            column,
            severity: Severity::Error,
            message: self.message.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Element {
    /// Name without prefix.
    pub name: String,
    pub namespace: Option<String>,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Element>,
    /// Concatenated character data directly inside this element.
    pub text: String,
    /// Byte offset of the start tag.
    pub offset: usize,
    /// In-scope prefix declarations; `""` is the default namespace.
    scope: FxHashMap<String, String>,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn is(&self, namespace: &str, name: &str) -> bool {
        self.name == name && self.namespace.as_deref() == Some(namespace)
    }

    pub fn children_named<'a>(
        &'a self,
        namespace: &'a str,
        name: &'a str,
    ) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.is(namespace, name))
    }

    /// Depth-first, self included.
    pub fn descendants(&self) -> Vec<&Element> {
        let mut out = vec![self];
        let mut i = 0;
        while i < out.len() {
            let next = out[i];
            out.extend(next.children.iter());
            i += 1;
        }
        out
    }
}

/// What checking one XML file found.
#[derive(Debug, Default)]
pub struct XmlCheck {
    pub diagnostics: Vec<Diagnostic>,
    pub links: Vec<String>,
}

/// Parse, validate against the schema for the root element, collect links.
pub fn check(src: &str) -> XmlCheck {
    let root = match parse(src) {
        Ok(root) => root,
        Err(violation) => {
            return XmlCheck {
                diagnostics: vec![violation.diagnostic(src)],
                links: Vec::new(),
            };
        }
    };
    XmlCheck {
        diagnostics: schema::validate(&root)
            .iter()
            .map(|v| v.diagnostic(src))
            .collect(),
        links: schema::links(&root),
    }
}

/// Parse a complete document.
pub fn parse(src: &str) -> Result<Element, Violation> {
    let mut reader = Reader::from_str(src);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let offset = reader.buffer_position() as usize;
        let event = reader
            .read_event()
            .map_err(|e| Violation::new(reader.error_position() as usize, e.to_string()))?;

        match event {
            Event::Start(start) => {
                let element = open(&reader, &start, offset, stack.last())?;
                if stack.is_empty() && root.is_some() {
                    return Err(Violation::new(offset, "junk after document element"));
                }
                stack.push(element);
            }
            Event::Empty(start) => {
                let element = open(&reader, &start, offset, stack.last())?;
                close(element, &mut stack, &mut root, offset)?;
            }
            Event::End(_) => {
                let Some(element) = stack.pop() else {
                    return Err(Violation::new(offset, "unexpected end tag"));
                };
                close(element, &mut stack, &mut root, offset)?;
            }
            Event::Text(text) => {
                let text = reader
                    .decoder()
                    .decode(&text)
                    .map_err(|e| Violation::new(offset, e.to_string()))?;
                append_text(&mut stack, &text, offset)?;
            }
            Event::CData(data) => {
                let text = String::from_utf8_lossy(&data);
                append_text(&mut stack, &text, offset)?;
            }
            Event::GeneralRef(reference) => {
                let name = reader
                    .decoder()
                    .decode(&reference)
                    .map_err(|e| Violation::new(offset, e.to_string()))?;
                let Some(c) = resolve_reference(&name) else {
                    return Err(Violation::new(offset, format!("undefined entity &{name};")));
                };
                append_text(&mut stack, c.encode_utf8(&mut [0; 4]), offset)?;
            }
            Event::Eof => break,
            Event::Decl(_) | Event::PI(_) | Event::Comment(_) | Event::DocType(_) => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(Violation::new(
            src.len(),
            format!("missing end tag for <{}>", open.name),
        ));
    }
    root.ok_or_else(|| Violation::new(0, "no document element"))
}

fn open(
    reader: &Reader<&[u8]>,
    start: &BytesStart<'_>,
    offset: usize,
    parent: Option<&Element>,
) -> Result<Element, Violation> {
    let decode = |bytes: &[u8]| {
        reader
            .decoder()
            .decode(bytes)
            .map(|s| s.into_owned())
            .map_err(|e| Violation::new(offset, e.to_string()))
    };

    let qname = decode(start.name().as_ref())?;
    let mut scope = parent.map(|p| p.scope.clone()).unwrap_or_default();
    let mut attrs = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| Violation::new(offset, e.to_string()))?;
        let key = decode(attr.key.as_ref())?;
        let value = attr
            .unescape_value()
            .map_err(|e| Violation::new(offset, e.to_string()))?
            .into_owned();

        if key == "xmlns" {
            scope.insert(String::new(), value.clone());
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            scope.insert(prefix.to_string(), value.clone());
        }
        attrs.push((key, value));
    }

    let (prefix, name) = match qname.split_once(':') {
        Some((prefix, name)) => (prefix, name),
        None => ("", qname.as_str()),
    };
    let namespace = scope.get(prefix).cloned();
    if namespace.is_none() && !prefix.is_empty() {
        return Err(Violation::new(offset, format!("undeclared namespace prefix \"{prefix}\"")));
    }

    Ok(Element {
        name: name.to_string(),
        namespace,
        attrs,
        children: Vec::new(),
        text: String::new(),
        offset,
        scope,
    })
}

fn close(
    element: Element,
    stack: &mut [Element],
    root: &mut Option<Element>,
    offset: usize,
) -> Result<(), Violation> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_some() => {
            return Err(Violation::new(offset, "junk after document element"));
        }
        None => *root = Some(element),
    }
    Ok(())
}

fn append_text(stack: &mut [Element], text: &str, offset: usize) -> Result<(), Violation> {
    match stack.last_mut() {
        Some(element) => element.text.push_str(text),
        None if !text.trim().is_empty() => {
            return Err(Violation::new(offset, "text outside the document element"));
        }
        None => {}
    }
    Ok(())
}

/// The five predefined entities and character references.
fn resolve_reference(name: &str) -> Option<char> {
    match name {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "apos" => Some('\''),
        "quot" => Some('"'),
        _ => {
            let code = name.strip_prefix('#')?;
            let value = match code.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse().ok()?,
            };
            char::from_u32(value)
        }
    }
}
