//! HTML well-formedness validation.
//!
//! A small tidy-like pass over the token stream. It tracks open elements,
//! closing those whose end tag is optional the way browsers do, and reports
//! what tidy would:
//!
//! | Severity | Message                                              |
//! |----------|------------------------------------------------------|
//! | Error    | `unterminated tag`, `discarding unexpected </x>`     |
//! | Error    | `missing </x> before </y>`, `missing </x>`           |
//! | Error    | `<x> dropping value "v" for repeated attribute "a"`  |
//! | Warning  | `missing <!DOCTYPE> declaration`                     |
//! | Warning  | `<img> lacks "alt" attribute`, `trimming empty <p>`  |

use super::report::{Diagnostic, Severity};
use crate::utils::html::{
    StartTag, Token, Tokenizer, closes_paragraph, has_optional_end_tag, is_void_element,
    starts_with_reference,
};
use crate::utils::line_col;

struct Open {
    name: String,
    offset: usize,
    has_content: bool,
}

struct Validator<'a> {
    src: &'a str,
    stack: Vec<Open>,
    diagnostics: Vec<Diagnostic>,
    seen_doctype: bool,
    seen_element: bool,
    seen_title: bool,
}

/// Validate a complete HTML document.
pub fn validate(html: &str) -> Vec<Diagnostic> {
    let mut v = Validator {
        src: html,
        stack: Vec::new(),
        diagnostics: Vec::new(),
        seen_doctype: false,
        seen_element: false,
        seen_title: false,
    };

    for token in Tokenizer::new(html) {
        match token {
            Token::Declaration(span) => {
                let decl = html[span.clone()].to_ascii_lowercase();
                if decl.starts_with("<!doctype") {
                    if v.seen_element || v.seen_doctype {
                        v.report(span.start, Severity::Warning, "discarding unexpected <!DOCTYPE>");
                    }
                    v.seen_doctype = true;
                }
            }
            Token::Comment(_) => {}
            Token::Start(tag) => v.start(&tag),
            Token::End { name, span } => v.end(&name, span.start),
            Token::Text { text, offset } => v.text(text, offset),
            Token::Unterminated { what, offset } => {
                v.report(offset, Severity::Error, &format!("unterminated {what}"));
            }
        }
    }

    v.finish()
}

impl Validator<'_> {
    fn report(&mut self, offset: usize, severity: Severity, message: &str) {
        let (line, column) = line_col(self.src, offset);
        self.diagnostics.push(Diagnostic {
            line,
            column,
            severity,
            message: message.to_string(),
        });
    }

    fn start(&mut self, tag: &StartTag) {
        let name = tag.name.as_str();
        let offset = tag.span.start;

        if !self.seen_element {
            self.seen_element = true;
            if !self.seen_doctype {
                self.report(0, Severity::Warning, "missing <!DOCTYPE> declaration");
            }
        }
        if name == "title" {
            self.seen_title = true;
        }

        for (i, (attr, value)) in tag.attrs.iter().enumerate() {
            if tag.attrs[..i].iter().any(|(a, _)| a == attr) {
                self.report(
                    offset,
                    Severity::Error,
                    &format!("<{name}> dropping value \"{value}\" for repeated attribute \"{attr}\""),
                );
            }
        }
        match name {
            "img" if !tag.has_attr("alt") => {
                self.report(offset, Severity::Warning, "<img> lacks \"alt\" attribute");
            }
            "table" if !tag.has_attr("summary") => {
                self.report(offset, Severity::Warning, "<table> lacks \"summary\" attribute");
            }
            "a" if self.stack.iter().any(|o| o.name == "a") => {
                self.report(offset, Severity::Error, "nested <a> element");
            }
            _ => {}
        }
        if tag.self_closing && !is_void_element(name) {
            self.report(
                offset,
                Severity::Warning,
                &format!("<{name}> is not a void element, ignoring self-closing syntax"),
            );
        }

        while let Some(top) = self.stack.last()
            && implicitly_closes(name, &top.name)
        {
            self.pop();
        }

        if let Some(top) = self.stack.last_mut() {
            top.has_content = true;
        }
        if !is_void_element(name) && !tag.self_closing {
            self.stack.push(Open {
                name: name.to_string(),
                offset,
                has_content: false,
            });
        }
    }

    fn end(&mut self, name: &str, offset: usize) {
        if is_void_element(name) {
            self.report(offset, Severity::Error, &format!("discarding unexpected </{name}> on void element"));
            return;
        }

        let Some(index) = self.stack.iter().rposition(|o| o.name == name) else {
            self.report(offset, Severity::Error, &format!("discarding unexpected </{name}>"));
            return;
        };

        while self.stack.len() > index + 1 {
            let unclosed = &self.stack[self.stack.len() - 1].name;
            if !has_optional_end_tag(unclosed) {
                let message = format!("missing </{unclosed}> before </{name}>");
                self.report(offset, Severity::Error, &message);
            }
            self.pop();
        }
        self.pop();
    }

    fn text(&mut self, text: &str, offset: usize) {
        let raw = self
            .stack
            .last()
            .is_some_and(|o| matches!(o.name.as_str(), "script" | "style"));
        if !raw {
            for (i, _) in text.match_indices('&') {
                if !starts_with_reference(&text[i..]) {
                    self.report(
                        offset + i,
                        Severity::Warning,
                        "unescaped & which should be written as &amp;",
                    );
                }
            }
        }
        if !text.trim().is_empty()
            && let Some(top) = self.stack.last_mut()
        {
            top.has_content = true;
        }
    }

    fn pop(&mut self) {
        if let Some(open) = self.stack.pop()
            && open.name == "p"
            && !open.has_content
        {
            self.report(open.offset, Severity::Warning, "trimming empty <p>");
        }
    }

    fn finish(mut self) -> Vec<Diagnostic> {
        while let Some(open) = self.stack.last() {
            if !has_optional_end_tag(&open.name) {
                let (offset, message) = (open.offset, format!("missing </{}>", open.name));
                self.report(offset, Severity::Error, &message);
            }
            self.pop();
        }
        if self.seen_element && !self.seen_title {
            self.report(0, Severity::Warning, "inserting missing 'title' element");
        }
        self.diagnostics.sort_by_key(|d| (d.line, d.column));
        self.diagnostics
    }
}

/// Whether starting `next` ends the open element `open` without an end tag.
fn implicitly_closes(next: &str, open: &str) -> bool {
    match open {
        "p" => closes_paragraph(next),
        "li" => next == "li",
        "dt" | "dd" => matches!(next, "dt" | "dd"),
        "td" | "th" => matches!(next, "td" | "th" | "tr" | "tbody" | "thead" | "tfoot"),
        "tr" => matches!(next, "tr" | "tbody" | "thead" | "tfoot"),
        "thead" | "tbody" => matches!(next, "tbody" | "tfoot"),
        "option" => matches!(next, "option" | "optgroup"),
        "head" => next == "body",
        _ => false,
    }
}
