//! Markup sources (Markdown, plain text) and their conversion to HTML.

use anyhow::Result;
use pulldown_cmark::{Options, Parser, html};

use super::{Convertible, Document, Input, Kind, Resource};
use crate::core::PathAddress;
use crate::utils::{html::escape, mime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupFormat {
    Markdown,
    Text,
}

/// Options for markdown conversion
#[derive(Debug, Clone)]
pub struct MarkdownOptions {
    pub tables: bool,
    pub footnotes: bool,
    pub strikethrough: bool,
    pub task_lists: bool,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            tables: true,
            footnotes: true,
            strikethrough: true,
            task_lists: true,
        }
    }
}

impl MarkdownOptions {
    /// Convert to pulldown-cmark Options
    fn to_pulldown_options(&self) -> Options {
        let mut opts = Options::empty();
        if self.tables {
            opts.insert(Options::ENABLE_TABLES);
        }
        if self.footnotes {
            opts.insert(Options::ENABLE_FOOTNOTES);
        }
        if self.strikethrough {
            opts.insert(Options::ENABLE_STRIKETHROUGH);
        }
        if self.task_lists {
            opts.insert(Options::ENABLE_TASKLISTS);
        }
        opts
    }
}

/// Loaded markup: the source text with its header already split off.
#[derive(Debug, Clone)]
pub struct Markup {
    pub format: MarkupFormat,
    pub source: String,
}

impl Markup {
    pub fn new(format: MarkupFormat) -> Self {
        Self {
            format,
            source: String::new(),
        }
    }

    /// HTML fragment for the source.
    pub fn to_html(&self) -> String {
        match self.format {
            MarkupFormat::Markdown => markdown_to_html(&self.source, &MarkdownOptions::default()),
            MarkupFormat::Text => text_to_html(&self.source),
        }
    }
}

impl Convertible for Markup {
    fn target(&self, address: &PathAddress) -> PathAddress {
        address.with_extension("html")
    }

    /// A new HTML document at the `.html` path, carrying the source's date,
    /// metadata and visibility.
    fn convert(&self, source: &Resource) -> Result<Resource> {
        let address = self.target(source.address());
        let input = Input::Memory(self.to_html().into());
        Ok(source.derive(
            address,
            Kind::Document(Document::default()),
            input,
            mime::types::HTML,
        ))
    }
}

pub fn markdown_to_html(source: &str, options: &MarkdownOptions) -> String {
    let parser = Parser::new_ext(source.trim(), options.to_pulldown_options());
    let mut out = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Escaped paragraphs separated by blank lines.
pub fn text_to_html(source: &str) -> String {
    fn flush(paragraph: &mut Vec<&str>, out: &mut String) {
        if !paragraph.is_empty() {
            out.push_str("<p>");
            out.push_str(&escape(&paragraph.join("\n")));
            out.push_str("</p>\n");
            paragraph.clear();
        }
    }

    let mut out = String::new();
    let mut paragraph = Vec::new();
    for line in source.lines() {
        if line.trim().is_empty() {
            flush(&mut paragraph, &mut out);
        } else {
            paragraph.push(line.trim_end());
        }
    }
    flush(&mut paragraph, &mut out);
    out
}
