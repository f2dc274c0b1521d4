//! HTML documents.
//!
//! Load splits a page into head and body, lifting `<title>` and recognized
//! `<meta name content>` fields into a header. Build reassembles a complete
//! HTML5 document around them:
//!
//! ```text
//! <!DOCTYPE html>
//! <html lang>
//!   <head> charset, title, original head, feed link </head>
//!   <body> nav, body with image sizes and link targets </body>
//! </html>
//! ```

use anyhow::Result;
use std::fmt::Write;

use super::{Header, Kind, Lifecycle, Resource, ResourceError};
use crate::core::{LinkKind, Target, has_scheme};
use crate::navigator::NavState;
use crate::pipeline::BuildContext;
use crate::utils::html::{self, StartTag, Token, Tokenizer, escape};

/// `<meta name>` values read as header fields.
const META_KEYS: [&str; 7] = ["title", "summary", "author", "date", "draft", "hidden", "public"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    /// Head elements other than charset, title and lifted meta tags.
    pub head: String,
    pub body: String,
}

impl Document {
    pub fn parse(source: &str) -> (Self, Header) {
        let mut doc = Self::default();
        let mut header = Header::new();
        let mut in_head = false;
        let mut title_start: Option<usize> = None;

        for token in Tokenizer::new(source) {
            let span = match &token {
                Token::Declaration(span) | Token::Comment(span) => span.clone(),
                Token::Start(tag) => tag.span.clone(),
                Token::End { span, .. } => span.clone(),
                Token::Text { text, offset } => *offset..offset + text.len(),
                Token::Unterminated { offset, .. } => *offset..source.len(),
            };

            if let Some(start) = title_start {
                if let Token::End { name, .. } = &token
                    && name == "title"
                {
                    let title = html::unescape(source[start..span.start].trim());
                    if !title.is_empty() {
                        header.insert("title", title);
                    }
                    title_start = None;
                }
                continue;
            }

            match &token {
                Token::Declaration(_) => continue,
                Token::Start(tag) => match tag.name.as_str() {
                    "html" | "body" => continue,
                    "head" => {
                        in_head = true;
                        continue;
                    }
                    "title" if !tag.self_closing => {
                        title_start = Some(span.end);
                        continue;
                    }
                    "meta" if lift_meta(tag, &mut header) => continue,
                    _ => {}
                },
                Token::End { name, .. } => match name.as_str() {
                    "html" | "body" => continue,
                    "head" => {
                        in_head = false;
                        continue;
                    }
                    _ => {}
                },
                Token::Text { text, .. } if in_head && text.trim().is_empty() => continue,
                _ => {}
            }

            let target = if in_head { &mut doc.head } else { &mut doc.body };
            if in_head && !target.is_empty() {
                target.push('\n');
            }
            target.push_str(&source[span]);
        }

        doc.body = doc.body.trim().to_string();
        (doc, header)
    }

    /// HTML used as feed entry content.
    ///
    /// `<div id="main">` or `<main>`, else `<article>`, else the whole body
    /// minus its header, nav, masthead and footer.
    pub fn feed_content(&self) -> String {
        let body = self.body.as_str();
        let Ok(dom) = tl::parse(body, tl::ParserOptions::default()) else {
            return body.trim().to_string();
        };
        let parser = dom.parser();
        let tags: Vec<&tl::HTMLTag<'_>> = dom.nodes().iter().filter_map(tl::Node::as_tag).collect();

        let container = section(&tags, "main").or_else(|| first_named(&tags, "article"));
        if let Some(tag) = container {
            return inner_source(tag, parser, body).trim().to_string();
        }

        let mut cuts: Vec<(usize, usize)> = ["header", "nav", "masthead", "footer"]
            .into_iter()
            .filter_map(|name| section(&tags, name))
            .map(|tag| tag.boundaries(parser))
            .collect();
        cuts.sort_unstable();

        let mut out = String::with_capacity(body.len());
        let mut copied = 0;
        for (start, end) in cuts {
            // nested in an earlier cut
            if start < copied {
                continue;
            }
            out.push_str(&body[copied..start]);
            copied = end + 1;
        }
        out.push_str(&body[copied..]);
        out.trim().to_string()
    }

    /// Text of the first paragraph of the feed content.
    pub fn feed_summary(&self) -> Option<String> {
        let content = self.feed_content();
        let dom = tl::parse(&content, tl::ParserOptions::default()).ok()?;
        let parser = dom.parser();
        let paragraph = dom
            .nodes()
            .iter()
            .filter_map(tl::Node::as_tag)
            .find(|tag| tag.name() == "p")?;

        let text = paragraph.inner_text(parser);
        let text = html::unescape(&text).split_whitespace().collect::<Vec<_>>().join(" ");
        (!text.is_empty()).then_some(text)
    }

    pub fn render(&self, resource: &Resource, ctx: &BuildContext<'_>) -> Result<Vec<u8>> {
        let config = ctx.config;
        let title = resource
            .meta
            .title
            .as_deref()
            .or_else(|| (!config.site.title.is_empty()).then_some(config.site.title.as_str()))
            .unwrap_or(resource.uri());

        let mut out = String::with_capacity(self.head.len() + self.body.len() + 512);
        out.push_str("<!DOCTYPE html>\n");
        let _ = writeln!(out, "<html lang=\"{}\">", escape(&config.site.language));
        out.push_str("<head>\n<meta charset=\"utf-8\">\n");
        let _ = writeln!(out, "<title>{}</title>", escape(title));
        if !self.head.is_empty() {
            out.push_str(&self.head);
            out.push('\n');
        }
        if config.build.make_feed {
            let feed_title = if config.site.title.is_empty() {
                "Feed"
            } else {
                config.site.title.as_str()
            };
            let _ = writeln!(
                out,
                "<link rel=\"alternate\" type=\"application/atom+xml\" href=\"/feed.xml\" title=\"{}\">",
                escape(feed_title)
            );
        }
        out.push_str("</head>\n<body>\n");

        if let Some(nav) = render_nav(resource.uri(), ctx) {
            out.push_str(&nav);
        }
        out.push_str(&self.filter_body(resource, ctx)?);
        out.push_str("\n</body>\n</html>\n");

        Ok(out.into_bytes())
    }

    /// Add image sizes and, when enabled, external link targets.
    fn filter_body(&self, resource: &Resource, ctx: &BuildContext<'_>) -> Result<String> {
        let external_targets = ctx.config.build.external_link_targets;

        html::add_attributes(&self.body, |tag| match tag.name.as_str() {
            "img" if !tag.has_attr("width") && !tag.has_attr("height") => {
                image_size(tag, resource, ctx)
            }
            "a" if external_targets && !tag.has_attr("target") => {
                let external = tag.attr("href").is_some_and(has_scheme);
                Ok(if external {
                    vec![("target".to_string(), "_blank".to_string())]
                } else {
                    Vec::new()
                })
            }
            _ => Ok(Vec::new()),
        })
    }
}

/// `<div id="name">`, else the first `<name>` element.
fn section<'t, 'a>(tags: &[&'t tl::HTMLTag<'a>], name: &str) -> Option<&'t tl::HTMLTag<'a>> {
    tags.iter()
        .find(|tag| {
            tag.name() == "div"
                && tag
                    .attributes()
                    .id()
                    .is_some_and(|id| id.as_utf8_str() == name)
        })
        .or_else(|| tags.iter().find(|tag| tag.name() == name))
        .copied()
}

fn first_named<'t, 'a>(tags: &[&'t tl::HTMLTag<'a>], name: &str) -> Option<&'t tl::HTMLTag<'a>> {
    tags.iter().find(|tag| tag.name() == name).copied()
}

/// Source between an element's start tag and its end tag.
///
/// An element without an end tag has no content.
fn inner_source<'s, 'a>(tag: &tl::HTMLTag<'a>, parser: &tl::Parser<'a>, source: &'s str) -> &'s str {
    let (start, end) = tag.boundaries(parser);
    let outer = &source[start..=end];
    let close = format!("</{}>", tag.name().as_utf8_str());
    let inner_end = outer.strip_suffix(close.as_str()).map_or(outer.len(), str::len);
    let inner_start = outer.find('>').map_or(outer.len(), |i| i + 1);
    outer.get(inner_start..inner_end).unwrap_or_default()
}

/// Lift a recognized `<meta name content>` into the header.
fn lift_meta(tag: &StartTag, header: &mut Header) -> bool {
    if tag.has_attr("charset") {
        return true;
    }
    let (Some(name), Some(content)) = (tag.attr("name"), tag.attr("content")) else {
        return false;
    };
    let key = super::header::normalize_key(name);
    if !META_KEYS.contains(&key.as_str()) {
        return false;
    }
    header.insert(&key, content);
    true
}

/// `width`/`height` for an `<img>` from the referenced image resource.
fn image_size(
    tag: &StartTag,
    resource: &Resource,
    ctx: &BuildContext<'_>,
) -> Result<Vec<(String, String)>> {
    let src = tag.attr("src").unwrap_or_default().trim();
    if src.is_empty() {
        let context = format!("<img> without src in {}", resource.uri());
        return Err(ResourceError::MissingImage(context).into());
    }
    if matches!(LinkKind::parse(src), LinkKind::External(_)) {
        return Ok(Vec::new());
    }

    let Target::Internal(path) = ctx.links.resolve(resource.uri(), src) else {
        return Ok(Vec::new());
    };
    let image = ctx
        .graph
        .find(&path)
        .ok_or_else(|| ResourceError::MissingImage(path.clone()))?;

    let Kind::Image(img) = &image.kind else {
        return Ok(Vec::new());
    };
    if image.state() < Lifecycle::Loaded {
        return Err(ResourceError::NotLoaded(path).into());
    }
    Ok(img
        .dimensions()
        .map(|(w, h)| {
            vec![
                ("width".to_string(), w.to_string()),
                ("height".to_string(), h.to_string()),
            ]
        })
        .unwrap_or_default())
}

/// `<nav>` for the configured menu, if any.
fn render_nav(uri: &str, ctx: &BuildContext<'_>) -> Option<String> {
    if ctx.navigator.is_empty() {
        return None;
    }

    let mut out = String::from("<nav>\n<ul>\n");
    for (item, state) in ctx.navigator.states(uri) {
        let title = escape(&item.title);
        let href = escape(&item.uri);
        let _ = match state {
            NavState::Current => writeln!(out, "<li><em>{title}</em></li>"),
            NavState::Within => writeln!(out, "<li><a href=\"{href}\"><em>{title}</em></a></li>"),
            NavState::Other => writeln!(out, "<li><a href=\"{href}\">{title}</a></li>"),
        };
    }
    out.push_str("</ul>\n</nav>\n");
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NavItem, SiteConfig};
    use crate::core::PathAddress;
    use crate::graph::ResourceGraph;
    use crate::pipeline::test_context_with;
    use crate::resource::{Image, Input};
    use crate::utils::mime::types;
    use tempfile::TempDir;

    fn page(body: &str) -> Resource {
        let (doc, _) = Document::parse(body);
        Resource::new(
            PathAddress::new("/page.html"),
            Kind::Document(doc),
            Input::Memory("".into()),
            types::HTML,
            true,
        )
    }

    fn image(dir: &TempDir, load: bool) -> Resource {
        let file = dir.path().join("z.png");
        ::image::RgbImage::new(3, 2).save(&file).unwrap();
        let mut img = Resource::new(
            PathAddress::new("/z.png"),
            Kind::Image(Image::default()),
            Input::File(file),
            types::PNG,
            true,
        );
        if load {
            img.load().unwrap();
        }
        img
    }

    fn render(page: &Resource, graph: &ResourceGraph, config: &SiteConfig) -> Result<String> {
        let Kind::Document(doc) = &page.kind else {
            unreachable!()
        };
        test_context_with(graph, config, |ctx| doc.render(page, ctx))
            .map(|bytes| String::from_utf8(bytes).unwrap())
    }

    const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>About &amp; more</title>
<meta name="date" content="2024-03-01">
<meta name="viewport" content="width=device-width">
<link rel="stylesheet" href="/style.css">
</head>
<body>
<main><h1>About</h1></main>
</body>
</html>"#;

    #[test]
    fn test_parse_full_page() {
        let (doc, header) = Document::parse(PAGE);
        assert_eq!(header.get("title"), Some("About & more"));
        assert_eq!(header.get("date"), Some("2024-03-01"));
        assert_eq!(
            doc.head,
            "<meta name=\"viewport\" content=\"width=device-width\">\n<link rel=\"stylesheet\" href=\"/style.css\">"
        );
        assert_eq!(doc.body, "<main><h1>About</h1></main>");
    }

    #[test]
    fn test_parse_fragment() {
        let (doc, header) = Document::parse("<p>Just a fragment</p>\n");
        assert!(header.is_empty());
        assert!(doc.head.is_empty());
        assert_eq!(doc.body, "<p>Just a fragment</p>");
    }

    #[test]
    fn test_parse_title_outside_head() {
        let (doc, header) = Document::parse("<title>T</title><p>x</p>");
        assert_eq!(header.get("title"), Some("T"));
        assert_eq!(doc.body, "<p>x</p>");
    }

    #[test]
    fn test_unknown_meta_stays_in_head() {
        let (doc, header) =
            Document::parse("<head><meta name=\"generator\" content=\"x\"></head><p>y</p>");
        assert!(header.get("generator").is_none());
        assert_eq!(doc.head, "<meta name=\"generator\" content=\"x\">");
    }

    #[test]
    fn test_feed_content_prefers_main() {
        let (doc, _) = Document::parse(PAGE);
        assert_eq!(doc.feed_content(), "<h1>About</h1>");

        let (doc, _) = Document::parse(
            r#"<main><p>m</p></main><div id="main"><p>d</p></div>"#,
        );
        assert_eq!(doc.feed_content(), "<p>d</p>");

        let (doc, _) = Document::parse("<article><p>a</p></article><footer>f</footer>");
        assert_eq!(doc.feed_content(), "<p>a</p>");

        let (doc, _) = Document::parse("<p>plain</p>");
        assert_eq!(doc.feed_content(), "<p>plain</p>");
    }

    #[test]
    fn test_feed_content_strips_page_chrome() {
        let (doc, _) = Document::parse(concat!(
            "<header><h1>Site</h1><nav><a href=\"/\">Home</a></nav></header>\n",
            "<div id=\"masthead\">banner</div>\n",
            "<p>Body text</p>\n",
            "<footer>(c)</footer>",
        ));
        assert_eq!(doc.feed_content(), "<p>Body text</p>");

        let (doc, _) = Document::parse("<nav><ul><li>x</li></ul></nav><p>Only</p>");
        assert_eq!(doc.feed_content(), "<p>Only</p>");
    }

    #[test]
    fn test_feed_summary_is_first_paragraph() {
        let (doc, _) = Document::parse(concat!(
            "<nav><p>menu</p></nav>",
            "<h1>T</h1><p>First  <em>para</em>\n &amp; more</p><p>Second</p>",
        ));
        assert_eq!(doc.feed_summary().as_deref(), Some("First para & more"));

        let (doc, _) = Document::parse("<h1>No paragraphs</h1>");
        assert_eq!(doc.feed_summary(), None);
    }

    #[test]
    fn test_render_wraps_document() {
        let mut config = SiteConfig::default();
        config.site.uri = "https://example.com".into();
        config.site.language = "de".into();
        config.build.external_link_targets = true;
        config.navigation = vec![
            NavItem {
                uri: "/".into(),
                title: "Home".into(),
            },
            NavItem {
                uri: "/page".into(),
                title: "Page".into(),
            },
        ];

        let mut page = page(r#"<p><a href="https://other.org/">o</a> <a href="/">h</a></p>"#);
        page.meta.title = Some("P & Q".into());
        let html = render(&page, &ResourceGraph::new(true), &config).unwrap();

        assert!(html.starts_with("<!DOCTYPE html>\n<html lang=\"de\">"));
        assert!(html.contains("<title>P &amp; Q</title>"));
        assert!(html.contains("<li><a href=\"/\"><em>Home</em></a></li>"));
        assert!(html.contains("<li><em>Page</em></li>"));
        assert!(html.contains(r#"<a href="https://other.org/" target="_blank">o</a>"#));
        assert!(html.contains(r#"<a href="/">h</a>"#));
        assert!(html.ends_with("</p>\n</body>\n</html>\n"));
    }

    #[test]
    fn test_render_sizes_images() {
        let dir = TempDir::new().unwrap();
        let mut graph = ResourceGraph::new(true);
        graph.add(image(&dir, true)).unwrap();

        let bare = page(r#"<p><img src="z.png" alt="z"></p>"#);
        let html = render(&bare, &graph, &SiteConfig::default()).unwrap();
        assert!(html.contains(r#"<img src="z.png" alt="z" width="3" height="2">"#));

        let sized = page(r#"<img src="z.png" alt="z" width="9">"#);
        let html = render(&sized, &graph, &SiteConfig::default()).unwrap();
        assert!(html.contains(r#"<img src="z.png" alt="z" width="9">"#));
    }

    #[test]
    fn test_render_missing_image_fails() {
        let page = page(r#"<img src="/nope.png" alt="">"#);
        let err = render(&page, &ResourceGraph::new(true), &SiteConfig::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ResourceError>(),
            Some(ResourceError::MissingImage(path)) if path == "/nope.png"
        ));
    }

    #[test]
    fn test_render_unloaded_image_fails() {
        let dir = TempDir::new().unwrap();
        let mut graph = ResourceGraph::new(true);
        graph.add(image(&dir, false)).unwrap();

        let page = page(r#"<img src="/z.png" alt="">"#);
        let err = render(&page, &graph, &SiteConfig::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ResourceError>(),
            Some(ResourceError::NotLoaded(_))
        ));
    }
}
