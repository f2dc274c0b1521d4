//! Atom 1.0 feed of public documents.
//!
//! Entries are the public, non-draft documents, newest first. Each entry
//! carries the document's main content as HTML and a summary: the
//! `summary` header, else the first paragraph.

use anyhow::{Result, anyhow};
use atom_syndication::{
    ContentBuilder, Entry, EntryBuilder, FeedBuilder, FixedDateTime, GeneratorBuilder, Link,
    LinkBuilder, Person, PersonBuilder, Text,
};

use super::{newest_public_date, public_documents};
use crate::pipeline::BuildContext;
use crate::resource::{Kind, Resource};
use crate::utils::date::DateTimeUtc;

pub const FEED_PATH: &str = "/feed.xml";

pub fn render(ctx: &BuildContext<'_>) -> Result<Vec<u8>> {
    let site = &ctx.config.site;
    let site_uri = ctx.links.absolute("/");

    let entries = public_documents(ctx.graph)
        .into_iter()
        .map(|doc| entry(doc, ctx))
        .collect::<Result<Vec<_>>>()?;

    let feed = FeedBuilder::default()
        .id(site_uri.clone())
        .title(Text::plain(site.title.clone()))
        .updated(fixed(newest_public_date(ctx.graph))?)
        .authors(vec![site_author(ctx)])
        .links(vec![
            link(site_uri, "alternate", None),
            link(ctx.links.absolute(FEED_PATH), "self", Some("application/atom+xml")),
        ])
        .generator(Some(GeneratorBuilder::default().value("quern").build()))
        .lang(Some(site.language.clone()))
        .entries(entries)
        .build();

    Ok(feed.to_string().into_bytes())
}

fn entry(doc: &Resource, ctx: &BuildContext<'_>) -> Result<Entry> {
    let uri = ctx.links.absolute(doc.uri());
    let date = fixed(doc.date)?;

    let (content, summary) = match &doc.kind {
        Kind::Document(document) => (
            Some(
                ContentBuilder::default()
                    .value(Some(document.feed_content()))
                    .content_type(Some("html".to_string()))
                    .build(),
            ),
            doc.meta.summary.clone().or_else(|| document.feed_summary()),
        ),
        _ => (None, doc.meta.summary.clone()),
    };

    let authors = doc
        .meta
        .author
        .as_ref()
        .map(|name| vec![PersonBuilder::default().name(name.clone()).build()])
        .unwrap_or_default();

    Ok(EntryBuilder::default()
        .title(Text::plain(doc.title().to_string()))
        .id(uri.clone())
        .links(vec![link(uri, "alternate", None)])
        .updated(date)
        .published(Some(date))
        .summary(summary.map(Text::plain))
        .content(content)
        .authors(authors)
        .build())
}

/// Feed-level author: the configured author, else the site title, else the host.
fn site_author(ctx: &BuildContext<'_>) -> Person {
    let site = &ctx.config.site;
    let name = [site.author.as_str(), site.title.as_str()]
        .into_iter()
        .find(|s| !s.is_empty())
        .or_else(|| ctx.links.site().host_str())
        .unwrap_or_default()
        .to_string();
    let email = (!site.email.is_empty()).then(|| site.email.clone());
    PersonBuilder::default().name(name).email(email).build()
}

fn link(href: String, rel: &str, mime_type: Option<&str>) -> Link {
    LinkBuilder::default()
        .href(href)
        .rel(rel.to_string())
        .mime_type(mime_type.map(str::to_string))
        .build()
}

fn fixed(date: DateTimeUtc) -> Result<FixedDateTime> {
    FixedDateTime::parse_from_rfc3339(&date.to_rfc3339())
        .map_err(|e| anyhow!("invalid feed date {date}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::core::PathAddress;
    use crate::graph::ResourceGraph;
    use crate::pipeline::test_context_with;
    use crate::resource::{Document, Input};

    fn doc(path: &str, title: &str, date: DateTimeUtc) -> Resource {
        let mut r = Resource::document(PathAddress::new(path), Input::Memory("".into()), true);
        let (document, _) = Document::parse("<main><p>Hello &amp; bye</p></main>");
        r.kind = Kind::Document(document);
        r.meta.title = Some(title.to_string());
        r.date = date;
        r
    }

    fn render_feed(graph: &ResourceGraph, config: &SiteConfig) -> String {
        let xml = test_context_with(graph, config, |ctx| render(ctx)).unwrap();
        String::from_utf8(xml).unwrap()
    }

    #[test]
    fn test_feed_entries_newest_first() {
        let mut config = SiteConfig::default();
        config.site.uri = "https://example.com".into();
        config.site.title = "Blog".into();

        let mut graph = ResourceGraph::new(true);
        graph.add(doc("/old.html", "Old", DateTimeUtc::from_ymd(2020, 1, 1))).unwrap();
        graph.add(doc("/new.html", "New", DateTimeUtc::from_ymd(2024, 3, 1))).unwrap();
        let mut draft = doc("/draft.html", "Draft", DateTimeUtc::from_ymd(2025, 1, 1));
        draft.visibility.draft = true;
        graph.add(draft).unwrap();

        let xml = render_feed(&graph, &config);
        let new = xml.find("https://example.com/new").unwrap();
        let old = xml.find("https://example.com/old").unwrap();
        assert!(new < old);
        assert!(!xml.contains("Draft"));
        assert!(xml.contains("<name>Blog</name>"));
        assert!(xml.contains("2024-03-01T00:00:00"));
        assert!(xml.contains(r#"rel="self""#));
        assert!(xml.contains("https://example.com/feed.xml"));
    }

    #[test]
    fn test_feed_entry_content_and_author() {
        let config = SiteConfig::default();
        let mut graph = ResourceGraph::new(true);
        let mut post = doc("/post.html", "Post", DateTimeUtc::from_ymd(2023, 5, 5));
        post.meta.author = Some("Ann".into());
        post.meta.summary = Some("Short".into());
        graph.add(post).unwrap();

        let feed = render_feed(&graph, &config);
        let parsed: atom_syndication::Feed = feed.parse().unwrap();
        let entry = &parsed.entries()[0];
        assert_eq!(entry.title().as_str(), "Post");
        assert_eq!(entry.authors()[0].name(), "Ann");
        assert_eq!(entry.summary().map(|s| s.as_str()), Some("Short"));
        let content = entry.content().unwrap();
        assert_eq!(content.content_type(), Some("html"));
        assert!(content.value().unwrap().contains("<p>Hello &amp; bye</p>"));
        assert_eq!(parsed.authors()[0].name(), "localhost");
    }

    #[test]
    fn test_feed_summary_falls_back_to_first_paragraph() {
        let mut graph = ResourceGraph::new(true);
        let mut post = Resource::document(PathAddress::new("/p.html"), Input::Memory("".into()), true);
        let (document, _) = Document::parse(concat!(
            "<nav><a href=\"/\">Home</a></nav>",
            "<p>Opening line.</p><p>Later.</p>",
        ));
        post.kind = Kind::Document(document);
        post.date = DateTimeUtc::from_ymd(2023, 1, 2);
        graph.add(post).unwrap();

        let feed: atom_syndication::Feed = render_feed(&graph, &SiteConfig::default()).parse().unwrap();
        let entry = &feed.entries()[0];
        assert_eq!(entry.summary().map(|s| s.as_str()), Some("Opening line."));
        let content = entry.content().and_then(|c| c.value()).unwrap();
        assert!(!content.contains("<nav>"));
        assert!(content.starts_with("<p>Opening line.</p>"));
    }
}
