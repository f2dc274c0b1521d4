//! Derived resources.
//!
//! Computed from the loaded graph rather than read from input files:
//!
//! - **Error page**: `/error.html`, served for missing paths
//! - **Redirects**: `<from>.redirect` files for `[redirects]` entries
//! - **Feed**: Atom feed of public documents (`/feed.xml`)
//! - **Sitemap**: search engine index (`/sitemap.xml`)
//! - **Robots**: crawler rules (`/robots.txt`)

pub mod feed;
pub mod redirect;
pub mod robots;
pub mod sitemap;

pub use redirect::Redirect;

use std::borrow::Cow;

use crate::core::PathAddress;
use crate::graph::ResourceGraph;
use crate::resource::{Input, Kind, Resource, Visibility};
use crate::utils::{date::DateTimeUtc, mime::types};

pub const ERROR_PATH: &str = "/error.html";

/// Public, non-draft documents, newest first.
pub fn public_documents(graph: &ResourceGraph) -> Vec<&Resource> {
    let mut docs: Vec<&Resource> = graph
        .iter()
        .map(|(_, r)| r)
        .filter(|r| matches!(r.kind, Kind::Document(_)))
        .filter(|r| r.visibility.public && !r.visibility.draft)
        .collect();
    docs.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.uri().cmp(b.uri())));
    docs
}

/// Date of the newest public document.
pub fn newest_public_date(graph: &ResourceGraph) -> DateTimeUtc {
    public_documents(graph)
        .first()
        .map(|r| r.date)
        .unwrap_or_default()
}

/// `/error.html`: an unlisted document.
pub fn error_page(shorten: bool) -> Resource {
    let html = "<title>Error</title>\n<h1>Error</h1>\n<p>The requested page could not be found.</p>";
    let mut page = Resource::document(PathAddress::new(ERROR_PATH), Input::Memory(html.into()), shorten);
    page.visibility = Visibility::UNLISTED;
    page.date = DateTimeUtc::now();
    page
}

/// Derived resource with synthesized content and no input.
fn synthesized(path: &str, kind: Kind, content_type: &'static str, shorten: bool) -> Resource {
    Resource::new(
        PathAddress::new(path),
        kind,
        Input::Memory("".into()),
        content_type,
        shorten,
    )
}

pub(crate) fn feed_resource(graph: &ResourceGraph) -> Resource {
    let mut feed = synthesized(feed::FEED_PATH, Kind::Feed, types::ATOM, graph.shorten());
    feed.date = newest_public_date(graph);
    feed
}

pub(crate) fn sitemap_resource(graph: &ResourceGraph) -> Resource {
    let mut sitemap = synthesized(sitemap::SITEMAP_PATH, Kind::Sitemap, types::XML, graph.shorten());
    sitemap.date = newest_public_date(graph);
    sitemap
}

pub(crate) fn robots_resource(graph: &ResourceGraph) -> Resource {
    let mut robots = synthesized(robots::ROBOTS_PATH, Kind::Robots, types::PLAIN, graph.shorten());
    robots.date = newest_public_date(graph);
    robots
}

/// Escape special XML characters.
pub fn escape_xml(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(s);
    }

    Cow::Owned(
        s.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&apos;"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(path: &str, date: DateTimeUtc, public: bool) -> Resource {
        let mut r = Resource::document(PathAddress::new(path), Input::Memory("".into()), true);
        r.date = date;
        r.visibility.public = public;
        r
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("hello"), "hello");
        assert_eq!(escape_xml("a & <b>"), "a &amp; &lt;b&gt;");
        assert_eq!(escape_xml(r#"it's "q""#), "it&apos;s &quot;q&quot;");
    }

    #[test]
    fn test_public_documents_newest_first() {
        let mut graph = ResourceGraph::new(true);
        graph.add(doc("/old.html", DateTimeUtc::from_ymd(2020, 1, 1), true)).unwrap();
        graph.add(doc("/new.html", DateTimeUtc::from_ymd(2024, 1, 1), true)).unwrap();
        graph.add(doc("/private.html", DateTimeUtc::from_ymd(2025, 1, 1), false)).unwrap();

        let uris: Vec<_> = public_documents(&graph).iter().map(|r| r.uri()).collect();
        assert_eq!(uris, ["/new", "/old"]);
        assert_eq!(newest_public_date(&graph), DateTimeUtc::from_ymd(2024, 1, 1));
    }

    #[test]
    fn test_error_page_is_unlisted() {
        let page = error_page(true);
        assert_eq!(page.address().as_str(), ERROR_PATH);
        assert!(!page.visibility.public);
        assert!(!page.visibility.advertise);
    }
}
