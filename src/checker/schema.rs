//! Structural schemas for the XML files a site publishes.
//!
//! Picked by the root element:
//!
//! | Root       | Rules                                   |
//! |------------|-----------------------------------------|
//! | `feed`     | Atom (RFC 4287) required elements       |
//! | `urlset`   | sitemap protocol 0.9                    |
//!
//! Any other root only has to be well-formed.

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

use super::xml::{Element, Violation};
use crate::generator::sitemap::SITEMAP_NS;

pub const ATOM_NS: &str = "http://www.w3.org/2005/Atom";

/// Most URLs one sitemap file may list.
const MAX_SITEMAP_URLS: usize = 50_000;
const MAX_LOC_LEN: usize = 2048;
const CHANGEFREQ: [&str; 7] = ["always", "hourly", "daily", "weekly", "monthly", "yearly", "never"];

static RE_RFC3339: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}[Tt]\d{2}:\d{2}:\d{2}(\.\d+)?([Zz]|[+-]\d{2}:\d{2})$").unwrap()
});

static RE_W3C_DATETIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}(-\d{2}(-\d{2}(T\d{2}:\d{2}(:\d{2}(\.\d+)?)?(Z|[+-]\d{2}:\d{2}))?)?)?$").unwrap()
});

pub fn validate(root: &Element) -> Vec<Violation> {
    let mut out = Vec::new();
    match root.name.as_str() {
        "feed" => atom(root, &mut out),
        "urlset" => sitemap(root, &mut out),
        _ => {}
    }
    out
}

/// Links a crawler should follow from the document.
pub fn links(root: &Element) -> Vec<String> {
    match root.name.as_str() {
        "feed" => root
            .descendants()
            .into_iter()
            .filter(|e| e.is(ATOM_NS, "link"))
            .filter_map(|e| e.attr("href"))
            .map(str::to_string)
            .collect(),
        "urlset" => root
            .children_named(SITEMAP_NS, "url")
            .flat_map(|url| url.children_named(SITEMAP_NS, "loc"))
            .map(|loc| loc.text.trim().to_string())
            .collect(),
        _ => Vec::new(),
    }
}

// ============================================================================
// Atom
// ============================================================================

fn atom(feed: &Element, out: &mut Vec<Violation>) {
    if feed.namespace.as_deref() != Some(ATOM_NS) {
        out.push(Violation::new(feed.offset, "<feed> is not in the Atom namespace"));
        return;
    }

    exactly_one(feed, ATOM_NS, &["id", "title", "updated"], out);
    let feed_has_author = feed.children_named(ATOM_NS, "author").next().is_some();

    for child in &feed.children {
        if child.namespace.as_deref() != Some(ATOM_NS) {
            continue;
        }
        match child.name.as_str() {
            "entry" => entry(child, feed_has_author, out),
            "author" | "contributor" => person(child, out),
            "link" => link(child, out),
            "updated" => date(child, out),
            _ => {}
        }
    }
}

fn entry(entry: &Element, feed_has_author: bool, out: &mut Vec<Violation>) {
    exactly_one(entry, ATOM_NS, &["id", "title", "updated"], out);
    if !feed_has_author && entry.children_named(ATOM_NS, "author").next().is_none() {
        out.push(Violation::new(
            entry.offset,
            "<entry> lacks <author> and <feed> has none",
        ));
    }

    for child in &entry.children {
        if child.namespace.as_deref() != Some(ATOM_NS) {
            continue;
        }
        match child.name.as_str() {
            "author" | "contributor" => person(child, out),
            "link" => link(child, out),
            "updated" | "published" => date(child, out),
            _ => {}
        }
    }
}

fn person(person: &Element, out: &mut Vec<Violation>) {
    if person.children_named(ATOM_NS, "name").next().is_none() {
        out.push(Violation::new(
            person.offset,
            format!("<{}> lacks <name>", person.name),
        ));
    }
}

fn link(link: &Element, out: &mut Vec<Violation>) {
    if link.attr("href").is_none() {
        out.push(Violation::new(link.offset, "<link> lacks \"href\" attribute"));
    }
}

fn date(element: &Element, out: &mut Vec<Violation>) {
    let value = element.text.trim();
    if !RE_RFC3339.is_match(value) {
        out.push(Violation::new(
            element.offset,
            format!("<{}> value \"{value}\" is not an RFC 3339 date", element.name),
        ));
    }
}

fn exactly_one(parent: &Element, namespace: &str, names: &[&str], out: &mut Vec<Violation>) {
    for name in names {
        let count = parent.children_named(namespace, name).count();
        if count != 1 {
            out.push(Violation::new(
                parent.offset,
                format!("<{}> has {count} <{name}> elements, expected one", parent.name),
            ));
        }
    }
}

// ============================================================================
// Sitemap
// ============================================================================

fn sitemap(urlset: &Element, out: &mut Vec<Violation>) {
    if urlset.namespace.as_deref() != Some(SITEMAP_NS) {
        out.push(Violation::new(urlset.offset, "<urlset> is not in the sitemap namespace"));
        return;
    }

    let mut count = 0;
    for child in &urlset.children {
        if child.is(SITEMAP_NS, "url") {
            count += 1;
            url_entry(child, out);
        } else {
            out.push(Violation::new(
                child.offset,
                format!("unexpected <{}> in <urlset>", child.name),
            ));
        }
    }
    if count > MAX_SITEMAP_URLS {
        out.push(Violation::new(
            urlset.offset,
            format!("{count} URLs exceed the limit of {MAX_SITEMAP_URLS}"),
        ));
    }
}

fn url_entry(url: &Element, out: &mut Vec<Violation>) {
    let mut seen: Vec<&str> = Vec::new();
    for child in &url.children {
        // Extensions (images, news, ...) live in their own namespaces.
        if child.namespace.as_deref() != Some(SITEMAP_NS) {
            continue;
        }
        let name = child.name.as_str();
        if seen.contains(&name) {
            out.push(Violation::new(child.offset, format!("repeated <{name}> in <url>")));
            continue;
        }
        seen.push(name);

        let value = child.text.trim();
        let problem = match name {
            "loc" => loc_problem(value),
            "lastmod" => (!RE_W3C_DATETIME.is_match(value))
                .then(|| format!("<lastmod> value \"{value}\" is not a W3C datetime")),
            "changefreq" => (!CHANGEFREQ.contains(&value))
                .then(|| format!("<changefreq> value \"{value}\" is not one of {}", CHANGEFREQ.join(", "))),
            "priority" => value
                .parse::<f64>()
                .ok()
                .filter(|p| (0.0..=1.0).contains(p))
                .is_none()
                .then(|| format!("<priority> value \"{value}\" is not between 0.0 and 1.0")),
            _ => Some(format!("unexpected <{name}> in <url>")),
        };
        if let Some(message) = problem {
            out.push(Violation::new(child.offset, message));
        }
    }

    if !seen.contains(&"loc") {
        out.push(Violation::new(url.offset, "<url> lacks <loc>"));
    }
}

fn loc_problem(value: &str) -> Option<String> {
    if value.len() > MAX_LOC_LEN {
        return Some(format!("<loc> is longer than {MAX_LOC_LEN} characters"));
    }
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => None,
        _ => Some(format!("<loc> value \"{value}\" is not an absolute http(s) URL")),
    }
}
