//! Link extraction from crawled files.
//!
//! Extractors return raw link values. Resolving them against the page and
//! deciding what to follow is `LinkResolver`'s job.

use regex::Regex;
use std::sync::LazyLock;

use crate::utils::html::unescape;

/// Attributes whose values the crawler follows.
const LINK_ATTRIBUTES: [&str; 2] = ["href", "src"];

static RE_CSS_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"url\(\s*(?:"([^"]*)"|'([^']*)'|([^)"'\s]+))\s*\)"#).unwrap()
});

/// Every `href` and `src` value, in document order.
pub fn from_html(html: &str) -> Vec<String> {
    let Ok(dom) = tl::parse(html, tl::ParserOptions::default()) else {
        return Vec::new();
    };

    let mut links = Vec::new();
    for node in dom.nodes() {
        let Some(tag) = node.as_tag() else {
            continue;
        };
        for name in LINK_ATTRIBUTES {
            if let Some(Some(value)) = tag.attributes().get(name) {
                let value = value.as_utf8_str();
                links.push(unescape(value.trim()).into_owned());
            }
        }
    }
    links
}

/// `url(...)` references, quoted or bare. Inline `data:` URIs are skipped.
pub fn from_css(css: &str) -> Vec<String> {
    RE_CSS_URL
        .captures_iter(css)
        .filter_map(|c| c.get(1).or_else(|| c.get(2)).or_else(|| c.get(3)))
        .map(|m| m.as_str().trim())
        .filter(|url| !url.is_empty() && !url.starts_with("data:"))
        .map(str::to_string)
        .collect()
}

/// `Sitemap:` lines of a robots file.
pub fn from_robots(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case("sitemap")
                .then(|| value.trim().to_string())
        })
        .filter(|v| !v.is_empty())
        .collect()
}
