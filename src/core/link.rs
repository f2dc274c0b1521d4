//! Link classification and resolution against the site URI.

use percent_encoding::percent_decode_str;
use url::Url;

/// Syntactic classification of links
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind<'a> {
    /// Link with a URI scheme (https://, mailto:, data:, ...).
    External(&'a str),
    /// Pure fragment/anchor link (#section). Value is anchor without `#`.
    Fragment(&'a str),
    /// Site-root-relative path (/about, /posts/hello).
    SiteRoot(&'a str),
    /// Path relative to the referring document (./image.png, ../other).
    Relative(&'a str),
}

impl<'a> LinkKind<'a> {
    /// Parse a link string into its syntactic kind.
    #[inline]
    pub fn parse(link: &'a str) -> Self {
        if has_scheme(link) {
            Self::External(link)
        } else if let Some(anchor) = link.strip_prefix('#') {
            Self::Fragment(anchor)
        } else if link.starts_with('/') {
            Self::SiteRoot(link)
        } else {
            Self::Relative(link)
        }
    }

    /// Check if link is HTTP/HTTPS.
    #[inline]
    pub fn is_http(link: &str) -> bool {
        let lower = link.get(..8).unwrap_or(link).to_ascii_lowercase();
        lower.starts_with("http://") || lower.starts_with("https://")
    }
}

/// `scheme:` prefix per RFC 3986.
pub fn has_scheme(link: &str) -> bool {
    link.find(':').is_some_and(|pos| {
        pos > 0
            && link[..pos].starts_with(|c: char| c.is_ascii_alphabetic())
            && link[..pos]
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

/// Where a link found on a page points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Decoded path on this site, without query or fragment.
    Internal(String),
    /// http(s) URL on another host.
    External(Url),
    /// Fragments, `mailto:`, `data:` and other links nothing can follow.
    Skip,
}

/// Resolves links the way a browser would, relative to a page on the site.
#[derive(Debug, Clone)]
pub struct LinkResolver {
    site: Url,
}

impl LinkResolver {
    pub fn new(site: Url) -> Self {
        Self { site }
    }

    pub fn site(&self) -> &Url {
        &self.site
    }

    /// Resolve `link` found on the page published at `page_uri`.
    pub fn resolve(&self, page_uri: &str, link: &str) -> Target {
        let link = link.trim();
        match LinkKind::parse(link) {
            LinkKind::Fragment(_) => return Target::Skip,
            LinkKind::External(l) if !LinkKind::is_http(l) => return Target::Skip,
            _ if link.is_empty() => return Target::Skip,
            _ => {}
        }

        let Ok(base) = self.site.join(page_uri) else {
            return Target::Skip;
        };
        let Ok(url) = base.join(link) else {
            return Target::Skip;
        };

        if self.is_local(&url) {
            Target::Internal(decode_path(url.path()))
        } else {
            Target::External(url)
        }
    }

    /// Same scheme, host and port as the site.
    pub fn is_local(&self, url: &Url) -> bool {
        url.scheme() == self.site.scheme()
            && url.host_str() == self.site.host_str()
            && url.port_or_known_default() == self.site.port_or_known_default()
    }

    /// Absolute URL of a site path.
    pub fn absolute(&self, path: &str) -> String {
        self.site
            .join(path)
            .map_or_else(|_| path.to_string(), |u| u.to_string())
    }
}

/// Percent-decode a URL path, keeping it verbatim when it is not UTF-8.
pub fn decode_path(path: &str) -> String {
    percent_decode_str(path)
        .decode_utf8()
        .map_or_else(|_| path.to_string(), |s| s.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> LinkResolver {
        LinkResolver::new(Url::parse("https://example.com/").unwrap())
    }

    #[test]
    fn test_parse_kinds() {
        assert_eq!(LinkKind::parse("https://x.org"), LinkKind::External("https://x.org"));
        assert_eq!(LinkKind::parse("mailto:a@b.c"), LinkKind::External("mailto:a@b.c"));
        assert_eq!(LinkKind::parse("#top"), LinkKind::Fragment("top"));
        assert_eq!(LinkKind::parse("/about"), LinkKind::SiteRoot("/about"));
        assert_eq!(LinkKind::parse("img/a.png"), LinkKind::Relative("img/a.png"));
        assert_eq!(LinkKind::parse("a:b/c"), LinkKind::External("a:b/c"));
        assert_eq!(LinkKind::parse("1a:b"), LinkKind::Relative("1a:b"));
    }

    #[test]
    fn test_is_http() {
        assert!(LinkKind::is_http("http://a"));
        assert!(LinkKind::is_http("HTTPS://a"));
        assert!(!LinkKind::is_http("ftp://a"));
        assert!(!LinkKind::is_http("http"));
    }

    #[test]
    fn test_resolve_internal() {
        let r = resolver();
        assert_eq!(r.resolve("/posts/a", "b"), Target::Internal("/posts/b".into()));
        assert_eq!(r.resolve("/posts/", "../img/x.png"), Target::Internal("/img/x.png".into()));
        assert_eq!(r.resolve("/", "/a?x=1#frag"), Target::Internal("/a".into()));
        assert_eq!(r.resolve("/", "/caf%C3%A9"), Target::Internal("/café".into()));
        assert_eq!(
            r.resolve("/", "https://example.com/about"),
            Target::Internal("/about".into())
        );
    }

    #[test]
    fn test_resolve_external_and_skip() {
        let r = resolver();
        assert!(matches!(r.resolve("/", "https://other.org/"), Target::External(_)));
        assert!(matches!(r.resolve("/", "http://example.com/"), Target::External(_)));
        assert_eq!(r.resolve("/", "#top"), Target::Skip);
        assert_eq!(r.resolve("/", "mailto:me@example.com"), Target::Skip);
        assert_eq!(r.resolve("/", "data:image/png;base64,AA"), Target::Skip);
        assert_eq!(r.resolve("/", ""), Target::Skip);
    }

    #[test]
    fn test_absolute() {
        assert_eq!(resolver().absolute("/feed.xml"), "https://example.com/feed.xml");
    }
}
