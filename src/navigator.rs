//! Site menu state.
//!
//! The menu is a fixed list of `[[navigation]]` entries. For the page being
//! rendered, each entry is:
//!
//! - `Current` when its URI is the page's URI,
//! - `Within` for the deepest entry whose path contains the page,
//! - `Other` otherwise.

use crate::config::NavItem;
use crate::core::{LinkResolver, Target};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavState {
    Current,
    Within,
    Other,
}

#[derive(Debug, Clone, Default)]
pub struct Navigator {
    items: Vec<NavItem>,
    /// Site path of each item; `None` for entries off the site.
    paths: Vec<Option<String>>,
}

impl Navigator {
    pub fn new(items: Vec<NavItem>, links: &LinkResolver) -> Self {
        let paths = items
            .iter()
            .map(|item| match links.resolve("/", &item.uri) {
                Target::Internal(path) => Some(path),
                Target::External(_) | Target::Skip => None,
            })
            .collect();
        Self { items, paths }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[NavItem] {
        &self.items
    }

    /// State of every item relative to the page at `uri`, in menu order.
    pub fn states(&self, uri: &str) -> Vec<(&NavItem, NavState)> {
        let page: Vec<&str> = segments(uri).collect();

        let current = self
            .paths
            .iter()
            .position(|p| p.as_deref() == Some(uri));

        let mut within: Option<(usize, usize)> = None;
        for (i, path) in self.paths.iter().enumerate() {
            let Some(path) = path else { continue };
            if Some(i) == current || path == uri {
                continue;
            }
            let depth = segments(path).count();
            let is_prefix = depth < page.len() && segments(path).zip(&page).all(|(a, b)| a == *b);
            if is_prefix && within.is_none_or(|(_, best)| depth > best) {
                within = Some((i, depth));
            }
        }

        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let state = if Some(i) == current {
                    NavState::Current
                } else if within.is_some_and(|(w, _)| w == i) {
                    NavState::Within
                } else {
                    NavState::Other
                };
                (item, state)
            })
            .collect()
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn navigator(uris: &[&str]) -> Navigator {
        let links = LinkResolver::new(Url::parse("https://example.com/").unwrap());
        let items = uris
            .iter()
            .map(|uri| NavItem {
                uri: (*uri).to_string(),
                title: (*uri).to_string(),
            })
            .collect();
        Navigator::new(items, &links)
    }

    fn states(nav: &Navigator, uri: &str) -> Vec<NavState> {
        nav.states(uri).into_iter().map(|(_, s)| s).collect()
    }

    use NavState::{Current, Other, Within};

    #[test]
    fn test_current_exact_match() {
        let nav = navigator(&["/", "/blog/", "/about"]);
        assert_eq!(states(&nav, "/about"), [Within, Other, Current]);
        assert_eq!(states(&nav, "/"), [Current, Other, Other]);
    }

    #[test]
    fn test_within_prefers_deepest() {
        let nav = navigator(&["/", "/blog/", "/blog/2024/"]);
        assert_eq!(states(&nav, "/blog/2024/post"), [Other, Other, Within]);
        assert_eq!(states(&nav, "/blog/post"), [Other, Within, Other]);
        assert_eq!(states(&nav, "/contact"), [Within, Other, Other]);
    }

    #[test]
    fn test_within_is_segment_based() {
        let nav = navigator(&["/blog"]);
        assert_eq!(states(&nav, "/blogging"), [Other]);
        assert_eq!(states(&nav, "/blog/x"), [Within]);
    }

    #[test]
    fn test_current_excludes_within() {
        let nav = navigator(&["/", "/blog/"]);
        assert_eq!(states(&nav, "/blog/"), [Within, Current]);
    }

    #[test]
    fn test_exclusivity() {
        let nav = navigator(&["/", "/a/", "/a/", "/a/b/", "https://other.org/a/"]);
        for uri in ["/", "/a/", "/a/b/", "/a/b/c", "/z", "/a/x"] {
            let all = states(&nav, uri);
            assert!(all.iter().filter(|s| **s == Current).count() <= 1, "{uri}");
            assert!(all.iter().filter(|s| **s == Within).count() <= 1, "{uri}");
        }
        assert_eq!(states(&nav, "/a/"), [Within, Current, Other, Other, Other]);
    }

    #[test]
    fn test_absolute_site_entries() {
        let nav = navigator(&["https://example.com/docs/"]);
        assert_eq!(states(&nav, "/docs/"), [Current]);
        assert_eq!(states(&nav, "/docs/intro"), [Within]);
    }
}
