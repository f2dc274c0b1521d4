//! Redirect resources.
//!
//! Each `[redirects]` entry becomes `<from>.redirect`, a one-line file the
//! file server reads back:
//!
//! ```text
//! /new/location 303
//! ```

use anyhow::{Result, bail};

use crate::core::PathAddress;
use crate::resource::{Input, Kind, Resource};
use crate::utils::{date::DateTimeUtc, mime::types};

pub const EXTENSION: &str = "redirect";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub target: String,
    pub status: u16,
}

impl Redirect {
    pub fn render(&self) -> String {
        format!("{} {}\n", self.target, self.status)
    }

    /// Parse a `.redirect` file body.
    pub fn parse(text: &str) -> Result<Self> {
        let mut parts = text.split_whitespace();
        let (Some(target), Some(status), None) = (parts.next(), parts.next(), parts.next()) else {
            bail!("expected `<target> <status>`, got {text:?}");
        };
        let status: u16 = status.parse()?;
        if !(300..400).contains(&status) {
            bail!("redirect status {status} is not 3xx");
        }
        Ok(Self {
            target: target.to_string(),
            status,
        })
    }
}

/// Resource for one configured redirect.
pub fn resource(from: &str, target: &str, status: u16, shorten: bool) -> Resource {
    let address = PathAddress::new(from).with_suffix(&format!(".{EXTENSION}"));
    let mut resource = Resource::new(
        address,
        Kind::Redirect(Redirect {
            target: target.to_string(),
            status,
        }),
        Input::Memory("".into()),
        types::PLAIN,
        shorten,
    );
    resource.date = DateTimeUtc::now();
    resource
}

/// The request path a `.redirect` file answers.
pub fn source_path(redirect_path: &str) -> Option<&str> {
    let source = redirect_path.strip_suffix(EXTENSION)?.strip_suffix('.')?;
    Some(
        source
            .strip_suffix("index")
            .filter(|s| s.ends_with('/'))
            .unwrap_or(source),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_and_parse() {
        let redirect = Redirect {
            target: "/new".into(),
            status: 301,
        };
        assert_eq!(redirect.render(), "/new 301\n");
        assert_eq!(Redirect::parse(&redirect.render()).unwrap(), redirect);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(Redirect::parse("").is_err());
        assert!(Redirect::parse("/x").is_err());
        assert!(Redirect::parse("/x 200").is_err());
        assert!(Redirect::parse("/x 30x").is_err());
        assert!(Redirect::parse("/x 301 extra").is_err());
    }

    #[test]
    fn test_resource_path() {
        let r = resource("/old/", "/new", 303, true);
        assert_eq!(r.address().as_str(), "/old.redirect");
        assert!(!r.visibility.advertise);
        assert_eq!(source_path(r.address().as_str()), Some("/old"));
        assert_eq!(source_path("/index.redirect"), Some("/"));
        assert_eq!(source_path("/reindex.redirect"), Some("/reindex"));
        assert_eq!(source_path("/a.html"), None);
    }
}
