//! Resources: the units of site output.
//!
//! # Lifecycle
//!
//! ```text
//! Discovered → Loaded → (Converted)? → Built → Saved
//! ```
//!
//! Transitions only move forward. A converted resource is replaced by the
//! resource its conversion produced, which starts again at `Discovered`.

mod document;
mod error;
pub mod header;
mod image;
mod kind;
mod markup;

pub use document::Document;
pub use error::ResourceError;
pub use header::{Header, split_header};
pub use image::Image;
pub use kind::{Convertible, Kind, Registry};
pub use markup::{Markup, MarkupFormat};

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::PathAddress;
use crate::generator;
use crate::graph::NodeId;
use crate::pipeline::BuildContext;
use crate::utils::date::DateTimeUtc;

/// Where a resource's content comes from.
#[derive(Debug, Clone)]
pub enum Input {
    File(PathBuf),
    /// Synthesized content.
    Memory(Arc<str>),
}

impl Input {
    pub fn file(&self) -> Option<&Path> {
        match self {
            Self::File(path) => Some(path),
            Self::Memory(_) => None,
        }
    }

    pub fn read_text(&self) -> Result<String> {
        match self {
            Self::File(path) => fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display())),
            Self::Memory(text) => Ok(text.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Lifecycle {
    Discovered,
    Loaded,
    Converted,
    Built,
    Saved,
}

/// Independent visibility flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visibility {
    /// Listed in feed and sitemap.
    pub public: bool,
    /// Placed in the navigation tree.
    pub advertise: bool,
    /// Dropped before build.
    pub draft: bool,
}

impl Visibility {
    pub const PAGE: Self = Self {
        public: true,
        advertise: true,
        draft: false,
    };

    pub const ASSET: Self = Self {
        public: false,
        advertise: false,
        draft: false,
    };

    pub const UNLISTED: Self = Self::ASSET;
}

/// Descriptive fields from headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Meta {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub author: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Resource {
    address: PathAddress,
    uri: String,
    shorten: bool,
    content_type: &'static str,
    node: Option<NodeId>,
    state: Lifecycle,

    pub kind: Kind,
    pub input: Input,
    /// Rendered bytes; `None` copies the input.
    pub output: Option<Vec<u8>>,
    pub date: DateTimeUtc,
    pub visibility: Visibility,
    pub meta: Meta,
}

impl Resource {
    pub fn new(
        address: PathAddress,
        kind: Kind,
        input: Input,
        content_type: &'static str,
        shorten: bool,
    ) -> Self {
        let visibility = if kind.is_page() {
            Visibility::PAGE
        } else {
            Visibility::ASSET
        };
        Self {
            uri: address.uri(shorten),
            address,
            shorten,
            content_type,
            node: None,
            state: Lifecycle::Discovered,
            kind,
            input,
            output: None,
            date: DateTimeUtc::default(),
            visibility,
            meta: Meta::default(),
        }
    }

    /// An HTML document.
    pub fn document(address: PathAddress, input: Input, shorten: bool) -> Self {
        Self::new(
            address,
            Kind::Document(Document::default()),
            input,
            crate::utils::mime::types::HTML,
            shorten,
        )
    }

    /// A fresh resource carrying this one's date, metadata and visibility.
    pub fn derive(
        &self,
        address: PathAddress,
        kind: Kind,
        input: Input,
        content_type: &'static str,
    ) -> Self {
        let mut derived = Self::new(address, kind, input, content_type, self.shorten);
        derived.date = self.date;
        derived.meta = self.meta.clone();
        derived.visibility = self.visibility;
        derived
    }

    #[inline]
    pub fn address(&self) -> &PathAddress {
        &self.address
    }

    #[inline]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn content_type(&self) -> &'static str {
        self.content_type
    }

    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    pub(crate) fn set_node(&mut self, node: Option<NodeId>) {
        self.node = node;
    }

    pub fn state(&self) -> Lifecycle {
        self.state
    }

    /// Move to `to`. Staying put is allowed; going back is not.
    pub fn advance(&mut self, to: Lifecycle) -> Result<(), ResourceError> {
        if to < self.state {
            return Err(ResourceError::Backward {
                path: self.address.clone(),
                from: self.state,
                to,
            });
        }
        self.state = to;
        Ok(())
    }

    pub fn title(&self) -> &str {
        self.meta.title.as_deref().unwrap_or(&self.uri)
    }

    // ========================================================================
    // load
    // ========================================================================

    /// Read the input and fill in kind-specific state and header fields.
    ///
    /// File-backed resources take their date from the file's mtime first;
    /// a `date` header overrides it.
    pub fn load(&mut self) -> Result<()> {
        if let Input::File(path) = &self.input {
            let modified = fs::metadata(path)
                .and_then(|m| m.modified())
                .with_context(|| format!("failed to stat {}", path.display()))?;
            self.date = DateTimeUtc::from_system_time(modified);
        }

        let header = match &mut self.kind {
            Kind::Document(doc) => {
                let text = self.input.read_text()?;
                let (parsed, header) = Document::parse(&text);
                *doc = parsed;
                header
            }
            Kind::Markup(markup) => {
                let text = self.input.read_text()?;
                let (header, body) = split_header(&text);
                markup.source = body.to_string();
                header
            }
            Kind::Image(image) => {
                let path = self.input.file().with_context(|| {
                    format!("{}: image input must be a file", self.address)
                })?;
                image.load(path)?;
                Header::new()
            }
            Kind::File
            | Kind::Redirect(_)
            | Kind::Feed
            | Kind::Sitemap
            | Kind::Robots => Header::new(),
        };

        self.apply_header(&header)?;
        self.advance(Lifecycle::Loaded)?;
        Ok(())
    }

    /// Map header fields onto the resource.
    pub fn apply_header(&mut self, header: &Header) -> Result<(), ResourceError> {
        for (key, value) in header.iter() {
            let invalid = || ResourceError::InvalidHeaderValue {
                key: key.to_string(),
                value: value.to_string(),
            };
            match key {
                "title" => self.meta.title = Some(value.to_string()),
                "summary" => self.meta.summary = Some(value.to_string()),
                "author" => self.meta.author = Some(value.to_string()),
                "date" => self.date = DateTimeUtc::parse(value).ok_or_else(invalid)?,
                "draft" => {
                    self.visibility.draft = header::parse_bool(value).ok_or_else(invalid)?;
                }
                "hidden" => {
                    self.visibility.advertise = !header::parse_bool(value).ok_or_else(invalid)?;
                }
                "public" => {
                    self.visibility.public = header::parse_bool(value).ok_or_else(invalid)?;
                }
                _ => return Err(ResourceError::UnknownHeaderKey(key.to_string())),
            }
        }
        if self.visibility.draft {
            self.visibility.advertise = false;
        }
        Ok(())
    }

    // ========================================================================
    // build
    // ========================================================================

    /// Final output bytes, or `None` when the input is copied as is.
    pub fn render(&self, ctx: &BuildContext<'_>) -> Result<Option<Vec<u8>>> {
        match &self.kind {
            Kind::Document(doc) => doc.render(self, ctx).map(Some),
            Kind::Markup(_) => Err(ResourceError::Unconverted(self.address.clone()).into()),
            Kind::Image(_) | Kind::File => Ok(None),
            Kind::Redirect(redirect) => Ok(Some(redirect.render().into_bytes())),
            Kind::Feed => generator::feed::render(ctx).map(Some),
            Kind::Sitemap => generator::sitemap::render(ctx).map(Some),
            Kind::Robots => Ok(Some(generator::robots::render(ctx).into_bytes())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::mime::types;
    use tempfile::TempDir;

    fn markdown(text: &str) -> Resource {
        Resource::new(
            PathAddress::new("/post.md"),
            Kind::Markup(Markup::new(MarkupFormat::Markdown)),
            Input::Memory(text.into()),
            types::MARKDOWN,
            true,
        )
    }

    #[test]
    fn test_lifecycle_only_moves_forward() {
        let mut resource = markdown("x");
        resource.advance(Lifecycle::Loaded).unwrap();
        resource.advance(Lifecycle::Loaded).unwrap();
        resource.advance(Lifecycle::Built).unwrap();
        let err = resource.advance(Lifecycle::Loaded).unwrap_err();
        assert!(matches!(err, ResourceError::Backward { .. }));
        assert_eq!(resource.state(), Lifecycle::Built);
    }

    #[test]
    fn test_load_applies_header() {
        let mut resource = markdown(
            "title: Post\nsummary: Short\nauthor: Ann\ndate: 2024-05-06\nhidden: true\n\nBody",
        );
        resource.load().unwrap();
        assert_eq!(resource.state(), Lifecycle::Loaded);
        assert_eq!(resource.meta.title.as_deref(), Some("Post"));
        assert_eq!(resource.meta.summary.as_deref(), Some("Short"));
        assert_eq!(resource.meta.author.as_deref(), Some("Ann"));
        assert_eq!(resource.date, DateTimeUtc::from_ymd(2024, 5, 6));
        assert!(!resource.visibility.advertise);
        assert!(resource.visibility.public);
        let Kind::Markup(markup) = &resource.kind else {
            panic!("expected markup");
        };
        assert_eq!(markup.source, "Body");
    }

    #[test]
    fn test_unknown_header_key_fails() {
        let mut resource = markdown("title: x\ncolour: red\n\nbody");
        let err = resource.load().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ResourceError>(),
            Some(ResourceError::UnknownHeaderKey(k)) if k == "colour"
        ));
    }

    #[test]
    fn test_invalid_header_values_fail() {
        assert!(markdown("date: someday\n\nx").load().is_err());
        assert!(markdown("draft: maybe\n\nx").load().is_err());
    }

    #[test]
    fn test_draft_is_not_advertised() {
        let mut resource = markdown("draft: true\n\nx");
        resource.load().unwrap();
        assert!(resource.visibility.draft);
        assert!(!resource.visibility.advertise);
    }

    #[test]
    fn test_file_date_from_mtime_then_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.html");
        std::fs::write(&path, "<title>A</title><p>a</p>").unwrap();
        let mtime = DateTimeUtc::new(2020, 1, 2, 3, 4, 5);
        let file = std::fs::File::options().write(true).open(&path).unwrap();
        file.set_modified(mtime.to_system_time().unwrap()).unwrap();
        drop(file);

        let mut resource = Resource::document(PathAddress::new("/a.html"), Input::File(path.clone()), true);
        resource.load().unwrap();
        assert_eq!(resource.date, mtime);
        assert_eq!(resource.meta.title.as_deref(), Some("A"));

        std::fs::write(&path, "<meta name=\"date\" content=\"2022-02-02\"><p>a</p>").unwrap();
        let mut resource = Resource::document(PathAddress::new("/a.html"), Input::File(path), true);
        resource.load().unwrap();
        assert_eq!(resource.date, DateTimeUtc::from_ymd(2022, 2, 2));
    }

    #[test]
    fn test_default_visibility_by_kind() {
        assert_eq!(markdown("x").visibility, Visibility::PAGE);
        let css = Resource::new(
            PathAddress::new("/a.css"),
            Kind::File,
            Input::Memory("".into()),
            types::CSS,
            true,
        );
        assert_eq!(css.visibility, Visibility::ASSET);
    }

    #[test]
    fn test_uri_follows_shortening() {
        let doc = Resource::document(PathAddress::new("/a/b.html"), Input::Memory("".into()), true);
        assert_eq!(doc.uri(), "/a/b");
        let doc = Resource::document(PathAddress::new("/a/b.html"), Input::Memory("".into()), false);
        assert_eq!(doc.uri(), "/a/b.html");
    }
}
