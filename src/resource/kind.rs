//! Resource variants and the content-type registration table.
//!
//! Discovery maps each input file's content type to a constructor through a
//! `Registry` built once at startup and handed to the pipeline:
//!
//! | Content type                         | Kind                |
//! |--------------------------------------|---------------------|
//! | `text/html`                          | Document            |
//! | `text/markdown`, `text/plain`        | Markup (converted)  |
//! | `image/png`, `jpeg`, `gif`, `webp`   | Image               |
//! | styles, scripts, fonts, media, ...   | File (copied as is) |

use anyhow::Result;
use std::path::Path;

use super::{Document, Image, Input, Markup, MarkupFormat, Resource, ResourceError};
use crate::core::PathAddress;
use crate::generator::Redirect;
use crate::utils::mime::{self, types};

#[derive(Debug, Clone)]
pub enum Kind {
    Document(Document),
    Markup(Markup),
    Image(Image),
    /// Copied verbatim.
    File,
    Redirect(Redirect),
    Feed,
    Sitemap,
    Robots,
}

impl Kind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Document(_) => "document",
            Self::Markup(_) => "markup",
            Self::Image(_) => "image",
            Self::File => "file",
            Self::Redirect(_) => "redirect",
            Self::Feed => "feed",
            Self::Sitemap => "sitemap",
            Self::Robots => "robots",
        }
    }

    /// The conversion capability, for kinds that have one.
    pub fn as_convertible(&self) -> Option<&dyn Convertible> {
        match self {
            Self::Markup(markup) => Some(markup),
            _ => None,
        }
    }

    /// Visible to readers as pages (feed, sitemap, navigation).
    pub fn is_page(&self) -> bool {
        matches!(self, Self::Document(_) | Self::Markup(_))
    }
}

/// Resources that turn into a different resource before they are built.
pub trait Convertible {
    /// Canonical path of the converted resource.
    fn target(&self, address: &PathAddress) -> PathAddress;

    /// The resource that replaces `source` in the graph.
    fn convert(&self, source: &Resource) -> Result<Resource>;
}

pub type Constructor = fn() -> Kind;

pub struct RegistryEntry {
    pub content_type: &'static str,
    pub label: &'static str,
    construct: Constructor,
}

/// Content type -> constructor table.
pub struct Registry {
    entries: Vec<RegistryEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Later registrations for the same content type win.
    pub fn register(&mut self, content_type: &'static str, label: &'static str, construct: Constructor) {
        self.entries.retain(|e| e.content_type != content_type);
        self.entries.push(RegistryEntry {
            content_type,
            label,
            construct,
        });
    }

    pub fn standard() -> Self {
        let mut registry = Self::new();

        registry.register(types::HTML, "document", || Kind::Document(Document::default()));
        registry.register(types::MARKDOWN, "markdown", || {
            Kind::Markup(Markup::new(MarkupFormat::Markdown))
        });
        registry.register(types::PLAIN, "text", || {
            Kind::Markup(Markup::new(MarkupFormat::Text))
        });

        for image in [types::PNG, types::JPEG, types::GIF, types::WEBP] {
            registry.register(image, "image", || Kind::Image(Image::default()));
        }

        let files = [
            types::CSS,
            types::JAVASCRIPT,
            types::JSON,
            types::XML,
            types::ATOM,
            types::PDF,
            types::SVG,
            types::ICO,
            types::MP3,
            types::OGG_AUDIO,
            types::MP4,
            types::WEBM,
            types::WOFF,
            types::WOFF2,
            types::TTF,
            types::OTF,
        ];
        for file in files {
            registry.register(file, "file", || Kind::File);
        }

        registry
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    pub fn lookup(&self, content_type: &str) -> Option<&RegistryEntry> {
        self.entries.iter().find(|e| e.content_type == content_type)
    }

    /// Resource for an input file, classified by its extension.
    pub fn instantiate(
        &self,
        address: PathAddress,
        file: &Path,
        shorten: bool,
    ) -> Result<Resource, ResourceError> {
        let content_type = mime::from_path(file);
        let entry = self
            .lookup(content_type)
            .ok_or_else(|| ResourceError::UnknownContentType {
                path: file.to_path_buf(),
                content_type,
            })?;
        Ok(Resource::new(
            address,
            (entry.construct)(),
            Input::File(file.to_path_buf()),
            content_type,
            shorten,
        ))
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::standard()
    }
}
