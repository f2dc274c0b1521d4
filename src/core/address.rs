//! Canonical resource paths and the URIs they are published at.
//!
//! A `PathAddress` is the identity of a resource in the graph:
//! - always starts with `/`
//! - directory indexes collapse to their directory (`/a/index.html` -> `/a/`)
//! - keeps its file extension, so it maps 1:1 to a file in the output tree
//!
//! The public URI is derived from the path plus the site-wide shorten flag,
//! which drops a trailing `.html`.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// File names that stand for their directory.
const INDEX_NAMES: [&str; 2] = ["index.html", "index"];

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathAddress(Arc<str>);

impl PathAddress {
    /// Canonicalize a slash path.
    ///
    /// Adds the leading slash, folds repeated slashes and collapses index
    /// file names onto their directory.
    pub fn new(raw: &str) -> Self {
        let mut path = String::with_capacity(raw.len() + 1);
        path.push('/');
        for segment in raw.split('/').filter(|s| !s.is_empty()) {
            path.push_str(segment);
            path.push('/');
        }
        if !raw.ends_with('/') && path.len() > 1 {
            path.pop();
        }

        if let Some((dir, name)) = path.rsplit_once('/')
            && INDEX_NAMES.contains(&name)
        {
            path.truncate(dir.len() + 1);
        }

        Self(Arc::from(path))
    }

    /// Address of a file below the input directory.
    ///
    /// Returns `None` for paths that escape the directory or are not UTF-8.
    pub fn from_relative(relative: &Path) -> Option<Self> {
        let mut segments = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(name) => segments.push(name.to_str()?),
                Component::CurDir => {}
                _ => return None,
            }
        }
        (!segments.is_empty()).then(|| Self::new(&segments.join("/")))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Public URI for this path.
    ///
    /// Shortening is idempotent: a shortened URI maps to itself.
    pub fn uri(&self, shorten: bool) -> String {
        shorten_uri(&self.0, shorten).to_string()
    }

    /// Same address with the extension replaced (or added).
    ///
    /// `/notes/index.md` becomes `/notes/` for `"html"`.
    pub fn with_extension(&self, ext: &str) -> Self {
        let path = self.as_str();
        let name_start = path.rfind('/').map_or(0, |i| i + 1);
        let stem_end = path[name_start..]
            .rfind('.')
            .filter(|&i| i > 0)
            .map_or(path.len(), |i| name_start + i);
        Self::new(&format!("{}.{ext}", &path[..stem_end]))
    }

    /// Same address with a suffix appended to the final segment.
    pub fn with_suffix(&self, suffix: &str) -> Self {
        let trimmed = self.as_str().trim_end_matches('/');
        let base = if trimmed.is_empty() { "/index" } else { trimmed };
        Self(Arc::from(format!("{base}{suffix}")))
    }

    /// Directory paths end with `/`.
    pub fn is_directory(&self) -> bool {
        self.0.ends_with('/')
    }

    /// Non-empty path segments, root first.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// File this address is saved to under `root`.
    pub fn output_file(&self, root: &Path) -> PathBuf {
        let mut file = root.to_path_buf();
        file.extend(self.segments());
        if self.is_directory() {
            file.push("index.html");
        }
        file
    }
}

/// Drop a trailing `.html` when shortening is on.
pub fn shorten_uri(uri: &str, shorten: bool) -> &str {
    if !shorten {
        return uri;
    }
    match uri.strip_suffix(".html") {
        Some(stem) if !stem.is_empty() && !stem.ends_with('/') && !stem.ends_with(".html") => stem,
        _ => uri,
    }
}

impl fmt::Display for PathAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PathAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
