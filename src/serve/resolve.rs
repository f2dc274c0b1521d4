//! Request path to output file resolution.
//!
//! The development server and the checker both go through `FileServer`,
//! so a crawl sees the output exactly as a browser would.
//!
//! Order for `/a/b`:
//!
//! 1. dot-prefixed segment: forbidden
//! 2. sibling `b.redirect`: redirect to its target
//! 3. `a/b`, `a/b.html`, `a/b.htm`
//! 4. directory `a/b/`: redirect to the slash form
//!
//! Slash paths (`/a/`) serve `a/index.html`.

use percent_encoding::percent_decode_str;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::generator::{Redirect, redirect::EXTENSION};
use crate::utils::mime;

/// Suffixes tried after the bare path.
const SUFFIXES: [&str; 2] = [".html", ".htm"];

/// Status of the redirect from a directory to its slash form.
const DIRECTORY_REDIRECT: u16 = 303;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("failed to read redirect {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed redirect {}: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    File {
        path: PathBuf,
        content_type: &'static str,
    },
    Redirect {
        location: String,
        status: u16,
        /// The `.redirect` file answering the request, if any.
        file: Option<PathBuf>,
    },
    NotFound,
    Forbidden,
}

impl Resolution {
    pub fn status(&self) -> u16 {
        match self {
            Self::File { .. } => 200,
            Self::Redirect { status, .. } => *status,
            Self::NotFound => 404,
            Self::Forbidden => 403,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileServer {
    root: PathBuf,
}

impl FileServer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a raw request target: percent-encoded, possibly with a query.
    pub fn resolve_request(&self, target: &str) -> Result<Resolution, ResolveError> {
        let path = target.split(['?', '#']).next().unwrap_or_default();
        let decoded = percent_decode_str(path).decode_utf8_lossy();
        self.resolve(&decoded)
    }

    /// Resolve a decoded site path.
    pub fn resolve(&self, path: &str) -> Result<Resolution, ResolveError> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if segments.iter().any(|s| s.starts_with('.') || s.contains('\\')) {
            return Ok(Resolution::Forbidden);
        }

        let mut base = self.root.clone();
        base.extend(&segments);

        let redirect_file = match segments.last() {
            Some(name) => base.with_file_name(format!("{name}.{EXTENSION}")),
            None => self.root.join(format!("index.{EXTENSION}")),
        };
        if redirect_file.is_file() {
            return read_redirect(&redirect_file);
        }

        if segments.is_empty() || path.ends_with('/') {
            let index = base.join("index.html");
            return Ok(if index.is_file() {
                file(index)
            } else {
                Resolution::NotFound
            });
        }

        if base.is_file() {
            return Ok(file(base));
        }
        for suffix in SUFFIXES {
            let candidate = with_suffix(&base, suffix);
            if candidate.is_file() {
                return Ok(file(candidate));
            }
        }

        if base.is_dir() {
            return Ok(Resolution::Redirect {
                location: format!("{path}/"),
                status: DIRECTORY_REDIRECT,
                file: None,
            });
        }
        Ok(Resolution::NotFound)
    }
}

fn file(path: PathBuf) -> Resolution {
    let content_type = mime::from_path(&path);
    Resolution::File { path, content_type }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut s = path.as_os_str().to_owned();
    s.push(suffix);
    PathBuf::from(s)
}

fn read_redirect(path: &Path) -> Result<Resolution, ResolveError> {
    let text = fs::read_to_string(path).map_err(|source| ResolveError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let redirect = Redirect::parse(&text).map_err(|e| ResolveError::Malformed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(Resolution::Redirect {
        location: redirect.target,
        status: redirect.status,
        file: Some(path.to_path_buf()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::mime::types;
    use tempfile::TempDir;

    fn site() -> (TempDir, FileServer) {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("blog")).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::write(root.join("index.html"), "home").unwrap();
        fs::write(root.join("about.html"), "about").unwrap();
        fs::write(root.join("old.htm"), "old").unwrap();
        fs::write(root.join("style.css"), "a{}").unwrap();
        fs::write(root.join("blog/index.html"), "blog").unwrap();
        fs::write(root.join("moved.redirect"), "/about 301\n").unwrap();
        fs::write(root.join("broken.redirect"), "nonsense").unwrap();
        let server = FileServer::new(root);
        (dir, server)
    }

    fn resolved_file(resolution: Resolution) -> PathBuf {
        match resolution {
            Resolution::File { path, .. } => path,
            other => panic!("expected a file, got {other:?}"),
        }
    }

    #[test]
    fn test_root_and_suffixes() {
        let (dir, server) = site();
        let root = dir.path();
        assert_eq!(resolved_file(server.resolve("/").unwrap()), root.join("index.html"));
        assert_eq!(resolved_file(server.resolve("/about").unwrap()), root.join("about.html"));
        assert_eq!(resolved_file(server.resolve("/about.html").unwrap()), root.join("about.html"));
        assert_eq!(resolved_file(server.resolve("/old").unwrap()), root.join("old.htm"));
        assert_eq!(resolved_file(server.resolve("/blog/").unwrap()), root.join("blog/index.html"));
    }

    #[test]
    fn test_content_type_from_extension() {
        let (_dir, server) = site();
        let Resolution::File { content_type, .. } = server.resolve("/style.css").unwrap() else {
            panic!("expected a file");
        };
        assert_eq!(content_type, types::CSS);
    }

    #[test]
    fn test_directory_without_slash_redirects() {
        let (_dir, server) = site();
        assert_eq!(
            server.resolve("/blog").unwrap(),
            Resolution::Redirect {
                location: "/blog/".into(),
                status: 303,
                file: None
            }
        );
    }

    #[test]
    fn test_redirect_file() {
        let (dir, server) = site();
        let resolution = server.resolve("/moved").unwrap();
        assert_eq!(resolution.status(), 301);
        assert_eq!(
            resolution,
            Resolution::Redirect {
                location: "/about".into(),
                status: 301,
                file: Some(dir.path().join("moved.redirect")),
            }
        );
        assert!(matches!(server.resolve("/moved/").unwrap(), Resolution::Redirect { .. }));
        assert!(matches!(server.resolve("/broken"), Err(ResolveError::Malformed { .. })));
    }

    #[test]
    fn test_forbidden_and_missing() {
        let (_dir, server) = site();
        assert_eq!(server.resolve("/.git/config").unwrap(), Resolution::Forbidden);
        assert_eq!(server.resolve("/../etc/passwd").unwrap(), Resolution::Forbidden);
        assert_eq!(server.resolve("/nope").unwrap(), Resolution::NotFound);
        assert_eq!(server.resolve("/nope/").unwrap(), Resolution::NotFound);
    }

    #[test]
    fn test_resolve_request_decodes() {
        let (_dir, server) = site();
        assert!(matches!(
            server.resolve_request("/ab%6Fut?x=1").unwrap(),
            Resolution::File { .. }
        ));
    }
}
