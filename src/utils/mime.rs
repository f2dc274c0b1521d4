//! Content-type mapping by file extension.
//!
//! The same table classifies input files during discovery (by essence, e.g.
//! `text/markdown`) and labels files served or crawled from the output
//! directory (full header value, e.g. `text/html; charset=utf-8`).

use std::path::Path;

/// Content-type essences (no parameters).
pub mod types {
    pub const HTML: &str = "text/html";
    pub const MARKDOWN: &str = "text/markdown";
    pub const PLAIN: &str = "text/plain";
    pub const CSS: &str = "text/css";
    pub const JAVASCRIPT: &str = "text/javascript";
    pub const JSON: &str = "application/json";
    pub const XML: &str = "application/xml";
    pub const ATOM: &str = "application/atom+xml";
    pub const PDF: &str = "application/pdf";
    pub const OCTET_STREAM: &str = "application/octet-stream";

    pub const PNG: &str = "image/png";
    pub const JPEG: &str = "image/jpeg";
    pub const GIF: &str = "image/gif";
    pub const WEBP: &str = "image/webp";
    pub const SVG: &str = "image/svg+xml";
    pub const ICO: &str = "image/x-icon";

    pub const MP3: &str = "audio/mpeg";
    pub const OGG_AUDIO: &str = "audio/ogg";
    pub const MP4: &str = "video/mp4";
    pub const WEBM: &str = "video/webm";

    pub const WOFF: &str = "font/woff";
    pub const WOFF2: &str = "font/woff2";
    pub const TTF: &str = "font/ttf";
    pub const OTF: &str = "font/otf";
}

/// Content-type essence for a path, by extension.
pub fn from_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    from_extension(ext.as_deref())
}

/// Content-type essence for an extension (without the dot).
pub fn from_extension(ext: Option<&str>) -> &'static str {
    match ext {
        Some("html" | "htm") => types::HTML,
        Some("md" | "markdown" | "mdown") => types::MARKDOWN,
        Some("txt" | "text") => types::PLAIN,
        Some("css") => types::CSS,
        Some("js" | "mjs") => types::JAVASCRIPT,
        Some("json") => types::JSON,
        Some("xml") => types::XML,
        Some("atom") => types::ATOM,
        Some("pdf") => types::PDF,

        Some("png") => types::PNG,
        Some("jpg" | "jpeg") => types::JPEG,
        Some("gif") => types::GIF,
        Some("webp") => types::WEBP,
        Some("svg") => types::SVG,
        Some("ico") => types::ICO,

        Some("mp3") => types::MP3,
        Some("ogg" | "oga") => types::OGG_AUDIO,
        Some("mp4" | "m4v") => types::MP4,
        Some("webm") => types::WEBM,

        Some("woff") => types::WOFF,
        Some("woff2") => types::WOFF2,
        Some("ttf") => types::TTF,
        Some("otf") => types::OTF,

        _ => types::OCTET_STREAM,
    }
}

/// Header value for serving: text types carry a UTF-8 charset.
pub fn header_value(essence: &'static str) -> String {
    if is_text(essence) {
        format!("{essence}; charset=utf-8")
    } else {
        essence.to_string()
    }
}

/// Strip parameters from a content-type header value.
pub fn essence(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
}

pub fn is_text(mime: &str) -> bool {
    mime.starts_with("text/")
}

pub fn is_xml(mime: &str) -> bool {
    mime == types::XML || (mime.ends_with("+xml") && !is_image(mime))
}

pub fn is_image(mime: &str) -> bool {
    mime.starts_with("image/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_from_path() {
        assert_eq!(from_path(&PathBuf::from("index.html")), types::HTML);
        assert_eq!(from_path(&PathBuf::from("post.md")), types::MARKDOWN);
        assert_eq!(from_path(&PathBuf::from("style.css")), types::CSS);
        assert_eq!(from_path(&PathBuf::from("photo.JPG")), types::JPEG);
        assert_eq!(from_path(&PathBuf::from("feed.xml")), types::XML);
        assert_eq!(from_path(&PathBuf::from("README")), types::OCTET_STREAM);
        assert_eq!(from_path(&PathBuf::from("unknown.xyz")), types::OCTET_STREAM);
    }

    #[test]
    fn test_header_value() {
        assert_eq!(header_value(types::HTML), "text/html; charset=utf-8");
        assert_eq!(header_value(types::PNG), "image/png");
    }

    #[test]
    fn test_essence() {
        assert_eq!(essence("text/html; charset=utf-8"), "text/html");
        assert_eq!(essence("image/png"), "image/png");
    }

    #[test]
    fn test_is_xml() {
        assert!(is_xml(types::XML));
        assert!(is_xml(types::ATOM));
        assert!(!is_xml(types::SVG));
        assert!(!is_xml(types::HTML));
    }
}
