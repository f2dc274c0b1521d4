//! Sitemap generation.
//!
//! Lists every public document for search engine indexing.
//!
//! # Sitemap Format
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9" ...>
//!   <url>
//!     <loc>https://example.com/</loc>
//!     <lastmod>2025-01-01T00:00:00Z</lastmod>
//!     <changefreq>weekly</changefreq>
//!   </url>
//! </urlset>
//! ```

use anyhow::Result;

use super::{escape_xml, public_documents};
use crate::pipeline::BuildContext;

pub const SITEMAP_PATH: &str = "/sitemap.xml";
pub const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";
const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
const SCHEMA_LOCATION: &str =
    "http://www.sitemaps.org/schemas/sitemap/0.9 http://www.sitemaps.org/schemas/sitemap/0.9/sitemap.xsd";

struct UrlEntry {
    loc: String,
    lastmod: String,
}

pub fn render(ctx: &BuildContext<'_>) -> Result<Vec<u8>> {
    let mut urls: Vec<UrlEntry> = public_documents(ctx.graph)
        .into_iter()
        .map(|doc| UrlEntry {
            loc: ctx.links.absolute(doc.uri()),
            lastmod: doc.date.to_rfc3339(),
        })
        .collect();
    urls.sort_by(|a, b| a.loc.cmp(&b.loc));

    Ok(into_xml(&urls).into_bytes())
}

fn into_xml(urls: &[UrlEntry]) -> String {
    let mut xml = String::with_capacity(256 + urls.len() * 128);

    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<urlset xmlns=\"");
    xml.push_str(SITEMAP_NS);
    xml.push_str("\" xmlns:xsi=\"");
    xml.push_str(XSI_NS);
    xml.push_str("\" xsi:schemaLocation=\"");
    xml.push_str(SCHEMA_LOCATION);
    xml.push_str("\">\n");

    for entry in urls {
        xml.push_str("  <url>\n    <loc>");
        xml.push_str(&escape_xml(&entry.loc));
        xml.push_str("</loc>\n    <lastmod>");
        xml.push_str(&entry.lastmod);
        xml.push_str("</lastmod>\n    <changefreq>weekly</changefreq>\n  </url>\n");
    }

    xml.push_str("</urlset>\n");
    xml
}
