//! `[build]` section configuration.
//!
//! ```toml
//! [build]
//! input = "content"            # Source directory
//! output = "public_html"       # Output directory
//! shorten_uris = true          # Publish /a.html as /a
//! make_error = true            # /error.html
//! make_feed = true             # /feed.xml
//! make_sitemap = true          # /sitemap.xml
//! make_robots = true           # /robots.txt
//! allow_robots = true          # false writes `Disallow: /`
//! redirect_status = 303        # Status for [redirects] entries
//! external_link_targets = false
//! clean = true                 # Empty output (except .git) before saving
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSectionConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub shorten_uris: bool,
    pub make_error: bool,
    pub make_feed: bool,
    pub make_sitemap: bool,
    pub make_robots: bool,
    pub allow_robots: bool,
    pub redirect_status: u16,
    /// Add `target="_blank"` to links that leave the site.
    pub external_link_targets: bool,
    pub clean: bool,
}

impl Default for BuildSectionConfig {
    fn default() -> Self {
        Self {
            input: "content".into(),
            output: "public_html".into(),
            shorten_uris: true,
            make_error: true,
            make_feed: true,
            make_sitemap: true,
            make_robots: true,
            allow_robots: true,
            redirect_status: 303,
            external_link_targets: false,
            clean: true,
        }
    }
}
