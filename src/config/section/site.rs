//! `[site]` section configuration.
//!
//! ```toml
//! [site]
//! uri = "https://example.com"
//! title = "My Site"
//! author = "Jane Doe"
//! email = "jane@example.com"
//! language = "en"
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSectionConfig {
    /// Absolute base URI the site is published at.
    pub uri: String,
    pub title: String,
    pub author: String,
    pub email: String,
    /// `lang` attribute of every rendered document.
    pub language: String,
}

impl Default for SiteSectionConfig {
    fn default() -> Self {
        Self {
            uri: "http://localhost".to_string(),
            title: String::new(),
            author: String::new(),
            email: String::new(),
            language: "en".to_string(),
        }
    }
}

/// One `[[navigation]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavItem {
    pub uri: String,
    pub title: String,
}
