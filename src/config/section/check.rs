//! `[check]` section configuration.
//!
//! ```toml
//! [check]
//! after_build = true     # Crawl the output after every build
//! external = false       # Also request off-site links
//! timeout = 3            # Seconds per external request
//! ignore = [             # HTML messages that never fail a check
//!     '<img> lacks "alt" attribute',
//! ]
//! ```

use serde::{Deserialize, Serialize};

/// Benign validator messages tolerated by default.
pub const DEFAULT_IGNORE: &[&str] = &[
    r#"<table> lacks "summary" attribute"#,
    r#"<img> lacks "alt" attribute"#,
    r#"<form> proprietary attribute "novalidate""#,
    r#"<input> attribute "type" has invalid value "email""#,
    r#"<input> attribute "tabindex" has invalid value "-1""#,
    r#"<input> proprietary attribute "border""#,
    "trimming empty <p>",
    r#"<iframe> proprietary attribute "allowfullscreen""#,
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    pub after_build: bool,
    pub external: bool,
    /// Seconds.
    pub timeout: u64,
    pub ignore: Vec<String>,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            after_build: true,
            external: false,
            timeout: 3,
            ignore: DEFAULT_IGNORE.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

impl CheckConfig {
    pub fn is_ignored(&self, message: &str) -> bool {
        self.ignore.iter().any(|i| i == message)
    }
}
