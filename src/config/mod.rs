//! Site configuration management for `quern.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── build      # [build]
//! │   ├── check      # [check]
//! │   ├── serve      # [serve]
//! │   └── site       # [site], [[navigation]]
//! ├── error          # ConfigError
//! └── mod.rs         # SiteConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section            | Purpose                                        |
//! |--------------------|------------------------------------------------|
//! | `[site]`           | Base URI, title, author, language              |
//! | `[build]`          | Paths, URI shortening, derived resources       |
//! | `[check]`          | Crawl after build, external links, ignore list |
//! | `[serve]`          | Development server                             |
//! | `[[navigation]]`   | Menu entries (uri, title)                      |
//! | `[redirects]`      | `"/from" = "/to"` redirects                    |

mod error;
pub mod section;

pub use error::ConfigError;
pub use section::{BuildSectionConfig, CheckConfig, NavItem, ServeConfig, SiteSectionConfig};

use crate::{
    cli::{Cli, Commands},
    log,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};
use url::Url;

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing quern.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub site: SiteSectionConfig,

    #[serde(default)]
    pub build: BuildSectionConfig,

    #[serde(default)]
    pub check: CheckConfig,

    #[serde(default)]
    pub serve: ServeConfig,

    /// Menu entries, in display order.
    #[serde(default)]
    pub navigation: Vec<NavItem>,

    /// Source path -> target URI.
    #[serde(default)]
    pub redirects: BTreeMap<String, String>,
}

impl SiteConfig {
    /// Load configuration for a CLI invocation.
    ///
    /// A missing config file is not an error: defaults apply, rooted at the
    /// current directory.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;
        let config_path = cwd.join(expand_tilde(&cli.config));

        let mut config = if config_path.exists() {
            Self::from_path(&config_path)?
        } else {
            crate::debug!("config"; "{} not found, using defaults", config_path.display());
            Self::default()
        };

        config.root = config_path
            .parent()
            .map_or_else(|| cwd.clone(), Path::to_path_buf);
        config.config_path = config_path;
        config.apply_cli(cli);
        config.normalize_paths();
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map_or_else(|| path.to_string_lossy(), |n| n.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring: {}", display_path, fields.join(", "));
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    fn apply_cli(&mut self, cli: &Cli) {
        crate::logger::set_verbose(cli.verbose);

        Self::update_option(&mut self.build.input, cli.input.as_ref());
        Self::update_option(&mut self.build.output, cli.output.as_ref());
        Self::update_option(&mut self.site.uri, cli.site_uri.as_ref());

        match &cli.command {
            Commands::Build { check, external } => {
                Self::update_option(&mut self.check.after_build, check.as_ref());
                Self::update_option(&mut self.check.external, external.as_ref());
            }
            Commands::Check { external, .. } => {
                Self::update_option(&mut self.check.external, external.as_ref());
            }
            Commands::Clean
            | Commands::Tree
            | Commands::List
            | Commands::Types
            | Commands::Serve => {}
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Resolve input/output relative to the root, with `~` expansion.
    fn normalize_paths(&mut self) {
        self.build.input = self.root.join(expand_tilde(&self.build.input));
        self.build.output = self.root.join(expand_tilde(&self.build.output));
    }

    // ========================================================================
    // validation
    // ========================================================================

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.site_url()?;

        let status = self.build.redirect_status;
        if !(300..400).contains(&status) {
            return Err(ConfigError::Validation(format!(
                "build.redirect_status must be a 3xx status, got {status}"
            )));
        }

        if self.check.timeout == 0 {
            return Err(ConfigError::Validation(
                "check.timeout must be at least 1 second".to_string(),
            ));
        }

        for item in &self.navigation {
            if item.uri.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "navigation entry `{}` has an empty uri",
                    item.title
                )));
            }
        }

        for (from, to) in &self.redirects {
            if !from.starts_with('/') || to.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "redirect `{from}` -> `{to}` needs an absolute source path and a target"
                )));
            }
        }

        Ok(())
    }

    /// Parsed `site.uri`.
    pub fn site_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.site.uri).map_err(|e| {
            ConfigError::Validation(format!("site.uri `{}` is not a URL: {e}", self.site.uri))
        })?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(ConfigError::Validation(format!(
                "site.uri `{}` must be an absolute http(s) URL",
                self.site.uri
            )));
        }
        Ok(url)
    }

    pub fn input_dir(&self) -> &Path {
        &self.build.input
    }

    pub fn output_dir(&self) -> &Path {
        &self.build.output
    }
}

fn expand_tilde(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(s) => PathBuf::from(shellexpand::tilde(s).into_owned()),
        None => path.to_path_buf(),
    }
}

/// Parse a config snippet, failing on unknown fields.
#[cfg(test)]
pub fn test_parse_config(extra: &str) -> SiteConfig {
    let (parsed, ignored) = SiteConfig::parse_with_ignored(extra).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_unknown_fields_are_collected() {
        let (config, ignored) =
            SiteConfig::parse_with_ignored("[site]\ntitel = \"x\"\n[build]\nshorten = true")
                .unwrap();
        assert_eq!(ignored, ["site.titel", "build.shorten"]);
        assert!(config.build.shorten_uris);
    }

    #[test]
    fn test_redirects_table() {
        let config = test_parse_config("[redirects]\n\"/old\" = \"/new\"");
        assert_eq!(config.redirects.get("/old").map(String::as_str), Some("/new"));
    }

    #[test]
    fn test_validate_site_uri() {
        let mut config = SiteConfig::default();
        assert!(config.validate().is_ok());
        config.site.uri = "example.com".to_string();
        assert!(config.validate().is_err());
        config.site.uri = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_redirect_status() {
        let mut config = SiteConfig::default();
        config.build.redirect_status = 200;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_validate_redirect_source() {
        let mut config = SiteConfig::default();
        config.redirects.insert("old".into(), "/new".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_paths_resolve_against_root() {
        let dir = TempDir::new().unwrap();
        let mut config = SiteConfig {
            root: dir.path().to_path_buf(),
            ..SiteConfig::default()
        };
        config.normalize_paths();
        assert_eq!(config.input_dir(), dir.path().join("content"));
        assert_eq!(config.output_dir(), dir.path().join("public_html"));
    }

    #[test]
    fn test_toml_error_maps_to_config_error() {
        let err = SiteConfig::parse_with_ignored("[site\n").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }
}
