//! `clean` command.

use anyhow::Result;

use crate::config::SiteConfig;
use crate::log;
use crate::pipeline::clean_output;

/// Empty the output directory, keeping `.git`.
pub fn clean_site(config: &SiteConfig) -> Result<()> {
    let output = config.output_dir();
    clean_output(output)?;
    log!("clean"; "emptied {}", output.display());
    Ok(())
}
