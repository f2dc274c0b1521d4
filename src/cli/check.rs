//! `check` command: crawl an output directory without building.

use anyhow::Result;

use crate::checker::{self, CheckError, Checker, standalone_seeds};
use crate::config::SiteConfig;
use crate::log;
use crate::utils::plural_count;

pub fn check_site(config: &SiteConfig, extra_seeds: &[String]) -> Result<()> {
    let output = config.output_dir();
    if !output.is_dir() {
        return Err(CheckError::MissingOutput(output.to_path_buf()).into());
    }

    let seeds = standalone_seeds(output, extra_seeds)?;
    log!(
        "check";
        "crawling {} from {}",
        output.display(),
        plural_count(seeds.len(), "seed")
    );

    let checker = Checker::new(config)?;
    checker::run(&checker, &seeds)
}
