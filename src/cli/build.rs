//! `build` command.

use anyhow::Result;

use crate::checker::{self, Checker, seeds_from_graph};
use crate::config::SiteConfig;
use crate::pipeline::Pipeline;
use crate::resource::Registry;

/// Build into the output directory, then crawl it when `check.after_build`.
pub fn build_site(config: &SiteConfig) -> Result<()> {
    let registry = Registry::standard();
    let mut pipeline = Pipeline::new(config, &registry)?;
    pipeline.run()?;

    if config.check.after_build {
        let checker = Checker::new(config)?;
        checker::run(&checker, &seeds_from_graph(pipeline.graph()))?;
    }
    Ok(())
}
