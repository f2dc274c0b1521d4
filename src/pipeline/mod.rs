//! Build pipeline.
//!
//! Drives every resource through its lifecycle, one stage at a time over
//! the whole graph:
//!
//! ```text
//! discover ─► load ─► convert ─► derive ─► build ─► save
//!    │          │        │          │         │        │
//!  walk input  parse   markup ->  error,    render   write output,
//!  + classify  headers  HTML doc  redirects, (graph   restore mtime
//!                                 feed, ...  read-only)
//! ```
//!
//! Every stage completes for all resources before the next starts, so a
//! page being built always sees the images it references loaded.

mod discover;
mod save;
#[cfg(test)]
mod tests;

pub use discover::input_files;
pub use save::clean_output;

use anyhow::{Context, Result, bail};
use rustc_hash::FxHashMap;
use std::path::PathBuf;

use crate::config::SiteConfig;
use crate::core::{LinkResolver, PathAddress};
use crate::generator::{self, redirect};
use crate::graph::{GraphError, ResourceGraph, ResourceId};
use crate::logger::ProgressLine;
use crate::navigator::Navigator;
use crate::resource::{Lifecycle, Registry, Resource};
use crate::utils::plural_count;
use crate::{debug, log};

/// Read-only view handed to resources while they render.
pub struct BuildContext<'a> {
    pub graph: &'a ResourceGraph,
    pub config: &'a SiteConfig,
    pub links: &'a LinkResolver,
    pub navigator: &'a Navigator,
}

pub struct Pipeline<'a> {
    config: &'a SiteConfig,
    registry: &'a Registry,
    graph: ResourceGraph,
    links: LinkResolver,
    navigator: Navigator,
    progress: bool,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a SiteConfig, registry: &'a Registry) -> Result<Self> {
        let links = LinkResolver::new(config.site_url()?);
        let navigator = Navigator::new(config.navigation.clone(), &links);
        Ok(Self {
            config,
            registry,
            graph: ResourceGraph::new(config.build.shorten_uris),
            links,
            navigator,
            progress: true,
        })
    }

    /// No progress lines or stage summaries.
    pub fn quiet(mut self) -> Self {
        self.progress = false;
        self
    }

    pub fn graph(&self) -> &ResourceGraph {
        &self.graph
    }

    pub fn links(&self) -> &LinkResolver {
        &self.links
    }

    pub fn context(&self) -> BuildContext<'_> {
        BuildContext {
            graph: &self.graph,
            config: self.config,
            links: &self.links,
            navigator: &self.navigator,
        }
    }

    /// Everything up to and including build, in memory.
    pub fn build(&mut self) -> Result<()> {
        self.discover()?;
        self.load_all()?;
        self.convert_all()?;
        self.derive()?;
        self.build_all()
    }

    /// Build, then write the output directory.
    pub fn run(&mut self) -> Result<()> {
        self.build()?;
        self.save_all()
    }

    fn progress_line(&self, stage: &'static str, total: usize) -> Option<ProgressLine> {
        self.progress.then(|| ProgressLine::new(&[(stage, total)]))
    }

    // ========================================================================
    // discover
    // ========================================================================

    /// Register one resource per input file.
    ///
    /// Two inputs that end up at the same canonical path (`a.md` and
    /// `a.html`) fail here, before anything is loaded.
    pub fn discover(&mut self) -> Result<()> {
        let input = self.config.input_dir();
        let files = input_files(input)?;
        let shorten = self.graph.shorten();

        let mut claimed: FxHashMap<PathAddress, PathBuf> = FxHashMap::default();
        for file in &files {
            let address = file
                .strip_prefix(input)
                .ok()
                .and_then(PathAddress::from_relative)
                .with_context(|| format!("unusable file name {}", file.display()))?;

            let resource = self
                .registry
                .instantiate(address, file, shorten)
                .with_context(|| format!("failed to classify {}", file.display()))?;

            let published = match resource.kind.as_convertible() {
                Some(convertible) => convertible.target(resource.address()),
                None => resource.address().clone(),
            };
            if let Some(other) = claimed.insert(published.clone(), file.clone()) {
                return Err(anyhow::Error::new(GraphError::DuplicatePath(published)).context(
                    format!("{} and {} publish to the same path", other.display(), file.display()),
                ));
            }

            self.graph
                .add(resource)
                .with_context(|| format!("failed to register {}", file.display()))?;
        }

        debug!("discover"; "{} in {}", plural_count(files.len(), "file"), input.display());
        Ok(())
    }

    // ========================================================================
    // load
    // ========================================================================

    pub fn load_all(&mut self) -> Result<()> {
        let ids = self.graph.select(|r| r.state() == Lifecycle::Discovered);
        let progress = self.progress_line("load", ids.len());

        for id in ids {
            self.load(id)?;
            if let Some(p) = &progress {
                p.inc("load");
            }
        }

        if let Some(p) = progress {
            p.finish();
        }
        Ok(())
    }

    /// Load one resource and move its tree node if headers changed visibility.
    fn load(&mut self, id: ResourceId) -> Result<()> {
        let Some(resource) = self.graph.get_mut(id) else {
            return Ok(());
        };
        resource
            .load()
            .with_context(|| format!("failed to load {}", resource.address()))?;
        self.graph.sync_node(id);
        Ok(())
    }

    // ========================================================================
    // convert
    // ========================================================================

    /// Drop drafts, then replace every markup source by its HTML document.
    pub fn convert_all(&mut self) -> Result<()> {
        let drafts = self.graph.select(|r| r.visibility.draft);
        for &id in &drafts {
            if let Some(draft) = self.graph.remove(id) {
                debug!("convert"; "skipping draft {}", draft.address());
            }
        }

        let sources = self.graph.select(|r| r.kind.as_convertible().is_some());
        for id in sources {
            let Some(mut source) = self.graph.remove(id) else {
                continue;
            };
            let Some(convertible) = source.kind.as_convertible() else {
                continue;
            };
            let converted = convertible
                .convert(&source)
                .with_context(|| format!("failed to convert {}", source.address()))?;
            source.advance(Lifecycle::Converted)?;

            let new_id = self
                .graph
                .add(converted)
                .with_context(|| format!("failed to register conversion of {}", source.address()))?;
            self.load(new_id)?;
        }

        if self.progress && !drafts.is_empty() {
            log!("build"; "{} skipped", plural_count(drafts.len(), "draft"));
        }
        Ok(())
    }

    // ========================================================================
    // derive
    // ========================================================================

    /// Add the resources computed from the loaded graph.
    ///
    /// An input file already occupying a derived path wins over the
    /// generated resource.
    pub fn derive(&mut self) -> Result<()> {
        let build = &self.config.build;
        let shorten = self.graph.shorten();

        let mut derived: Vec<Resource> = Vec::new();
        if build.make_error {
            derived.push(generator::error_page(shorten));
        }
        for (from, target) in &self.config.redirects {
            derived.push(redirect::resource(from, target, build.redirect_status, shorten));
        }
        if build.make_feed {
            derived.push(generator::feed_resource(&self.graph));
        }
        if build.make_sitemap {
            derived.push(generator::sitemap_resource(&self.graph));
        }
        if build.make_robots {
            derived.push(generator::robots_resource(&self.graph));
        }

        for resource in derived {
            if self.graph.id_of(resource.address()).is_some() {
                debug!("derive"; "{} exists in input, not generating it", resource.address());
                continue;
            }
            let address = resource.address().clone();
            let id = self
                .graph
                .add(resource)
                .with_context(|| format!("failed to register {address}"))?;
            self.load(id)?;
        }
        Ok(())
    }

    // ========================================================================
    // build
    // ========================================================================

    /// Render every resource against the read-only graph.
    pub fn build_all(&mut self) -> Result<()> {
        let ids = self.graph.ids();
        let progress = self.progress_line("build", ids.len());

        let mut outputs = Vec::with_capacity(ids.len());
        {
            let ctx = self.context();
            for &id in &ids {
                let Some(resource) = self.graph.get(id) else {
                    continue;
                };
                if resource.state() < Lifecycle::Loaded {
                    bail!("{} was never loaded", resource.address());
                }
                let output = resource
                    .render(&ctx)
                    .with_context(|| format!("failed to build {}", resource.address()))?;
                outputs.push((id, output));
                if let Some(p) = &progress {
                    p.inc("build");
                }
            }
        }

        for (id, output) in outputs {
            if let Some(resource) = self.graph.get_mut(id) {
                resource.output = output;
                resource.advance(Lifecycle::Built)?;
            }
        }

        if let Some(p) = progress {
            p.finish();
        }
        Ok(())
    }

    // ========================================================================
    // save
    // ========================================================================

    pub fn save_all(&mut self) -> Result<()> {
        let output = self.config.output_dir();
        if self.config.build.clean {
            clean_output(output)?;
        }

        let ids = self.graph.ids();
        let progress = self.progress_line("save", ids.len());

        for id in ids {
            let Some(resource) = self.graph.get_mut(id) else {
                continue;
            };
            if resource.state() < Lifecycle::Built {
                bail!("{} was never built", resource.address());
            }
            save::save(resource, output)
                .with_context(|| format!("failed to save {}", resource.address()))?;
            resource.advance(Lifecycle::Saved)?;
            if let Some(p) = &progress {
                p.inc("save");
            }
        }

        if let Some(p) = progress {
            p.finish();
        }
        if self.progress {
            log!(
                "build";
                "{} written to {}",
                plural_count(self.graph.len(), "resource"),
                output.display()
            );
        }
        Ok(())
    }
}

#[cfg(test)]
pub fn test_context_with<R>(
    graph: &ResourceGraph,
    config: &SiteConfig,
    f: impl FnOnce(&BuildContext<'_>) -> R,
) -> R {
    let links = LinkResolver::new(config.site_url().unwrap());
    let navigator = Navigator::new(config.navigation.clone(), &links);
    f(&BuildContext {
        graph,
        config,
        links: &links,
        navigator: &navigator,
    })
}

#[cfg(test)]
pub fn test_context<R>(config: &SiteConfig, f: impl FnOnce(&BuildContext<'_>) -> R) -> R {
    let graph = ResourceGraph::new(config.build.shorten_uris);
    test_context_with(&graph, config, f)
}
