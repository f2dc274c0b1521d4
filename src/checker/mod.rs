//! Output crawler.
//!
//! Walks the saved site the way a link-following client would, starting
//! from a few seed URIs. Every request goes through the same
//! [`FileServer`] the development server uses.
//!
//! | Content        | Validation                  | Links followed          |
//! |----------------|-----------------------------|-------------------------|
//! | HTML           | tidy-like well-formedness   | `href`, `src`           |
//! | CSS            | -                           | `url(...)`              |
//! | XML            | strict parse, feed/sitemap  | `link/@href`, `loc`     |
//! | `robots.txt`   | -                           | `Sitemap:`              |
//! | anything else  | -                           | -                       |
//!
//! Files in the output directory that no crawl reaches are orphans.

pub mod external;
mod html;
mod links;
mod report;
mod schema;
mod xml;

pub use report::{CheckReport, Diagnostic, ExternalFailure, Severity};

use rustc_hash::FxHashSet;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::config::{CheckConfig, ConfigError, SiteConfig};
use crate::core::{LinkResolver, Target};
use crate::generator::{feed::FEED_PATH, redirect, robots::ROBOTS_PATH, sitemap::SITEMAP_PATH};
use crate::graph::ResourceGraph;
use crate::logger::ProgressLine;
use crate::pipeline::input_files;
use crate::resource::Kind;
use crate::serve::{FileServer, Resolution, ResolveError};
use crate::utils::mime::{self, types};
use crate::utils::plural_count;
use crate::debug;
use external::ExternalChecker;

/// Requested by browsers on their own; a site without one is fine.
const FAVICON: &str = "/favicon.ico";

const SEED_REFERRER: &str = "(seed)";

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("output directory {} does not exist", .0.display())]
    MissingOutput(PathBuf),

    #[error("{uri} answered {status} (linked from {referrer})")]
    BadStatus {
        uri: String,
        status: u16,
        referrer: String,
    },

    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to list output files: {0}")]
    Walk(String),
}

/// One pending request.
struct Visit {
    uri: String,
    referrer: String,
}

pub struct Checker<'a> {
    config: &'a CheckConfig,
    links: LinkResolver,
    files: FileServer,
    progress: bool,
}

impl<'a> Checker<'a> {
    pub fn new(config: &'a SiteConfig) -> Result<Self, CheckError> {
        Ok(Self {
            config: &config.check,
            links: LinkResolver::new(config.site_url()?),
            files: FileServer::new(config.output_dir()),
            progress: true,
        })
    }

    pub fn quiet(mut self) -> Self {
        self.progress = false;
        self
    }

    /// Crawl from `seeds`, then report what was found.
    ///
    /// `Err` means the crawl itself could not finish: a forbidden or
    /// unreadable file. Broken links and invalid files end up in the report.
    pub fn check(&self, seeds: &[String]) -> Result<CheckReport, CheckError> {
        let root = self.files.root();
        if !root.is_dir() {
            return Err(CheckError::MissingOutput(root.to_path_buf()));
        }

        let mut crawl = Crawl {
            checker: self,
            queue: VecDeque::new(),
            visited: FxHashSet::default(),
            unvisited: input_files(root)
                .map_err(|e| CheckError::Walk(format!("{e:#}")))?
                .into_iter()
                .collect(),
            externals: BTreeMap::new(),
            report: CheckReport::default(),
        };

        for seed in seeds {
            crawl.follow(SEED_REFERRER, "/", seed);
        }
        while let Some(visit) = crawl.queue.pop_front() {
            crawl.visit(visit)?;
        }

        let Crawl {
            unvisited,
            externals,
            mut report,
            ..
        } = crawl;

        report.orphans = unvisited
            .into_iter()
            .filter_map(|path| path.strip_prefix(root).ok().map(Path::to_path_buf))
            .collect();
        if self.config.external {
            self.check_externals(externals, &mut report);
        }
        debug!("check"; "{} crawled", plural_count(report.visited, "URI"));
        Ok(report)
    }

    fn check_externals(&self, externals: BTreeMap<String, BTreeSet<String>>, report: &mut CheckReport) {
        let checker = ExternalChecker::new(Duration::from_secs(self.config.timeout));
        let progress = self
            .progress
            .then(|| ProgressLine::new(&[("external", externals.len())]));

        for (url, referrers) in externals {
            report.externals_checked += 1;
            if let Err(reason) = checker.check(&url) {
                report.external.push(ExternalFailure {
                    url,
                    reason,
                    referrers: referrers.into_iter().collect(),
                });
            }
            if let Some(p) = &progress {
                p.inc("external");
            }
        }

        if let Some(p) = progress {
            p.finish();
        }
    }
}

struct Crawl<'c, 'a> {
    checker: &'c Checker<'a>,
    queue: VecDeque<Visit>,
    /// Decoded site paths already requested.
    visited: FxHashSet<String>,
    /// Output files no request has resolved to yet.
    unvisited: BTreeSet<PathBuf>,
    /// URL -> referring URIs.
    externals: BTreeMap<String, BTreeSet<String>>,
    report: CheckReport,
}

impl Crawl<'_, '_> {
    /// Queue the target of `link` found at `from`.
    fn follow(&mut self, referrer: &str, from: &str, link: &str) {
        match self.checker.links.resolve(from, link) {
            Target::Internal(uri) => self.queue.push_back(Visit {
                uri,
                referrer: referrer.to_string(),
            }),
            Target::External(url) => self.add_external(url, referrer),
            Target::Skip => {}
        }
    }

    fn add_external(&mut self, mut url: Url, referrer: &str) {
        url.set_fragment(None);
        self.externals
            .entry(url.to_string())
            .or_default()
            .insert(referrer.to_string());
    }

    /// Request one URI, following redirects on the spot.
    fn visit(&mut self, visit: Visit) -> Result<(), CheckError> {
        let Visit { mut uri, referrer } = visit;
        if !self.visited.insert(uri.clone()) {
            return Ok(());
        }

        let mut chain: Vec<String> = Vec::new();
        loop {
            self.report.visited += 1;
            match self.checker.files.resolve(&uri)? {
                Resolution::File { path, content_type } => {
                    self.unvisited.remove(&path);
                    return self.scan(&uri, &path, content_type);
                }
                Resolution::Redirect { location, file, .. } => {
                    if let Some(file) = file {
                        self.unvisited.remove(&file);
                    }
                    chain.push(uri.clone());
                    let next = match self.checker.links.resolve(&uri, &location) {
                        Target::Internal(next) => next,
                        Target::External(url) => {
                            self.add_external(url, &referrer);
                            return Ok(());
                        }
                        Target::Skip => return Ok(()),
                    };
                    if chain.contains(&next) {
                        let path = chain.join(" -> ");
                        self.report
                            .add_broken(&referrer, format!("redirect loop: {path} -> {next}"));
                        return Ok(());
                    }
                    if !self.visited.insert(next.clone()) {
                        return Ok(());
                    }
                    uri = next;
                }
                Resolution::NotFound if uri == FAVICON => return Ok(()),
                Resolution::NotFound => {
                    self.report.add_broken(&referrer, format!("{uri}: not found"));
                    return Ok(());
                }
                other => {
                    return Err(CheckError::BadStatus {
                        uri,
                        status: other.status(),
                        referrer,
                    });
                }
            }
        }
    }

    /// Validate a resolved file and queue its links.
    fn scan(&mut self, uri: &str, path: &Path, content_type: &str) -> Result<(), CheckError> {
        let essence = mime::essence(content_type);
        let scanned = essence == types::HTML
            || essence == types::CSS
            || mime::is_xml(essence)
            || uri == ROBOTS_PATH;
        if !scanned {
            return Ok(());
        }

        let bytes = fs::read(path).map_err(|source| CheckError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let text = String::from_utf8_lossy(&bytes);

        let (diagnostics, found) = if essence == types::HTML {
            (html::validate(&text), links::from_html(&text))
        } else if essence == types::CSS {
            (Vec::new(), links::from_css(&text))
        } else if mime::is_xml(essence) {
            let checked = xml::check(&text);
            (checked.diagnostics, checked.links)
        } else {
            (Vec::new(), links::from_robots(&text))
        };

        let kept: Vec<Diagnostic> = diagnostics
            .into_iter()
            .filter(|d| !self.checker.config.is_ignored(&d.message))
            .collect();
        if !kept.is_empty() {
            let relative = path.strip_prefix(self.checker.files.root()).unwrap_or(path);
            self.report.diagnostics.insert(relative.to_path_buf(), kept);
        }

        for link in found {
            self.follow(uri, uri, &link);
        }
        Ok(())
    }
}

/// Entry points after a build: the home page, every document the
/// navigation does not reach, the derived files and every redirect.
pub fn seeds_from_graph(graph: &ResourceGraph) -> Vec<String> {
    let mut seeds = vec!["/".to_string()];
    for id in graph.of_type("document") {
        if let Some(doc) = graph.get(id)
            && !doc.visibility.advertise
        {
            seeds.push(doc.uri().to_string());
        }
    }
    for (_, resource) in graph.iter() {
        let seed = match &resource.kind {
            Kind::Feed | Kind::Sitemap | Kind::Robots => Some(resource.uri()),
            Kind::Redirect(_) => redirect::source_path(resource.address().as_str()),
            _ => None,
        };
        if let Some(seed) = seed {
            seeds.push(seed.to_string());
        }
    }
    seeds.sort();
    seeds.dedup();
    seeds
}

/// Entry points for a saved site without its graph.
pub fn standalone_seeds(output: &Path, extra: &[String]) -> Result<Vec<String>, CheckError> {
    let mut seeds = vec!["/".to_string()];
    for path in [FEED_PATH, SITEMAP_PATH, ROBOTS_PATH] {
        if output.join(path.trim_start_matches('/')).is_file() {
            seeds.push(path.to_string());
        }
    }

    for file in input_files(output).map_err(|e| CheckError::Walk(format!("{e:#}")))? {
        let Ok(relative) = file.strip_prefix(output) else {
            continue;
        };
        let Some(relative) = relative.to_str() else {
            continue;
        };
        let site_path = format!("/{}", relative.replace('\\', "/"));
        if let Some(source) = redirect::source_path(&site_path) {
            seeds.push(source.to_string());
        }
    }

    seeds.extend(extra.iter().cloned());
    seeds.dedup();
    Ok(seeds)
}

/// Crawl, print the report and fail on broken links or invalid files.
pub fn run(checker: &Checker<'_>, seeds: &[String]) -> anyhow::Result<()> {
    let report = checker.check(seeds)?;
    report.print();
    if !report.is_ok() {
        anyhow::bail!(
            "check failed: {}, {}",
            plural_count(report.broken_count(), "broken link"),
            plural_count(report.count(Severity::Error), "validation error")
        );
    }
    Ok(())
}
