//! `tree`, `list` and `types`: look at the graph without writing anything.

use anyhow::Result;
use std::fmt::Write;

use crate::config::SiteConfig;
use crate::graph::ResourceGraph;
use crate::pipeline::Pipeline;
use crate::resource::{Registry, Resource};

fn built<R>(config: &SiteConfig, f: impl FnOnce(&ResourceGraph) -> R) -> Result<R> {
    let registry = Registry::standard();
    let mut pipeline = Pipeline::new(config, &registry)?.quiet();
    pipeline.build()?;
    Ok(f(pipeline.graph()))
}

pub fn print_tree(config: &SiteConfig) -> Result<()> {
    print!("{}", built(config, render_tree)?);
    Ok(())
}

pub fn print_list(config: &SiteConfig) -> Result<()> {
    print!("{}", built(config, render_list)?);
    Ok(())
}

pub fn print_types() {
    print!("{}", render_types(&Registry::standard()));
}

/// Navigation tree, one node per line, with the title of its resource.
pub fn render_tree(graph: &ResourceGraph) -> String {
    let tree = graph.tree();
    let mut out = String::new();
    tree.walk(|depth, node| {
        let indent = "  ".repeat(depth);
        let name = if depth == 0 { "/" } else { tree.name(node) };
        let _ = match tree.content(node).and_then(|id| graph.get(id)) {
            Some(resource) => writeln!(out, "{indent}{name}  {}", resource.title()),
            None => writeln!(out, "{indent}{name}"),
        };
    });
    out
}

/// Every resource, ordered by path.
pub fn render_list(graph: &ResourceGraph) -> String {
    let mut resources: Vec<&Resource> = graph.iter().map(|(_, r)| r).collect();
    resources.sort_by(|a, b| a.address().cmp(b.address()));

    let mut out = String::new();
    for r in resources {
        let _ = writeln!(
            out,
            "{:<32} {:<28} {:<9} {:<22} {} {} {:?}",
            r.address().as_str(),
            r.uri(),
            r.kind.label(),
            r.content_type(),
            r.date,
            flags(r),
            r.state(),
        );
    }
    out
}

/// `p` public, `a` advertised, `d` draft; `-` when unset.
fn flags(resource: &Resource) -> String {
    let v = resource.visibility;
    [(v.public, 'p'), (v.advertise, 'a'), (v.draft, 'd')]
        .iter()
        .map(|&(set, c)| if set { c } else { '-' })
        .collect()
}

pub fn render_types(registry: &Registry) -> String {
    let mut out = String::new();
    for entry in registry.entries() {
        let _ = writeln!(out, "{:<26} {}", entry.content_type, entry.label);
    }
    out
}
