//! End-to-end builds in temporary directories.

use std::fs;
use std::path::Path;
use tempfile::TempDir;

use super::Pipeline;
use crate::checker::{CheckReport, Checker, seeds_from_graph};
use crate::config::{SiteConfig, test_parse_config};
use crate::graph::GraphError;
use crate::resource::{Lifecycle, Registry};

fn site(files: &[(&str, &[u8])]) -> (TempDir, SiteConfig) {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("content");
    for (path, content) in files {
        let full = input.join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, content).unwrap();
    }

    let mut config = test_parse_config("");
    config.root = dir.path().to_path_buf();
    config.build.input = input;
    config.build.output = dir.path().join("public_html");
    (dir, config)
}

fn check(config: &SiteConfig, pipeline: &Pipeline<'_>) -> CheckReport {
    let seeds = seeds_from_graph(pipeline.graph());
    Checker::new(config).unwrap().quiet().check(&seeds).unwrap()
}

fn read(root: &Path, path: &str) -> String {
    fs::read_to_string(root.join(path)).unwrap()
}

#[test]
fn test_markdown_site_builds_and_checks_clean() {
    let (_dir, config) = site(&[
        ("index.md", b"title: Home\n\nWelcome.\n"),
        ("a.md", b"[A](/a)\n"),
    ]);
    let registry = Registry::standard();
    let mut pipeline = Pipeline::new(&config, &registry).unwrap().quiet();
    pipeline.run().unwrap();

    let output = config.output_dir();
    assert!(output.join("index.html").is_file());
    assert!(output.join("a.html").is_file());
    assert!(!output.join("a.md").exists());
    assert!(read(output, "index.html").contains("<title>Home</title>"));
    assert!(read(output, "a.html").contains(r#"<a href="/a">A</a>"#));

    let graph = pipeline.graph();
    let a = graph.find("/a").unwrap();
    assert_eq!(a.address().as_str(), "/a.html");
    assert!(graph.iter().all(|(_, r)| r.state() == Lifecycle::Saved));

    let report = check(&config, &pipeline);
    assert!(report.broken.is_empty(), "{:?}", report.broken);
    assert!(report.orphans.is_empty(), "{:?}", report.orphans);
    assert!(report.is_ok(), "{:?}", report.diagnostics);
}

#[test]
fn test_images_load_before_pages_build() {
    // `a.html` sorts first, so it is discovered before the image it sizes.
    let (dir, config) = site(&[(
        "a.html",
        br#"<title>A</title><p><img src="z.png" alt="z"></p>"#,
    )]);
    image::RgbImage::new(3, 2)
        .save(dir.path().join("content/z.png"))
        .unwrap();

    let registry = Registry::standard();
    let mut pipeline = Pipeline::new(&config, &registry).unwrap().quiet();
    pipeline.run().unwrap();

    let html = read(config.output_dir(), "a.html");
    assert!(html.contains(r#"<img src="z.png" alt="z" width="3" height="2">"#), "{html}");
    assert!(config.output_dir().join("z.png").is_file());
}

#[test]
fn test_missing_image_fails_build() {
    let (_dir, config) = site(&[("a.html", br#"<p><img src="/nope.png" alt=""></p>"#)]);
    let registry = Registry::standard();
    let err = Pipeline::new(&config, &registry)
        .unwrap()
        .quiet()
        .run()
        .unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("/a.html"), "{message}");
    assert!(message.contains("/nope.png"), "{message}");
    assert!(!config.output_dir().exists());
}

#[test]
fn test_redirect_cycle_is_reported() {
    let (_dir, mut config) = site(&[("index.md", b"home\n")]);
    config.redirects.insert("/x".into(), "/y".into());
    config.redirects.insert("/y".into(), "/x".into());

    let registry = Registry::standard();
    let mut pipeline = Pipeline::new(&config, &registry).unwrap().quiet();
    pipeline.run().unwrap();
    assert_eq!(read(config.output_dir(), "x.redirect"), "/y 303\n");

    let report = check(&config, &pipeline);
    let problems: Vec<&String> = report.broken.values().flatten().collect();
    assert_eq!(problems, ["redirect loop: /x -> /y -> /x"]);
    assert!(report.orphans.is_empty(), "{:?}", report.orphans);
}

#[test]
fn test_unlinked_output_file_is_orphan() {
    let (_dir, config) = site(&[
        ("index.md", b"[style](/linked.css)\n"),
        ("linked.css", b"a {}"),
        ("stray.css", b"b {}"),
    ]);
    let registry = Registry::standard();
    let mut pipeline = Pipeline::new(&config, &registry).unwrap().quiet();
    pipeline.run().unwrap();

    let report = check(&config, &pipeline);
    assert_eq!(report.orphans, [Path::new("stray.css")]);
    assert!(report.is_ok());
}

#[test]
fn test_same_canonical_path_fails_before_load() {
    let (_dir, config) = site(&[("a.md", b"markdown\n"), ("a.html", b"<p>html</p>")]);
    let registry = Registry::standard();
    let mut pipeline = Pipeline::new(&config, &registry).unwrap().quiet();

    let err = pipeline.discover().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<GraphError>(),
        Some(GraphError::DuplicatePath(path)) if path.as_str() == "/a.html"
    ));
    assert!(format!("{err:#}").contains("publish to the same path"));
}

#[test]
fn test_drafts_are_dropped() {
    let (_dir, config) = site(&[
        ("index.md", b"home\n"),
        ("wip.md", b"title: Soon\ndraft: true\n\nnot yet\n"),
    ]);
    let registry = Registry::standard();
    let mut pipeline = Pipeline::new(&config, &registry).unwrap().quiet();
    pipeline.run().unwrap();

    assert!(pipeline.graph().find("/wip").is_none());
    assert!(!config.output_dir().join("wip.html").exists());
    assert!(!read(config.output_dir(), "feed.xml").contains("Soon"));
}

#[test]
fn test_input_file_wins_over_derived() {
    let (_dir, config) = site(&[("index.md", b"home\n"), ("feed.xml", b"<custom/>")]);
    let registry = Registry::standard();
    let mut pipeline = Pipeline::new(&config, &registry).unwrap().quiet();
    pipeline.run().unwrap();

    assert_eq!(read(config.output_dir(), "feed.xml"), "<custom/>");
    assert!(config.output_dir().join("sitemap.xml").is_file());
}

#[test]
fn test_build_keeps_everything_in_memory() {
    let (_dir, config) = site(&[("index.md", b"home\n")]);
    let registry = Registry::standard();
    let mut pipeline = Pipeline::new(&config, &registry).unwrap().quiet();
    pipeline.build().unwrap();

    assert!(!config.output_dir().exists());
    let home = pipeline.graph().find("/").unwrap();
    assert_eq!(home.state(), Lifecycle::Built);
    assert!(home.output.is_some());
}
