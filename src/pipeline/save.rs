//! Writing built resources to the output directory.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use crate::resource::{Input, Resource};

/// Entries of the output directory that survive cleaning.
const KEEP_ON_CLEAN: &[&str] = &[".git"];

/// Empty `dir`, sparing version control metadata.
pub fn clean_output(dir: &Path) -> Result<()> {
    if !dir.exists() {
        return Ok(());
    }
    for entry in fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))? {
        let entry = entry?;
        if KEEP_ON_CLEAN.contains(&entry.file_name().to_string_lossy().as_ref()) {
            continue;
        }
        let path = entry.path();
        let removed = if entry.file_type()?.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        removed.with_context(|| format!("failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Write one resource below `root` and stamp it with the resource date.
pub fn save(resource: &Resource, root: &Path) -> Result<PathBuf> {
    let dest = resource.address().output_file(root);
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    match (&resource.output, &resource.input) {
        (Some(bytes), _) => fs::write(&dest, bytes).map(drop),
        (None, Input::File(source)) => fs::copy(source, &dest).map(drop),
        (None, Input::Memory(text)) => fs::write(&dest, text.as_bytes()).map(drop),
    }
    .with_context(|| format!("failed to write {}", dest.display()))?;

    if let Some(time) = resource.date.to_system_time() {
        File::options()
            .write(true)
            .open(&dest)
            .and_then(|f| f.set_modified(time))
            .with_context(|| format!("failed to set mtime of {}", dest.display()))?;
    }

    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PathAddress;
    use crate::utils::date::DateTimeUtc;
    use tempfile::TempDir;

    #[test]
    fn test_clean_spares_git() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::create_dir_all(root.join("old")).unwrap();
        fs::write(root.join("old/x.html"), "").unwrap();
        fs::write(root.join("stale.css"), "").unwrap();

        clean_output(root).unwrap();
        let left: Vec<_> = fs::read_dir(root).unwrap().map(|e| e.unwrap().file_name()).collect();
        assert_eq!(left, [".git"]);
        clean_output(&root.join("missing")).unwrap();
    }

    #[test]
    fn test_save_output_and_mtime() {
        let dir = TempDir::new().unwrap();
        let mut page = Resource::document(PathAddress::new("/blog/"), Input::Memory("".into()), true);
        page.output = Some(b"<p>hi</p>".to_vec());
        page.date = DateTimeUtc::from_ymd(2021, 6, 1);

        let dest = save(&page, dir.path()).unwrap();
        assert_eq!(dest, dir.path().join("blog/index.html"));
        assert_eq!(fs::read_to_string(&dest).unwrap(), "<p>hi</p>");
        let mtime = fs::metadata(&dest).unwrap().modified().unwrap();
        assert_eq!(DateTimeUtc::from_system_time(mtime), page.date);
    }

    #[test]
    fn test_save_copies_input() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("in.css");
        fs::write(&source, "a{}").unwrap();
        let out = dir.path().join("out");
        let css = Resource::new(
            PathAddress::new("/css/site.css"),
            crate::resource::Kind::File,
            Input::File(source),
            crate::utils::mime::types::CSS,
            true,
        );
        let dest = save(&css, &out).unwrap();
        assert_eq!(fs::read_to_string(dest).unwrap(), "a{}");
    }
}
