//! Input directory walk.

use anyhow::{Context, Result, bail};
use jwalk::WalkDir;
use std::path::{Path, PathBuf};

/// File names skipped besides dot-files.
const IGNORED_FILES: &[&str] = &["Icon\r"];

/// Every regular file below `dir`, sorted.
///
/// Dot-prefixed files and directories are skipped.
pub fn input_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!("input directory {} does not exist", dir.display());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).skip_hidden(true).sort(true) {
        let entry = entry.with_context(|| format!("failed to walk {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if name.starts_with('.') || IGNORED_FILES.contains(&name.as_ref()) {
            continue;
        }
        files.push(entry.path());
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_skips_hidden_and_icon() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("b/.git")).unwrap();
        fs::write(root.join("b/.git/config"), "").unwrap();
        fs::write(root.join("b/z.md"), "").unwrap();
        fs::write(root.join("a.html"), "").unwrap();
        fs::write(root.join(".hidden"), "").unwrap();
        fs::write(root.join("Icon\r"), "").unwrap();

        let files = input_files(root).unwrap();
        let relative: Vec<_> = files
            .iter()
            .map(|f| f.strip_prefix(root).unwrap().to_path_buf())
            .collect();
        assert_eq!(relative, [PathBuf::from("a.html"), PathBuf::from("b/z.md")]);
    }

    #[test]
    fn test_missing_input_dir() {
        let dir = TempDir::new().unwrap();
        assert!(input_files(&dir.path().join("nope")).is_err());
    }
}
