//! Workspace file collector.
//!
//! Walks the workspace root, keeps files with a supported source extension
//! (plus notebooks), and reads each into a [`FileRecord`]. A file that cannot
//! be stat'ed, read, or unwrapped is logged and skipped; the scan itself
//! only fails on configuration problems such as a bad exclude glob.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use zerodev_core::{ContextError, FileRecord};

use crate::config::WorkspaceConfig;
use crate::extract::{extract_notebook, is_notebook};

/// Source extensions collected from the workspace. Not configurable.
pub const SOURCE_EXTENSIONS: &[&str] = &["py", "cpp", "java", "php", "ts", "cs", "sh", "js"];

/// Files read during a scan plus the number that had to be skipped.
#[derive(Debug, Default)]
pub struct ScanReport {
    pub files: Vec<FileRecord>,
    pub skipped: usize,
}

/// Canonical workspace root, or [`ContextError::NoWorkspace`] when none is set.
pub fn resolve_root(ws: &WorkspaceConfig) -> Result<PathBuf> {
    let root = ws.root.as_ref().ok_or(ContextError::NoWorkspace)?;
    if !root.exists() {
        bail!("workspace root does not exist: {}", root.display());
    }
    root.canonicalize()
        .with_context(|| format!("Failed to resolve workspace root: {}", root.display()))
}

/// True when `e` is the "no workspace open" condition.
pub fn is_no_workspace(e: &anyhow::Error) -> bool {
    matches!(e.downcast_ref::<ContextError>(), Some(ContextError::NoWorkspace))
}

/// True when `path` is a file the collector would pick up.
pub fn is_collectable(path: &Path) -> bool {
    if is_notebook(path) {
        return true;
    }
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}

/// Scan the configured workspace.
///
/// With no workspace root this logs a warning and returns an empty report.
pub async fn scan_workspace(ws: &WorkspaceConfig) -> Result<ScanReport> {
    let root = match resolve_root(ws) {
        Ok(root) => root,
        Err(e) if is_no_workspace(&e) => {
            warn!("{}", e);
            return Ok(ScanReport::default());
        }
        Err(e) => return Err(e),
    };

    let mut excludes = vec![
        "**/.git/**".to_string(),
        "**/target/**".to_string(),
        "**/node_modules/**".to_string(),
    ];
    excludes.extend(ws.exclude_globs.clone());
    let exclude_set = build_globset(&excludes)?;

    let walk_root = root.clone();
    let follow = ws.follow_symlinks;
    let (paths, walk_errors) =
        tokio::task::spawn_blocking(move || candidate_paths(&walk_root, &exclude_set, follow))
            .await
            .context("workspace walk task failed")?;

    let mut report = ScanReport {
        files: Vec::with_capacity(paths.len()),
        skipped: walk_errors,
    };
    for path in paths {
        match read_record(&path).await {
            Ok(record) => report.files.push(record),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping file");
                report.skipped += 1;
            }
        }
    }

    report.files.sort_by(|a, b| a.path.cmp(&b.path));
    debug!(
        root = %root.display(),
        files = report.files.len(),
        skipped = report.skipped,
        "workspace scan finished"
    );
    Ok(report)
}

fn candidate_paths(
    root: &Path,
    exclude_set: &GlobSet,
    follow_symlinks: bool,
) -> (Vec<PathBuf>, usize) {
    let mut paths = Vec::new();
    let mut errors = 0;

    for entry in WalkDir::new(root).follow_links(follow_symlinks) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "failed to walk workspace entry");
                errors += 1;
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        if exclude_set.is_match(relative) {
            continue;
        }
        if is_collectable(path) {
            paths.push(path.to_path_buf());
        }
    }

    (paths, errors)
}

async fn read_record(path: &Path) -> Result<FileRecord> {
    let metadata = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("stat failed: {}", path.display()))?;
    let last_modified: DateTime<Utc> = metadata
        .modified()
        .unwrap_or(std::time::SystemTime::UNIX_EPOCH)
        .into();
    let content = read_source_text(path).await?;

    Ok(FileRecord {
        path: path.to_path_buf(),
        last_modified,
        content,
    })
}

/// Read a file as windowable text, unwrapping notebooks to their code cells.
///
/// Invalid UTF-8 sequences are replaced with U+FFFD rather than failing the
/// read, so a stray Latin-1 byte does not drop the file.
pub async fn read_source_text(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("read failed: {}", path.display()))?;
    let raw = String::from_utf8_lossy(&bytes).into_owned();
    if is_notebook(path) {
        return extract_notebook(&raw)
            .with_context(|| format!("notebook extraction failed: {}", path.display()));
    }
    Ok(raw)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).with_context(|| format!("invalid glob: {}", pattern))?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn workspace(root: &Path) -> WorkspaceConfig {
        WorkspaceConfig {
            root: Some(root.to_path_buf()),
            exclude_globs: vec![],
            follow_symlinks: false,
        }
    }

    #[test]
    fn test_extension_filter() {
        for name in ["a.py", "a.cpp", "a.java", "a.php", "a.ts", "a.cs", "a.sh", "a.js", "a.ipynb"] {
            assert!(is_collectable(Path::new(name)), "{}", name);
        }
        for name in ["a.md", "a.rs", "a.tsx", "Makefile", "a.py.bak"] {
            assert!(!is_collectable(Path::new(name)), "{}", name);
        }
    }

    #[tokio::test]
    async fn test_no_root_is_empty() {
        let report = scan_workspace(&WorkspaceConfig::default()).await.unwrap();
        assert!(report.files.is_empty());
        assert_eq!(report.skipped, 0);
    }

    #[tokio::test]
    async fn test_missing_root_is_error() {
        let tmp = TempDir::new().unwrap();
        let ws = workspace(&tmp.path().join("nope"));
        assert!(scan_workspace(&ws).await.is_err());
    }

    #[tokio::test]
    async fn test_collects_sources_and_notebooks_sorted() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join("node_modules/dep")).unwrap();
        fs::write(root.join("src/b.py"), "print('b')\n").unwrap();
        fs::write(root.join("src/a.js"), "let a = 1;\n").unwrap();
        fs::write(root.join("README.md"), "# readme\n").unwrap();
        fs::write(root.join("node_modules/dep/index.js"), "x").unwrap();
        fs::write(
            root.join("nb.ipynb"),
            r#"{"cells": [{"cell_type": "code", "source": ["x = 1\n", "y = 2"]}]}"#,
        )
        .unwrap();

        let report = scan_workspace(&workspace(root)).await.unwrap();
        let names: Vec<String> = report
            .files
            .iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["nb.ipynb", "a.js", "b.py"]);
        assert_eq!(report.files[0].content, "x = 1\ny = 2");
        assert_eq!(report.skipped, 0);
    }

    #[tokio::test]
    async fn test_bad_notebook_is_skipped_not_fatal() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::write(root.join("broken.ipynb"), "{ nope").unwrap();
        fs::write(root.join("ok.sh"), "echo ok\n").unwrap();

        let report = scan_workspace(&workspace(root)).await.unwrap();
        assert_eq!(report.files.len(), 1);
        assert_eq!(report.skipped, 1);
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_decoded_lossily() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::write(root.join("legacy.php"), b"<?php\n// caf\xE9\necho 1;\n").unwrap();
        fs::write(root.join("ok.php"), "<?php\n").unwrap();

        let report = scan_workspace(&workspace(root)).await.unwrap();
        assert_eq!(report.files.len(), 2);
        assert_eq!(report.skipped, 0);
        let legacy = &report.files[0];
        assert!(legacy.path.ends_with("legacy.php"));
        assert_eq!(legacy.content, "<?php\n// caf\u{FFFD}\necho 1;\n");

        let reread = read_source_text(&root.join("legacy.php")).await.unwrap();
        assert_eq!(reread, legacy.content);
    }

    #[tokio::test]
    async fn test_custom_excludes() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("vendor")).unwrap();
        fs::write(root.join("vendor/lib.php"), "<?php\n").unwrap();
        fs::write(root.join("main.php"), "<?php\n").unwrap();

        let mut ws = workspace(root);
        ws.exclude_globs = vec!["vendor/**".to_string()];
        let report = scan_workspace(&ws).await.unwrap();
        assert_eq!(report.files.len(), 1);
        assert!(report.files[0].path.ends_with("main.php"));
    }
}
