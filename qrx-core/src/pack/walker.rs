use crate::error::{QrxError, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A regular file found under the source root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceFile {
    /// `/`-separated path relative to the root; the logical path carried in payloads.
    pub rel: String,
    pub abs: PathBuf,
}

impl SourceFile {
    pub fn read(&self) -> Result<Vec<u8>> {
        Ok(std::fs::read(&self.abs)?)
    }
}

pub fn build_excludes(patterns: &[String]) -> Result<GlobSet> {
    let mut b = GlobSetBuilder::new();
    for p in patterns {
        let g = Glob::new(p).map_err(|e| QrxError::Pattern(format!("{p}: {e}")))?;
        b.add(g);
    }
    b.build().map_err(|e| QrxError::Pattern(e.to_string()))
}

fn rel_string(path: &Path, root: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

fn excluded(set: &GlobSet, rel: &str, name: &str) -> bool {
    set.is_match(rel) || set.is_match(name)
}

/// Regular files under `root`, sorted by relative path, skipping anything an
/// exclude pattern matches (matching a directory prunes its whole subtree).
pub fn walk(root: &Path, exclude: &[String]) -> Result<Vec<SourceFile>> {
    let set = build_excludes(exclude)?;
    let mut files = Vec::new();

    let it = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| match rel_string(e.path(), root) {
            Some(rel) => !excluded(&set, &rel, &e.file_name().to_string_lossy()),
            None => true, // the root itself
        });

    for e in it {
        let e = e.map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        if !e.file_type().is_file() {
            // (symlinks and special files skipped)
            continue;
        }
        if let Some(rel) = rel_string(e.path(), root) {
            files.push(SourceFile {
                rel,
                abs: e.path().to_path_buf(),
            });
        }
    }
    files.sort_by(|a, b| a.rel.cmp(&b.rel));
    Ok(files)
}
