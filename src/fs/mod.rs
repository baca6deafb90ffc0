// src/fs/mod.rs

//! Filesystem collaborators used by the watch set.
//!
//! [`FileSystem`] bundles path resolution, directory classification and the
//! directory walk used for recursive registration, so that the watch set can
//! be exercised against [`mock::MockFileSystem`] in tests.

use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;
use walkdir::WalkDir;

pub mod mock;

/// Abstract filesystem interface.
pub trait FileSystem: Send + Sync + Debug {
    /// Resolve `path` to an absolute, canonical form.
    fn canonicalize(&self, path: &Path) -> Result<PathBuf>;

    fn exists(&self, path: &Path) -> bool;

    fn is_dir(&self, path: &Path) -> bool;

    /// Return every directory under `root` (including `root`), skipping
    /// hidden directories below the root and their subtrees when
    /// `ignore_hidden` is set.
    ///
    /// Entries that cannot be read are skipped; the walk never fails as a
    /// whole.
    fn walk_dirs(&self, root: &Path, ignore_hidden: bool) -> Vec<PathBuf>;
}

/// Returns true if the final component of `path` names a hidden entry
/// (a dot-file or dot-directory).
pub fn is_hidden(path: &Path) -> bool {
    match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => name.starts_with('.') && name != "." && name != "..",
        None => false,
    }
}

/// Implementation that uses `std::fs` and `walkdir`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        fs::canonicalize(path).with_context(|| format!("canonicalizing {:?}", path))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn walk_dirs(&self, root: &Path, ignore_hidden: bool) -> Vec<PathBuf> {
        WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            // The root is always kept, even when its own name is hidden.
            .filter_entry(|entry| {
                !(entry.depth() > 0
                    && ignore_hidden
                    && entry.file_type().is_dir()
                    && is_hidden(entry.path()))
            })
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    debug!(error = %err, "skipping unreadable entry during directory walk");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_dir())
            .map(|entry| entry.into_path())
            .collect()
    }
}
