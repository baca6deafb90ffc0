// src/watch/path_utils.rs

//! Utility functions for path handling in the watcher.

use std::path::Path;

use crate::fs::FileSystem;

/// Returns true if `path` lies under (or is) `root`.
///
/// Containment is checked component-wise, never as a string prefix, so
/// `/proj/src2` is not inside `/proj/src`.
/// - First we try `path.starts_with(root)` as given.
/// - If that fails (e.g. symlinks or different absolute prefixes), we
///   canonicalize both paths and try again.
/// - If neither attempt proves containment the path is treated as outside.
pub fn is_within(fs: &dyn FileSystem, root: &Path, path: &Path) -> bool {
    if path.starts_with(root) {
        return true;
    }

    // Same underlying directory reached through different prefixes
    // (notably /private/var vs /var on macOS).
    if let (Ok(root_canon), Ok(path_canon)) = (fs.canonicalize(root), fs.canonicalize(path)) {
        return path_canon.starts_with(&root_canon);
    }

    false
}
