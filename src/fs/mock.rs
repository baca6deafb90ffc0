// src/fs/mock.rs

use super::{FileSystem, is_hidden};
use anyhow::{Result, anyhow};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File,
    Dir(Vec<String>), // List of child names
}

/// In-memory directory tree.
///
/// Paths are used verbatim, so tests should stick to absolute paths such as
/// `/proj/src`. Cloning shares the underlying tree, which lets a test add
/// directories after handing the filesystem to a watch set.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    entries: Arc<Mutex<HashMap<PathBuf, MockEntry>>>,
    unreadable: Arc<Mutex<HashSet<PathBuf>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        let mut entries = HashMap::new();
        entries.insert(PathBuf::from("/"), MockEntry::Dir(Vec::new()));

        Self {
            entries: Arc::new(Mutex::new(entries)),
            unreadable: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Create a directory and any missing parents.
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut entries = self.entries.lock().unwrap();
        Self::ensure_dir_entry(&mut entries, path.as_ref());
    }

    pub fn add_file(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut entries = self.entries.lock().unwrap();
        if let Some(parent) = path.parent() {
            Self::ensure_dir_entry(&mut entries, parent);
            Self::link_child(&mut entries, parent, path);
        }
        entries.insert(path.to_path_buf(), MockEntry::File);
    }

    /// Make listing `path` fail, as a permission error would.
    pub fn deny(&self, path: impl AsRef<Path>) {
        self.unreadable
            .lock()
            .unwrap()
            .insert(path.as_ref().to_path_buf());
    }

    fn ensure_dir_entry(entries: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
        if entries.contains_key(path) {
            return;
        }
        entries.insert(path.to_path_buf(), MockEntry::Dir(Vec::new()));
        if let Some(parent) = path.parent() {
            if parent != path {
                Self::ensure_dir_entry(entries, parent);
                Self::link_child(entries, parent, path);
            }
        }
    }

    fn link_child(entries: &mut HashMap<PathBuf, MockEntry>, parent: &Path, child: &Path) {
        if let Some(MockEntry::Dir(children)) = entries.get_mut(parent) {
            if let Some(name) = child.file_name().and_then(|n| n.to_str()) {
                if !children.iter().any(|c| c == name) {
                    children.push(name.to_string());
                }
            }
        }
    }
}

impl FileSystem for MockFileSystem {
    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        // Paths are stored verbatim; resolution only checks existence.
        if self.exists(path) {
            Ok(path.to_path_buf())
        } else {
            Err(anyhow!("No such file or directory: {:?}", path))
        }
    }

    fn exists(&self, path: &Path) -> bool {
        self.entries.lock().unwrap().contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(
            self.entries.lock().unwrap().get(path),
            Some(MockEntry::Dir(_))
        )
    }

    fn walk_dirs(&self, root: &Path, ignore_hidden: bool) -> Vec<PathBuf> {
        let entries = self.entries.lock().unwrap();
        let unreadable = self.unreadable.lock().unwrap();
        let mut dirs = Vec::new();
        let mut stack = vec![root.to_path_buf()];

        while let Some(dir) = stack.pop() {
            let Some(MockEntry::Dir(children)) = entries.get(&dir) else {
                continue;
            };
            if ignore_hidden && dir.as_path() != root && is_hidden(&dir) {
                continue;
            }
            dirs.push(dir.clone());
            if unreadable.contains(&dir) {
                continue;
            }
            for name in children.iter().rev() {
                stack.push(dir.join(name));
            }
        }

        dirs
    }
}
