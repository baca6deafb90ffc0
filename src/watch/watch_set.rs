// src/watch/watch_set.rs

//! The set of directories currently under watch.
//!
//! A [`WatchSet`] is shared between the pipeline (registration at any time),
//! the per-event rescan tasks (which may run many at once for a single
//! batch) and the running event source. All mutation goes through one mutex
//! so that concurrent `add` calls can neither duplicate nor lose a target.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::errors::{Result, WatchflowError};
use crate::fs::{FileSystem, is_hidden};
use crate::types::RawEvent;
use crate::watch::path_utils::is_within;
use crate::watch::source::EventSource;
use crate::workflow::Sink;

/// A watch target whose whole subtree is kept under watch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecursiveRoot {
    pub path: PathBuf,
    /// Hidden subdirectories (and their subtrees) are never added.
    pub ignore_hidden: bool,
}

#[derive(Debug, Default)]
struct WatchState {
    /// Resolved targets in registration order, without duplicates.
    targets: Vec<PathBuf>,
    /// Recursive roots in registration order. Entries are never removed.
    roots: Vec<RecursiveRoot>,
}

pub struct WatchSet {
    fs: Arc<dyn FileSystem>,
    state: Mutex<WatchState>,
    /// Live event source; present only while the pipeline is running.
    source: Mutex<Option<Arc<dyn EventSource>>>,
    /// Where "Watching <dir>" lines go in verbose mode.
    announce: Option<Sink>,
}

impl fmt::Debug for WatchSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock_state();
        f.debug_struct("WatchSet")
            .field("targets", &state.targets)
            .field("roots", &state.roots)
            .finish_non_exhaustive()
    }
}

impl WatchSet {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            state: Mutex::new(WatchState::default()),
            source: Mutex::new(None),
            announce: None,
        }
    }

    /// Write a "Watching <dir>" line to `sink` whenever a target is
    /// subscribed on a live source.
    pub fn with_announcements(mut self, sink: Sink) -> Self {
        self.announce = Some(sink);
        self
    }

    /// Register a single directory.
    ///
    /// Returns the resolved path. Adding a path that resolves to an existing
    /// target is a no-op that returns the same resolved path. When a source
    /// is attached the new target is subscribed immediately.
    pub fn add(&self, path: &Path) -> Result<PathBuf> {
        let resolved = self.resolve(path)?;

        {
            let mut state = self.lock_state();
            if state.targets.contains(&resolved) {
                return Ok(resolved);
            }
            state.targets.push(resolved.clone());
        }

        debug!(path = ?resolved, "added watch target");

        if let Some(source) = self.live_source() {
            self.subscribe(source.as_ref(), &resolved);
        }

        Ok(resolved)
    }

    /// Register `path` as a recursive root and add every directory beneath
    /// it (the root included).
    ///
    /// With `ignore_hidden`, hidden directories are skipped together with
    /// their subtrees. Unreadable subdirectories are skipped silently.
    pub fn add_recursive(&self, path: &Path, ignore_hidden: bool) -> Result<()> {
        let resolved = self.resolve(path)?;

        {
            let mut state = self.lock_state();
            match state.roots.iter_mut().find(|r| r.path == resolved) {
                Some(root) => root.ignore_hidden = ignore_hidden,
                None => state.roots.push(RecursiveRoot {
                    path: resolved.clone(),
                    ignore_hidden,
                }),
            }
        }

        let dirs = self.fs.walk_dirs(&resolved, ignore_hidden);
        debug!(root = ?resolved, count = dirs.len(), ignore_hidden, "walked recursive root");

        for dir in dirs {
            if let Err(err) = self.add(&dir) {
                // Directory vanished or became unreadable mid-walk.
                debug!(dir = ?dir, error = %err, "skipping directory during recursive registration");
            }
        }

        Ok(())
    }

    /// Bring a newly created or renamed directory under watch if it lies
    /// inside a recursive root.
    ///
    /// Only create/rename events for paths that are currently directories
    /// are considered. Roots are tried in registration order; a root that
    /// ignores hidden directories is skipped for a hidden path. The first
    /// containing root wins and its hidden policy is inherited.
    ///
    /// Returns the root the directory was added under, if any.
    pub fn rescan(&self, event: &RawEvent) -> Option<PathBuf> {
        if !event.op.is_dir_op() {
            return None;
        }
        if !self.fs.is_dir(&event.path) {
            return None;
        }

        let hidden = is_hidden(&event.path);

        for root in self.recursive_roots() {
            if hidden && root.ignore_hidden {
                continue;
            }
            if !is_within(self.fs.as_ref(), &root.path, &event.path) {
                continue;
            }

            info!(dir = ?event.path, root = ?root.path, "new directory under recursive root");
            if let Err(err) = self.add_recursive(&event.path, root.ignore_hidden) {
                warn!(dir = ?event.path, error = %err, "failed to watch new directory");
            }
            return Some(root.path);
        }

        None
    }

    /// Snapshot of the resolved watch targets, in registration order.
    pub fn targets(&self) -> Vec<PathBuf> {
        self.lock_state().targets.clone()
    }

    /// Snapshot of the recursive roots, in registration order.
    pub fn recursive_roots(&self) -> Vec<RecursiveRoot> {
        self.lock_state().roots.clone()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.lock_state().targets.iter().any(|t| t == path)
    }

    pub fn len(&self) -> usize {
        self.lock_state().targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Attach a running source and subscribe every current target.
    ///
    /// Targets added concurrently are subscribed either here or by `add`
    /// itself, because `add` records the target before looking for a
    /// source and the source is published here before the snapshot.
    pub fn attach(&self, source: Arc<dyn EventSource>) {
        *self.source.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&source));

        for target in self.targets() {
            self.subscribe(source.as_ref(), &target);
        }
    }

    /// Detach the running source, returning it so the caller can close it.
    pub fn detach(&self) -> Option<Arc<dyn EventSource>> {
        self.source
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    fn resolve(&self, path: &Path) -> Result<PathBuf> {
        self.fs
            .canonicalize(path)
            .map_err(|err| WatchflowError::Resolution {
                path: path.to_path_buf(),
                reason: format!("{err:#}"),
            })
    }

    fn subscribe(&self, source: &dyn EventSource, path: &Path) {
        match source.subscribe(path) {
            Ok(()) => {
                if let Some(sink) = &self.announce {
                    sink.write_line(format!("Watching {}", path.display()));
                }
            }
            Err(err) => warn!(path = ?path, error = %err, "failed to subscribe watch target"),
        }
    }

    fn live_source(&self) -> Option<Arc<dyn EventSource>> {
        self.source
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn lock_state(&self) -> MutexGuard<'_, WatchState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
