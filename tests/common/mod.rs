#![allow(dead_code)]

use std::sync::Arc;

use watchflow::fs::mock::MockFileSystem;
use watchflow::watch::WatchSet;

pub use watchflow_test_utils::builders;
pub use watchflow_test_utils::{
    FakeEventSource, RecordingWorkflow, eventually, init_tracing, with_timeout,
};

/// A small project tree:
///
/// ```text
/// /proj
/// ├── src
/// │   ├── main.rs
/// │   └── nested
/// ├── docs
/// └── .git
///     └── objects
/// ```
pub fn project_fs() -> MockFileSystem {
    let fs = MockFileSystem::new();
    fs.add_file("/proj/src/main.rs");
    fs.add_dir("/proj/src/nested");
    fs.add_dir("/proj/docs");
    fs.add_dir("/proj/.git/objects");
    fs
}

pub fn watch_set_on(fs: &MockFileSystem) -> Arc<WatchSet> {
    Arc::new(WatchSet::new(Arc::new(fs.clone())))
}
