// tests/watch_set.rs

mod common;
use crate::common::{FakeEventSource, init_tracing, project_fs, watch_set_on};

use std::path::PathBuf;
use std::sync::Arc;

use watchflow::errors::WatchflowError;
use watchflow::types::{Op, RawEvent};

fn p(s: &str) -> PathBuf {
    PathBuf::from(s)
}

#[test]
fn watching_the_same_directory_twice_keeps_one_entry() {
    init_tracing();
    let fs = project_fs();
    let watches = watch_set_on(&fs);

    let first = watches.add(&p("/proj/src")).unwrap();
    let second = watches.add(&p("/proj/src")).unwrap();

    assert_eq!(first, second);
    assert_eq!(watches.targets(), vec![p("/proj/src")]);
}

#[test]
fn unresolvable_path_is_reported_and_nothing_is_added() {
    let fs = project_fs();
    let watches = watch_set_on(&fs);

    match watches.add(&p("/proj/missing")) {
        Err(WatchflowError::Resolution { path, .. }) => assert_eq!(path, p("/proj/missing")),
        other => panic!("expected Resolution error, got {other:?}"),
    }
    assert!(watches.is_empty());

    assert!(matches!(
        watches.add_recursive(&p("/nowhere"), true),
        Err(WatchflowError::Resolution { .. })
    ));
    assert!(watches.recursive_roots().is_empty());
}

#[test]
fn recursive_registration_skips_hidden_subtrees() {
    let fs = project_fs();
    let watches = watch_set_on(&fs);

    watches.add_recursive(&p("/proj"), true).unwrap();

    let targets = watches.targets();
    assert!(targets.contains(&p("/proj")));
    assert!(targets.contains(&p("/proj/src")));
    assert!(targets.contains(&p("/proj/src/nested")));
    assert!(targets.contains(&p("/proj/docs")));
    assert!(!targets.iter().any(|t| t.starts_with("/proj/.git")));
    // Files are never watch targets.
    assert!(!targets.contains(&p("/proj/src/main.rs")));

    let roots = watches.recursive_roots();
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].path, p("/proj"));
    assert!(roots[0].ignore_hidden);
}

#[test]
fn recursive_registration_can_include_hidden_subtrees() {
    let fs = project_fs();
    let watches = watch_set_on(&fs);

    watches.add_recursive(&p("/proj"), false).unwrap();

    assert!(watches.contains(&p("/proj/.git")));
    assert!(watches.contains(&p("/proj/.git/objects")));
}

#[test]
fn unreadable_subdirectory_does_not_abort_the_walk() {
    let fs = project_fs();
    fs.add_dir("/proj/src/nested/deeper");
    fs.deny("/proj/src");
    let watches = watch_set_on(&fs);

    watches.add_recursive(&p("/proj"), true).unwrap();

    // The unreadable directory itself is listed, its children are not,
    // and siblings are unaffected.
    assert!(watches.contains(&p("/proj/src")));
    assert!(!watches.contains(&p("/proj/src/nested")));
    assert!(watches.contains(&p("/proj/docs")));
}

#[test]
fn targets_added_while_attached_are_subscribed_immediately() {
    let fs = project_fs();
    let watches = watch_set_on(&fs);
    watches.add(&p("/proj/src")).unwrap();

    let (source, _rx) = FakeEventSource::new();
    watches.attach(source.clone());
    assert_eq!(source.subscriptions(), vec![p("/proj/src")]);

    watches.add(&p("/proj/docs")).unwrap();
    assert!(source.is_subscribed("/proj/docs"));

    // Duplicates are not re-subscribed.
    watches.add(&p("/proj/docs")).unwrap();
    assert_eq!(source.subscriptions().len(), 2);

    assert!(watches.detach().is_some());
    watches.add(&p("/proj/src/nested")).unwrap();
    assert_eq!(source.subscriptions().len(), 2);
}

#[test]
fn new_directory_deep_under_a_root_is_picked_up() {
    let fs = project_fs();
    let watches = watch_set_on(&fs);
    watches.add_recursive(&p("/proj"), true).unwrap();

    fs.add_dir("/proj/src/new/inner");
    let root = watches.rescan(&RawEvent::new("/proj/src/new", Op::CREATE));

    assert_eq!(root, Some(p("/proj")));
    assert!(watches.contains(&p("/proj/src/new")));
    assert!(watches.contains(&p("/proj/src/new/inner")));
    // The new directory becomes a recursive root with the inherited policy.
    assert!(
        watches
            .recursive_roots()
            .iter()
            .any(|r| r.path == p("/proj/src/new") && r.ignore_hidden)
    );
}

#[test]
fn renamed_directory_is_picked_up() {
    let fs = project_fs();
    let watches = watch_set_on(&fs);
    watches.add_recursive(&p("/proj"), true).unwrap();

    fs.add_dir("/proj/docs/moved");
    assert!(
        watches
            .rescan(&RawEvent::new("/proj/docs/moved", Op::RENAME))
            .is_some()
    );
    assert!(watches.contains(&p("/proj/docs/moved")));
}

#[test]
fn rescan_ignores_files_and_other_operations() {
    let fs = project_fs();
    let watches = watch_set_on(&fs);
    watches.add_recursive(&p("/proj"), true).unwrap();
    let before = watches.len();

    fs.add_file("/proj/src/lib.rs");
    assert_eq!(watches.rescan(&RawEvent::new("/proj/src/lib.rs", Op::CREATE)), None);

    fs.add_dir("/proj/src/other");
    assert_eq!(watches.rescan(&RawEvent::new("/proj/src/other", Op::WRITE)), None);
    assert_eq!(
        watches.rescan(&RawEvent::new("/proj/src/other", Op::CREATE | Op::WRITE)),
        None
    );

    assert_eq!(watches.len(), before);
}

#[test]
fn rescan_outside_every_root_adds_nothing() {
    let fs = project_fs();
    fs.add_dir("/elsewhere");
    fs.add_dir("/proj-sibling/new");
    let watches = watch_set_on(&fs);
    watches.add_recursive(&p("/proj"), true).unwrap();
    let before = watches.len();

    assert_eq!(watches.rescan(&RawEvent::new("/elsewhere", Op::CREATE)), None);
    // Shares a string prefix with the root but is not inside it.
    assert_eq!(watches.rescan(&RawEvent::new("/proj-sibling/new", Op::CREATE)), None);
    assert_eq!(watches.len(), before);
}

#[test]
fn hidden_named_root_is_watched_but_its_hidden_children_are_not() {
    let fs = project_fs();
    fs.add_dir("/proj/.cfg/app");
    fs.add_dir("/proj/.cfg/.cache");
    let watches = watch_set_on(&fs);

    watches.add_recursive(&p("/proj/.cfg"), true).unwrap();

    assert!(watches.contains(&p("/proj/.cfg")));
    assert!(watches.contains(&p("/proj/.cfg/app")));
    assert!(!watches.contains(&p("/proj/.cfg/.cache")));
}

#[test]
fn hidden_directory_is_skipped_by_hidden_ignoring_root_only() {
    let fs = project_fs();
    fs.add_dir("/proj/src/.cache");
    let watches = watch_set_on(&fs);
    watches.add_recursive(&p("/proj/src"), true).unwrap();

    let event = RawEvent::new("/proj/src/.cache", Op::CREATE);
    assert_eq!(watches.rescan(&event), None);
    assert!(!watches.contains(&p("/proj/src/.cache")));

    // A second root that admits hidden directories takes it.
    watches.add_recursive(&p("/proj"), false).unwrap();
    assert_eq!(watches.rescan(&event), Some(p("/proj")));
    assert!(watches.contains(&p("/proj/src/.cache")));
}

#[test]
fn first_registered_matching_root_wins() {
    let fs = project_fs();
    let watches = watch_set_on(&fs);
    watches.add_recursive(&p("/proj"), true).unwrap();
    watches.add_recursive(&p("/proj/src"), false).unwrap();

    fs.add_dir("/proj/src/fresh");
    assert_eq!(
        watches.rescan(&RawEvent::new("/proj/src/fresh", Op::CREATE)),
        Some(p("/proj"))
    );
}

#[test]
fn concurrent_rescans_neither_lose_nor_duplicate_targets() {
    let fs = project_fs();
    let watches = watch_set_on(&fs);
    watches.add_recursive(&p("/proj"), true).unwrap();

    let new_dirs: Vec<PathBuf> = (0..32).map(|i| p(&format!("/proj/src/d{i}"))).collect();
    for dir in &new_dirs {
        fs.add_dir(dir);
    }

    // Two rescans per directory, racing each other.
    let handles: Vec<_> = new_dirs
        .iter()
        .chain(new_dirs.iter())
        .cloned()
        .map(|dir| {
            let watches = Arc::clone(&watches);
            std::thread::spawn(move || watches.rescan(&RawEvent::new(dir, Op::CREATE)))
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let targets = watches.targets();
    for dir in &new_dirs {
        assert_eq!(targets.iter().filter(|t| *t == dir).count(), 1, "{dir:?}");
    }
}
