// tests/config_loading.rs

mod common;
use crate::common::builders::{ConfigFileBuilder, WorkflowConfigBuilder};
use crate::common::init_tracing;

use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use tempfile::NamedTempFile;

use watchflow::cli::CliArgs;
use watchflow::config::{ConfigFile, load_and_validate, load_or_default, parse_ops};
use watchflow::errors::WatchflowError;
use watchflow::logging::build_filter;
use watchflow::types::Op;
use watchflow::workflow::{PatternWorkflow, Workflow};
use watchflow::{apply_cli_overrides, build_pipeline};

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn config_error(contents: &str) -> String {
    let file = write_config(contents);
    match load_and_validate(file.path()) {
        Err(WatchflowError::ConfigError(msg)) => msg,
        other => panic!("expected config error, got {other:?}"),
    }
}

#[test]
fn full_config_is_loaded_with_defaults_applied() {
    let file = write_config(
        r#"
[pipeline]
name = "rust project"
verbose = true

[[watch]]
path = "src"
recursive = true

[[watch]]
path = "docs"

[[workflow]]
name = "check"
match = ['\.rs$']
ops = ["create", "write"]

[[workflow.task]]
cmd = "cargo check"
label = "checking"

[[workflow.task]]
cmd = "cc -c {src}"
target = "{dir}/{stem}.o"
fail_on_output = true
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.pipeline().name, "rust project");
    assert!(cfg.pipeline().verbose);
    assert_eq!(cfg.pipeline().batch_interval_ms, 300);

    assert_eq!(cfg.watches().len(), 2);
    assert!(cfg.watches()[0].recursive);
    assert!(!cfg.watches()[0].include_hidden);
    assert_eq!(cfg.watches()[1].path, PathBuf::from("docs"));
    assert!(!cfg.watches()[1].recursive);

    let workflow = &cfg.workflows()[0];
    assert_eq!(workflow.patterns, vec![r"\.rs$".to_string()]);
    assert_eq!(workflow.task.len(), 2);
    assert_eq!(workflow.task[0].label.as_deref(), Some("checking"));
    assert_eq!(workflow.task[1].target.as_deref(), Some("{dir}/{stem}.o"));
    assert!(workflow.task[1].fail_on_output);
}

#[test]
fn empty_file_is_a_valid_config() {
    let file = write_config("");
    let cfg = load_and_validate(file.path()).unwrap();
    assert_eq!(cfg.pipeline().name, "<UNNAMED>");
    assert!(cfg.watches().is_empty());
    assert!(cfg.workflows().is_empty());
}

#[test]
fn missing_default_config_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = load_or_default(dir.path().join("Watchflow.toml")).unwrap();
    assert_eq!(cfg.pipeline().batch_interval_ms, 300);
}

#[test]
fn unknown_keys_are_rejected() {
    let file = write_config("[pipeline]\nnmae = \"typo\"\n");
    assert!(matches!(
        load_and_validate(file.path()),
        Err(WatchflowError::TomlError(_))
    ));
}

#[test]
fn invalid_configs_are_rejected_with_a_reason() {
    let msg = config_error("[pipeline]\nbatch_interval_ms = 0\n");
    assert!(msg.contains("batch_interval_ms"), "{msg}");

    let msg = config_error("[[workflow]]\nname = \"w\"\n[[workflow.task]]\ncmd = \"true\"\n");
    assert!(msg.contains("needs at least one `match` or `glob` pattern"), "{msg}");

    let msg = config_error("[[workflow]]\nname = \"w\"\nmatch = ['x']\n");
    assert!(msg.contains("has no [[workflow.task]] entries"), "{msg}");

    let msg = config_error(
        "[[workflow]]\nname = \"w\"\nmatch = ['(unclosed']\n[[workflow.task]]\ncmd = \"true\"\n",
    );
    assert!(msg.contains("invalid match pattern"), "{msg}");

    let msg = config_error(
        "[[workflow]]\nname = \"w\"\nglob = ['a[']\n[[workflow.task]]\ncmd = \"true\"\n",
    );
    assert!(msg.contains("invalid glob"), "{msg}");

    let msg = config_error(
        "[[workflow]]\nname = \"w\"\nmatch = ['x']\nops = [\"touch\"]\n[[workflow.task]]\ncmd = \"true\"\n",
    );
    assert!(msg.starts_with("workflow 'w': invalid operation: touch"), "{msg}");

    let msg = config_error("[[watch]]\npath = \"\"\n");
    assert!(msg.contains("empty path"), "{msg}");
}

#[test]
fn duplicate_workflow_names_are_rejected() {
    let workflow = WorkflowConfigBuilder::new("same").matching("x").task("true").build();
    let raw = ConfigFileBuilder::new()
        .with_workflow(workflow.clone())
        .with_workflow(workflow)
        .build_raw();

    match ConfigFile::try_from(raw) {
        Err(WatchflowError::ConfigError(msg)) => assert!(msg.contains("more than once"), "{msg}"),
        other => panic!("expected duplicate-name error, got {other:?}"),
    }
}

#[test]
fn operation_names_combine_into_a_mask() {
    assert_eq!(parse_ops(&[]).unwrap(), Op::ALL);
    assert_eq!(
        parse_ops(&["create".to_string(), "RENAME".to_string()]).unwrap(),
        Op::CREATE | Op::RENAME
    );
    assert!(parse_ops(&["delete".to_string()]).is_err());
}

#[test]
fn workflow_from_config_honours_patterns_and_ops() {
    let cfg = WorkflowConfigBuilder::new("go")
        .matching(r"\.go$")
        .glob("**/*.mod")
        .op("write")
        .task("go build")
        .build();
    let workflow = PatternWorkflow::from_config(&cfg).unwrap();

    assert_eq!(workflow.name(), "go");
    assert!(workflow.matches(&PathBuf::from("/src/main.go"), Op::WRITE));
    assert!(workflow.matches(&PathBuf::from("/src/go.mod"), Op::WRITE));
    assert!(!workflow.matches(&PathBuf::from("/src/main.go"), Op::CREATE));
    assert!(!workflow.matches(&PathBuf::from("/src/main.rs"), Op::WRITE));
    assert_eq!(workflow.tasks().count(), 1);
}

#[test]
fn cli_flags_extend_and_override_the_config() {
    let mut cfg = ConfigFileBuilder::new().watch("from-file").build();
    let args = CliArgs::parse_from([
        "watchflow",
        "--watch",
        "extra",
        "-r",
        "tree",
        "--include-hidden",
        "-v",
        "--batch-interval-ms",
        "0",
    ]);

    apply_cli_overrides(&mut cfg, &args);

    let paths: Vec<_> = cfg.watches().iter().map(|w| w.path.clone()).collect();
    assert_eq!(
        paths,
        vec![
            PathBuf::from("from-file"),
            PathBuf::from("extra"),
            PathBuf::from("tree")
        ]
    );
    assert!(cfg.watches()[2].recursive);
    assert!(cfg.watches()[2].include_hidden);
    assert!(cfg.pipeline().verbose);
    assert_eq!(cfg.pipeline().batch_interval_ms, 1);
}

#[test]
fn build_pipeline_registers_watches_and_skips_missing_ones() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("sub/inner")).unwrap();
    std::fs::create_dir_all(dir.path().join(".hidden")).unwrap();

    let cfg = ConfigFileBuilder::new()
        .name("built")
        .batch_interval_ms(50)
        .watch(dir.path().join("does-not-exist"))
        .watch_recursive(dir.path(), false)
        .with_workflow(
            WorkflowConfigBuilder::new("all")
                .matching(".*")
                .task("true")
                .build(),
        )
        .build();

    let pipeline = build_pipeline(&cfg).unwrap();

    let root = dir.path().canonicalize().unwrap();
    assert_eq!(pipeline.name(), "built");
    assert_eq!(pipeline.options().batch_interval.as_millis(), 50);
    assert!(pipeline.watches().contains(&root));
    assert!(pipeline.watches().contains(&root.join("sub/inner")));
    assert!(!pipeline.watches().contains(&root.join(".hidden")));
    assert_eq!(pipeline.workflows().len(), 1);
}

#[test]
fn log_filter_accepts_levels_and_directive_lists() {
    assert!(build_filter(None, None).unwrap().to_string().contains("info"));
    assert!(build_filter(None, Some("debug")).unwrap().to_string().contains("debug"));
    assert!(
        build_filter(None, Some("watchflow=trace,notify=warn"))
            .unwrap()
            .to_string()
            .contains("watchflow=trace")
    );
    assert!(
        build_filter(Some(watchflow::cli::LogLevel::Warn), Some("trace"))
            .unwrap()
            .to_string()
            .contains("warn")
    );
}
