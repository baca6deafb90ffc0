// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod types;
pub mod watch;
pub mod workflow;

use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::model::{ConfigFile, WatchConfig};
use crate::config::{default_config_path, load_and_validate, load_or_default};
use crate::engine::{Pipeline, PipelineOptions};
use crate::workflow::PatternWorkflow;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (+ CLI overrides)
/// - pipeline construction (watches + workflows)
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let mut cfg = match &args.config {
        Some(path) => load_and_validate(path)?,
        None => load_or_default(default_config_path())?,
    };
    apply_cli_overrides(&mut cfg, &args);

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let pipeline = build_pipeline(&cfg)?;

    pipeline
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("failed to listen for Ctrl+C: {e}");
                // Without a signal handler there is no way to stop cleanly;
                // keep running until the process is killed.
                std::future::pending::<()>().await;
            }
            info!("Ctrl+C received; stopping pipeline");
        })
        .await?;

    Ok(())
}

/// Merge command-line flags into the loaded configuration.
///
/// CLI watches are appended after the config file's; scalar flags override.
pub fn apply_cli_overrides(cfg: &mut ConfigFile, args: &CliArgs) {
    for path in &args.watch {
        cfg.push_watch(WatchConfig {
            path: path.clone(),
            recursive: false,
            include_hidden: false,
        });
    }
    for path in &args.recursive {
        cfg.push_watch(WatchConfig {
            path: path.clone(),
            recursive: true,
            include_hidden: args.include_hidden,
        });
    }

    let section = cfg.pipeline_mut();
    if args.verbose {
        section.verbose = true;
    }
    if let Some(ms) = args.batch_interval_ms {
        // Zero would make the batcher spin.
        section.batch_interval_ms = ms.max(1);
    }
}

/// Build a configured pipeline: register every watch root and every
/// workflow from `cfg`.
///
/// Watch paths that cannot be resolved are reported and skipped, so a
/// typo in one root does not prevent the others from being watched.
pub fn build_pipeline(cfg: &ConfigFile) -> crate::errors::Result<Pipeline> {
    let section = cfg.pipeline();
    let mut pipeline = Pipeline::new(PipelineOptions {
        name: section.name.clone(),
        batch_interval: Duration::from_millis(section.batch_interval_ms),
        verbose: section.verbose,
    });

    for watch in cfg.watches() {
        let res = if watch.recursive {
            pipeline.watch_recursive(&watch.path, !watch.include_hidden)
        } else {
            pipeline.watch(&watch.path).map(|_| ())
        };
        if let Err(err) = res {
            warn!(path = ?watch.path, error = %err, "skipping watch root");
        }
    }

    for workflow in cfg.workflows() {
        pipeline.add_workflow(PatternWorkflow::from_config(workflow)?);
    }

    debug!(?pipeline, "pipeline built");
    Ok(pipeline)
}

/// Simple dry-run output: print the pipeline settings, watches and workflows.
fn print_dry_run(cfg: &ConfigFile) {
    let section = cfg.pipeline();
    println!("watchflow dry-run");
    println!("  pipeline.name = {}", section.name);
    println!("  pipeline.verbose = {}", section.verbose);
    println!("  pipeline.batch_interval_ms = {}", section.batch_interval_ms);
    println!();

    println!("watches ({}):", cfg.watches().len());
    for watch in cfg.watches() {
        let mode = match (watch.recursive, watch.include_hidden) {
            (false, _) => "",
            (true, false) => " (recursive)",
            (true, true) => " (recursive, including hidden)",
        };
        println!("  - {}{mode}", watch.path.display());
    }
    println!();

    println!("workflows ({}):", cfg.workflows().len());
    for workflow in cfg.workflows() {
        println!("  - {}", workflow.name);
        if !workflow.patterns.is_empty() {
            println!("      match: {:?}", workflow.patterns);
        }
        if !workflow.glob.is_empty() {
            println!("      glob: {:?}", workflow.glob);
        }
        if !workflow.ops.is_empty() {
            println!("      ops: {:?}", workflow.ops);
        }
        for task in &workflow.task {
            println!("      task: {}", task.cmd);
            if let Some(ref target) = task.target {
                println!("        target: {target}");
            }
            if task.fail_on_output {
                println!("        fail_on_output: true");
            }
        }
    }

    debug!("dry-run complete (no watching)");
}
