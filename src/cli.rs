// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `watchflow`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "watchflow",
    version,
    about = "Watch directory trees and run workflows when matching files change.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Watchflow.toml` in the current working directory; a missing
    /// default file is not an error.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Watch a single directory (repeatable).
    #[arg(long = "watch", value_name = "DIR")]
    pub watch: Vec<PathBuf>,

    /// Watch a directory tree, following new subdirectories (repeatable).
    #[arg(long = "recursive", short = 'r', value_name = "DIR")]
    pub recursive: Vec<PathBuf>,

    /// Descend into hidden directories for `--recursive` roots.
    #[arg(long)]
    pub include_hidden: bool,

    /// Echo watched directories and every event to stdout.
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Length of one coalescing window, in milliseconds.
    #[arg(long, value_name = "MS")]
    pub batch_interval_ms: Option<u64>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `WATCHFLOW_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the pipeline, but don't watch anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
