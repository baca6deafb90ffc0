// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [pipeline]
/// name = "rust project"
/// verbose = true
/// batch_interval_ms = 300
///
/// [[watch]]
/// path = "src"
/// recursive = true
///
/// [[workflow]]
/// name = "check"
/// match = ['\.rs$']
/// ops = ["create", "write", "rename"]
///
/// [[workflow.task]]
/// cmd = "cargo check"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    /// Pipeline-wide settings from `[pipeline]`.
    #[serde(default)]
    pub pipeline: PipelineSection,

    /// Watch roots from `[[watch]]`, in file order.
    #[serde(default)]
    pub watch: Vec<WatchConfig>,

    /// Workflows from `[[workflow]]`, in file order (which is also the order
    /// they are evaluated in).
    #[serde(default)]
    pub workflow: Vec<WorkflowConfig>,
}

/// Validated configuration. Obtain one through `ConfigFile::try_from` or
/// [`crate::config::load_and_validate`].
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pipeline: PipelineSection,
    watch: Vec<WatchConfig>,
    workflow: Vec<WorkflowConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        pipeline: PipelineSection,
        watch: Vec<WatchConfig>,
        workflow: Vec<WorkflowConfig>,
    ) -> Self {
        Self {
            pipeline,
            watch,
            workflow,
        }
    }

    pub fn pipeline(&self) -> &PipelineSection {
        &self.pipeline
    }

    pub fn watches(&self) -> &[WatchConfig] {
        &self.watch
    }

    pub fn workflows(&self) -> &[WorkflowConfig] {
        &self.workflow
    }

    pub(crate) fn pipeline_mut(&mut self) -> &mut PipelineSection {
        &mut self.pipeline
    }

    pub(crate) fn push_watch(&mut self, watch: WatchConfig) {
        self.watch.push(watch);
    }
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineSection {
    /// Display name used in warnings. Defaults to `<UNNAMED>`.
    #[serde(default = "default_name")]
    pub name: String,

    /// Echo watched directories and every event to the output sink.
    #[serde(default)]
    pub verbose: bool,

    /// Length of one coalescing window in milliseconds.
    #[serde(default = "default_batch_interval_ms")]
    pub batch_interval_ms: u64,
}

pub(crate) fn default_name() -> String {
    "<UNNAMED>".to_string()
}

fn default_batch_interval_ms() -> u64 {
    300
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            name: default_name(),
            verbose: false,
            batch_interval_ms: default_batch_interval_ms(),
        }
    }
}

/// `[[watch]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchConfig {
    /// Directory to watch, relative to the working directory or absolute.
    pub path: PathBuf,

    /// Keep the whole subtree under watch, including directories created
    /// later.
    #[serde(default)]
    pub recursive: bool,

    /// Also descend into hidden directories (only meaningful with
    /// `recursive = true`).
    #[serde(default)]
    pub include_hidden: bool,
}

/// `[[workflow]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkflowConfig {
    pub name: String,

    /// Regular expressions tested against the absolute event path. Any
    /// match is enough.
    #[serde(default, rename = "match")]
    pub patterns: Vec<String>,

    /// Glob patterns tested against the absolute event path. Any match is
    /// enough.
    #[serde(default)]
    pub glob: Vec<String>,

    /// Operation names (`create`, `write`, `remove`, `rename`, `chmod`,
    /// `all`). Empty means every operation.
    #[serde(default)]
    pub ops: Vec<String>,

    /// Task chain, run in order for each matching event.
    #[serde(default)]
    pub task: Vec<TaskConfig>,
}

/// `[[workflow.task]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskConfig {
    /// Shell command. Supports `{src}`, `{target}`, `{dir}`, `{name}`,
    /// `{stem}` and `{ext}` placeholders.
    pub cmd: String,

    /// Text for the "running" line; defaults to the command itself.
    #[serde(default)]
    pub label: Option<String>,

    /// Working directory template.
    #[serde(default)]
    pub dir: Option<String>,

    /// Template for the derived artifact path handed to later tasks.
    #[serde(default)]
    pub target: Option<String>,

    /// Treat any stdout output as failure (linter convention).
    #[serde(default)]
    pub fail_on_output: bool,
}
