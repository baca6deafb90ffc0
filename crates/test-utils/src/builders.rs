#![allow(dead_code)]

use std::path::PathBuf;

use watchflow::config::{ConfigFile, RawConfigFile, TaskConfig, WatchConfig, WorkflowConfig};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.config.pipeline.name = name.to_string();
        self
    }

    pub fn verbose(mut self, val: bool) -> Self {
        self.config.pipeline.verbose = val;
        self
    }

    pub fn batch_interval_ms(mut self, ms: u64) -> Self {
        self.config.pipeline.batch_interval_ms = ms;
        self
    }

    pub fn watch(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.watch.push(WatchConfig {
            path: path.into(),
            recursive: false,
            include_hidden: false,
        });
        self
    }

    pub fn watch_recursive(mut self, path: impl Into<PathBuf>, include_hidden: bool) -> Self {
        self.config.watch.push(WatchConfig {
            path: path.into(),
            recursive: true,
            include_hidden,
        });
        self
    }

    pub fn with_workflow(mut self, workflow: WorkflowConfig) -> Self {
        self.config.workflow.push(workflow);
        self
    }

    /// The raw (unvalidated) config, for tests that exercise validation.
    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `WorkflowConfig`.
pub struct WorkflowConfigBuilder {
    workflow: WorkflowConfig,
}

impl WorkflowConfigBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            workflow: WorkflowConfig {
                name: name.to_string(),
                patterns: vec![],
                glob: vec![],
                ops: vec![],
                task: vec![],
            },
        }
    }

    pub fn matching(mut self, pattern: &str) -> Self {
        self.workflow.patterns.push(pattern.to_string());
        self
    }

    pub fn glob(mut self, pattern: &str) -> Self {
        self.workflow.glob.push(pattern.to_string());
        self
    }

    pub fn op(mut self, op: &str) -> Self {
        self.workflow.ops.push(op.to_string());
        self
    }

    pub fn task(mut self, cmd: &str) -> Self {
        self.workflow.task.push(TaskConfig {
            cmd: cmd.to_string(),
            label: None,
            dir: None,
            target: None,
            fail_on_output: false,
        });
        self
    }

    pub fn with_task(mut self, task: TaskConfig) -> Self {
        self.workflow.task.push(task);
        self
    }

    pub fn build(self) -> WorkflowConfig {
        self.workflow
    }
}
