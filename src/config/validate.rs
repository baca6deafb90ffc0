// src/config/validate.rs

use std::collections::HashSet;

use globset::Glob;
use regex::Regex;

use crate::config::model::{ConfigFile, RawConfigFile, WorkflowConfig};
use crate::errors::{Result, WatchflowError};
use crate::types::Op;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::WatchflowError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.pipeline, raw.watch, raw.workflow))
    }
}

/// Combine operation names into one mask. An empty list means every
/// operation.
pub fn parse_ops(names: &[String]) -> Result<Op> {
    if names.is_empty() {
        return Ok(Op::ALL);
    }
    let mut mask = Op::empty();
    for name in names {
        mask |= name.parse::<Op>().map_err(WatchflowError::ConfigError)?;
    }
    Ok(mask)
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_pipeline_section(cfg)?;
    validate_watches(cfg)?;
    validate_workflow_names(cfg)?;
    for workflow in &cfg.workflow {
        validate_workflow(workflow)?;
    }
    Ok(())
}

fn validate_pipeline_section(cfg: &RawConfigFile) -> Result<()> {
    if cfg.pipeline.batch_interval_ms == 0 {
        return Err(WatchflowError::ConfigError(
            "[pipeline].batch_interval_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_watches(cfg: &RawConfigFile) -> Result<()> {
    for watch in &cfg.watch {
        if watch.path.as_os_str().is_empty() {
            return Err(WatchflowError::ConfigError(
                "[[watch]] entry has an empty path".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_workflow_names(cfg: &RawConfigFile) -> Result<()> {
    let mut seen = HashSet::new();
    for workflow in &cfg.workflow {
        if workflow.name.trim().is_empty() {
            return Err(WatchflowError::ConfigError(
                "[[workflow]] entry has an empty name".to_string(),
            ));
        }
        if !seen.insert(workflow.name.as_str()) {
            return Err(WatchflowError::ConfigError(format!(
                "workflow '{}' is defined more than once",
                workflow.name
            )));
        }
    }
    Ok(())
}

fn validate_workflow(workflow: &WorkflowConfig) -> Result<()> {
    let name = &workflow.name;

    if workflow.patterns.is_empty() && workflow.glob.is_empty() {
        return Err(WatchflowError::ConfigError(format!(
            "workflow '{name}' needs at least one `match` or `glob` pattern"
        )));
    }

    if workflow.task.is_empty() {
        return Err(WatchflowError::ConfigError(format!(
            "workflow '{name}' has no [[workflow.task]] entries"
        )));
    }

    for pattern in &workflow.patterns {
        Regex::new(pattern).map_err(|e| {
            WatchflowError::ConfigError(format!(
                "workflow '{name}' has an invalid match pattern {pattern:?}: {e}"
            ))
        })?;
    }

    for pattern in &workflow.glob {
        Glob::new(pattern).map_err(|e| {
            WatchflowError::ConfigError(format!(
                "workflow '{name}' has an invalid glob {pattern:?}: {e}"
            ))
        })?;
    }

    parse_ops(&workflow.ops).map_err(|e| match e {
        WatchflowError::ConfigError(msg) => {
            WatchflowError::ConfigError(format!("workflow '{name}': {msg}"))
        }
        other => other,
    })?;

    for (idx, task) in workflow.task.iter().enumerate() {
        if task.cmd.trim().is_empty() {
            return Err(WatchflowError::ConfigError(format!(
                "workflow '{name}' task #{} has an empty cmd",
                idx + 1
            )));
        }
    }

    Ok(())
}
