// src/workflow/pattern.rs

use std::fmt;
use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::RegexSet;
use tracing::debug;

use crate::config::model::WorkflowConfig;
use crate::config::validate::parse_ops;
use crate::errors::Result;
use crate::types::Op;
use crate::workflow::{CommandTask, Task, TaskContext, TaskFuture, Workflow};

/// Compiled path patterns for one workflow.
///
/// Patterns are evaluated against the absolute event path, with `\`
/// normalised to `/`. A path matches when any regex or any glob matches.
#[derive(Clone)]
pub struct PathMatcher {
    regexes: Option<RegexSet>,
    globs: Option<GlobSet>,
}

impl fmt::Debug for PathMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathMatcher")
            .field("regexes", &self.regexes.as_ref().map(|r| r.patterns()))
            .finish_non_exhaustive()
    }
}

impl PathMatcher {
    pub fn new(regexes: &[String], globs: &[String]) -> Result<Self> {
        let regexes = if regexes.is_empty() {
            None
        } else {
            Some(RegexSet::new(regexes)?)
        };

        let globs = if globs.is_empty() {
            None
        } else {
            Some(build_globset(globs)?)
        };

        Ok(Self { regexes, globs })
    }

    /// Matcher built from regular expressions only.
    pub fn regex<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let patterns: Vec<String> = patterns.iter().map(|p| p.as_ref().to_string()).collect();
        Self::new(&patterns, &[])
    }

    pub fn is_match(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy().replace('\\', "/");
        if let Some(regexes) = &self.regexes {
            if regexes.is_match(&path_str) {
                return true;
            }
        }
        if let Some(globs) = &self.globs {
            if globs.is_match(&path_str) {
                return true;
            }
        }
        false
    }
}

/// Build a GlobSet from simple string patterns.
fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        builder.add(Glob::new(pat)?);
    }
    Ok(builder.build()?)
}

/// Workflow that runs a fixed task chain for events whose path matches a
/// [`PathMatcher`] and whose operation is in `ops`.
pub struct PatternWorkflow {
    name: String,
    matcher: PathMatcher,
    ops: Op,
    tasks: Vec<Box<dyn Task>>,
}

impl fmt::Debug for PatternWorkflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<&str> = self.tasks.iter().map(|t| t.label()).collect();
        f.debug_struct("PatternWorkflow")
            .field("name", &self.name)
            .field("ops", &self.ops)
            .field("tasks", &labels)
            .finish_non_exhaustive()
    }
}

impl PatternWorkflow {
    pub fn new(name: impl Into<String>, matcher: PathMatcher, ops: Op) -> Self {
        Self {
            name: name.into(),
            matcher,
            ops,
            tasks: Vec::new(),
        }
    }

    /// Append a task to the chain.
    pub fn with_task(mut self, task: impl Task + 'static) -> Self {
        self.tasks.push(Box::new(task));
        self
    }

    pub fn tasks(&self) -> impl Iterator<Item = &dyn Task> {
        self.tasks.iter().map(|t| t.as_ref())
    }

    /// Build a workflow (matcher, op mask and command tasks) from its
    /// config section.
    pub fn from_config(cfg: &WorkflowConfig) -> Result<Self> {
        let matcher = PathMatcher::new(&cfg.patterns, &cfg.glob)?;
        let ops = parse_ops(&cfg.ops)?;
        let mut workflow = Self::new(cfg.name.clone(), matcher, ops);
        for task in &cfg.task {
            workflow = workflow.with_task(CommandTask::from_config(task));
        }
        Ok(workflow)
    }
}

impl Workflow for PatternWorkflow {
    fn name(&self) -> &str {
        &self.name
    }

    fn matches(&self, path: &Path, op: Op) -> bool {
        self.ops.intersects(op) && self.matcher.is_match(path)
    }

    fn run<'a>(&'a self, ctx: &'a mut TaskContext) -> TaskFuture<'a> {
        Box::pin(async move {
            for task in &self.tasks {
                if let Err(err) = task.run(ctx).await {
                    ctx.err.write_line(format!("Error: {err}"));
                    debug!(
                        workflow = %self.name,
                        task = %task.label(),
                        error = %err,
                        "task chain stopped"
                    );
                    return Err(err);
                }
            }
            Ok(())
        })
    }
}
