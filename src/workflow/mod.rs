// src/workflow/mod.rs

//! Workflows and the tasks they run.
//!
//! A [`Workflow`] is a match predicate over `(path, op)` plus something to
//! run when it matches. The dispatcher only ever calls through the trait.
//! [`PatternWorkflow`] is the stock implementation built from config: a set
//! of regex/glob patterns and an ordered chain of [`Task`]s sharing one
//! [`TaskContext`].

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use crate::errors::Result;
use crate::types::Op;

pub mod command;
pub mod pattern;
pub mod sink;

pub use command::CommandTask;
pub use pattern::{PathMatcher, PatternWorkflow};
pub use sink::Sink;

/// Boxed future returned by [`Workflow::run`] and [`Task::run`].
pub type TaskFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// A match predicate plus the work to do on a match.
pub trait Workflow: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    fn matches(&self, path: &Path, op: Op) -> bool;

    /// Run the workflow for one event. Failures should already have been
    /// reported on `ctx.err` by the time the error is returned.
    fn run<'a>(&'a self, ctx: &'a mut TaskContext) -> TaskFuture<'a>;
}

/// One step of a workflow's task chain.
///
/// By convention a task sets `ctx.target = ctx.src` when it starts, resets
/// `ctx.buf`, writes a "running" line to `ctx.out`, and writes `ok` on
/// success. On failure it returns the error after flushing whatever output
/// it captured.
pub trait Task: Send + Sync {
    fn label(&self) -> &str;

    fn run<'a>(&'a self, ctx: &'a mut TaskContext) -> TaskFuture<'a>;
}

/// Per-dispatch state threaded through a task chain.
#[derive(Debug)]
pub struct TaskContext {
    /// Path of the event that triggered the workflow.
    pub src: PathBuf,
    /// Path later tasks should operate on; tasks may point it at a derived
    /// artifact.
    pub target: PathBuf,
    pub out: Sink,
    pub err: Sink,
    /// Scratch buffer reused across the chain.
    pub buf: Vec<u8>,
    pub verbose: bool,
}

impl TaskContext {
    pub fn new(src: impl Into<PathBuf>, out: Sink, err: Sink, verbose: bool) -> Self {
        Self {
            src: src.into(),
            target: PathBuf::new(),
            out,
            err,
            buf: Vec::new(),
            verbose,
        }
    }
}
