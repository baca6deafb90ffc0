// src/engine/dispatch.rs

//! Matching events against workflows and running the ones that match.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::types::RawEvent;
use crate::workflow::{Sink, TaskContext, Workflow};

/// Evaluates every registered workflow, in registration order, for each
/// event and runs every workflow that matches.
///
/// Each run gets a fresh [`TaskContext`] and is awaited before the next
/// workflow is considered, so dispatch for one event never overlaps with
/// dispatch for the next. Failures and panics inside a workflow are
/// contained here. Dropping a pending [`WorkflowDispatcher::dispatch`]
/// future stops waiting for the run in progress but leaves it running.
#[derive(Clone)]
pub struct WorkflowDispatcher {
    workflows: Vec<Arc<dyn Workflow>>,
    out: Sink,
    err: Sink,
    verbose: bool,
}

impl fmt::Debug for WorkflowDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.workflows.iter().map(|w| w.name()).collect();
        f.debug_struct("WorkflowDispatcher")
            .field("workflows", &names)
            .field("verbose", &self.verbose)
            .finish_non_exhaustive()
    }
}

impl WorkflowDispatcher {
    pub fn new(workflows: Vec<Arc<dyn Workflow>>, out: Sink, err: Sink, verbose: bool) -> Self {
        Self {
            workflows,
            out,
            err,
            verbose,
        }
    }

    /// Dispatch one event. Returns how many workflows matched.
    pub async fn dispatch(&self, event: &RawEvent) -> usize {
        if self.verbose {
            self.out
                .write_line(format!("Watcher event {} {}", event.path.display(), event.op));
        }

        let mut matched = 0;
        for workflow in &self.workflows {
            if !self.evaluate(workflow.as_ref(), event) {
                continue;
            }
            matched += 1;
            self.run_workflow(Arc::clone(workflow), event).await;
        }
        matched
    }

    fn evaluate(&self, workflow: &dyn Workflow, event: &RawEvent) -> bool {
        match catch_unwind(AssertUnwindSafe(|| workflow.matches(&event.path, event.op))) {
            Ok(matched) => matched,
            Err(_) => {
                error!(workflow = %workflow.name(), path = ?event.path, "workflow match panicked");
                false
            }
        }
    }

    async fn run_workflow(&self, workflow: Arc<dyn Workflow>, event: &RawEvent) {
        let name = workflow.name().to_string();
        let ctx = TaskContext::new(
            event.path.clone(),
            self.out.clone(),
            self.err.clone(),
            self.verbose,
        );

        debug!(workflow = %name, path = ?event.path, op = %event.op, "running workflow");

        // Own task so a panic surfaces as a JoinError instead of unwinding
        // through the dispatch loop.
        // Dropping the handle (a stop abandoning this dispatch) detaches the
        // run rather than cancelling it.
        let handle = tokio::spawn(async move {
            let mut ctx = ctx;
            workflow.run(&mut ctx).await
        });

        match handle.await {
            Ok(Ok(())) => debug!(workflow = %name, "workflow finished"),
            Ok(Err(err)) => {
                warn!(workflow = %name, path = ?event.path, error = %err, "workflow failed")
            }
            Err(join_err) => error!(
                workflow = %name,
                path = ?event.path,
                error = %join_err,
                "workflow aborted"
            ),
        }
    }
}
