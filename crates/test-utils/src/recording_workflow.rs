use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use watchflow::errors::WatchflowError;
use watchflow::types::Op;
use watchflow::workflow::{TaskContext, TaskFuture, Workflow};

type MatchFn = Box<dyn Fn(&Path, Op) -> bool + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Behaviour {
    Succeed,
    Fail,
    Panic,
}

/// A workflow that records the source path of every run.
pub struct RecordingWorkflow {
    name: String,
    matcher: MatchFn,
    calls: Arc<Mutex<Vec<PathBuf>>>,
    behaviour: Behaviour,
    delay: Option<Duration>,
}

impl RecordingWorkflow {
    pub fn new<F>(name: &str, matcher: F) -> Self
    where
        F: Fn(&Path, Op) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            matcher: Box::new(matcher),
            calls: Arc::new(Mutex::new(Vec::new())),
            behaviour: Behaviour::Succeed,
            delay: None,
        }
    }

    /// Matches every event.
    pub fn matching_all(name: &str) -> Self {
        Self::new(name, |_, _| true)
    }

    /// Return an error from every run (after recording it).
    pub fn failing(mut self) -> Self {
        self.behaviour = Behaviour::Fail;
        self
    }

    /// Panic in every run (after recording it).
    pub fn panicking(mut self) -> Self {
        self.behaviour = Behaviour::Panic;
        self
    }

    /// Sleep this long inside every run.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Shared handle to the recorded source paths.
    pub fn calls(&self) -> Arc<Mutex<Vec<PathBuf>>> {
        Arc::clone(&self.calls)
    }
}

impl Workflow for RecordingWorkflow {
    fn name(&self) -> &str {
        &self.name
    }

    fn matches(&self, path: &Path, op: Op) -> bool {
        (self.matcher)(path, op)
    }

    fn run<'a>(&'a self, ctx: &'a mut TaskContext) -> TaskFuture<'a> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(ctx.src.clone());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            match self.behaviour {
                Behaviour::Succeed => {
                    ctx.out.write_line(format!("{} ok", self.name));
                    Ok(())
                }
                Behaviour::Fail => {
                    ctx.err.write_line(format!("{} failed", self.name));
                    Err(WatchflowError::Task(format!("{} failed", self.name)))
                }
                Behaviour::Panic => panic!("{} panicked", self.name),
            }
        })
    }
}
