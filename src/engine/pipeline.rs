// src/engine/pipeline.rs

//! The pipeline orchestrator.
//!
//! The lifecycle is encoded in two types:
//! - [`Pipeline`] is the *configured* state: watches and workflows can be
//!   registered, nothing is running.
//! - [`RunningPipeline`] is returned by [`Pipeline::start`]. It owns the
//!   batcher and dispatch loop tasks and hands out [`StopHandle`]s. Once a
//!   stop has been requested and [`RunningPipeline::wait`] returns, the
//!   pipeline is stopped for good.

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::engine::dispatch::WorkflowDispatcher;
use crate::engine::shutdown::{StopHandle, StopSignal, stop_channel};
use crate::errors::{Result, WatchflowError};
use crate::fs::{FileSystem, RealFileSystem};
use crate::types::{EventBatch, RawEvent};
use crate::watch::batcher::{Batcher, DEFAULT_BATCH_INTERVAL};
use crate::watch::source::{EventSource, NotifyEventSource};
use crate::watch::watch_set::WatchSet;
use crate::workflow::{Sink, Workflow};

/// Capacity of the channel between the batcher and the dispatch loop.
///
/// While a slow workflow holds up dispatch, the batcher waits in `send`
/// with at most one finished batch queued. Raw events keep accumulating in
/// the unbounded source channel meanwhile; nothing bounds that backlog.
const BATCH_CHANNEL_CAPACITY: usize = 1;

/// Pipeline-wide settings.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Name used in warnings. Defaults to `<UNNAMED>`.
    pub name: String,
    /// Length of one coalescing window. Defaults to 300ms.
    pub batch_interval: Duration,
    /// Echo watched directories, resolution errors and every event to the
    /// output sink. Off by default.
    pub verbose: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            name: crate::config::model::default_name(),
            batch_interval: DEFAULT_BATCH_INTERVAL,
            verbose: false,
        }
    }
}

/// A configured, not yet running pipeline.
pub struct Pipeline {
    options: PipelineOptions,
    watches: Arc<WatchSet>,
    workflows: Vec<Arc<dyn Workflow>>,
    out: Sink,
    err: Sink,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.workflows.iter().map(|w| w.name()).collect();
        f.debug_struct("Pipeline")
            .field("options", &self.options)
            .field("watches", &self.watches)
            .field("workflows", &names)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Pipeline on the real filesystem writing to stdout/stderr.
    pub fn new(options: PipelineOptions) -> Self {
        Self::with_parts(
            options,
            Arc::new(RealFileSystem),
            Sink::stdout(),
            Sink::stderr(),
        )
    }

    pub fn with_parts(
        options: PipelineOptions,
        fs: Arc<dyn FileSystem>,
        out: Sink,
        err: Sink,
    ) -> Self {
        let mut watches = WatchSet::new(fs);
        if options.verbose {
            watches = watches.with_announcements(out.clone());
        }
        Self {
            options,
            watches: Arc::new(watches),
            workflows: Vec::new(),
            out,
            err,
        }
    }

    pub fn name(&self) -> &str {
        &self.options.name
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn watches(&self) -> &Arc<WatchSet> {
        &self.watches
    }

    pub fn workflows(&self) -> &[Arc<dyn Workflow>] {
        &self.workflows
    }

    /// Watch a single directory. See [`WatchSet::add`].
    pub fn watch(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        watch_one(&self.watches, &self.out, self.options.verbose, path.as_ref())
    }

    /// Watch a directory tree. See [`WatchSet::add_recursive`].
    pub fn watch_recursive(&self, path: impl AsRef<Path>, ignore_hidden: bool) -> Result<()> {
        watch_tree(
            &self.watches,
            &self.out,
            self.options.verbose,
            path.as_ref(),
            ignore_hidden,
        )
    }

    /// Register a workflow. Workflows are evaluated in registration order.
    pub fn add_workflow(&mut self, workflow: impl Workflow + 'static) {
        self.workflows.push(Arc::new(workflow));
    }

    /// Open the platform event source and start the pipeline.
    ///
    /// Fails only if the event source cannot be created; the failure is
    /// also written to the error sink.
    pub fn start(self) -> Result<RunningPipeline> {
        let (source, raw_rx) = match NotifyEventSource::open() {
            Ok(opened) => opened,
            Err(err) => {
                error!(pipeline = %self.options.name, error = %err, "cannot start pipeline");
                self.err.write_line(err.to_string());
                return Err(err);
            }
        };
        Ok(self.start_with_source(Arc::new(source), raw_rx))
    }

    /// Start the pipeline on an already opened event source.
    ///
    /// `raw_rx` must be the receiving end of the channel `source` delivers
    /// its events on.
    pub fn start_with_source(
        self,
        source: Arc<dyn EventSource>,
        raw_rx: mpsc::UnboundedReceiver<RawEvent>,
    ) -> RunningPipeline {
        let Pipeline {
            options,
            watches,
            workflows,
            out,
            err,
        } = self;

        if watches.is_empty() {
            warn!(pipeline = %options.name, "pipeline is not watching anything");
            err.write_line(format!("Pipeline {} is not watching anything", options.name));
        }
        if workflows.is_empty() {
            warn!(pipeline = %options.name, "pipeline has no workflows");
            err.write_line(format!("Pipeline {} has no Workflows", options.name));
        }

        let (stop, signal) = stop_channel();
        let (batch_tx, batch_rx) = mpsc::channel::<EventBatch>(BATCH_CHANNEL_CAPACITY);

        let batcher =
            Batcher::new(options.batch_interval).spawn(raw_rx, batch_tx, signal.clone());

        watches.attach(source);

        let dispatcher = WorkflowDispatcher::new(workflows, out.clone(), err, options.verbose);
        let dispatch_loop = tokio::spawn(dispatch_loop(
            batch_rx,
            dispatcher,
            Arc::clone(&watches),
            signal,
        ));

        info!(
            pipeline = %options.name,
            targets = watches.len(),
            interval_ms = options.batch_interval.as_millis() as u64,
            "pipeline started"
        );

        RunningPipeline {
            name: options.name,
            verbose: options.verbose,
            watches,
            out,
            stop,
            batcher,
            dispatch_loop,
        }
    }

    /// Start the pipeline and keep it running until `shutdown` resolves.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let running = self.start()?;
        shutdown.await;
        running.stop().await
    }
}

/// A started pipeline.
///
/// Dropping every [`StopHandle`] (including the one held here) stops the
/// pipeline as if [`StopHandle::stop`] had been called.
pub struct RunningPipeline {
    name: String,
    verbose: bool,
    watches: Arc<WatchSet>,
    out: Sink,
    stop: StopHandle,
    batcher: JoinHandle<()>,
    dispatch_loop: JoinHandle<()>,
}

impl fmt::Debug for RunningPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunningPipeline")
            .field("name", &self.name)
            .field("watches", &self.watches)
            .finish_non_exhaustive()
    }
}

impl RunningPipeline {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn watches(&self) -> &Arc<WatchSet> {
        &self.watches
    }

    /// Watch another directory; it is subscribed immediately.
    pub fn watch(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        watch_one(&self.watches, &self.out, self.verbose, path.as_ref())
    }

    /// Watch another directory tree; every directory found is subscribed
    /// immediately.
    pub fn watch_recursive(&self, path: impl AsRef<Path>, ignore_hidden: bool) -> Result<()> {
        watch_tree(&self.watches, &self.out, self.verbose, path.as_ref(), ignore_hidden)
    }

    /// Handle that can stop this pipeline from any task or thread.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Request a stop, release the event source and wait until the
    /// pipeline has shut down.
    pub async fn stop(self) -> Result<()> {
        self.stop.stop();
        release_source(&self.watches);
        self.wait().await
    }

    /// Wait until a stop is requested through a [`StopHandle`] and the
    /// batcher and dispatch loop have exited.
    ///
    /// Nothing is dispatched after the stop request is observed. A workflow
    /// run still in progress at that point is not waited for; it keeps
    /// running detached until it finishes or the runtime shuts down.
    pub async fn wait(self) -> Result<()> {
        let RunningPipeline {
            name,
            stop,
            batcher,
            dispatch_loop,
            ..
        } = self;

        // Keep our handle alive until both loops are done so that a stop is
        // only ever triggered explicitly while waiting.
        let _stop = stop;

        dispatch_loop
            .await
            .map_err(|e| WatchflowError::Other(anyhow::anyhow!("dispatch loop failed: {e}")))?;
        batcher
            .await
            .map_err(|e| WatchflowError::Other(anyhow::anyhow!("batcher failed: {e}")))?;

        info!(pipeline = %name, "pipeline stopped");
        Ok(())
    }
}

fn watch_one(watches: &WatchSet, out: &Sink, verbose: bool, path: &Path) -> Result<PathBuf> {
    watches.add(path).inspect_err(|err| report_resolution(out, verbose, err))
}

fn watch_tree(
    watches: &WatchSet,
    out: &Sink,
    verbose: bool,
    path: &Path,
    ignore_hidden: bool,
) -> Result<()> {
    watches
        .add_recursive(path, ignore_hidden)
        .inspect_err(|err| report_resolution(out, verbose, err))
}

fn report_resolution(out: &Sink, verbose: bool, err: &WatchflowError) {
    warn!(error = %err, "cannot watch path");
    if verbose {
        out.write_line(err.to_string());
    }
}

/// Consume batches until stopped. For each event a rescan runs on the
/// blocking pool while the event is dispatched; the two are not ordered
/// relative to each other.
///
/// The stop signal is checked before every event and raced against the
/// dispatch itself, so a hung workflow cannot hold up shutdown.
async fn dispatch_loop(
    mut batch_rx: mpsc::Receiver<EventBatch>,
    dispatcher: WorkflowDispatcher,
    watches: Arc<WatchSet>,
    mut stop: StopSignal,
) {
    'batches: loop {
        let batch = tokio::select! {
            biased;
            _ = stop.stopped() => break,
            batch = batch_rx.recv() => match batch {
                Some(batch) => batch,
                None => break,
            },
        };

        debug!(events = batch.len(), "dispatching batch");

        for event in batch {
            tokio::select! {
                biased;
                _ = stop.stopped() => {
                    debug!(path = ?event.path, "stop requested; abandoning dispatch");
                    break 'batches;
                }
                _ = dispatch_event(&dispatcher, &watches, &event) => {}
            }
        }
    }

    release_source(&watches);
    debug!("dispatch loop finished");
}

async fn dispatch_event(
    dispatcher: &WorkflowDispatcher,
    watches: &Arc<WatchSet>,
    event: &RawEvent,
) {
    spawn_rescan(Arc::clone(watches), event.clone());
    dispatcher.dispatch(event).await;
}

/// Detach and close the live source. Safe to call more than once.
fn release_source(watches: &WatchSet) {
    if let Some(source) = watches.detach() {
        source.close();
    }
}

fn spawn_rescan(watches: Arc<WatchSet>, event: RawEvent) {
    if !event.op.is_dir_op() {
        return;
    }
    tokio::task::spawn_blocking(move || {
        watches.rescan(&event);
    });
}
