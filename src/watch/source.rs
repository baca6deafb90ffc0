// src/watch/source.rs

use std::path::Path;
use std::sync::{Mutex, PoisonError};

use notify::event::{EventKind, ModifyKind};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::errors::{Result, WatchflowError};
use crate::types::{Op, RawEvent};

/// OS-level change notifier.
///
/// Raw events are delivered through the receiver handed out when the source
/// is opened; the trait only covers subscription management so that the
/// watch set can subscribe newly discovered directories while running.
pub trait EventSource: Send + Sync {
    /// Start receiving events for the immediate contents of `path`.
    fn subscribe(&self, path: &Path) -> Result<()>;

    /// Stop delivering events. Best effort; calling it twice is harmless.
    fn close(&self);
}

/// [`EventSource`] backed by `notify`'s platform watcher.
///
/// Every directory is watched non-recursively; recursive behaviour is
/// maintained by the watch set, which subscribes subdirectories as they are
/// discovered.
pub struct NotifyEventSource {
    watcher: Mutex<Option<RecommendedWatcher>>,
}

impl std::fmt::Debug for NotifyEventSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyEventSource").finish()
    }
}

impl NotifyEventSource {
    /// Create the platform watcher and the channel its events are sent on.
    pub fn open() -> Result<(Self, mpsc::UnboundedReceiver<RawEvent>)> {
        // Channel from the blocking notify callback into the async world.
        let (event_tx, event_rx) = mpsc::unbounded_channel::<RawEvent>();

        let watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    for raw in translate(&event) {
                        if event_tx.send(raw).is_err() {
                            // Receiver gone: the pipeline has stopped.
                            return;
                        }
                    }
                }
                Err(err) => {
                    warn!(error = %err, "file watch error");
                }
            },
            Config::default(),
        )
        .map_err(|e| WatchflowError::Setup(format!("creating file watcher: {e}")))?;

        info!("file watcher created");

        Ok((
            Self {
                watcher: Mutex::new(Some(watcher)),
            },
            event_rx,
        ))
    }
}

impl EventSource for NotifyEventSource {
    fn subscribe(&self, path: &Path) -> Result<()> {
        let mut guard = self.watcher.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.as_mut() {
            Some(watcher) => {
                watcher.watch(path, RecursiveMode::NonRecursive)?;
                debug!(?path, "subscribed");
                Ok(())
            }
            None => Err(WatchflowError::Setup(format!(
                "cannot watch {:?}: event source is closed",
                path
            ))),
        }
    }

    fn close(&self) {
        let mut guard = self.watcher.lock().unwrap_or_else(PoisonError::into_inner);
        // Dropping the watcher releases every OS watch and the callback.
        if guard.take().is_some() {
            info!("file watcher closed");
        }
    }
}

/// Map a notify event onto one raw event per affected path.
///
/// Access notifications and kinds with no counterpart in [`Op`] are
/// dropped.
pub fn translate(event: &Event) -> Vec<RawEvent> {
    let Some(op) = op_for_kind(&event.kind) else {
        return Vec::new();
    };
    event
        .paths
        .iter()
        .map(|path| RawEvent::new(path.clone(), op))
        .collect()
}

fn op_for_kind(kind: &EventKind) -> Option<Op> {
    match kind {
        EventKind::Create(_) => Some(Op::CREATE),
        EventKind::Remove(_) => Some(Op::REMOVE),
        EventKind::Modify(ModifyKind::Name(_)) => Some(Op::RENAME),
        EventKind::Modify(ModifyKind::Metadata(_)) => Some(Op::CHMOD),
        EventKind::Modify(_) => Some(Op::WRITE),
        EventKind::Any => Some(Op::WRITE),
        EventKind::Access(_) | EventKind::Other => None,
    }
}
