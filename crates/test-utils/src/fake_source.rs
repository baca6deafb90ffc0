use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use watchflow::errors::Result;
use watchflow::types::{Op, RawEvent};
use watchflow::watch::EventSource;

/// An event source that:
/// - records every subscribed path
/// - lets the test inject raw events directly
/// - remembers whether it was closed.
///
/// Injection keeps working after `close()`, which stands in for the OS
/// still producing events while a pipeline shuts down.
pub struct FakeEventSource {
    tx: mpsc::UnboundedSender<RawEvent>,
    subscribed: Mutex<Vec<PathBuf>>,
    closed: AtomicBool,
}

impl FakeEventSource {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<RawEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let source = Arc::new(Self {
            tx,
            subscribed: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        });
        (source, rx)
    }

    /// Inject an event. Returns false once the receiving side is gone.
    pub fn emit(&self, path: impl Into<PathBuf>, op: Op) -> bool {
        self.tx.send(RawEvent::new(path, op)).is_ok()
    }

    pub fn subscriptions(&self) -> Vec<PathBuf> {
        self.subscribed.lock().unwrap().clone()
    }

    pub fn is_subscribed(&self, path: impl AsRef<Path>) -> bool {
        self.subscribed
            .lock()
            .unwrap()
            .iter()
            .any(|p| p == path.as_ref())
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl EventSource for FakeEventSource {
    fn subscribe(&self, path: &Path) -> Result<()> {
        self.subscribed.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
