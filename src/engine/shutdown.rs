// src/engine/shutdown.rs

//! Stop signalling between a running pipeline and whoever controls it.

use std::sync::Arc;

use tokio::sync::watch;

/// Cloneable handle that stops a running pipeline.
///
/// Stopping is idempotent at this level; the pipeline reacts to the first
/// request only.
#[derive(Debug, Clone)]
pub struct StopHandle {
    tx: Arc<watch::Sender<bool>>,
}

/// Receiving side of a [`StopHandle`], held by the batcher and the dispatch
/// loop.
#[derive(Debug, Clone)]
pub struct StopSignal {
    rx: watch::Receiver<bool>,
}

/// Create a connected stop handle / signal pair.
pub fn stop_channel() -> (StopHandle, StopSignal) {
    let (tx, rx) = watch::channel(false);
    (StopHandle { tx: Arc::new(tx) }, StopSignal { rx })
}

impl StopHandle {
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.tx.borrow()
    }
}

impl StopSignal {
    pub fn is_stopped(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once a stop has been requested. Dropping every
    /// [`StopHandle`] counts as a stop request.
    pub async fn stopped(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}
