// src/watch/batcher.rs

//! Time-windowed coalescing of raw events.
//!
//! [`Coalescer`] is the pure accumulation logic; [`Batcher`] is the async
//! loop around it that waits on raw events, the tick and the stop signal.

use std::mem;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, trace};

use crate::engine::shutdown::StopSignal;
use crate::types::{EventBatch, RawEvent};

/// Length of one coalescing window unless configured otherwise.
pub const DEFAULT_BATCH_INTERVAL: Duration = Duration::from_millis(300);

/// Accumulates events for the current window.
///
/// There is no bound on how many events a window may hold.
#[derive(Debug, Default)]
pub struct Coalescer {
    pending: Vec<RawEvent>,
}

impl Coalescer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: RawEvent) {
        self.pending.push(event);
    }

    /// Close the current window: returns the accumulated events in arrival
    /// order, or `None` if nothing arrived.
    pub fn take_batch(&mut self) -> Option<EventBatch> {
        if self.pending.is_empty() {
            return None;
        }
        Some(mem::take(&mut self.pending))
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Drains raw events and emits one batch per non-empty tick.
#[derive(Debug, Clone, Copy)]
pub struct Batcher {
    interval: Duration,
}

impl Default for Batcher {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_INTERVAL)
    }
}

impl Batcher {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Run the batching loop as its own Tokio task.
    pub fn spawn(
        self,
        raw_rx: mpsc::UnboundedReceiver<RawEvent>,
        batch_tx: mpsc::Sender<EventBatch>,
        stop: StopSignal,
    ) -> JoinHandle<()> {
        tokio::spawn(self.run(raw_rx, batch_tx, stop))
    }

    /// Batching loop.
    ///
    /// Exits when `stop` fires or the batch receiver is dropped. Events
    /// still pending at that point are discarded. A closed raw channel does
    /// not end the loop; only the stop signal does.
    pub async fn run(
        self,
        mut raw_rx: mpsc::UnboundedReceiver<RawEvent>,
        batch_tx: mpsc::Sender<EventBatch>,
        mut stop: StopSignal,
    ) {
        info!(interval_ms = self.interval.as_millis() as u64, "batcher started");

        let mut ticker = time::interval_at(time::Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut coalescer = Coalescer::new();

        loop {
            tokio::select! {
                biased;

                _ = stop.stopped() => break,

                _ = ticker.tick() => {
                    let Some(batch) = coalescer.take_batch() else {
                        continue;
                    };
                    debug!(events = batch.len(), "emitting batch");
                    tokio::select! {
                        biased;
                        _ = stop.stopped() => break,
                        res = batch_tx.send(batch) => {
                            if res.is_err() {
                                debug!("batch receiver dropped");
                                break;
                            }
                        }
                    }
                }

                Some(event) = raw_rx.recv() => {
                    trace!(path = ?event.path, op = %event.op, "raw event");
                    coalescer.push(event);
                }
            }
        }

        if !coalescer.is_empty() {
            debug!(discarded = coalescer.len(), "dropping partial window on stop");
        }
        info!("batcher finished");
    }
}
