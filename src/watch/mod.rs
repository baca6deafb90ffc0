// src/watch/mod.rs

//! File watching and change coalescing.
//!
//! This module is responsible for:
//! - Tracking which directories are watched, including recursive roots that
//!   grow as new subdirectories appear (`watch_set`).
//! - Wiring up a cross-platform filesystem watcher (`notify`) behind the
//!   [`EventSource`] trait (`source`).
//! - Coalescing raw events into fixed-interval batches (`batcher`).
//!
//! It does **not** know about workflows; it only turns filesystem changes
//! into ordered batches of [`crate::types::RawEvent`]s.

pub mod batcher;
pub mod path_utils;
pub mod source;
pub mod watch_set;

pub use batcher::{Batcher, Coalescer, DEFAULT_BATCH_INTERVAL};
pub use source::{EventSource, NotifyEventSource, translate};
pub use watch_set::{RecursiveRoot, WatchSet};
