// src/engine/mod.rs

//! Orchestration engine for watchflow.
//!
//! This module ties together:
//! - the watch set and event source (from [`crate::watch`])
//! - the batcher that coalesces raw events into per-window batches
//! - the dispatch loop that, for every event, fires a rescan of new
//!   directories and runs the matching workflows
//!
//! [`pipeline`] holds the lifecycle types, [`dispatch`] the workflow
//! matching, and [`shutdown`] the stop signalling shared by the loops.

pub mod dispatch;
pub mod pipeline;
pub mod shutdown;

pub use dispatch::WorkflowDispatcher;
pub use pipeline::{Pipeline, PipelineOptions, RunningPipeline};
pub use shutdown::{StopHandle, StopSignal, stop_channel};
