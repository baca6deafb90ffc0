// src/config/mod.rs

//! Configuration loading and validation for watchflow.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate patterns, operations and intervals (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_or_default};
pub use model::{ConfigFile, PipelineSection, RawConfigFile, TaskConfig, WatchConfig, WorkflowConfig};
pub use validate::parse_ops;
