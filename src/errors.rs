// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchflowError {
    /// A watch target could not be canonicalised (missing, permission
    /// denied, ...). Nothing is registered when this is returned.
    #[error("cannot resolve watch path {path:?}: {reason}")]
    Resolution { path: PathBuf, reason: String },

    /// The event source could not be opened when starting a pipeline.
    #[error("Setup error: {0}")]
    Setup(String),

    /// An external task reported failure.
    #[error("Task failed: {0}")]
    Task(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Invalid regex: {0}")]
    RegexError(#[from] regex::Error),

    #[error("Invalid glob: {0}")]
    GlobError(#[from] globset::Error),

    #[error("Watcher error: {0}")]
    NotifyError(#[from] notify::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, WatchflowError>;
