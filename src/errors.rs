// src/errors.rs

//! Crate-wide error type.
//!
//! Only conditions that stop the harness *before* a session starts are
//! errors. Session-ending conditions (timeout, crashes) are reported through
//! [`crate::engine::SessionOutcome`] instead.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum InteractError {
    #[error("No such file: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("failed to launch {}: {source}", path.display())]
    Launch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, InteractError>;
