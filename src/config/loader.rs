// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::cli::CliArgs;
use crate::config::model::{HarnessConfig, RawConfigFile};
use crate::errors::{InteractError, Result};

/// Load a configuration file from a given path and return the raw
/// `RawConfigFile`.
///
/// This only performs TOML deserialization; use [`load_and_validate`] to also
/// check value ranges.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(InteractError::MissingFile(path.to_path_buf()));
    }
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<HarnessConfig> {
    let raw_config = load_from_path(&path)?;
    HarnessConfig::try_from(raw_config)
}

/// Build the effective config for a run.
///
/// Starts from `--config` (or built-in defaults when absent), applies CLI
/// overrides on top, then validates the merged result.
pub fn resolve(args: &CliArgs) -> Result<HarnessConfig> {
    let mut raw = match args.config {
        Some(ref path) => load_from_path(path)?,
        None => RawConfigFile::default(),
    };

    apply_overrides(&mut raw, args);
    HarnessConfig::try_from(raw)
}

fn apply_overrides(raw: &mut RawConfigFile, args: &CliArgs) {
    if let Some(timeout) = args.timeout {
        raw.session.timeout = timeout;
    }
    if let Some(poll) = args.poll_interval_ms {
        raw.session.poll_interval_ms = poll;
    }
    if args.no_color {
        raw.display.color = false;
    }
}
